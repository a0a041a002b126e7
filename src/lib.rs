// Copyright (c) Addison Crump, 2025, licensed under the EUPL-1.2-or-later.

//! rush-hour-search: a backtracking solver for Thinkfun's "Rush Hour".
//!
//! The premise of the game is simple: vehicles with fixed orientations (up/down or left/right)
//! sit on a grid and may only slide forwards and backwards along that orientation. One vehicle,
//! the goal vehicle, must be brought to the exit cell by moving the others out of its way.
//! Vehicles may not intersect and must stay within the bounds of the board.
//!
//! This library provides the board model ([`Board`]), the search tree built from it
//! ([`SearchNode`]), and a depth-first [`Backtracker`] which walks that tree until the goal
//! vehicle reaches the exit. For the common case, [`solve`] wraps all three.
//!
//! ```
//! use rush_hour_search::{solve, Board, BoardConfig, Direction, Vehicle};
//!
//! # fn main() -> Result<(), Box<dyn core::error::Error>> {
//! let red = Vehicle::try_from(('X', 2u8, 0, 2, 1))?;
//! let board = Board::with_vehicles(BoardConfig::standard(), [red])?;
//! let path = solve(board)?.expect("an open row is solvable");
//! assert_eq!(4, path.len());
//! assert!(path.iter().all(|m| m.direction() == Direction::Right));
//! # Ok(())
//! # }
//! ```

#![no_std]

use core::error::Error;
use core::fmt::{Debug, Display, Formatter};
use core::hash::Hash;
use core::iter;
use core::num::IntErrorKind;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use num_traits::{CheckedAdd, CheckedMul, CheckedSub, One, Unsigned, Zero};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};

extern crate alloc;

mod board;
mod search;

pub use board::{
    Board, BoardLayout, InvalidMoveError, InvalidMoveType, InvalidStateError,
    VehicleNotFoundError,
};
pub use search::{Backtracker, SearchConfig, SearchNode, SearchStats, Strategy};

/// An orientation for a vehicle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum Orientation {
    /// The vehicle may only move up and down.
    UpDown,
    /// The vehicle may only move left and right.
    LeftRight,
}

impl Orientation {
    /// Whether a vehicle of this orientation may move in the provided direction.
    pub fn allows(self, dir: Direction) -> bool {
        matches!(
            (self, dir),
            (Orientation::UpDown, Direction::Up | Direction::Down)
                | (Orientation::LeftRight, Direction::Left | Direction::Right)
        )
    }
}

/// A direction for a move. A direction may be flipped with [`Neg`] (i.e. `-`).
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum Direction {
    /// Upward movement.
    Up,
    /// Downward movement.
    Down,
    /// Leftward movement.
    Left,
    /// Rightward movement.
    Right,
}

impl Direction {
    /// Every direction, in the order successors are enumerated.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        })
    }
}

impl Neg for Direction {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Marker trait: specifies that a value may be used for board definitions.
pub trait BoardValue:
    One
    + Ord
    + Hash
    + Add<Output = Self>
    + CheckedAdd
    + Sub<Output = Self>
    + CheckedSub
    + AddAssign
    + SubAssign
    + Copy
    + Into<usize>
    + From<u8>
    + TryFrom<usize>
    + Zero
    + CheckedMul
    + Debug
    + Display
    + Unsigned
    + DeserializeOwned
    + Serialize
    + 'static
{
}

impl<V> BoardValue for V where
    V: One
        + Ord
        + Hash
        + Add<Output = Self>
        + CheckedAdd
        + Sub<Output = Self>
        + CheckedSub
        + AddAssign
        + SubAssign
        + Copy
        + Into<usize>
        + From<u8>
        + TryFrom<usize>
        + Zero
        + CheckedMul
        + Debug
        + Display
        + Unsigned
        + DeserializeOwned
        + Serialize
        + 'static
{
}

/// A position in the board (eff., a coordinate pair). Positions order row-major.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct Position<V> {
    row: V,
    column: V,
}

impl<V> Position<V> {
    /// Create a position from its coordinates.
    pub fn new(row: V, column: V) -> Self {
        Self { row, column }
    }

    /// The row of the position.
    pub fn row(&self) -> &V {
        &self.row
    }

    /// The column of the position.
    pub fn column(&self) -> &V {
        &self.column
    }
}

impl<V> Add for Position<V>
where
    V: BoardValue,
{
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            row: self.row + rhs.row,
            column: self.column + rhs.column,
        }
    }
}

impl<V> CheckedAdd for Position<V>
where
    V: BoardValue,
{
    fn checked_add(&self, rhs: &Self) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add(&rhs.row)?,
            column: self.column.checked_add(&rhs.column)?,
        })
    }
}

impl<V> Sub for Position<V>
where
    V: BoardValue,
{
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            row: self.row - rhs.row,
            column: self.column - rhs.column,
        }
    }
}

impl<V> CheckedSub for Position<V>
where
    V: BoardValue,
{
    fn checked_sub(&self, rhs: &Self) -> Option<Self> {
        Some(Self {
            row: self.row.checked_sub(&rhs.row)?,
            column: self.column.checked_sub(&rhs.column)?,
        })
    }
}

impl<V> Position<V>
where
    V: BoardValue,
{
    /// The position encoded as an index into a board with the provided dimensions, or `None` if
    /// the position lies outside of them.
    pub fn as_index(&self, dim: &Dimensions<V>) -> Option<usize> {
        if self.row >= dim.rows || self.column >= dim.columns {
            return None;
        }
        let row = self.row.into();
        let column = self.column.into();
        Some(row * dim.columns.into() + column)
    }

    /// Get the position `by` units away from this position in the provided direction `dir`, or
    /// `None` if the position would fall below zero on either axis.
    pub fn shift(&self, dir: Direction, by: V) -> Option<Self> {
        match dir {
            Direction::Up => self.checked_sub(&Self::from((by, V::zero()))),
            Direction::Down => self.checked_add(&Self::from((by, V::zero()))),
            Direction::Left => self.checked_sub(&Self::from((V::zero(), by))),
            Direction::Right => self.checked_add(&Self::from((V::zero(), by))),
        }
    }
}

impl<V> From<(V, V)> for Position<V> {
    fn from((row, column): (V, V)) -> Self {
        Self { row, column }
    }
}

impl<V> Display for Position<V>
where
    V: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// The dimensions of a board in terms of rows and columns.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct Dimensions<V> {
    rows: V,
    columns: V,
}

impl<V> Dimensions<V> {
    /// The number of rows.
    pub fn rows(&self) -> &V {
        &self.rows
    }

    /// The number of columns.
    pub fn columns(&self) -> &V {
        &self.columns
    }
}

impl<V> Dimensions<V>
where
    V: BoardValue,
{
    /// The number of cells covered by these dimensions.
    pub fn area(&self) -> usize {
        self.rows.into() * self.columns.into()
    }

    /// Whether the provided position lies within these dimensions.
    pub fn contains(&self, position: &Position<V>) -> bool {
        position.as_index(self).is_some()
    }
}

/// An error associated with the creation of the dimensions.
#[derive(Debug, Eq, PartialEq)]
pub struct DimensionError(IntErrorKind);

impl Display for DimensionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let reason = match self.0 {
            IntErrorKind::PosOverflow => "the dimensions were too large",
            IntErrorKind::Zero => "the dimensions have zero area",
            _ => unreachable!(),
        };
        f.write_fmt(format_args!("dimensions could not be used: {reason}"))
    }
}

impl Error for DimensionError {}

impl<V> TryFrom<(V, V)> for Dimensions<V>
where
    V: BoardValue,
{
    type Error = DimensionError;

    fn try_from((rows, columns): (V, V)) -> Result<Self, Self::Error> {
        if let Some(size) = rows.checked_mul(&columns) {
            if size.is_zero() {
                Err(DimensionError(IntErrorKind::Zero))
            } else {
                Ok(Self { rows, columns })
            }
        } else {
            Err(DimensionError(IntErrorKind::PosOverflow))
        }
    }
}

/// The fixed parameters of a board: its dimensions, the exit cell and the id of the goal vehicle.
/// Once constructed, the exit is guaranteed to lie within the dimensions.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(
    try_from = "BoardConfigFields<V>",
    into = "BoardConfigFields<V>",
    bound(deserialize = "V: BoardValue", serialize = "V: BoardValue")
)]
pub struct BoardConfig<V> {
    dim: Dimensions<V>,
    exit: Position<V>,
    goal: char,
}

#[derive(Deserialize, Serialize)]
struct BoardConfigFields<V> {
    rows: V,
    columns: V,
    exit: Position<V>,
    goal: char,
}

impl<V> BoardConfig<V> {
    /// The dimensions of the board.
    pub fn dimensions(&self) -> &Dimensions<V> {
        &self.dim
    }

    /// The cell the goal vehicle's front must reach.
    pub fn exit(&self) -> &Position<V> {
        &self.exit
    }

    /// The id of the goal vehicle.
    pub fn goal(&self) -> char {
        self.goal
    }
}

impl<V> BoardConfig<V>
where
    V: BoardValue,
{
    /// Create a configuration, checking that the exit lies on the board.
    pub fn new<D, P>(dim: D, exit: P, goal: char) -> Result<Self, ConfigError<V>>
    where
        D: TryInto<Dimensions<V>, Error = DimensionError>,
        P: Into<Position<V>>,
    {
        let dim = dim.try_into().map_err(ConfigError::Dimensions)?;
        let exit = exit.into();
        if !dim.contains(&exit) {
            return Err(ConfigError::ExitOutOfBounds(exit));
        }
        Ok(Self { dim, exit, goal })
    }

    /// The classic game: a 6x6 board, exit on row 2 of the last column, and the red car `X`.
    pub fn standard() -> Self {
        Self {
            dim: Dimensions {
                rows: V::from(6),
                columns: V::from(6),
            },
            exit: Position {
                row: V::from(2),
                column: V::from(5),
            },
            goal: 'X',
        }
    }
}

impl<V> TryFrom<BoardConfigFields<V>> for BoardConfig<V>
where
    V: BoardValue,
{
    type Error = ConfigError<V>;

    fn try_from(fields: BoardConfigFields<V>) -> Result<Self, Self::Error> {
        Self::new((fields.rows, fields.columns), fields.exit, fields.goal)
    }
}

impl<V> From<BoardConfig<V>> for BoardConfigFields<V> {
    fn from(config: BoardConfig<V>) -> Self {
        Self {
            rows: config.dim.rows,
            columns: config.dim.columns,
            exit: config.exit,
            goal: config.goal,
        }
    }
}

/// An error which denotes that a board configuration could not be used.
#[derive(Debug, Eq, PartialEq)]
pub enum ConfigError<V> {
    /// The dimensions themselves were invalid.
    Dimensions(DimensionError),
    /// The exit cell lies outside of the board.
    ExitOutOfBounds(Position<V>),
}

impl<V> Display for ConfigError<V>
where
    V: BoardValue,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::Dimensions(err) => Display::fmt(err, f),
            ConfigError::ExitOutOfBounds(exit) => {
                write!(f, "exit {exit} does not lie within the board")
            }
        }
    }
}

impl<V> Error for ConfigError<V>
where
    V: BoardValue,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Dimensions(err) => Some(err),
            ConfigError::ExitOutOfBounds(_) => None,
        }
    }
}

/// A vehicle, generic over the numeric type which backs it. Orientation and length are derived
/// from the back and front positions, which always share a row or a column.
///
/// Vehicles (de)serialize as the tuple `(id, back row, back column, front row, front column)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize)]
#[serde(
    try_from = "(char, V, V, V, V)",
    bound(deserialize = "V: BoardValue")
)]
pub struct Vehicle<V> {
    id: char,
    back: Position<V>,
    front: Position<V>,
}

impl<V> Vehicle<V> {
    /// The id of the vehicle.
    pub fn id(&self) -> char {
        self.id
    }

    /// The back end of the vehicle.
    pub fn back(&self) -> &Position<V> {
        &self.back
    }

    /// The front end of the vehicle.
    pub fn front(&self) -> &Position<V> {
        &self.front
    }
}

impl<V> Vehicle<V>
where
    V: BoardValue,
{
    /// Create a new vehicle spanning `back` to `front`, inclusive.
    pub fn new<P: Into<Position<V>>>(id: char, back: P, front: P) -> Result<Self, VehicleError> {
        let back = back.into();
        let front = front.into();
        if back.row != front.row && back.column != front.column {
            return Err(VehicleError(id));
        }
        Ok(Self { id, back, front })
    }

    /// The orientation of the vehicle. A single-cell vehicle counts as left/right.
    pub fn orientation(&self) -> Orientation {
        if self.back.row == self.front.row {
            Orientation::LeftRight
        } else {
            Orientation::UpDown
        }
    }

    /// Whether the vehicle moves left and right.
    pub fn is_horizontal(&self) -> bool {
        self.orientation() == Orientation::LeftRight
    }

    /// The lowest and highest cell covered by the vehicle, regardless of which end is the front.
    pub fn span(&self) -> (Position<V>, Position<V>) {
        (
            Position {
                row: self.back.row.min(self.front.row),
                column: self.back.column.min(self.front.column),
            },
            Position {
                row: self.back.row.max(self.front.row),
                column: self.back.column.max(self.front.column),
            },
        )
    }

    /// The number of cells the vehicle covers.
    pub fn length(&self) -> V {
        let (low, high) = self.span();
        (high.row - low.row) + (high.column - low.column) + V::one()
    }

    /// Every cell the vehicle covers, from its lowest to its highest.
    pub fn cells(&self) -> impl Iterator<Item = Position<V>> + use<V> {
        let (low, high) = self.span();
        let step = match self.orientation() {
            Orientation::UpDown => Position::from((V::one(), V::zero())),
            Orientation::LeftRight => Position::from((V::zero(), V::one())),
        };
        iter::successors(Some(low), move |cell| (*cell != high).then(|| *cell + step))
    }

    /// Whether the vehicle covers the provided cell.
    pub fn occupies(&self, position: &Position<V>) -> bool {
        let (low, high) = self.span();
        (low.row..=high.row).contains(&position.row)
            && (low.column..=high.column).contains(&position.column)
    }

    /// This vehicle moved one cell in the provided direction, or `None` if either end would fall
    /// below zero. Orientation is not checked here.
    pub fn shifted(&self, dir: Direction) -> Option<Self> {
        Some(Self {
            id: self.id,
            back: self.back.shift(dir, V::one())?,
            front: self.front.shift(dir, V::one())?,
        })
    }
}

impl<V> TryFrom<(char, V, V, V, V)> for Vehicle<V>
where
    V: BoardValue,
{
    type Error = VehicleError;

    fn try_from(
        (id, back_row, back_column, front_row, front_column): (char, V, V, V, V),
    ) -> Result<Self, Self::Error> {
        Self::new(id, (back_row, back_column), (front_row, front_column))
    }
}

impl<V> Serialize for Vehicle<V>
where
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (
            self.id,
            &self.back.row,
            &self.back.column,
            &self.front.row,
            &self.front.column,
        )
            .serialize(serializer)
    }
}

/// An error which denotes that a vehicle's ends share neither a row nor a column.
#[derive(Debug, Eq, PartialEq)]
pub struct VehicleError(char);

impl Display for VehicleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "vehicle {} must have its back and front on the same row or column",
            self.0
        )
    }
}

impl Error for VehicleError {}

/// A single one-cell displacement request. A move is only checked against a board when applied.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct Move {
    vehicle: char,
    direction: Direction,
}

impl Move {
    /// Create a move of `vehicle` towards `direction`.
    pub fn new(vehicle: char, direction: Direction) -> Self {
        Self { vehicle, direction }
    }

    /// The id of the vehicle to move.
    pub fn vehicle(&self) -> char {
        self.vehicle
    }

    /// The direction to move in.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The move which undoes this one.
    pub fn inverse(&self) -> Self {
        Self {
            vehicle: self.vehicle,
            direction: -self.direction,
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.vehicle, self.direction)
    }
}

/// Search for a path which brings the goal vehicle to the exit, using the default
/// [`SearchConfig`].
///
/// Returns an error if the board has no goal vehicle, `Ok(None)` if every reachable
/// configuration was explored without success.
pub fn solve<V>(board: Board<V>) -> Result<Option<alloc::vec::Vec<Move>>, InvalidStateError<V>>
where
    V: BoardValue,
{
    let root = SearchNode::root(board)?;
    Ok(Backtracker::default()
        .solve(root)
        .map(SearchNode::into_path))
}
