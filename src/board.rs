// Copyright (c) Addison Crump, 2025, licensed under the EUPL-1.2-or-later.

//! The board: vehicle placements over a fixed grid, with the movement rules enforced.

use crate::{BoardConfig, BoardValue, Direction, Move, Position, Vehicle};
use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::error::Error;
use core::fmt::{Display, Formatter};
use core::hash::{Hash, Hasher};
use serde::{Deserialize, Serialize};

/// A state of the game. The board upholds its invariants (no overlapping vehicles, every vehicle
/// in bounds, a horizontal goal vehicle) as long as it is manipulated through its own operations.
///
/// Equality, ordering and hashing only consider the configuration and the vehicle placements: the
/// move counter does not take part, so two boards reached by different move orders compare equal
/// when their vehicles sit in the same cells.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(
    try_from = "BoardLayout<V>",
    into = "BoardLayout<V>",
    bound(deserialize = "V: BoardValue", serialize = "V: BoardValue")
)]
pub struct Board<V> {
    config: BoardConfig<V>,
    vehicles: BTreeMap<char, Vehicle<V>>,
    concrete: Vec<Option<char>>,
    moves: usize,
}

/// The serialized form of a [`Board`]: its configuration and its vehicles. Converting a layout
/// into a board validates every vehicle.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(bound(deserialize = "V: BoardValue", serialize = "V: BoardValue"))]
pub struct BoardLayout<V> {
    /// The configuration of the board.
    pub config: BoardConfig<V>,
    /// The vehicles on the board, in insertion order.
    pub vehicles: Vec<Vehicle<V>>,
}

impl<V> TryFrom<BoardLayout<V>> for Board<V>
where
    V: BoardValue,
{
    type Error = InvalidStateError<V>;

    fn try_from(layout: BoardLayout<V>) -> Result<Self, Self::Error> {
        Board::with_vehicles(layout.config, layout.vehicles)
    }
}

impl<V> From<Board<V>> for BoardLayout<V> {
    fn from(board: Board<V>) -> Self {
        Self {
            config: board.config,
            vehicles: board.vehicles.into_values().collect(),
        }
    }
}

/// An error which denotes that an invalid state was encountered.
#[derive(Debug, Eq, PartialEq)]
pub enum InvalidStateError<V> {
    /// A vehicle with the provided id is already on the board.
    DuplicateVehicle(char),
    /// The vehicle with the provided id would cover a cell outside of the board.
    InvalidPosition(char, Position<V>),
    /// The vehicles with the provided ids overlap at the provided position.
    Overlap(char, char, Position<V>),
    /// The goal vehicle with the provided id is not horizontal.
    VerticalGoal(char),
    /// The goal vehicle with the provided id is not on the board.
    MissingGoal(char),
}

impl<V> Display for InvalidStateError<V>
where
    V: BoardValue,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            InvalidStateError::DuplicateVehicle(id) => {
                write!(f, "vehicle {id} already exists on the board")
            }
            InvalidStateError::InvalidPosition(id, position) => {
                write!(f, "vehicle {id} was located at an invalid position {position}")
            }
            InvalidStateError::Overlap(first, second, position) => {
                write!(f, "vehicle {first} and vehicle {second} overlapped at position {position}")
            }
            InvalidStateError::VerticalGoal(id) => {
                write!(f, "goal vehicle {id} must be horizontal")
            }
            InvalidStateError::MissingGoal(id) => {
                write!(f, "goal vehicle {id} is not on the board")
            }
        }
    }
}

impl<V> Error for InvalidStateError<V> where V: BoardValue {}

/// An error which denotes that no vehicle with the requested id is on the board.
#[derive(Debug, Eq, PartialEq)]
pub struct VehicleNotFoundError(char);

impl VehicleNotFoundError {
    /// The id which was looked up.
    pub fn id(&self) -> char {
        self.0
    }
}

impl Display for VehicleNotFoundError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "vehicle {} was not found", self.0)
    }
}

impl Error for VehicleNotFoundError {}

/// The type of invalid move that was observed in an [`InvalidMoveError`].
#[derive(Debug, Eq, PartialEq)]
pub enum InvalidMoveType<V> {
    /// The vehicle that was designated to be moved didn't exist.
    UnknownVehicle,
    /// The direction that was used isn't valid for the vehicle's orientation.
    InvalidDirection,
    /// The back or front of the vehicle would leave the board.
    InvalidFinalPosition,
    /// After moving the vehicle, it would intersect another with the provided id at the provided
    /// position.
    Intersects(Position<V>, char),
}

/// An error which describes an attempted invalid move.
#[derive(Debug, Eq, PartialEq)]
pub struct InvalidMoveError<V> {
    vehicle: char,
    dir: Direction,
    variant: InvalidMoveType<V>,
}

impl<V> InvalidMoveError<V> {
    /// The id of the vehicle that was to be moved.
    pub fn vehicle(&self) -> char {
        self.vehicle
    }

    /// The direction of the attempted move.
    pub fn direction(&self) -> Direction {
        self.dir
    }

    /// Why the move was rejected.
    pub fn variant(&self) -> &InvalidMoveType<V> {
        &self.variant
    }
}

impl<V> Display for InvalidMoveError<V>
where
    V: BoardValue,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match &self.variant {
            InvalidMoveType::UnknownVehicle => f.write_fmt(format_args!("cannot move vehicle {} {} because it doesn't exist", self.vehicle, self.dir)),
            InvalidMoveType::InvalidDirection => f.write_fmt(format_args!("cannot move vehicle {} {} because its orientation does not allow for movement in that direction", self.vehicle, self.dir)),
            InvalidMoveType::InvalidFinalPosition => f.write_fmt(format_args!("cannot move vehicle {} {} because it enters an invalid position", self.vehicle, self.dir)),
            InvalidMoveType::Intersects(pos, other) => f.write_fmt(format_args!("cannot move vehicle {} {} because it would intersect with vehicle {} at {}", self.vehicle, self.dir, other, pos)),
        }
    }
}

impl<V> Error for InvalidMoveError<V> where V: BoardValue {}

impl<V> Board<V> {
    /// The configuration of this board.
    pub fn config(&self) -> &BoardConfig<V> {
        &self.config
    }

    /// The number of moves made on this board since it was created or last reset.
    pub fn move_count(&self) -> usize {
        self.moves
    }

    /// The vehicles on this board, ordered by id.
    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle<V>> {
        self.vehicles.values()
    }

    /// The vehicle placements, keyed by id. Two boards with the same configuration are equal
    /// exactly when their placements are.
    pub fn placement(&self) -> &BTreeMap<char, Vehicle<V>> {
        &self.vehicles
    }

    /// The goal vehicle, if it has been placed.
    pub fn goal_vehicle(&self) -> Option<&Vehicle<V>> {
        self.vehicles.get(&self.config.goal())
    }

    /// Look up a vehicle by its id.
    pub fn get(&self, id: char) -> Result<&Vehicle<V>, VehicleNotFoundError> {
        self.vehicles.get(&id).ok_or(VehicleNotFoundError(id))
    }

    /// Remove every vehicle and reset the move counter.
    pub fn reset(&mut self) {
        self.vehicles.clear();
        self.concrete.fill(None);
        self.moves = 0;
    }
}

impl<V> Board<V>
where
    V: BoardValue,
{
    /// Produce an empty board (i.e., one with no vehicles) with the provided configuration.
    pub fn new(config: BoardConfig<V>) -> Self {
        Self {
            concrete: vec![None; config.dimensions().area()],
            config,
            vehicles: BTreeMap::new(),
            moves: 0,
        }
    }

    /// Produce a board holding the provided vehicles, or the first error encountered while
    /// adding them.
    pub fn with_vehicles<I>(config: BoardConfig<V>, vehicles: I) -> Result<Self, InvalidStateError<V>>
    where
        I: IntoIterator<Item = Vehicle<V>>,
    {
        let mut board = Self::new(config);
        for vehicle in vehicles {
            board.add_vehicle(vehicle)?;
        }
        Ok(board)
    }

    /// Fetches the vehicle id occupying the requested position. [`None`] if the position doesn't
    /// exist in the board, [`Some`]`(`[`None`]`)` if the position exists, but is empty, and
    /// [`Some`]`(`[`Some`]`(id))` with `id` as the vehicle that occupies that position.
    pub fn occupant<P: Into<Position<V>>>(&self, position: P) -> Option<Option<char>> {
        position
            .into()
            .as_index(self.config.dimensions())
            .and_then(|p| self.concrete.get(p).copied())
    }

    /// Add a vehicle to the board. On error, the board is left unchanged.
    pub fn add_vehicle(&mut self, vehicle: Vehicle<V>) -> Result<(), InvalidStateError<V>> {
        let id = vehicle.id();
        if self.vehicles.contains_key(&id) {
            return Err(InvalidStateError::DuplicateVehicle(id));
        }
        if id == self.config.goal() && !vehicle.is_horizontal() {
            return Err(InvalidStateError::VerticalGoal(id));
        }
        let mut cells = Vec::new();
        for cell in vehicle.cells() {
            match cell
                .as_index(self.config.dimensions())
                .map(|idx| (idx, self.concrete[idx]))
            {
                None => return Err(InvalidStateError::InvalidPosition(id, cell)),
                Some((_, Some(existing))) => {
                    return Err(InvalidStateError::Overlap(existing, id, cell));
                }
                Some((idx, None)) => cells.push(idx),
            }
        }
        for idx in cells {
            self.concrete[idx] = Some(id);
        }
        self.vehicles.insert(id, vehicle);
        Ok(())
    }

    /// Insert a vehicle without any checks, leaving the occupancy grid stale.
    #[cfg(test)]
    pub(crate) fn place_unchecked(&mut self, vehicle: Vehicle<V>) {
        self.vehicles.insert(vehicle.id(), vehicle);
    }

    /// Check whether the vehicle may move one cell in the provided direction, producing the
    /// vehicle at its new position if so.
    pub fn check_move(&self, id: char, dir: Direction) -> Result<Vehicle<V>, InvalidMoveError<V>> {
        let reject = |variant| InvalidMoveError {
            vehicle: id,
            dir,
            variant,
        };
        let vehicle = self
            .vehicles
            .get(&id)
            .ok_or_else(|| reject(InvalidMoveType::UnknownVehicle))?;
        if !vehicle.orientation().allows(dir) {
            return Err(reject(InvalidMoveType::InvalidDirection));
        }
        let dim = self.config.dimensions();
        let moved = vehicle
            .shifted(dir)
            .filter(|moved| dim.contains(moved.back()) && dim.contains(moved.front()))
            .ok_or_else(|| reject(InvalidMoveType::InvalidFinalPosition))?;
        for cell in moved.cells() {
            let idx = cell
                .as_index(dim)
                .ok_or_else(|| reject(InvalidMoveType::InvalidFinalPosition))?;
            match self.concrete[idx] {
                Some(other) if other != id => {
                    return Err(reject(InvalidMoveType::Intersects(cell, other)));
                }
                _ => {}
            }
        }
        Ok(moved)
    }

    /// Whether the vehicle may move one cell in the provided direction. Unknown vehicles cannot
    /// move.
    pub fn can_move(&self, id: char, dir: Direction) -> bool {
        self.check_move(id, dir).is_ok()
    }

    /// Shift a vehicle one cell in the provided direction, returning it at its new position.
    pub fn move_vehicle(&mut self, id: char, dir: Direction) -> Result<Vehicle<V>, InvalidMoveError<V>> {
        let moved = self.check_move(id, dir)?;
        let dim = *self.config.dimensions();
        if let Some(previous) = self.vehicles.insert(id, moved) {
            for idx in previous.cells().filter_map(|cell| cell.as_index(&dim)) {
                self.concrete[idx] = None;
            }
        }
        for idx in moved.cells().filter_map(|cell| cell.as_index(&dim)) {
            self.concrete[idx] = Some(id);
        }
        self.moves += 1;
        Ok(moved)
    }

    /// Apply a move to this board. See [`Board::move_vehicle`].
    pub fn apply(&mut self, mv: &Move) -> Result<Vehicle<V>, InvalidMoveError<V>> {
        self.move_vehicle(mv.vehicle(), mv.direction())
    }

    /// Whether the goal vehicle is horizontal and its front sits on the exit.
    pub fn is_goal(&self) -> bool {
        self.goal_vehicle()
            .is_some_and(|goal| goal.is_horizontal() && goal.front() == self.config.exit())
    }

    /// Recompute the board invariants from the vehicles alone, without consulting the occupancy
    /// grid. Reports the first violation found.
    pub fn validate(&self) -> Result<(), InvalidStateError<V>> {
        let dim = self.config.dimensions();
        let mut occupied = BTreeMap::new();
        for vehicle in self.vehicles.values() {
            if vehicle.id() == self.config.goal() && !vehicle.is_horizontal() {
                return Err(InvalidStateError::VerticalGoal(vehicle.id()));
            }
            for cell in vehicle.cells() {
                if !dim.contains(&cell) {
                    return Err(InvalidStateError::InvalidPosition(vehicle.id(), cell));
                }
                if let Some(existing) = occupied.insert(cell, vehicle.id()) {
                    return Err(InvalidStateError::Overlap(existing, vehicle.id(), cell));
                }
            }
        }
        Ok(())
    }
}

impl<V> PartialEq for Board<V>
where
    V: BoardValue,
{
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config && self.vehicles == other.vehicles
    }
}

impl<V> Eq for Board<V> where V: BoardValue {}

impl<V> PartialOrd for Board<V>
where
    V: BoardValue,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V> Ord for Board<V>
where
    V: BoardValue,
{
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.config, &self.vehicles).cmp(&(&other.config, &other.vehicles))
    }
}

impl<V> Hash for Board<V>
where
    V: BoardValue,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.config.hash(state);
        self.vehicles.hash(state);
    }
}

impl<V> Display for Board<V>
where
    V: BoardValue,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let dim = self.config.dimensions();
        let rows: usize = (*dim.rows()).into();
        let columns: usize = (*dim.columns()).into();
        let exit = self.config.exit();
        let exit_row: usize = (*exit.row()).into();
        let exit_column: usize = (*exit.column()).into();
        let exit_open = exit_column + 1 == columns;

        writeln!(f, "{:#>1$}", "", columns + 2)?;
        for (row, cells) in self.concrete.chunks(columns).enumerate().take(rows) {
            write!(f, "#")?;
            for cell in cells {
                write!(f, "{}", cell.unwrap_or('.'))?;
            }
            if exit_open && row == exit_row {
                writeln!(f)?;
            } else {
                writeln!(f, "#")?;
            }
        }
        writeln!(f, "{:#>1$}", "", columns + 2)
    }
}
