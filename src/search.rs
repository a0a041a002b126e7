// Copyright (c) Addison Crump, 2025, licensed under the EUPL-1.2-or-later.

//! Depth-first search over board configurations.
//!
//! A [`SearchNode`] pairs a board snapshot with the moves that produced it. The [`Backtracker`]
//! walks the tree of nodes depth-first, trying successors in a fixed order (vehicles by id, then
//! [`Direction::ALL`]) and returning the first node whose board is solved. No attempt is made to
//! find a shortest path.

use crate::{Board, BoardValue, Direction, InvalidStateError, Move, Vehicle};
use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

/// A board snapshot paired with the path of moves that produced it from the root. Every node owns
/// its board outright; nothing is shared with its parent or siblings.
#[derive(Clone, Debug)]
pub struct SearchNode<V> {
    board: Board<V>,
    path: Vec<Move>,
}

impl<V> SearchNode<V> {
    /// The board at this node.
    pub fn board(&self) -> &Board<V> {
        &self.board
    }

    /// The moves leading from the root to this node.
    pub fn path(&self) -> &[Move] {
        &self.path
    }

    /// The number of moves between the root and this node.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Consume the node, keeping only its path.
    pub fn into_path(self) -> Vec<Move> {
        self.path
    }

    /// Consume the node, keeping only its board.
    pub fn into_board(self) -> Board<V> {
        self.board
    }
}

impl<V> SearchNode<V>
where
    V: BoardValue,
{
    /// Wrap an initial board into the root of a search tree. Fails if the board breaks its
    /// invariants or has no goal vehicle.
    pub fn root(board: Board<V>) -> Result<Self, InvalidStateError<V>> {
        board.validate()?;
        if board.goal_vehicle().is_none() {
            return Err(InvalidStateError::MissingGoal(board.config().goal()));
        }
        Ok(Self {
            board,
            path: Vec::new(),
        })
    }

    /// Whether every vehicle lies in bounds and no two vehicles overlap, recomputed from scratch.
    pub fn is_valid(&self) -> bool {
        self.board.validate().is_ok()
    }

    /// Whether the goal vehicle is horizontal and sits on the exit.
    pub fn is_goal(&self) -> bool {
        self.board
            .goal_vehicle()
            .is_some_and(Vehicle::is_horizontal)
            && self.board.is_goal()
    }

    /// Every node one legal move away from this one. Moves which land on the same board as an
    /// earlier move in this expansion are dropped.
    pub fn successors(&self) -> Vec<Self> {
        let mut successors: Vec<Self> = Vec::new();
        for id in self.board.placement().keys().copied() {
            for dir in Direction::ALL {
                if !self.board.can_move(id, dir) {
                    continue;
                }
                let mut board = self.board.clone();
                if let Err(err) = board.move_vehicle(id, dir) {
                    log::debug!("pruning successor: {err}");
                    continue;
                }
                if successors.iter().any(|other| other.board == board) {
                    continue;
                }
                let mut path = Vec::with_capacity(self.path.len() + 1);
                path.extend_from_slice(&self.path);
                path.push(Move::new(id, dir));
                successors.push(Self { board, path });
            }
        }
        successors
    }
}

/// How the [`Backtracker`] treats configurations it has already seen.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum Strategy {
    /// Keep no record of explored configurations. Only a configuration already on the current
    /// path is skipped, so the same configuration may be explored again from another branch.
    #[default]
    Exhaustive,
    /// Remember every configuration expanded so far and expand each at most once. Under a depth
    /// limit, a configuration is expanded again when it is reached in fewer moves than before.
    Memoized,
}

/// Parameters of a search.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// How repeated configurations are handled.
    pub strategy: Strategy,
    /// Nodes this many moves from the root are checked against the goal but not expanded.
    pub depth_limit: Option<usize>,
}

/// Counters collected during a single call to [`Backtracker::solve`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchStats {
    /// Nodes taken off the stack and checked.
    pub nodes_visited: u64,
    /// Nodes whose successors were generated.
    pub nodes_expanded: u64,
    /// Nodes abandoned after all of their successors failed.
    pub backtracks: u64,
    /// Nodes dropped because their board broke an invariant.
    pub invalid_nodes: u64,
    /// Nodes dropped because their board already appeared on the current path.
    pub cycles_skipped: u64,
    /// Nodes dropped because their board was already expanded elsewhere.
    pub revisits_skipped: u64,
    /// Nodes left unexpanded because of the depth limit.
    pub depth_limited: u64,
    /// The deepest node visited.
    pub max_depth: usize,
}

impl Display for SearchStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Search Statistics:")?;
        writeln!(f, "  Nodes Visited: {}", self.nodes_visited)?;
        writeln!(f, "  Nodes Expanded: {}", self.nodes_expanded)?;
        writeln!(f, "  Backtracks: {}", self.backtracks)?;
        writeln!(f, "  Invalid Nodes: {}", self.invalid_nodes)?;
        writeln!(f, "  Cycles Skipped: {}", self.cycles_skipped)?;
        writeln!(f, "  Revisits Skipped: {}", self.revisits_skipped)?;
        writeln!(f, "  Depth Limited: {}", self.depth_limited)?;
        write!(f, "  Max Depth: {}", self.max_depth)
    }
}

struct Frame<V> {
    node: SearchNode<V>,
    pending: vec::IntoIter<SearchNode<V>>,
}

enum Step<V> {
    Found(SearchNode<V>),
    Expand(Frame<V>),
    Skip,
}

struct Path<'a>(&'a [Move]);

impl Display for Path<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str("[")?;
        for (i, mv) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{mv}")?;
        }
        f.write_str("]")
    }
}

/// A depth-first search driver. Nodes are checked for validity, then for the goal, then expanded;
/// the first goal node found is returned without looking at the remaining successors.
///
/// Pending successors live on an explicit stack, so the depth of the search is bounded by memory
/// rather than by the call stack.
#[derive(Clone, Debug, Default)]
pub struct Backtracker {
    config: SearchConfig,
    stats: SearchStats,
}

impl Backtracker {
    /// Create a backtracker with the provided configuration.
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            stats: SearchStats::default(),
        }
    }

    /// The configuration of this backtracker.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The counters from the most recent search.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Search the tree below `root`, returning the first node which satisfies the goal, or `None`
    /// once every reachable node was explored (or cut off by the depth limit).
    pub fn solve<V>(&mut self, root: SearchNode<V>) -> Option<SearchNode<V>>
    where
        V: BoardValue,
    {
        self.stats = SearchStats::default();
        let mut visited = BTreeMap::new();
        let mut stack: Vec<Frame<V>> = Vec::new();
        let mut next = Some(root);

        loop {
            if let Some(node) = next.take() {
                match self.enter(node, &stack, &mut visited) {
                    Step::Found(node) => {
                        log::info!(
                            "solution with {} moves found after visiting {} nodes",
                            node.depth(),
                            self.stats.nodes_visited
                        );
                        return Some(node);
                    }
                    Step::Expand(frame) => stack.push(frame),
                    Step::Skip => {}
                }
            }
            let Some(frame) = stack.last_mut() else {
                break;
            };
            match frame.pending.next() {
                Some(child) => next = Some(child),
                None => {
                    stack.pop();
                    self.stats.backtracks += 1;
                }
            }
        }

        log::info!(
            "no solution: search exhausted after visiting {} nodes",
            self.stats.nodes_visited
        );
        log::debug!("{}", self.stats);
        None
    }

    fn enter<V>(
        &mut self,
        node: SearchNode<V>,
        stack: &[Frame<V>],
        visited: &mut BTreeMap<BTreeMap<char, Vehicle<V>>, usize>,
    ) -> Step<V>
    where
        V: BoardValue,
    {
        self.stats.nodes_visited += 1;
        self.stats.max_depth = self.stats.max_depth.max(node.depth());
        log::trace!(
            "depth {}, moves {}\n{}",
            node.depth(),
            Path(node.path()),
            node.board()
        );

        if !node.is_valid() {
            log::debug!("dropping invalid node after {}", Path(node.path()));
            self.stats.invalid_nodes += 1;
            return Step::Skip;
        }
        if node.is_goal() {
            return Step::Found(node);
        }
        if stack.iter().any(|frame| frame.node.board() == node.board()) {
            self.stats.cycles_skipped += 1;
            return Step::Skip;
        }
        if self
            .config
            .depth_limit
            .is_some_and(|limit| node.depth() >= limit)
        {
            self.stats.depth_limited += 1;
            return Step::Skip;
        }
        if self.config.strategy == Strategy::Memoized {
            // under a depth limit, a board reached closer to the root has more moves left and is
            // expanded again
            let depth = node.depth();
            let seen = visited.get(node.board().placement()).is_some_and(|&previous| {
                self.config.depth_limit.is_none() || previous <= depth
            });
            if seen {
                self.stats.revisits_skipped += 1;
                return Step::Skip;
            }
            visited.insert(node.board().placement().clone(), depth);
        }

        self.stats.nodes_expanded += 1;
        let pending = node.successors().into_iter();
        Step::Expand(Frame { node, pending })
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use crate::{
        solve, Backtracker, Board, BoardConfig, Direction, InvalidStateError, Move, Position,
        SearchConfig, SearchNode, Strategy, Vehicle,
    };
    use alloc::boxed::Box;
    use alloc::collections::BTreeSet;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::error::Error;

    fn vehicle(id: char, back: (u8, u8), front: (u8, u8)) -> Vehicle<u8> {
        Vehicle::new(id, back, front).unwrap()
    }

    fn standard(vehicles: &[Vehicle<u8>]) -> Result<Board<u8>, InvalidStateError<u8>> {
        Board::with_vehicles(BoardConfig::standard(), vehicles.iter().copied())
    }

    fn replay(board: &Board<u8>, path: &[Move]) -> Result<Board<u8>, Box<dyn Error>> {
        let mut board = board.clone();
        for mv in path {
            board.apply(mv)?;
        }
        Ok(board)
    }

    #[test]
    fn root_requires_goal_vehicle() -> Result<(), Box<dyn Error>> {
        let board = standard(&[vehicle('A', (0, 0), (1, 0))])?;
        assert!(matches!(
            SearchNode::root(board.clone()),
            Err(InvalidStateError::MissingGoal('X'))
        ));
        assert_eq!(Err(InvalidStateError::MissingGoal('X')), solve(board));
        Ok(())
    }

    #[test]
    fn open_row() -> Result<(), Box<dyn Error>> {
        let board = standard(&[vehicle('X', (2, 0), (2, 1))])?;
        let path = solve(board)?.ok_or("no solution found")?;
        assert_eq!(vec![Move::new('X', Direction::Right); 4], path);
        Ok(())
    }

    #[test]
    fn goal_at_root() -> Result<(), Box<dyn Error>> {
        let root = SearchNode::root(standard(&[vehicle('X', (2, 4), (2, 5))])?)?;
        assert!(root.is_goal());
        let mut backtracker = Backtracker::default();
        let found = backtracker.solve(root).ok_or("no solution found")?;
        assert!(found.path().is_empty());
        assert_eq!(1, backtracker.stats().nodes_visited);
        assert_eq!(0, backtracker.stats().nodes_expanded);
        Ok(())
    }

    #[test]
    fn boxed_in_vehicle_has_no_successors() -> Result<(), Box<dyn Error>> {
        // A is pinned between the top edge and X, and cannot move sideways.
        let root = SearchNode::root(standard(&[
            vehicle('A', (0, 0), (1, 0)),
            vehicle('X', (2, 0), (2, 1)),
        ])?)?;
        let successors = root.successors();
        assert!(successors.iter().all(|s| s.path()[0].vehicle() != 'A'));
        assert_eq!(1, successors.len());
        assert_eq!(&[Move::new('X', Direction::Right)], successors[0].path());
        Ok(())
    }

    #[test]
    fn successors_are_valid_and_distinct() -> Result<(), Box<dyn Error>> {
        let root = SearchNode::root(standard(&[
            vehicle('X', (2, 1), (2, 2)),
            vehicle('A', (0, 3), (2, 3)),
            vehicle('B', (4, 1), (4, 3)),
            vehicle('C', (3, 5), (5, 5)),
            vehicle('D', (0, 0), (0, 1)),
        ])?)?;
        let successors = root.successors();
        assert!(!successors.is_empty());
        for (i, successor) in successors.iter().enumerate() {
            assert!(successor.is_valid());
            assert_eq!(1, successor.depth());
            assert_eq!(1, successor.board().move_count());
            assert_eq!(
                successor.board(),
                &replay(root.board(), successor.path())?
            );
            assert!(successors[..i].iter().all(|s| s.board() != successor.board()));
        }
        // expansion never touches the parent
        assert_eq!(0, root.board().move_count());
        assert!(root.path().is_empty());

        let grandchildren = successors[0].successors();
        assert!(grandchildren.iter().all(|g| g.path().starts_with(successors[0].path())));
        Ok(())
    }

    #[test]
    fn blocked_exit_is_exhausted() -> Result<(), Box<dyn Error>> {
        // B fills the exit column top to bottom, so it can never leave the exit.
        let board = standard(&[vehicle('X', (2, 0), (2, 1)), vehicle('B', (0, 5), (5, 5))])?;
        assert_eq!(None, solve(board.clone())?);

        let mut backtracker = Backtracker::default();
        assert!(backtracker.solve(SearchNode::root(board.clone())?).is_none());
        let stats = *backtracker.stats();
        // X's back may only reach columns 0..=3 behind B
        assert_eq!(4, stats.nodes_expanded);
        assert_eq!(stats.nodes_expanded, stats.backtracks);
        assert!(stats.cycles_skipped > 0);

        let mut memoized = Backtracker::new(SearchConfig {
            strategy: Strategy::Memoized,
            ..SearchConfig::default()
        });
        assert!(memoized.solve(SearchNode::root(board)?).is_none());
        assert_eq!(4, memoized.stats().nodes_expanded);
        Ok(())
    }

    // X is blocked by the truck A, which can only drop out of row 2 once B slides left.
    fn blocker_puzzle() -> Result<Board<u8>, InvalidStateError<u8>> {
        standard(&[
            vehicle('X', (2, 0), (2, 1)),
            vehicle('A', (0, 3), (2, 3)),
            vehicle('B', (5, 2), (5, 3)),
        ])
    }

    fn reachable(board: &Board<u8>) -> Result<BTreeSet<Board<u8>>, Box<dyn Error>> {
        let mut seen = BTreeSet::new();
        let mut pending = vec![SearchNode::root(board.clone())?];
        while let Some(node) = pending.pop() {
            if seen.insert(node.board().clone()) {
                pending.extend(node.successors());
            }
        }
        Ok(seen)
    }

    #[test]
    fn solution_replays_to_goal() -> Result<(), Box<dyn Error>> {
        let board = blocker_puzzle()?;
        let path = solve(board.clone())?.ok_or("no solution found")?;
        let solved = replay(&board, &path)?;
        assert!(solved.is_goal());
        assert_eq!(path.len(), solved.move_count());
        assert!(path.contains(&Move::new('B', Direction::Left)));
        Ok(())
    }

    #[test]
    fn memoized_strategy() -> Result<(), Box<dyn Error>> {
        let board = blocker_puzzle()?;

        let mut memoized = Backtracker::new(SearchConfig {
            strategy: Strategy::Memoized,
            depth_limit: None,
        });
        let found = memoized
            .solve(SearchNode::root(board.clone())?)
            .ok_or("no solution found")?;
        assert!(found.is_goal());
        assert!(replay(&board, found.path())?.is_goal());

        // each placement is expanded at most once
        let states = reachable(&board)?;
        assert!(memoized.stats().nodes_expanded <= states.len() as u64);

        // with the exit walled off, every reachable placement is expanded exactly once
        let walled = standard(&[
            vehicle('X', (2, 0), (2, 1)),
            vehicle('A', (0, 3), (2, 3)),
            vehicle('B', (5, 2), (5, 3)),
            vehicle('W', (0, 5), (5, 5)),
        ])?;
        assert!(memoized.solve(SearchNode::root(walled.clone())?).is_none());
        assert_eq!(
            reachable(&walled)?.len() as u64,
            memoized.stats().nodes_expanded
        );
        Ok(())
    }

    #[test]
    fn depth_limit() -> Result<(), Box<dyn Error>> {
        let board = standard(&[vehicle('X', (2, 0), (2, 1))])?;

        let mut limited = Backtracker::new(SearchConfig {
            depth_limit: Some(3),
            ..SearchConfig::default()
        });
        assert!(limited.solve(SearchNode::root(board.clone())?).is_none());
        assert!(limited.stats().depth_limited > 0);
        assert_eq!(3, limited.stats().max_depth);

        let mut exact = Backtracker::new(SearchConfig {
            depth_limit: Some(4),
            ..SearchConfig::default()
        });
        let found = exact
            .solve(SearchNode::root(board)?)
            .ok_or("no solution found")?;
        assert_eq!(4, found.depth());
        Ok(())
    }

    #[test]
    fn memoized_depth_limit_matches_exhaustive() -> Result<(), Box<dyn Error>> {
        // every first visit along the X-first branch lands at the limit, so those boards must
        // not shadow the same boards reached later in fewer moves
        let board = standard(&[vehicle('X', (2, 1), (2, 2)), vehicle('A', (3, 0), (4, 0))])?;
        let config = SearchConfig {
            depth_limit: Some(3),
            ..SearchConfig::default()
        };

        let mut exhaustive = Backtracker::new(config);
        let found = exhaustive
            .solve(SearchNode::root(board.clone())?)
            .ok_or("no solution found")?;
        assert_eq!(vec![Move::new('X', Direction::Right); 3], found.path());

        let mut memoized = Backtracker::new(SearchConfig {
            strategy: Strategy::Memoized,
            ..config
        });
        let found = memoized
            .solve(SearchNode::root(board.clone())?)
            .ok_or("no solution found")?;
        assert!(found.depth() <= 3);
        assert!(replay(&board, found.path())?.is_goal());
        assert!(memoized.stats().depth_limited > 0);
        Ok(())
    }

    #[test]
    fn invalid_nodes_are_dropped() -> Result<(), Box<dyn Error>> {
        let mut board = standard(&[vehicle('X', (2, 0), (2, 1))])?;
        board.place_unchecked(vehicle('A', (1, 1), (2, 1)));
        match SearchNode::root(board.clone()) {
            Err(InvalidStateError::Overlap('A', 'X', cell)) => {
                assert_eq!(Position::new(2, 1), cell);
            }
            other => panic!("expected an overlap, got {other:?}"),
        }

        let node = SearchNode {
            board,
            path: Vec::new(),
        };
        assert!(!node.is_valid());
        let mut backtracker = Backtracker::default();
        assert!(backtracker.solve(node).is_none());
        assert_eq!(1, backtracker.stats().invalid_nodes);
        assert_eq!(1, backtracker.stats().nodes_visited);
        assert_eq!(0, backtracker.stats().nodes_expanded);

        let mut board = standard(&[vehicle('X', (2, 0), (2, 1))])?;
        board.place_unchecked(vehicle('B', (5, 4), (6, 4)));
        match SearchNode::root(board.clone()) {
            Err(InvalidStateError::InvalidPosition('B', cell)) => {
                assert_eq!(Position::new(6, 4), cell);
            }
            other => panic!("expected an invalid position, got {other:?}"),
        }
        let node = SearchNode {
            board,
            path: Vec::new(),
        };
        assert!(!node.is_valid());
        assert!(backtracker.solve(node).is_none());
        assert_eq!(1, backtracker.stats().invalid_nodes);
        Ok(())
    }

    #[test]
    fn long_paths_do_not_recurse() -> Result<(), Box<dyn Error>> {
        let config = BoardConfig::<u8>::new((1, 250), (0, 249), 'X')?;
        let board = Board::with_vehicles(config, [vehicle('X', (0, 0), (0, 1))])?;
        let path = solve(board)?.ok_or("no solution found")?;
        assert_eq!(248, path.len());
        assert!(path.iter().all(|mv| *mv == Move::new('X', Direction::Right)));
        Ok(())
    }

    #[test]
    fn stats_are_reset_between_searches() -> Result<(), Box<dyn Error>> {
        let board = standard(&[vehicle('X', (2, 0), (2, 1))])?;
        let mut backtracker = Backtracker::default();
        backtracker.solve(SearchNode::root(board.clone())?);
        let first = *backtracker.stats();
        backtracker.solve(SearchNode::root(board)?);
        assert_eq!(&first, backtracker.stats());
        assert!(first.to_string().starts_with("Search Statistics:"));
        Ok(())
    }

    #[test]
    fn config_from_json() -> Result<(), Box<dyn Error>> {
        let config: SearchConfig = serde_json::from_str(r#"{"strategy": "Memoized"}"#)?;
        assert_eq!(Strategy::Memoized, config.strategy);
        assert_eq!(None, config.depth_limit);

        let config: SearchConfig = serde_json::from_str(r#"{"depth_limit": 12}"#)?;
        assert_eq!(Strategy::Exhaustive, config.strategy);
        assert_eq!(Some(12), config.depth_limit);
        let _: Vec<SearchConfig> = serde_json::from_str("[{}]")?;
        Ok(())
    }
}
