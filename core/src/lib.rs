#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the sliding-tile engine.
//!
//! This crate defines the message surface that connects the
//! authoritative session world and the pure systems. Callers submit
//! [`Command`] values describing desired mutations, the world executes
//! those commands via its `apply` entry point, and then broadcasts
//! [`Event`] values describing what actually happened. Systems are
//! pure functions over immutable views defined here; they never hold
//! references into the live tile collection.

use serde::{Deserialize, Serialize};

/// Tile value that flips the session status to won (classic 2048).
pub const DEFAULT_WIN_TARGET: u32 = 2048;

/// Maximum number of undo snapshots retained by the session.
pub const HISTORY_CAP: usize = 50;

/// Unique identifier assigned to a tile at spawn time.
///
/// The identifier is stable for the tile's whole lifetime; merges
/// remove the absorbed tile's identifier from play rather than
/// reassigning it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single board cell expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    row: u32,
    column: u32,
}

impl Coord {
    /// Creates a new board coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

/// Side length of the square board, immutable for a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoardSize(u32);

impl BoardSize {
    /// Smallest board the engine supports.
    pub const MIN: u32 = 2;

    /// Creates a new board size.
    ///
    /// # Panics
    ///
    /// Panics when `value` is below [`BoardSize::MIN`]; a board that
    /// small cannot host a move.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        assert!(value >= Self::MIN);
        Self(value)
    }

    /// Retrieves the side length.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Total number of cells on the board.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        (self.0 as u64 * self.0 as u64) as usize
    }

    /// Reports whether the coordinate lies within the board.
    #[must_use]
    pub const fn contains(&self, coord: Coord) -> bool {
        coord.row() < self.0 && coord.column() < self.0
    }
}

/// Logical slide directions accepted by the move engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Slide every tile toward column zero.
    Left,
    /// Slide every tile toward the last column.
    Right,
    /// Slide every tile toward row zero.
    Up,
    /// Slide every tile toward the last row.
    Down,
}

impl Direction {
    /// All four directions, useful for exhaustive legality checks.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];
}

/// Immutable representation of a single tile's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSnapshot {
    /// Unique identifier assigned to the tile.
    pub id: TileId,
    /// Current value, always a power of two.
    pub value: u32,
    /// Cell currently occupied by the tile.
    pub coord: Coord,
}

/// Read-only snapshot describing every tile on the board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileView {
    snapshots: Vec<TileSnapshot>,
}

impl TileView {
    /// Creates a new tile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tile snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of tiles captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no tiles at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TileSnapshot> {
        self.snapshots
    }
}

/// Dense value grid derived from a tile view; zero marks an empty cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: BoardSize,
    values: Vec<u32>,
}

impl Grid {
    /// Builds the dense grid for the provided tiles.
    ///
    /// Tiles outside the board or stacked on one another are a caller
    /// precondition violation; the last writer wins in release builds.
    #[must_use]
    pub fn from_view(view: &TileView, size: BoardSize) -> Self {
        let mut values = vec![0; size.cell_count()];
        for tile in view.iter() {
            debug_assert!(size.contains(tile.coord), "tile outside the board");
            if let Some(index) = Self::index_for(size, tile.coord) {
                debug_assert!(values[index] == 0, "two tiles share a cell");
                values[index] = tile.value;
            }
        }
        Self { size, values }
    }

    /// Side length of the underlying board.
    #[must_use]
    pub const fn size(&self) -> BoardSize {
        self.size
    }

    /// Value stored at the provided cell; zero when the cell is empty.
    #[must_use]
    pub fn value_at(&self, coord: Coord) -> u32 {
        Self::index_for(self.size, coord)
            .and_then(|index| self.values.get(index).copied())
            .unwrap_or(0)
    }

    /// Enumerates the empty cells in row-major order.
    #[must_use]
    pub fn empty_cells(&self) -> Vec<Coord> {
        let n = self.size.get();
        let mut empties = Vec::new();
        for row in 0..n {
            for column in 0..n {
                let coord = Coord::new(row, column);
                if self.value_at(coord) == 0 {
                    empties.push(coord);
                }
            }
        }
        empties
    }

    fn index_for(size: BoardSize, coord: Coord) -> Option<usize> {
        if !size.contains(coord) {
            return None;
        }
        let row = usize::try_from(coord.row()).ok()?;
        let column = usize::try_from(coord.column()).ok()?;
        let width = usize::try_from(size.get()).ok()?;
        Some(row * width + column)
    }
}

/// Per-tile output of the move engine for one computed move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveStep {
    /// Tile the step applies to.
    pub id: TileId,
    /// Cell the tile ends the move on.
    pub destination: Coord,
    /// Target the tile is absorbed into, when the step ends in a merge.
    pub merges_into: Option<TileId>,
}

/// One merge target together with every tile absorbed into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeRecord {
    /// Tile that survives the merge and holds the combined value.
    pub target: TileId,
    /// Tiles removed by the merge; each appears in exactly one record
    /// per move.
    pub absorbed: Vec<TileId>,
}

/// Complete outcome of one computed move.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveResult {
    /// True iff any destination differs from its origin or any merge
    /// occurred.
    pub moved: bool,
    /// Destination assignments for every tile that slides, including
    /// absorbed tiles routed onto their target's cell.
    pub steps: Vec<MoveStep>,
    /// Merges to apply once the slide has been presented.
    pub merges: Vec<MergeRecord>,
}

/// Phases of a move's application, advanced explicitly by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovePhase {
    /// No move is in flight; the board is fully resolved.
    Settled,
    /// Slide destinations have been applied; merges are still pending.
    PositionsUpdated,
    /// Absorbed tiles are gone and survivors doubled; spawn pending.
    MergesApplied,
}

/// Lifecycle state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Moves are being accepted.
    Playing,
    /// A tile reached the win target.
    Won,
    /// No direction can change the board.
    Lost,
}

/// Reasons a move command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveRejection {
    /// A previous move's phases have not been fully advanced yet.
    MoveInProgress,
    /// The session already ended in a win or a loss.
    SessionEnded,
    /// The direction cannot compact or merge anything.
    Saturated,
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Discards the session and starts a fresh board with two tiles.
    NewGame {
        /// Side length of the new board.
        size: BoardSize,
        /// Seed for the session's spawn randomness.
        seed: u64,
    },
    /// Requests a slide of every tile in the provided direction.
    Move {
        /// Direction to slide toward.
        direction: Direction,
    },
    /// Advances a move in flight to its next application phase.
    AdvancePhase,
    /// Restores the snapshot taken before the most recent move.
    Undo,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a fresh session began.
    GameStarted {
        /// Side length of the new board.
        size: BoardSize,
    },
    /// Confirms that a tile appeared on a previously empty cell.
    TileSpawned {
        /// The tile as it entered the board.
        tile: TileSnapshot,
    },
    /// Reports the destinations applied during the slide phase.
    TilesSlid {
        /// Destination assignments, including absorbed tiles.
        steps: Vec<MoveStep>,
    },
    /// Reports the merges applied after the slide phase.
    TilesMerged {
        /// Merges folded per surviving target.
        merges: Vec<MergeRecord>,
        /// Score gained, the sum of absorbed pre-move values.
        gained: u64,
    },
    /// Reports that a move command was rejected.
    MoveRejected {
        /// Direction provided in the rejected command.
        direction: Direction,
        /// Specific reason the move was refused.
        reason: MoveRejection,
    },
    /// Reports that an undo command was rejected.
    UndoRejected {
        /// Specific reason the undo was refused.
        reason: MoveRejection,
    },
    /// Announces that the session entered a new lifecycle state.
    StatusChanged {
        /// State that became active after processing commands.
        status: GameStatus,
    },
    /// Confirms that the most recent move was rolled back.
    TurnUndone {
        /// Score after the rollback.
        score: u64,
    },
}

/// Persisted shape of a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTile {
    /// Stable identifier of the tile.
    pub id: TileId,
    /// Tile value, a power of two.
    pub value: u32,
    /// Zero-based row index.
    pub r: u32,
    /// Zero-based column index.
    pub c: u32,
}

/// Persisted shape of one undo snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedEntry {
    /// Tiles captured before the move.
    pub tiles: Vec<SavedTile>,
    /// Score captured before the move.
    pub score: u64,
}

/// Persisted shape of a whole session, round-tripped by the caller's
/// storage layer. The board size travels separately, owned by the
/// caller alongside its live tile collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveState {
    /// Tiles currently on the board.
    pub tiles: Vec<SavedTile>,
    /// Current score.
    pub score: u64,
    /// Number of effective moves played so far.
    #[serde(rename = "moveCount")]
    pub move_count: u64,
    /// Undo snapshots, oldest first.
    pub history: Vec<SavedEntry>,
    /// Lifecycle state of the session.
    pub status: GameStatus,
}
