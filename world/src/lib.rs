#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for the sliding-tile engine.
//!
//! The world owns the tile arena, score, undo history, and the seeded
//! spawn randomness. Callers submit [`Command`] values through
//! [`apply`] and observe the outcome as [`Event`] values; a move is
//! applied in three explicit phases (positions, merges, spawn) that
//! the caller advances between its presentation steps, and further
//! move commands are rejected until the sequence settles.

mod history;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use history::History;
use twenty48_core::{
    BoardSize, Command, Coord, Direction, Event, GameStatus, Grid, MergeRecord, MovePhase,
    MoveRejection, MoveResult, SaveState, SavedEntry, SavedTile, TileId, TileSnapshot, TileView,
    DEFAULT_WIN_TARGET, HISTORY_CAP,
};
use twenty48_system_endgame::{check_game_over, check_win};
use twenty48_system_movement::compute_move;
use twenty48_system_spawning::spawn_random_tile;

/// Number of tiles spawned onto a fresh board.
const INITIAL_SPAWNS: u32 = 2;

/// Represents the authoritative session state.
#[derive(Clone, Debug)]
pub struct World {
    size: BoardSize,
    tiles: Vec<Tile>,
    next_id: u32,
    score: u64,
    move_count: u64,
    status: GameStatus,
    phase: MovePhase,
    pending: Option<MoveResult>,
    history: History,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a fresh session with two spawned tiles.
    #[must_use]
    pub fn new(size: BoardSize, seed: u64) -> Self {
        let mut world = Self::empty(size, seed);
        for _ in 0..INITIAL_SPAWNS {
            let _ = world.spawn_tile();
        }
        world
    }

    /// Rebuilds a session from its persisted shape.
    ///
    /// The board size and a fresh randomness seed travel outside the
    /// shape, owned by the caller. The restored session resumes fully
    /// settled with no move in flight.
    pub fn from_save(save: &SaveState, size: BoardSize, seed: u64) -> Result<Self, RestoreError> {
        let tiles = restore_tiles(&save.tiles, size)?;
        let mut history = History::new(HISTORY_CAP);
        for entry in &save.history {
            history.push(restore_tiles(&entry.tiles, size)?, entry.score);
        }

        let highest_id = save
            .tiles
            .iter()
            .chain(save.history.iter().flat_map(|entry| entry.tiles.iter()))
            .map(|tile| tile.id.get())
            .max();

        Ok(Self {
            size,
            tiles,
            next_id: highest_id.map_or(0, |id| id + 1),
            score: save.score,
            move_count: save.move_count,
            status: save.status,
            phase: MovePhase::Settled,
            pending: None,
            history,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    fn empty(size: BoardSize, seed: u64) -> Self {
        Self {
            size,
            tiles: Vec::new(),
            next_id: 0,
            score: 0,
            move_count: 0,
            status: GameStatus::Playing,
            phase: MovePhase::Settled,
            pending: None,
            history: History::new(HISTORY_CAP),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn tile_view(&self) -> TileView {
        TileView::from_snapshots(self.tiles.iter().map(Tile::snapshot).collect())
    }

    /// View with the pending move's absorbed tiles filtered out, so
    /// each cell holds at most one tile even between phases. Identical
    /// to [`World::tile_view`] once the board is settled.
    fn resolved_view(&self) -> TileView {
        let absorbed: std::collections::HashSet<TileId> = self
            .pending
            .iter()
            .flat_map(|result| result.merges.iter())
            .flat_map(|record| record.absorbed.iter().copied())
            .collect();
        TileView::from_snapshots(
            self.tiles
                .iter()
                .filter(|tile| !absorbed.contains(&tile.id))
                .map(Tile::snapshot)
                .collect(),
        )
    }

    fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id == id)
    }

    fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|tile| tile.id == id)
    }

    fn spawn_tile(&mut self) -> Option<TileSnapshot> {
        let view = self.tile_view();
        let id = TileId::new(self.next_id);
        let spawned = spawn_random_tile(&view, self.size, id, &mut self.rng)?;
        self.next_id += 1;
        self.tiles.push(Tile {
            id: spawned.id,
            value: spawned.value,
            coord: spawned.coord,
        });
        Some(spawned)
    }

    fn begin_move(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.phase != MovePhase::Settled {
            out_events.push(Event::MoveRejected {
                direction,
                reason: MoveRejection::MoveInProgress,
            });
            return;
        }
        if self.status != GameStatus::Playing {
            out_events.push(Event::MoveRejected {
                direction,
                reason: MoveRejection::SessionEnded,
            });
            return;
        }

        let result = compute_move(&self.tile_view(), self.size, direction);
        if !result.moved {
            out_events.push(Event::MoveRejected {
                direction,
                reason: MoveRejection::Saturated,
            });
            return;
        }

        // Snapshot before any mutation so one undo restores the whole
        // pre-move board.
        self.history.push(self.tiles.clone(), self.score);
        self.move_count += 1;

        for step in &result.steps {
            if let Some(tile) = self.tile_mut(step.id) {
                tile.coord = step.destination;
            }
        }
        out_events.push(Event::TilesSlid {
            steps: result.steps.clone(),
        });

        self.pending = Some(result);
        self.phase = MovePhase::PositionsUpdated;
    }

    fn advance_phase(&mut self, out_events: &mut Vec<Event>) {
        match self.phase {
            MovePhase::Settled => {}
            MovePhase::PositionsUpdated => {
                let merges = self
                    .pending
                    .as_ref()
                    .map(|result| result.merges.clone())
                    .unwrap_or_default();
                let gained = self.apply_merges(&merges);
                self.score += gained;
                if !merges.is_empty() {
                    out_events.push(Event::TilesMerged { merges, gained });
                }
                self.phase = MovePhase::MergesApplied;
            }
            MovePhase::MergesApplied => {
                if let Some(tile) = self.spawn_tile() {
                    out_events.push(Event::TileSpawned { tile });
                }
                self.pending = None;
                self.phase = MovePhase::Settled;
                self.refresh_status(out_events);
            }
        }
    }

    /// Removes absorbed tiles and folds their values into each target.
    /// Returns the score gained, the sum of absorbed pre-move values.
    fn apply_merges(&mut self, merges: &[MergeRecord]) -> u64 {
        let mut gained = 0u64;
        for record in merges {
            let mut absorbed_total = 0u32;
            for id in &record.absorbed {
                if let Some(tile) = self.tile(*id) {
                    absorbed_total += tile.value;
                }
            }
            self.tiles.retain(|tile| !record.absorbed.contains(&tile.id));
            if let Some(target) = self.tile_mut(record.target) {
                target.value += absorbed_total;
            }
            gained += u64::from(absorbed_total);
        }
        gained
    }

    fn undo(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != MovePhase::Settled {
            out_events.push(Event::UndoRejected {
                reason: MoveRejection::MoveInProgress,
            });
            return;
        }
        let Some(entry) = self.history.pop() else {
            // Empty stack: the caller treats undo as a no-op.
            return;
        };

        self.tiles = entry.tiles;
        self.score = entry.score;
        self.move_count = self.move_count.saturating_sub(1);
        out_events.push(Event::TurnUndone { score: self.score });
        self.refresh_status(out_events);
    }

    /// Re-derives the lifecycle status from the current board. Win is
    /// checked before game-over.
    fn refresh_status(&mut self, out_events: &mut Vec<Event>) {
        let grid = Grid::from_view(&self.tile_view(), self.size);
        let next = if check_win(&grid, DEFAULT_WIN_TARGET) {
            GameStatus::Won
        } else if check_game_over(&grid) {
            GameStatus::Lost
        } else {
            GameStatus::Playing
        };
        if next != self.status {
            self.status = next;
            out_events.push(Event::StatusChanged { status: next });
        }
    }
}

/// Applies the provided command to the world, mutating state
/// deterministically for a given spawn seed.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::NewGame { size, seed } => {
            *world = World::empty(size, seed);
            out_events.push(Event::GameStarted { size });
            for _ in 0..INITIAL_SPAWNS {
                if let Some(tile) = world.spawn_tile() {
                    out_events.push(Event::TileSpawned { tile });
                }
            }
        }
        Command::Move { direction } => world.begin_move(direction, out_events),
        Command::AdvancePhase => world.advance_phase(out_events),
        Command::Undo => world.undo(out_events),
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use super::{saved_tiles, Grid, SaveState, SavedEntry, TileView, World};
    use twenty48_core::{BoardSize, GameStatus, MovePhase};

    /// Captures a read-only view of every tile on the board.
    #[must_use]
    pub fn tile_view(world: &World) -> TileView {
        world.tile_view()
    }

    /// Builds the dense value grid for the current board.
    ///
    /// While a move is mid-phase, tiles already marked as absorbed are
    /// excluded; each cell carries its surviving occupant's value (the
    /// pre-merge value until the merge phase applies).
    #[must_use]
    pub fn grid(world: &World) -> Grid {
        Grid::from_view(&world.resolved_view(), world.size)
    }

    /// Side length of the session's board.
    #[must_use]
    pub fn board_size(world: &World) -> BoardSize {
        world.size
    }

    /// Current score.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        world.score
    }

    /// Number of effective moves played so far.
    #[must_use]
    pub fn move_count(world: &World) -> u64 {
        world.move_count
    }

    /// Lifecycle state of the session.
    #[must_use]
    pub fn status(world: &World) -> GameStatus {
        world.status
    }

    /// Phase of the move currently being applied, if any.
    #[must_use]
    pub fn phase(world: &World) -> MovePhase {
        world.phase
    }

    /// Number of undo snapshots currently retained.
    #[must_use]
    pub fn history_depth(world: &World) -> usize {
        world.history.depth()
    }

    /// Captures the persisted shape of the session for the caller's
    /// storage layer.
    #[must_use]
    pub fn save_state(world: &World) -> SaveState {
        SaveState {
            tiles: saved_tiles(&world.tiles),
            score: world.score,
            move_count: world.move_count,
            history: world
                .history
                .iter()
                .map(|entry| SavedEntry {
                    tiles: saved_tiles(&entry.tiles),
                    score: entry.score,
                })
                .collect(),
            status: world.status,
        }
    }
}

/// Reasons a persisted session cannot be restored.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RestoreError {
    /// A tile's coordinate lies outside the board.
    #[error("tile {id} lies outside the board at ({row}, {column})")]
    OutOfBounds {
        /// Identifier of the offending tile.
        id: u32,
        /// Persisted row index.
        row: u32,
        /// Persisted column index.
        column: u32,
    },
    /// Two tiles claim the same cell.
    #[error("two tiles occupy ({row}, {column})")]
    DuplicatePosition {
        /// Row index of the contested cell.
        row: u32,
        /// Column index of the contested cell.
        column: u32,
    },
    /// A tile value is not a power of two of at least two.
    #[error("tile {id} carries invalid value {value}")]
    InvalidValue {
        /// Identifier of the offending tile.
        id: u32,
        /// Persisted value.
        value: u32,
    },
}

#[derive(Clone, Debug)]
struct Tile {
    id: TileId,
    value: u32,
    coord: Coord,
}

impl Tile {
    fn snapshot(&self) -> TileSnapshot {
        TileSnapshot {
            id: self.id,
            value: self.value,
            coord: self.coord,
        }
    }
}

fn saved_tiles(tiles: &[Tile]) -> Vec<SavedTile> {
    tiles
        .iter()
        .map(|tile| SavedTile {
            id: tile.id,
            value: tile.value,
            r: tile.coord.row(),
            c: tile.coord.column(),
        })
        .collect()
}

fn restore_tiles(saved: &[SavedTile], size: BoardSize) -> Result<Vec<Tile>, RestoreError> {
    let mut occupied = std::collections::HashSet::new();
    let mut tiles = Vec::with_capacity(saved.len());
    for tile in saved {
        let coord = Coord::new(tile.r, tile.c);
        if !size.contains(coord) {
            return Err(RestoreError::OutOfBounds {
                id: tile.id.get(),
                row: tile.r,
                column: tile.c,
            });
        }
        if !occupied.insert(coord) {
            return Err(RestoreError::DuplicatePosition {
                row: tile.r,
                column: tile.c,
            });
        }
        if tile.value < 2 || !tile.value.is_power_of_two() {
            return Err(RestoreError::InvalidValue {
                id: tile.id.get(),
                value: tile.value,
            });
        }
        tiles.push(Tile {
            id: tile.id,
            value: tile.value,
            coord,
        });
    }
    Ok(tiles)
}
