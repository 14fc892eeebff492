#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure move engine: compacts and merges every lane of the board for
//! one direction and reports where each surviving tile ends up.
//!
//! The engine borrows the tile view read-only and never mutates it;
//! all position, value, and removal changes are applied by the caller
//! from the returned [`MoveResult`].

use std::collections::HashMap;

use twenty48_core::{
    BoardSize, Coord, Direction, MergeRecord, MoveResult, MoveStep, TileId, TileSnapshot,
    TileView,
};

/// Computes the outcome of sliding every tile in `direction`.
///
/// The result is deterministic given its inputs. `moved` is false when
/// the direction is saturated, in which case the caller treats the
/// command as a no-op. Absorbed tiles receive an extra step routing
/// them onto their target's final cell with `merges_into` set, so a
/// presentation layer can slide them before removing them.
///
/// Boards with duplicate or out-of-range positions violate the
/// engine's preconditions; they are rejected by debug assertions only.
#[must_use]
pub fn compute_move(view: &TileView, size: BoardSize, direction: Direction) -> MoveResult {
    let occupancy = build_occupancy(view, size);
    let mut steps: Vec<MoveStep> = Vec::with_capacity(view.len());
    let mut pairs: Vec<MergePair> = Vec::new();

    for line in 0..size.get() {
        let lane = lane_coords(direction, line, size.get());
        let slots: Vec<(TileId, u32)> = lane
            .iter()
            .filter_map(|coord| occupant(&occupancy, size, *coord))
            .collect();
        let outcome = compact_line(&slots);

        for (slot, id) in outcome.survivors.iter().enumerate() {
            steps.push(MoveStep {
                id: *id,
                destination: lane[slot],
                merges_into: None,
            });
        }
        pairs.extend(outcome.merges);
    }

    // Survivor destinations are final once every lane is processed;
    // absorbed tiles are routed onto them afterwards.
    let destinations: HashMap<TileId, Coord> = steps
        .iter()
        .map(|step| (step.id, step.destination))
        .collect();

    let mut merges: Vec<MergeRecord> = Vec::new();
    for pair in &pairs {
        // A merge target always survives its own lane, so the lookup
        // cannot miss on a well-formed board.
        let Some(destination) = destinations.get(&pair.target).copied() else {
            continue;
        };
        steps.push(MoveStep {
            id: pair.absorbed,
            destination,
            merges_into: Some(pair.target),
        });
        match merges.iter_mut().find(|record| record.target == pair.target) {
            Some(record) => record.absorbed.push(pair.absorbed),
            None => merges.push(MergeRecord {
                target: pair.target,
                absorbed: vec![pair.absorbed],
            }),
        }
    }

    let moved = !merges.is_empty()
        || view.iter().any(|tile| {
            destinations
                .get(&tile.id)
                .map_or(false, |destination| *destination != tile.coord)
        });

    MoveResult {
        moved,
        steps,
        merges,
    }
}

#[derive(Clone, Copy, Debug)]
struct MergePair {
    target: TileId,
    absorbed: TileId,
}

#[derive(Clone, Debug)]
struct LineOutcome {
    survivors: Vec<TileId>,
    merges: Vec<MergePair>,
}

/// Compacts one lane read in its normalized traversal order.
///
/// A single left-to-right pass over the occupied slots: an adjacent
/// equal pair merges once, the earlier tile surviving, and the scan
/// advances past both so a fresh merge result never re-merges with a
/// third tile in the same move.
fn compact_line(slots: &[(TileId, u32)]) -> LineOutcome {
    let mut survivors = Vec::with_capacity(slots.len());
    let mut merges = Vec::new();
    let mut cursor = 0;
    while cursor < slots.len() {
        let (id, value) = slots[cursor];
        if cursor + 1 < slots.len() && slots[cursor + 1].1 == value {
            survivors.push(id);
            merges.push(MergePair {
                target: id,
                absorbed: slots[cursor + 1].0,
            });
            cursor += 2;
        } else {
            survivors.push(id);
            cursor += 1;
        }
    }
    LineOutcome { survivors, merges }
}

/// Enumerates one lane's coordinates from its leading edge inward.
///
/// The same sequence serves as read order and as destination order, so
/// all four directions share one compaction with identical tie-breaks.
fn lane_coords(direction: Direction, line: u32, n: u32) -> Vec<Coord> {
    match direction {
        Direction::Left => (0..n).map(|column| Coord::new(line, column)).collect(),
        Direction::Right => (0..n)
            .rev()
            .map(|column| Coord::new(line, column))
            .collect(),
        Direction::Up => (0..n).map(|row| Coord::new(row, line)).collect(),
        Direction::Down => (0..n).rev().map(|row| Coord::new(row, line)).collect(),
    }
}

fn build_occupancy(view: &TileView, size: BoardSize) -> Vec<Option<TileSnapshot>> {
    let mut cells: Vec<Option<TileSnapshot>> = vec![None; size.cell_count()];
    for tile in view.iter() {
        debug_assert!(size.contains(tile.coord), "tile outside the board");
        let Some(index) = cell_index(size, tile.coord) else {
            continue;
        };
        debug_assert!(cells[index].is_none(), "two tiles share a cell");
        cells[index] = Some(*tile);
    }
    cells
}

fn occupant(
    cells: &[Option<TileSnapshot>],
    size: BoardSize,
    coord: Coord,
) -> Option<(TileId, u32)> {
    let index = cell_index(size, coord)?;
    cells
        .get(index)
        .copied()
        .flatten()
        .map(|tile| (tile.id, tile.value))
}

fn cell_index(size: BoardSize, coord: Coord) -> Option<usize> {
    if !size.contains(coord) {
        return None;
    }
    let row = usize::try_from(coord.row()).ok()?;
    let column = usize::try_from(coord.column()).ok()?;
    let width = usize::try_from(size.get()).ok()?;
    Some(row * width + column)
}
