#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tile spawner: picks a uniformly random empty cell and a value of
//! two or four.

use rand::Rng;

use twenty48_core::{BoardSize, Grid, TileId, TileSnapshot, TileView};

/// Probability that a spawned tile carries the value four rather than
/// two.
pub const SPAWN_FOUR_PROBABILITY: f64 = 0.1;

/// Proposes a new tile on a uniformly random empty cell, or `None`
/// when the board is full.
///
/// The tile view is borrowed read-only; the caller decides whether and
/// when to add the proposed tile to the live collection, stamping it
/// with the fresh `id` supplied here. The cell is drawn before the
/// value so a given RNG stream always produces the same tile.
#[must_use]
pub fn spawn_random_tile<R: Rng>(
    view: &TileView,
    size: BoardSize,
    id: TileId,
    rng: &mut R,
) -> Option<TileSnapshot> {
    let empties = Grid::from_view(view, size).empty_cells();
    if empties.is_empty() {
        return None;
    }

    let coord = empties[rng.gen_range(0..empties.len())];
    let value = if rng.gen_bool(SPAWN_FOUR_PROBABILITY) {
        4
    } else {
        2
    };
    Some(TileSnapshot { id, value, coord })
}
