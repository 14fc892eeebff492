#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Terminal-state detector: win and game-over predicates over the
//! dense value grid.
//!
//! Both predicates are evaluated on the board as it stands after the
//! spawn step; a move that fills the last cell but leaves a merge
//! available does not end the session.

use twenty48_core::{Coord, Grid};

/// Reports whether any cell holds the win target value.
#[must_use]
pub fn check_win(grid: &Grid, target: u32) -> bool {
    let n = grid.size().get();
    for row in 0..n {
        for column in 0..n {
            if grid.value_at(Coord::new(row, column)) == target {
                return true;
            }
        }
    }
    false
}

/// Reports whether at least one direction can still change the board:
/// an empty cell exists, or two equal values sit adjacent in a row or
/// column.
#[must_use]
pub fn can_slide(grid: &Grid) -> bool {
    let n = grid.size().get();
    for row in 0..n {
        for column in 0..n {
            let value = grid.value_at(Coord::new(row, column));
            if value == 0 {
                return true;
            }
            if column + 1 < n && grid.value_at(Coord::new(row, column + 1)) == value {
                return true;
            }
            if row + 1 < n && grid.value_at(Coord::new(row + 1, column)) == value {
                return true;
            }
        }
    }
    false
}

/// Reports whether no legal move remains in any direction.
#[must_use]
pub fn check_game_over(grid: &Grid) -> bool {
    !can_slide(grid)
}
