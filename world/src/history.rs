//! Bounded undo stack of pre-move snapshots.

use std::collections::VecDeque;

use crate::Tile;

/// One undo snapshot: the full tile collection and the score captured
/// before a move mutated them.
#[derive(Clone, Debug)]
pub(crate) struct HistoryEntry {
    pub(crate) tiles: Vec<Tile>,
    pub(crate) score: u64,
}

/// Stack of prior snapshots with a fixed depth cap; pushing beyond the
/// cap evicts the oldest entry at the bottom.
#[derive(Clone, Debug)]
pub(crate) struct History {
    cap: usize,
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: VecDeque::new(),
        }
    }

    /// Appends a snapshot to the top of the stack. The tiles passed in
    /// are already a deep copy owned by the entry, so later mutation
    /// of the live collection cannot reach it.
    pub(crate) fn push(&mut self, tiles: Vec<Tile>, score: u64) {
        if self.entries.len() == self.cap {
            let _ = self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry { tiles, score });
    }

    /// Removes and returns the most recent snapshot, or `None` when
    /// the stack is empty.
    pub(crate) fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop_back()
    }

    pub(crate) fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Iterates the retained snapshots from oldest to newest.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}
