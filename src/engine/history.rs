use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::grid::Grid;

/// Pre-move copy of everything undo restores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub grid: Grid,
    pub score: u64,
}

/// Undo stack. With a capacity set, pushing past it drops the oldest entry.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<Snapshot>,
    capacity: Option<usize>,
}

impl History {
    pub fn new(capacity: Option<usize>) -> Self {
        History { entries: VecDeque::new(), capacity }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        if self.capacity == Some(0) {
            return;
        }
        self.entries.push_back(snapshot);
        if let Some(cap) = self.capacity {
            while self.entries.len() > cap {
                self.entries.pop_front();
            }
        }
    }

    /// Most recent snapshot, if any.
    pub fn pop(&mut self) -> Option<Snapshot> { self.entries.pop_back() }

    pub fn peek(&self) -> Option<&Snapshot> { self.entries.back() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn clear(&mut self) { self.entries.clear(); }
}
