//! Grid-state primitives shared by the slide and chain engines.
//!
//! - [`Grid`] / [`Coord`]: the square tile matrix, 0 meaning empty.
//! - [`spawn_tile`] with a [`SpawnTable`]: weighted random tile insertion.
//! - [`History`] / [`Snapshot`]: bounded undo stack.
//! - [`GameEvent`]: structured notifications for a rendering layer.
//!
//! Nothing here knows about a particular rule set; see [`crate::slide`] and
//! [`crate::chain`] for the games built on top.

use serde::{Deserialize, Serialize};

mod events;
mod grid;
mod history;
mod spawn;

pub use events::GameEvent;
pub use grid::{Axis, Coord, Grid};
pub use history::{History, Snapshot};
pub use spawn::{spawn_tile, SpawnTable};

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// The axis whose lines this move slides along.
    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            Move::Left | Move::Right => Axis::Row,
            Move::Up | Move::Down => Axis::Column,
        }
    }

    /// True when tiles travel towards the high end of each line.
    #[inline]
    pub fn is_reversed(self) -> bool { matches!(self, Move::Right | Move::Down) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameState {
    #[default]
    Playing,
    Won,
    Lost,
}

impl GameState {
    pub fn is_terminal(self) -> bool { !matches!(self, GameState::Playing) }
}

/// Read-only snapshot handed to a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub grid: Grid,
    pub score: u64,
    pub best_score: u64,
    pub state: GameState,
    /// Session-high tile, for rule sets that track one.
    pub max_tile: Option<u32>,
}

/// Current and best score for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u64,
    pub best: u64,
}

impl Scoreboard {
    pub fn new(best: u64) -> Self { Scoreboard { score: 0, best } }

    /// Add merge points; returns the new best when it moved.
    pub fn add(&mut self, gained: u64) -> Option<u64> {
        self.score += gained;
        if self.score > self.best {
            self.best = self.score;
            Some(self.best)
        } else {
            None
        }
    }

    pub fn reset(&mut self) { self.score = 0; }
}
