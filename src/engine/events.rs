use serde::{Deserialize, Serialize};

use super::grid::Coord;
use super::GameState;

/// Something a renderer may want to animate.
///
/// Engines collect these while applying an input and hand them back in the
/// outcome. Coordinates refer to the grid after the input was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new tile appeared on an empty cell.
    Spawned { at: Coord, value: u32 },
    /// A tile slid without merging.
    Moved { from: Coord, to: Coord, value: u32 },
    /// Several tiles combined into one.
    Merged { from: Vec<Coord>, into: Coord, value: u32 },
    /// Tiles removed by the escalation rule.
    Cleared { cells: Vec<Coord>, value: u32 },
    StateChanged(GameState),
    BestScore(u64),
    /// New session-high tile.
    MaxTile(u32),
    Undone,
}
