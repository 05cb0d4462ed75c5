use serde::{Deserialize, Serialize};

use crate::engine::{Coord, Grid, SpawnTable};
use crate::error::EngineError;

/// Which cells count as neighbours when building a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adjacency {
    /// Up, down, left, right.
    Orthogonal,
    /// The full 8-neighbourhood, diagonals included.
    EightWay,
}

impl Adjacency {
    pub fn is_adjacent(self, a: Coord, b: Coord) -> bool {
        let dr = a.row.abs_diff(b.row);
        let dc = a.col.abs_diff(b.col);
        match self {
            Adjacency::Orthogonal => dr + dc == 1,
            Adjacency::EightWay => dr <= 1 && dc <= 1 && dr + dc > 0,
        }
    }

    /// In-bounds neighbours of `coord` on a `size`x`size` grid.
    pub fn neighbors(self, coord: Coord, size: usize) -> Vec<Coord> {
        const ORTHOGONAL: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        const EIGHT_WAY: [(isize, isize); 8] = [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)];
        let offsets: &[(isize, isize)] = match self {
            Adjacency::Orthogonal => &ORTHOGONAL,
            Adjacency::EightWay => &EIGHT_WAY,
        };
        offsets
            .iter()
            .filter_map(|&(dr, dc)| {
                let row = coord.row.checked_add_signed(dr)?;
                let col = coord.col.checked_add_signed(dc)?;
                (row < size && col < size).then_some(Coord::new(row, col))
            })
            .collect()
    }
}

/// How many tiles a successful merge spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnPolicy {
    OnePerMerge,
    /// `chain_len - 1`, one for every cell the merge vacated.
    PerVacatedCell,
}

impl SpawnPolicy {
    pub fn count(self, chain_len: usize) -> usize {
        match self {
            SpawnPolicy::OnePerMerge => 1,
            SpawnPolicy::PerVacatedCell => chain_len.saturating_sub(1),
        }
    }
}

/// A complete chain-merge rule set.
///
/// The two presets differ in adjacency, spawning and escalation. They are
/// separate games; mixing fields from both changes the balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainRules {
    pub size: usize,
    pub adjacency: Adjacency,
    pub spawn: SpawnTable,
    pub spawn_policy: SpawnPolicy,
    pub initial_tiles: usize,
    /// Clear every lowest-valued tile whenever the board reaches a new
    /// session-high tile.
    pub escalation: bool,
    pub target: Option<u32>,
    pub undo_capacity: Option<usize>,
}

impl ChainRules {
    /// Browser 2248: orthogonal chains, one spawn per merge.
    pub fn classic() -> Self {
        ChainRules {
            size: 6,
            adjacency: Adjacency::Orthogonal,
            spawn: SpawnTable::classic(),
            spawn_policy: SpawnPolicy::OnePerMerge,
            initial_tiles: 2,
            escalation: false,
            target: None,
            undo_capacity: Some(20),
        }
    }

    /// Packaged mobile 2248: diagonal chains, refills vacated cells and
    /// clears the lowest tiles on every new record tile.
    pub fn escalating() -> Self {
        ChainRules {
            size: 6,
            adjacency: Adjacency::EightWay,
            spawn: SpawnTable::triple(),
            spawn_policy: SpawnPolicy::PerVacatedCell,
            initial_tiles: 5,
            escalation: true,
            target: None,
            undo_capacity: Some(20),
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        Grid::new(self.size)?;
        self.spawn.validate()
    }
}

impl Default for ChainRules {
    fn default() -> Self { Self::classic() }
}
