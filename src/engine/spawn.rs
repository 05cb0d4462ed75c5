use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{Coord, Grid};
use crate::error::EngineError;

/// Weighted distribution of freshly spawned tile values.
///
/// Weights are relative, so `[(2, 9), (4, 1)]` and `[(2, 90), (4, 10)]` draw
/// identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnTable {
    entries: Vec<(u32, u32)>,
}

impl SpawnTable {
    /// 2 (90%) or 4 (10%).
    pub fn classic() -> Self { SpawnTable { entries: vec![(2, 90), (4, 10)] } }

    /// 2 (40%), 4 (30%) or 8 (30%).
    pub fn triple() -> Self { SpawnTable { entries: vec![(2, 40), (4, 30), (8, 30)] } }

    /// Build a custom table of `(value, weight)` pairs.
    pub fn new(entries: Vec<(u32, u32)>) -> Result<Self, EngineError> {
        let table = SpawnTable { entries };
        table.validate()?;
        Ok(table)
    }

    /// Check a table that may have come in through deserialization.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.entries.is_empty() {
            return Err(EngineError::InvalidSpawnTable("no entries"));
        }
        if self.entries.iter().any(|&(_, w)| w == 0) {
            return Err(EngineError::InvalidSpawnTable("zero weight"));
        }
        if self.entries.iter().try_fold(0u32, |sum, &(_, w)| sum.checked_add(w)).is_none() {
            return Err(EngineError::InvalidSpawnTable("weights overflow"));
        }
        if self.entries.iter().any(|&(v, _)| v < 2 || !v.is_power_of_two()) {
            return Err(EngineError::InvalidSpawnTable("values must be powers of two >= 2"));
        }
        Ok(())
    }

    pub fn entries(&self) -> &[(u32, u32)] { &self.entries }

    /// Draw one value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        // A validated table always has positive weights; fall back to the
        // first value for hand-built tables that never went through `validate`.
        match WeightedIndex::new(self.entries.iter().map(|&(_, w)| w)) {
            Ok(dist) => self.entries[dist.sample(rng)].0,
            Err(_) => self.entries.first().map(|&(v, _)| v).unwrap_or(2),
        }
    }
}

impl Default for SpawnTable {
    fn default() -> Self { Self::classic() }
}

/// Place one tile from `table` on a uniformly chosen empty cell.
///
/// Returns `None`, leaving the grid untouched, when there is no empty cell.
///
/// ```
/// use tile_merge::engine::{spawn_tile, Grid, SpawnTable};
/// use rand::{rngs::StdRng, SeedableRng};
/// let mut rng = StdRng::seed_from_u64(7);
/// let mut g = Grid::new(4).unwrap();
/// let (at, value) = spawn_tile(&mut g, &SpawnTable::classic(), &mut rng).unwrap();
/// assert_eq!(g.get(at).unwrap(), value);
/// assert_eq!(g.count_empty(), 15);
/// ```
pub fn spawn_tile<R: Rng + ?Sized>(grid: &mut Grid, table: &SpawnTable, rng: &mut R) -> Option<(Coord, u32)> {
    let empty = grid.empty_cells();
    let &at = empty.choose(rng)?;
    let value = table.sample(rng);
    grid.put(at, value);
    Some((at, value))
}
