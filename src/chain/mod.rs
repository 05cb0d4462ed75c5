//! Chain-merge rules (2248).
//!
//! The player traces a path of equal, mutually adjacent tiles; the whole
//! path collapses into its last cell with value `value * len`. Two rule sets
//! are provided through [`ChainRules`]:
//! - [`ChainRules::classic`]: orthogonal paths, one spawn per merge.
//! - [`ChainRules::escalating`]: 8-way paths, one spawn per vacated cell, and
//!   a board clear of the lowest tiles whenever a new record tile appears.
//!
//! ```
//! use tile_merge::chain::{ChainGame, ChainRules, MergeOutcome};
//! use tile_merge::engine::{Coord, Grid};
//!
//! let mut rows = vec![vec![0u32; 6]; 6];
//! rows[0][..3].copy_from_slice(&[4, 4, 4]);
//! let grid = Grid::from_rows(rows).unwrap();
//! let mut game = ChainGame::from_grid(ChainRules::classic(), grid, 0, 0, 1).unwrap();
//! let chain = [Coord::new(0, 0), Coord::new(0, 1), Coord::new(0, 2)];
//! match game.merge_chain(&chain).unwrap() {
//!     MergeOutcome::Merged { result, .. } => {
//!         assert_eq!(result.total_value, 12);
//!         assert_eq!(result.end_cell, Coord::new(0, 2));
//!     }
//!     MergeOutcome::Rejected(r) => panic!("rejected: {r}"),
//! }
//! assert_eq!(game.score(), 12);
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::engine::{spawn_tile, Coord, GameEvent, GameState, GameView, Grid, History, Scoreboard, Snapshot};
use crate::error::EngineError;

mod rules;

pub use rules::{Adjacency, ChainRules, SpawnPolicy};

/// Why a well-formed chain was refused. Nothing is mutated in these cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ChainRejection {
    #[error("chain starts on an empty cell")]
    EmptyStart,
    #[error("cell ({}, {}) holds a different value", .0.row, .0.col)]
    ValueMismatch(Coord),
    #[error("cell ({}, {}) appears twice", .0.row, .0.col)]
    Repeated(Coord),
    #[error("cell ({}, {}) is not adjacent to the previous cell", .0.row, .0.col)]
    NotAdjacent(Coord),
    #[error("{len} tiles of {value} would overflow a tile")]
    Overflow { value: u32, len: usize },
    #[error("game is over ({0:?})")]
    GameOver(GameState),
}

/// What a collapse produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub total_value: u32,
    pub end_cell: Coord,
}

/// Outcome of [`ChainGame::merge_chain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged { result: MergeResult, state: GameState, events: Vec<GameEvent> },
    Rejected(ChainRejection),
}

impl MergeOutcome {
    pub fn is_merged(&self) -> bool { matches!(self, MergeOutcome::Merged { .. }) }

    pub fn result(&self) -> Option<MergeResult> {
        match self {
            MergeOutcome::Merged { result, .. } => Some(*result),
            MergeOutcome::Rejected(_) => None,
        }
    }
}

/// Fail on chains the input layer should never have produced.
pub fn check_preconditions(grid: &Grid, chain: &[Coord]) -> Result<(), EngineError> {
    if chain.len() < 2 {
        return Err(EngineError::ChainTooShort(chain.len()));
    }
    chain.iter().try_for_each(|&c| grid.check(c))
}

/// Check a chain against the game rules, returning its common tile value.
///
/// Out-of-bounds cells read as empty; callers that need to tell the two apart
/// run [`check_preconditions`] first.
pub fn validate_chain(grid: &Grid, chain: &[Coord], adjacency: Adjacency) -> Result<u32, ChainRejection> {
    let value = chain.first().and_then(|&c| grid.get(c).ok()).unwrap_or(0);
    if value == 0 {
        return Err(ChainRejection::EmptyStart);
    }
    for (i, &cell) in chain.iter().enumerate().skip(1) {
        if chain[..i].contains(&cell) {
            return Err(ChainRejection::Repeated(cell));
        }
        if grid.get(cell).unwrap_or(0) != value {
            return Err(ChainRejection::ValueMismatch(cell));
        }
        if !adjacency.is_adjacent(chain[i - 1], cell) {
            return Err(ChainRejection::NotAdjacent(cell));
        }
    }
    if chain_total(value, chain.len()).is_none() {
        return Err(ChainRejection::Overflow { value, len: chain.len() });
    }
    Ok(value)
}

fn chain_total(value: u32, len: usize) -> Option<u32> {
    u32::try_from(len).ok().and_then(|len| value.checked_mul(len))
}

/// Collapse a validated chain into its last cell.
///
/// Every other cell is cleared and the last one becomes `value * chain.len()`,
/// saturating for chains that skipped [`validate_chain`].
pub fn merge_cells(grid: &mut Grid, chain: &[Coord]) -> MergeResult {
    debug_assert!(chain.len() >= 2);
    let value = grid.at(chain[0]);
    let total_value = chain_total(value, chain.len()).unwrap_or(u32::MAX);
    let end_cell = chain[chain.len() - 1];
    for &cell in chain {
        grid.put(cell, 0);
    }
    grid.put(end_cell, total_value);
    MergeResult { total_value, end_cell }
}

/// True while some legal chain exists, or some cell is still empty.
pub fn has_moves(grid: &Grid, adjacency: Adjacency) -> bool {
    grid.tiles().any(|(coord, v)| {
        v == 0
            || (chain_total(v, 2).is_some()
                && adjacency.neighbors(coord, grid.size()).into_iter().any(|n| grid.at(n) == v))
    })
}

/// Longest greedy chain on the board, if any legal chain exists.
///
/// From every start cell the path repeatedly steps to the first unvisited
/// neighbour holding the same value, stopping before the total would
/// overflow. Not an exhaustive search.
pub fn find_chain(grid: &Grid, adjacency: Adjacency) -> Option<Vec<Coord>> {
    let mut best: Option<Vec<Coord>> = None;
    for (start, value) in grid.tiles() {
        if value == 0 {
            continue;
        }
        let mut path = vec![start];
        let mut cur = start;
        while chain_total(value, path.len() + 1).is_some() {
            let Some(next) = adjacency
                .neighbors(cur, grid.size())
                .into_iter()
                .find(|&n| grid.at(n) == value && !path.contains(&n))
            else {
                break;
            };
            path.push(next);
            cur = next;
        }
        if path.len() >= 2 && best.as_ref().map_or(true, |b| path.len() > b.len()) {
            best = Some(path);
        }
    }
    best
}

/// A single 2248 session.
#[derive(Debug, Clone)]
pub struct ChainGame {
    rules: ChainRules,
    grid: Grid,
    scores: Scoreboard,
    state: GameState,
    history: History,
    rng: StdRng,
    max_tile: u32,
}

impl ChainGame {
    /// Start a game with an entropy-seeded RNG.
    pub fn new(rules: ChainRules, best_score: u64) -> Result<Self, EngineError> {
        Self::build(rules, best_score, StdRng::from_entropy())
    }

    /// Start a game whose spawns are reproducible from `seed`.
    pub fn with_seed(rules: ChainRules, best_score: u64, seed: u64) -> Result<Self, EngineError> {
        Self::build(rules, best_score, StdRng::seed_from_u64(seed))
    }

    fn build(rules: ChainRules, best_score: u64, rng: StdRng) -> Result<Self, EngineError> {
        rules.validate()?;
        let mut game = ChainGame {
            grid: Grid::new(rules.size)?,
            history: History::new(rules.undo_capacity),
            scores: Scoreboard::new(best_score),
            state: GameState::Playing,
            rng,
            max_tile: 0,
            rules,
        };
        game.new_game();
        Ok(game)
    }

    /// Resume from an explicit board.
    pub fn from_grid(rules: ChainRules, grid: Grid, score: u64, best_score: u64, seed: u64) -> Result<Self, EngineError> {
        rules.validate()?;
        if grid.size() != rules.size {
            return Err(EngineError::SizeMismatch { expected: rules.size, found: grid.size() });
        }
        let mut game = ChainGame {
            max_tile: grid.highest_tile(),
            grid,
            history: History::new(rules.undo_capacity),
            scores: Scoreboard { score, best: best_score.max(score) },
            state: GameState::Playing,
            rng: StdRng::seed_from_u64(seed),
            rules,
        };
        game.state = game.evaluate();
        Ok(game)
    }

    /// Reset score and history and seed a fresh board.
    pub fn new_game(&mut self) -> Vec<GameEvent> {
        self.grid.clear();
        self.scores.reset();
        self.history.clear();
        self.state = GameState::Playing;
        let mut events = Vec::with_capacity(self.rules.initial_tiles);
        for _ in 0..self.rules.initial_tiles {
            if let Some((at, value)) = spawn_tile(&mut self.grid, &self.rules.spawn, &mut self.rng) {
                events.push(GameEvent::Spawned { at, value });
            }
        }
        self.max_tile = self.grid.highest_tile();
        debug!(tiles = events.len(), "chain: new game");
        events
    }

    /// Merge `chain` into its last cell, then spawn and re-check the game state.
    ///
    /// Chains shorter than two cells or reaching outside the grid are caller
    /// bugs and return `Err`. Chains that break the rules come back as
    /// [`MergeOutcome::Rejected`] with nothing changed.
    pub fn merge_chain(&mut self, chain: &[Coord]) -> Result<MergeOutcome, EngineError> {
        check_preconditions(&self.grid, chain)?;
        if self.state.is_terminal() {
            trace!(state = ?self.state, "chain: merge ignored in terminal state");
            return Ok(MergeOutcome::Rejected(ChainRejection::GameOver(self.state)));
        }
        if let Err(reason) = validate_chain(&self.grid, chain, self.rules.adjacency) {
            trace!(%reason, "chain: merge rejected");
            return Ok(MergeOutcome::Rejected(reason));
        }

        self.history.push(Snapshot { grid: self.grid.clone(), score: self.scores.score });
        let result = merge_cells(&mut self.grid, chain);
        let mut events = vec![GameEvent::Merged { from: chain.to_vec(), into: result.end_cell, value: result.total_value }];
        if let Some(best) = self.scores.add(u64::from(result.total_value)) {
            events.push(GameEvent::BestScore(best));
        }
        for _ in 0..self.rules.spawn_policy.count(chain.len()) {
            match spawn_tile(&mut self.grid, &self.rules.spawn, &mut self.rng) {
                Some((at, value)) => events.push(GameEvent::Spawned { at, value }),
                None => break,
            }
        }
        // The record starts at the seed board's highest tile, and a board whose
        // lowest tile is the record keeps it. Both differ from the mobile game,
        // which clears on every first merge and even when min equals max.
        self.track_max_tile(&mut events);

        let state = self.evaluate();
        if state != self.state {
            info!(?state, score = self.scores.score, "chain: game state changed");
            events.push(GameEvent::StateChanged(state));
            self.state = state;
        }
        debug!(len = chain.len(), total = result.total_value, score = self.scores.score, "chain: merged");
        Ok(MergeOutcome::Merged { result, state, events })
    }

    // A new session-high tile; under escalation this also clears the lowest tiles.
    fn track_max_tile(&mut self, events: &mut Vec<GameEvent>) {
        let high = self.grid.highest_tile();
        if high <= self.max_tile {
            return;
        }
        self.max_tile = high;
        events.push(GameEvent::MaxTile(high));
        if !self.rules.escalation {
            return;
        }
        let Some(low) = self.grid.lowest_tile().filter(|&low| low < high) else {
            return;
        };
        let cells: Vec<Coord> = self.grid.tiles().filter(|&(_, v)| v == low).map(|(c, _)| c).collect();
        for &c in &cells {
            self.grid.put(c, 0);
        }
        debug!(value = low, count = cells.len(), "chain: cleared lowest tiles");
        events.push(GameEvent::Cleared { cells, value: low });
    }

    /// Restore the grid and score from before the last merge.
    ///
    /// The best score and the session-high tile are kept.
    pub fn undo(&mut self) -> bool { self.undo_events().is_some() }

    /// [`undo`](Self::undo) with the events a renderer needs: `Undone`, and
    /// `StateChanged` when the restored board leaves a terminal state.
    pub fn undo_events(&mut self) -> Option<Vec<GameEvent>> {
        let prev = self.history.pop()?;
        self.grid = prev.grid;
        self.scores.score = prev.score;
        let mut events = vec![GameEvent::Undone];
        let state = self.evaluate();
        if state != self.state {
            events.push(GameEvent::StateChanged(state));
            self.state = state;
        }
        debug!(score = self.scores.score, state = ?self.state, "chain: undo");
        Some(events)
    }

    /// A legal chain the player could trace right now.
    pub fn hint(&self) -> Option<Vec<Coord>> {
        if self.state.is_terminal() {
            return None;
        }
        find_chain(&self.grid, self.rules.adjacency)
    }

    // Won is checked before Lost.
    fn evaluate(&self) -> GameState {
        match self.rules.target {
            Some(target) if self.grid.tiles().any(|(_, v)| v >= target) => GameState::Won,
            _ if !has_moves(&self.grid, self.rules.adjacency) => GameState::Lost,
            _ => GameState::Playing,
        }
    }

    pub fn grid(&self) -> &Grid { &self.grid }

    pub fn score(&self) -> u64 { self.scores.score }

    pub fn best_score(&self) -> u64 { self.scores.best }

    pub fn state(&self) -> GameState { self.state }

    pub fn rules(&self) -> &ChainRules { &self.rules }

    /// Highest tile seen this session.
    pub fn max_tile(&self) -> u32 { self.max_tile }

    pub fn can_undo(&self) -> bool { !self.history.is_empty() }

    pub fn history_len(&self) -> usize { self.history.len() }

    pub fn view(&self) -> GameView {
        GameView {
            grid: self.grid.clone(),
            score: self.scores.score,
            best_score: self.scores.best,
            state: self.state,
            max_tile: Some(self.max_tile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SpawnTable;

    fn c(row: usize, col: usize) -> Coord { Coord::new(row, col) }

    fn board(cells: &[(usize, usize, u32)]) -> Grid {
        let mut g = Grid::new(6).unwrap();
        for &(r, col, v) in cells {
            g.set(c(r, col), v).unwrap();
        }
        g
    }

    fn spawned(events: &[GameEvent]) -> usize {
        events.iter().filter(|e| matches!(e, GameEvent::Spawned { .. })).count()
    }

    #[test]
    fn it_merges_cells() {
        let mut g = board(&[(0, 0, 4), (0, 1, 4), (0, 2, 4)]);
        let r = merge_cells(&mut g, &[c(0, 0), c(0, 1), c(0, 2)]);
        assert_eq!(r, MergeResult { total_value: 12, end_cell: c(0, 2) });
        assert_eq!(g.get(c(0, 0)), Ok(0));
        assert_eq!(g.get(c(0, 1)), Ok(0));
        assert_eq!(g.get(c(0, 2)), Ok(12));
    }

    #[test]
    fn it_merges_in_game() {
        let g = board(&[(0, 0, 4), (0, 1, 4), (0, 2, 4), (5, 5, 2)]);
        let mut game = ChainGame::from_grid(ChainRules::classic(), g, 0, 0, 3).unwrap();
        let out = game.merge_chain(&[c(0, 0), c(0, 1), c(0, 2)]).unwrap();
        assert_eq!(out.result(), Some(MergeResult { total_value: 12, end_cell: c(0, 2) }));
        assert_eq!(game.score(), 12);
        assert_eq!(game.grid().get(c(0, 2)), Ok(12));
        assert_eq!(game.grid().tiles().filter(|&(_, v)| v != 0).count(), 3);
        let MergeOutcome::Merged { events, .. } = out else { unreachable!() };
        assert_eq!(spawned(&events), 1);
        assert!(events.contains(&GameEvent::Merged { from: vec![c(0, 0), c(0, 1), c(0, 2)], into: c(0, 2), value: 12 }));
    }

    #[test]
    fn it_spawns_per_vacated_cell() {
        let g = board(&[(0, 0, 16), (1, 1, 16), (2, 2, 16), (3, 3, 16), (5, 5, 32)]);
        let mut game = ChainGame::from_grid(ChainRules::escalating(), g, 0, 0, 3).unwrap();
        let out = game.merge_chain(&[c(0, 0), c(1, 1), c(2, 2), c(3, 3)]).unwrap();
        let MergeOutcome::Merged { result, events, .. } = out else { panic!("expected merge") };
        assert_eq!(result.total_value, 64);
        assert_eq!(spawned(&events), 3);
    }

    #[test]
    fn it_rejects_rule_breaking_chains() {
        let g = board(&[(0, 0, 2), (0, 1, 2), (1, 1, 2), (0, 2, 4), (2, 2, 2)]);
        let mut game = ChainGame::from_grid(ChainRules::classic(), g.clone(), 0, 0, 1).unwrap();
        let cases = [
            (vec![c(3, 3), c(3, 4)], ChainRejection::EmptyStart),
            (vec![c(0, 1), c(0, 2)], ChainRejection::ValueMismatch(c(0, 2))),
            (vec![c(0, 0), c(0, 1), c(0, 0)], ChainRejection::Repeated(c(0, 0))),
            (vec![c(0, 0), c(1, 1)], ChainRejection::NotAdjacent(c(1, 1))),
            (vec![c(1, 1), c(2, 2)], ChainRejection::NotAdjacent(c(2, 2))),
        ];
        for (chain, reason) in cases {
            assert_eq!(game.merge_chain(&chain), Ok(MergeOutcome::Rejected(reason)));
        }
        assert_eq!(game.grid(), &g);
        assert_eq!(game.score(), 0);
        assert!(!game.can_undo());
    }

    #[test]
    fn it_allows_diagonals_only_in_eight_way() {
        let g = board(&[(0, 0, 2), (1, 1, 2), (4, 4, 8)]);
        assert_eq!(validate_chain(&g, &[c(0, 0), c(1, 1)], Adjacency::EightWay), Ok(2));
        assert_eq!(
            validate_chain(&g, &[c(0, 0), c(1, 1)], Adjacency::Orthogonal),
            Err(ChainRejection::NotAdjacent(c(1, 1)))
        );
    }

    #[test]
    fn it_errors_on_precondition_violations() {
        let g = board(&[(0, 0, 2), (0, 1, 2)]);
        let mut game = ChainGame::from_grid(ChainRules::classic(), g, 0, 0, 1).unwrap();
        assert_eq!(game.merge_chain(&[c(0, 0)]), Err(EngineError::ChainTooShort(1)));
        assert_eq!(game.merge_chain(&[]), Err(EngineError::ChainTooShort(0)));
        assert_eq!(
            game.merge_chain(&[c(0, 0), c(0, 6)]),
            Err(EngineError::OutOfBounds { coord: c(0, 6), size: 6 })
        );
    }

    #[test]
    fn it_clears_lowest_tiles_on_new_record() {
        let g = board(&[(0, 0, 16), (0, 1, 16), (3, 0, 2), (3, 2, 2), (5, 5, 2), (4, 4, 4)]);
        let mut game = ChainGame::from_grid(ChainRules::escalating(), g, 0, 0, 11).unwrap();
        assert_eq!(game.max_tile(), 16);
        let out = game.merge_chain(&[c(0, 0), c(0, 1)]).unwrap();
        let MergeOutcome::Merged { events, .. } = out else { panic!("expected merge") };
        assert_eq!(game.max_tile(), 32);
        assert!(events.contains(&GameEvent::MaxTile(32)));
        let cleared = events.iter().find_map(|e| match e {
            GameEvent::Cleared { cells, value } => Some((cells.clone(), *value)),
            _ => None,
        });
        let (cells, value) = cleared.expect("lowest tiles cleared");
        assert_eq!(value, 2);
        assert!(cells.contains(&c(3, 0)) && cells.contains(&c(3, 2)) && cells.contains(&c(5, 5)));
        assert!(!game.grid().contains(2));
        assert_eq!(game.grid().get(c(0, 1)), Ok(32));
    }

    #[test]
    fn it_skips_clearing_without_new_record() {
        let g = board(&[(0, 0, 2), (0, 1, 2), (5, 5, 64)]);
        let mut game = ChainGame::from_grid(ChainRules::escalating(), g, 0, 0, 5).unwrap();
        let out = game.merge_chain(&[c(0, 0), c(0, 1)]).unwrap();
        let MergeOutcome::Merged { events, .. } = out else { panic!("expected merge") };
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Cleared { .. })));
        assert_eq!(game.max_tile(), 64);
    }

    #[test]
    fn it_keeps_the_record_tile_when_it_is_also_the_lowest() {
        let mut rules = ChainRules::escalating();
        rules.spawn_policy = SpawnPolicy::OnePerMerge;
        rules.spawn = SpawnTable::new(vec![(64, 1)]).unwrap();
        let g = board(&[(0, 0, 32), (0, 1, 32)]);
        let mut game = ChainGame::from_grid(rules, g, 0, 0, 2).unwrap();
        let out = game.merge_chain(&[c(0, 0), c(0, 1)]).unwrap();
        let MergeOutcome::Merged { events, .. } = out else { panic!("expected merge") };
        assert!(events.contains(&GameEvent::MaxTile(64)));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Cleared { .. })));
        assert_eq!(game.grid().tiles().filter(|&(_, v)| v == 64).count(), 2);
    }

    #[test]
    fn it_never_clears_under_classic_rules() {
        let g = board(&[(0, 0, 16), (0, 1, 16), (3, 0, 2)]);
        let mut game = ChainGame::from_grid(ChainRules::classic(), g, 0, 0, 5).unwrap();
        let out = game.merge_chain(&[c(0, 0), c(0, 1)]).unwrap();
        let MergeOutcome::Merged { events, .. } = out else { panic!("expected merge") };
        assert!(events.contains(&GameEvent::MaxTile(32)));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Cleared { .. })));
        assert_eq!(game.grid().get(c(3, 0)), Ok(2));
    }

    #[test]
    fn it_detects_loss_per_adjacency() {
        let rows: Vec<Vec<u32>> =
            (0..6).map(|r| (0..6).map(|col| if (r + col) % 2 == 0 { 2 } else { 4 }).collect()).collect();
        let g = Grid::from_rows(rows).unwrap();
        assert!(!has_moves(&g, Adjacency::Orthogonal));
        assert!(has_moves(&g, Adjacency::EightWay));
        let game = ChainGame::from_grid(ChainRules::classic(), g.clone(), 0, 0, 1).unwrap();
        assert_eq!(game.state(), GameState::Lost);
        assert_eq!(game.hint(), None);

        let mut open = g;
        open.set(c(2, 3), 0).unwrap();
        assert!(has_moves(&open, Adjacency::Orthogonal));
    }

    #[test]
    fn it_rejects_merges_after_game_over() {
        let rows: Vec<Vec<u32>> =
            (0..6).map(|r| (0..6).map(|col| if (r + col) % 2 == 0 { 2 } else { 4 }).collect()).collect();
        let mut game = ChainGame::from_grid(ChainRules::classic(), Grid::from_rows(rows).unwrap(), 0, 0, 1).unwrap();
        assert_eq!(
            game.merge_chain(&[c(0, 0), c(0, 1)]),
            Ok(MergeOutcome::Rejected(ChainRejection::GameOver(GameState::Lost)))
        );
    }

    #[test]
    fn it_wins_with_a_target() {
        let rules = ChainRules { target: Some(64), ..ChainRules::classic() };
        let g = board(&[(0, 0, 32), (0, 1, 32)]);
        let mut game = ChainGame::from_grid(rules, g, 0, 0, 1).unwrap();
        let out = game.merge_chain(&[c(0, 0), c(0, 1)]).unwrap();
        let MergeOutcome::Merged { state, .. } = out else { panic!("expected merge") };
        assert_eq!(state, GameState::Won);
    }

    #[test]
    fn it_undoes_merges() {
        let g = board(&[(0, 0, 8), (1, 0, 8), (4, 4, 2)]);
        let mut game = ChainGame::from_grid(ChainRules::classic(), g.clone(), 10, 10, 2).unwrap();
        assert!(game.merge_chain(&[c(0, 0), c(1, 0)]).unwrap().is_merged());
        assert_eq!(game.score(), 26);
        assert!(game.undo());
        assert_eq!(game.grid(), &g);
        assert_eq!(game.score(), 10);
        assert_eq!(game.best_score(), 26);
        assert!(!game.undo());
    }

    #[test]
    fn it_undoes_out_of_terminal_state() {
        let rules = ChainRules { size: 2, spawn: SpawnTable::new(vec![(32, 1)]).unwrap(), ..ChainRules::classic() };
        let g = Grid::from_rows(vec![vec![2, 2], vec![8, 16]]).unwrap();
        let mut game = ChainGame::from_grid(rules, g.clone(), 0, 0, 3).unwrap();
        let out = game.merge_chain(&[c(0, 0), c(0, 1)]).unwrap();
        let MergeOutcome::Merged { state, .. } = out else { panic!("expected merge") };
        assert_eq!(state, GameState::Lost);
        assert_eq!(game.grid().rows(), vec![vec![32, 4], vec![8, 16]]);

        let events = game.undo_events().unwrap();
        assert_eq!(events, vec![GameEvent::Undone, GameEvent::StateChanged(GameState::Playing)]);
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.grid(), &g);
        assert_eq!(game.score(), 0);
        assert_eq!(game.best_score(), 4);
        assert_eq!(game.max_tile(), 32);
        assert_eq!(game.undo_events(), None);
    }

    #[test]
    fn it_rejects_chains_that_would_overflow() {
        let big = 1u32 << 30;
        let g = board(&[(0, 0, big), (0, 1, big), (0, 2, big), (0, 3, big)]);
        let mut game = ChainGame::from_grid(ChainRules::classic(), g.clone(), 0, 0, 6).unwrap();
        let four = [c(0, 0), c(0, 1), c(0, 2), c(0, 3)];
        assert_eq!(
            game.merge_chain(&four),
            Ok(MergeOutcome::Rejected(ChainRejection::Overflow { value: big, len: 4 }))
        );
        assert_eq!(game.grid(), &g);
        assert_eq!(game.score(), 0);
        assert!(!game.can_undo());

        let hint = game.hint().unwrap();
        assert_eq!(hint.len(), 3);
        let out = game.merge_chain(&hint).unwrap();
        assert_eq!(out.result().map(|r| r.total_value), Some(3 * big));

        let top = 1u32 << 31;
        let stuck = Grid::from_rows(vec![vec![top, top], vec![2, 4]]).unwrap();
        assert!(!has_moves(&stuck, Adjacency::Orthogonal));
        assert_eq!(find_chain(&stuck, Adjacency::Orthogonal), None);
    }

    #[test]
    fn it_bounds_undo_history() {
        let rules = ChainRules { undo_capacity: Some(3), ..ChainRules::classic() };
        let pairs: Vec<(usize, usize, u32)> = (0..5).flat_map(|r| [(r, 0, 2), (r, 1, 2)]).collect();
        let mut game = ChainGame::from_grid(rules, board(&pairs), 0, 0, 21).unwrap();
        for r in 0..5 {
            assert!(game.merge_chain(&[c(r, 0), c(r, 1)]).unwrap().is_merged());
        }
        assert_eq!(game.score(), 20);
        assert_eq!(game.history_len(), 3);
        for expected in [16, 12, 8] {
            assert!(game.undo());
            assert_eq!(game.score(), expected);
        }
        assert!(!game.undo());
    }

    #[test]
    fn it_finds_the_longest_greedy_chain() {
        let g = board(&[(0, 0, 2), (0, 1, 2), (2, 0, 4), (2, 1, 4), (2, 2, 4)]);
        assert_eq!(find_chain(&g, Adjacency::Orthogonal), Some(vec![c(2, 0), c(2, 1), c(2, 2)]));
        assert_eq!(find_chain(&board(&[(0, 0, 2), (2, 2, 2)]), Adjacency::EightWay), None);
    }

    #[test]
    fn it_seeds_the_initial_board() {
        let classic = ChainGame::with_seed(ChainRules::classic(), 0, 4).unwrap();
        assert_eq!(classic.grid().tiles().filter(|&(_, v)| v != 0).count(), 2);
        let escalating = ChainGame::with_seed(ChainRules::escalating(), 0, 4).unwrap();
        assert_eq!(escalating.grid().tiles().filter(|&(_, v)| v != 0).count(), 5);
        assert!(escalating.grid().tiles().all(|(_, v)| [0, 2, 4, 8].contains(&v)));
        assert_eq!(escalating.max_tile(), escalating.grid().highest_tile());
    }
}
