//! Directional-slide rules (2048).
//!
//! Every direction reduces to one slide-left routine: rows are read for
//! Left/Right, columns for Up/Down, and Right/Down lines are reversed before
//! and after sliding. [`slide_line`] and [`shift`] are pure; [`SlideGame`]
//! owns a grid, score, undo history and RNG and applies them.
//!
//! ```
//! use tile_merge::engine::{Grid, Move};
//! use tile_merge::slide::{SlideConfig, SlideGame};
//!
//! let grid = Grid::from_rows(vec![
//!     vec![2, 2, 4, 4],
//!     vec![0, 0, 0, 0],
//!     vec![0, 0, 0, 0],
//!     vec![0, 0, 0, 0],
//! ]).unwrap();
//! let mut game = SlideGame::from_grid(SlideConfig::default(), grid, 0, 0, 42).unwrap();
//! let out = game.apply_move(Move::Left);
//! assert!(out.changed);
//! assert_eq!(out.gained, 12);
//! assert_eq!(&game.grid().rows()[0][..2], &[4, 8]);
//! assert!(game.undo());
//! assert_eq!(game.score(), 0);
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::engine::{spawn_tile, GameEvent, GameState, GameView, Grid, History, Move, Scoreboard, Snapshot, SpawnTable};
use crate::error::EngineError;

/// Knobs for a slide game. Defaults are the standard 4x4, 2048-target game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideConfig {
    pub size: usize,
    /// Tile value that wins the game; `None` plays until stuck.
    pub target: Option<u32>,
    /// Tiles placed on a fresh board.
    pub initial_tiles: usize,
    pub spawn: SpawnTable,
    /// `None` keeps every snapshot.
    pub undo_capacity: Option<usize>,
}

impl Default for SlideConfig {
    fn default() -> Self {
        Self { size: 4, target: Some(2048), initial_tiles: 2, spawn: SpawnTable::classic(), undo_capacity: None }
    }
}

impl SlideConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        Grid::new(self.size)?;
        self.spawn.validate()
    }
}

/// Where one tile of a line came from and ended up, in slide-left order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMove {
    /// One source position, or two when the tile is a merge result.
    pub from: Vec<usize>,
    pub to: usize,
    pub value: u32,
}

impl LineMove {
    pub fn is_merge(&self) -> bool { self.from.len() > 1 }
}

/// Result of sliding a single line to the left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineShift {
    pub tiles: Vec<u32>,
    /// Sum of all merge results.
    pub gained: u64,
    pub moves: Vec<LineMove>,
}

/// Slide one line to the left.
///
/// Zeros are compacted out, then equal neighbours merge left to right. A
/// merged tile never merges again in the same pass, so `[2, 2, 2, 2]`
/// becomes `[4, 4, 0, 0]`. Pairs whose sum would overflow `u32` stay apart.
///
/// ```
/// use tile_merge::slide::slide_line;
/// let s = slide_line(&[2, 2, 4, 4]);
/// assert_eq!(s.tiles, vec![4, 8, 0, 0]);
/// assert_eq!(s.gained, 12);
/// ```
pub fn slide_line(line: &[u32]) -> LineShift {
    let compact: Vec<(usize, u32)> = line.iter().copied().enumerate().filter(|&(_, v)| v != 0).collect();
    let mut tiles = Vec::with_capacity(line.len());
    let mut moves = Vec::with_capacity(compact.len());
    let mut gained = 0u64;
    let mut i = 0;
    while i < compact.len() {
        let (pos, value) = compact[i];
        let to = tiles.len();
        match compact.get(i + 1) {
            Some(&(next_pos, next)) if next == value && value.checked_mul(2).is_some() => {
                let merged = value << 1;
                gained += u64::from(merged);
                tiles.push(merged);
                moves.push(LineMove { from: vec![pos, next_pos], to, value: merged });
                i += 2;
            }
            _ => {
                tiles.push(value);
                moves.push(LineMove { from: vec![pos], to, value });
                i += 1;
            }
        }
    }
    tiles.resize(line.len(), 0);
    LineShift { tiles, gained, moves }
}

/// Result of applying a direction to a whole grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub grid: Grid,
    pub gained: u64,
    pub changed: bool,
    /// `Moved`/`Merged` events for every tile that travelled.
    pub events: Vec<GameEvent>,
}

/// Slide every line of `grid` in `dir`, without spawning.
pub fn shift(grid: &Grid, dir: Move) -> Shift {
    let size = grid.size();
    let axis = dir.axis();
    let reversed = dir.is_reversed();
    // Map a slide-left position back to the real position on the line.
    let real = |p: usize| if reversed { size - 1 - p } else { p };

    let mut out = grid.clone();
    let mut gained = 0;
    let mut changed = false;
    let mut events = Vec::new();
    for index in 0..size {
        let before = grid.line(index, axis);
        let mut line = before.clone();
        if reversed {
            line.reverse();
        }
        let mut slid = slide_line(&line);
        if reversed {
            slid.tiles.reverse();
        }
        if slid.tiles == before {
            continue;
        }
        changed = true;
        gained += slid.gained;
        out.set_line(index, axis, &slid.tiles);
        for mv in slid.moves {
            let to = axis.coord(index, real(mv.to));
            if mv.is_merge() {
                let from = mv.from.iter().map(|&p| axis.coord(index, real(p))).collect();
                events.push(GameEvent::Merged { from, into: to, value: mv.value });
            } else {
                let from = axis.coord(index, real(mv.from[0]));
                if from != to {
                    events.push(GameEvent::Moved { from, to, value: mv.value });
                }
            }
        }
    }
    Shift { grid: out, gained, changed, events }
}

/// No empty cell and no equal orthogonal neighbours.
pub fn is_lost(grid: &Grid) -> bool { grid.is_full() && !grid.has_orthogonal_pair() }

/// Directions that would change the grid.
pub fn legal_moves(grid: &Grid) -> Vec<Move> {
    Move::ALL.into_iter().filter(|&m| shift(grid, m).changed).collect()
}

/// Outcome of [`SlideGame::apply_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// False for a rejected move; nothing was mutated or recorded then.
    pub changed: bool,
    pub gained: u64,
    pub state: GameState,
    pub events: Vec<GameEvent>,
}

impl MoveOutcome {
    fn rejected(state: GameState) -> Self { MoveOutcome { changed: false, gained: 0, state, events: Vec::new() } }
}

/// A single 2048 session.
#[derive(Debug, Clone)]
pub struct SlideGame {
    config: SlideConfig,
    grid: Grid,
    scores: Scoreboard,
    state: GameState,
    history: History,
    rng: StdRng,
    // Cleared by `keep_playing` so the target tile doesn't re-trigger a win.
    win_enabled: bool,
}

impl SlideGame {
    /// Start a game with an entropy-seeded RNG.
    pub fn new(config: SlideConfig, best_score: u64) -> Result<Self, EngineError> {
        Self::build(config, best_score, StdRng::from_entropy())
    }

    /// Start a game whose spawns are reproducible from `seed`.
    pub fn with_seed(config: SlideConfig, best_score: u64, seed: u64) -> Result<Self, EngineError> {
        Self::build(config, best_score, StdRng::seed_from_u64(seed))
    }

    fn build(config: SlideConfig, best_score: u64, rng: StdRng) -> Result<Self, EngineError> {
        config.validate()?;
        let mut game = SlideGame {
            grid: Grid::new(config.size)?,
            history: History::new(config.undo_capacity),
            scores: Scoreboard::new(best_score),
            state: GameState::Playing,
            rng,
            win_enabled: true,
            config,
        };
        game.new_game();
        Ok(game)
    }

    /// Resume from an explicit board, e.g. a restored session or a test fixture.
    pub fn from_grid(
        config: SlideConfig,
        grid: Grid,
        score: u64,
        best_score: u64,
        seed: u64,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if grid.size() != config.size {
            return Err(EngineError::SizeMismatch { expected: config.size, found: grid.size() });
        }
        let mut game = SlideGame {
            grid,
            history: History::new(config.undo_capacity),
            scores: Scoreboard { score, best: best_score.max(score) },
            state: GameState::Playing,
            rng: StdRng::seed_from_u64(seed),
            win_enabled: true,
            config,
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
        self.win_enabled = true;
        let mut events = Vec::with_capacity(self.config.initial_tiles);
        for _ in 0..self.config.initial_tiles {
            if let Some((at, value)) = spawn_tile(&mut self.grid, &self.config.spawn, &mut self.rng) {
                events.push(GameEvent::Spawned { at, value });
            }
        }
        debug!(tiles = events.len(), "slide: new game");
        events
    }

    /// Slide in `dir`, then spawn one tile and re-check the game state.
    ///
    /// A move that changes nothing, or any move once the game has ended,
    /// returns `changed == false` and leaves grid, score and history alone.
    pub fn apply_move(&mut self, dir: Move) -> MoveOutcome {
        if self.state.is_terminal() {
            trace!(?dir, state = ?self.state, "slide: move ignored in terminal state");
            return MoveOutcome::rejected(self.state);
        }
        let shifted = shift(&self.grid, dir);
        if !shifted.changed {
            trace!(?dir, "slide: move rejected, nothing would change");
            return MoveOutcome::rejected(self.state);
        }

        self.history.push(Snapshot { grid: self.grid.clone(), score: self.scores.score });
        self.grid = shifted.grid;
        let mut events = shifted.events;
        if let Some(best) = self.scores.add(shifted.gained) {
            events.push(GameEvent::BestScore(best));
        }
        if let Some((at, value)) = spawn_tile(&mut self.grid, &self.config.spawn, &mut self.rng) {
            events.push(GameEvent::Spawned { at, value });
        }

        let state = self.evaluate();
        if state != self.state {
            info!(?state, score = self.scores.score, "slide: game state changed");
            events.push(GameEvent::StateChanged(state));
            self.state = state;
        }
        debug!(?dir, gained = shifted.gained, score = self.scores.score, "slide: move applied");
        MoveOutcome { changed: true, gained: shifted.gained, state, events }
    }

    /// Restore the grid and score from before the last accepted move.
    ///
    /// Returns false when there is nothing to undo. The best score is kept.
    pub fn undo(&mut self) -> bool { self.undo_events().is_some() }

    /// Like [`undo`](Self::undo), but hands back `Undone` plus a
    /// `StateChanged` when the restored board is in a different state.
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
        debug!(score = self.scores.score, state = ?self.state, "slide: undo");
        Some(events)
    }

    /// Continue past a win. Later target tiles no longer end the game.
    pub fn keep_playing(&mut self) -> bool {
        if self.state != GameState::Won {
            return false;
        }
        self.win_enabled = false;
        self.state = self.evaluate();
        true
    }

    // Won is checked before Lost.
    fn evaluate(&self) -> GameState {
        match self.config.target {
            Some(target) if self.win_enabled && self.grid.contains(target) => GameState::Won,
            _ if is_lost(&self.grid) => GameState::Lost,
            _ => GameState::Playing,
        }
    }

    pub fn grid(&self) -> &Grid { &self.grid }

    pub fn score(&self) -> u64 { self.scores.score }

    pub fn best_score(&self) -> u64 { self.scores.best }

    pub fn state(&self) -> GameState { self.state }

    pub fn config(&self) -> &SlideConfig { &self.config }

    pub fn can_undo(&self) -> bool { !self.history.is_empty() }

    pub fn history_len(&self) -> usize { self.history.len() }

    /// Read-only copy for a renderer.
    pub fn view(&self) -> GameView {
        GameView {
            grid: self.grid.clone(),
            score: self.scores.score,
            best_score: self.scores.best,
            state: self.state,
            max_tile: None,
        }
    }
}
