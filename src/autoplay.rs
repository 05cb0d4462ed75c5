//! Unattended play, used by the `autoplay` binary and the benches.
//!
//! The slide player picks uniformly among legal moves; the chain player
//! always takes the engine hint. Every session comes back with a
//! [`SessionTrace`] that [`crate::trace::replay`] reproduces.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, instrument};

use crate::chain::{ChainGame, ChainRules};
use crate::engine::{GameState, GameView};
use crate::error::EngineError;
use crate::slide::{legal_moves, SlideConfig, SlideGame};
use crate::trace::{now_unix_seconds, Input, Ruleset, SessionTrace, TraceMeta};

// Keeps the move picker's stream apart from the spawn stream.
const POLICY_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Clone)]
pub struct PlayReport {
    pub steps: u32,
    pub final_score: u64,
    pub highest_tile: u32,
    pub state: GameState,
    pub trace: SessionTrace,
}

impl PlayReport {
    fn finish(ruleset: Ruleset, seed: u64, start: u64, inputs: Vec<Input>, view: GameView) -> Self {
        let steps = inputs.len() as u32;
        let highest = view.max_tile.unwrap_or_else(|| view.grid.highest_tile());
        let trace = SessionTrace {
            meta: TraceMeta {
                ruleset,
                seed,
                steps,
                start_unix_s: start,
                final_score: view.score,
                highest_tile: highest,
                engine_str: Some(format!("tile-merge {}", env!("CARGO_PKG_VERSION"))),
            },
            inputs,
            final_grid: view.grid,
        };
        PlayReport { steps, final_score: view.score, highest_tile: highest, state: view.state, trace }
    }
}

/// Play one slide game to the end or for `max_steps` accepted moves.
#[instrument(level = "debug", skip(config))]
pub fn play_slide(config: SlideConfig, seed: u64, max_steps: u32) -> Result<PlayReport, EngineError> {
    let start = now_unix_seconds();
    let mut game = SlideGame::with_seed(config.clone(), 0, seed)?;
    let mut policy = StdRng::seed_from_u64(seed ^ POLICY_SALT);
    let mut inputs = Vec::new();
    while (inputs.len() as u32) < max_steps && !game.state().is_terminal() {
        let Some(&dir) = legal_moves(game.grid()).choose(&mut policy) else { break };
        if game.apply_move(dir).changed {
            inputs.push(Input::Slide(dir));
        }
    }
    debug!(steps = inputs.len(), score = game.score(), state = ?game.state(), "slide session done");
    Ok(PlayReport::finish(Ruleset::Slide(config), seed, start, inputs, game.view()))
}

/// Play one chain game following [`ChainGame::hint`].
#[instrument(level = "debug", skip(rules))]
pub fn play_chain(rules: ChainRules, seed: u64, max_steps: u32) -> Result<PlayReport, EngineError> {
    let start = now_unix_seconds();
    let mut game = ChainGame::with_seed(rules.clone(), 0, seed)?;
    let mut inputs = Vec::new();
    while (inputs.len() as u32) < max_steps {
        let Some(chain) = game.hint() else { break };
        if !game.merge_chain(&chain)?.is_merged() {
            break;
        }
        inputs.push(Input::Chain(chain));
    }
    debug!(steps = inputs.len(), score = game.score(), state = ?game.state(), "chain session done");
    Ok(PlayReport::finish(Ruleset::Chain(rules), seed, start, inputs, game.view()))
}

/// Play whichever game `ruleset` names.
pub fn play(ruleset: &Ruleset, seed: u64, max_steps: u32) -> Result<PlayReport, EngineError> {
    match ruleset {
        Ruleset::Slide(config) => play_slide(config.clone(), seed, max_steps),
        Ruleset::Chain(rules) => play_chain(rules.clone(), seed, max_steps),
    }
}
