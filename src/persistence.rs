//! Boundary towards whatever stores scores between sessions.
//!
//! The engines never touch storage. Callers read the prior best score before
//! constructing a game and write back when an outcome reports a new one.

use std::collections::HashMap;

use crate::trace::Ruleset;

/// Best score of the slide game.
pub const BEST_SCORE_KEY: &str = "bestScore";
/// Best score of both chain presets. The escalating game shares it rather
/// than `bestScore`, which belongs to the slide game.
pub const CHAIN_BEST_SCORE_KEY: &str = "bestScore2248";
/// Session-high tile of the escalating chain game.
pub const MAX_TILE_KEY: &str = "maxTile";

/// Minimal key-value store for integer records.
pub trait ScoreStore {
    fn load(&self, key: &str) -> Option<u64>;
    fn store(&mut self, key: &str, value: u64);
}

/// In-memory store, also handy as a test double.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, u64>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

impl ScoreStore for MemoryStore {
    fn load(&self, key: &str) -> Option<u64> { self.values.get(key).copied() }

    fn store(&mut self, key: &str, value: u64) { self.values.insert(key.to_owned(), value); }
}

/// Key the best score of a session under `ruleset` is kept at.
pub fn best_score_key(ruleset: &Ruleset) -> &'static str {
    match ruleset {
        Ruleset::Slide(_) => BEST_SCORE_KEY,
        Ruleset::Chain(_) => CHAIN_BEST_SCORE_KEY,
    }
}

/// Write `value` under `key` only if it beats what is stored. Returns true on write.
pub fn record_best<S: ScoreStore + ?Sized>(store: &mut S, key: &str, value: u64) -> bool {
    if store.load(key).is_some_and(|prev| prev >= value) {
        return false;
    }
    store.store(key, value);
    true
}
