//! Recorded sessions.
//!
//! A trace stores the rule set, the RNG seed and every accepted input of one
//! game. Because spawns are driven by the seeded RNG, replaying the inputs on
//! a fresh game reproduces the session exactly.
//!
//! File layout: 4-byte magic, 1-byte version, then the postcard-encoded
//! [`SessionTrace`].

use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::chain::{ChainGame, ChainRules};
use crate::engine::{Coord, Grid, Move};
use crate::error::EngineError;
use crate::slide::{SlideConfig, SlideGame};

const MAGIC: &[u8; 4] = b"TMT1";
const VERSION: u8 = 1;

/// Which game a trace belongs to, with the exact rules it ran under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ruleset {
    Slide(SlideConfig),
    Chain(ChainRules),
}

/// One accepted player input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Input {
    Slide(Move),
    Chain(Vec<Coord>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceMeta {
    pub ruleset: Ruleset,
    pub seed: u64,
    pub steps: u32,
    pub start_unix_s: u64,
    pub final_score: u64,
    pub highest_tile: u32,
    pub engine_str: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTrace {
    pub meta: TraceMeta,
    pub inputs: Vec<Input>, // length = steps
    pub final_grid: Grid,
}

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("step count {steps} does not match {inputs} recorded inputs")]
    Malformed { steps: u32, inputs: usize },
    #[error("input {0} does not belong to this ruleset")]
    WrongInput(usize),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// What a replay ended on, compared with what the trace recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub steps: usize,
    /// Inputs the engine refused during replay; 0 for a faithful trace.
    pub rejected: usize,
    pub final_score: u64,
    pub final_grid: Grid,
    pub matches: bool,
}

pub fn to_bytes(trace: &SessionTrace) -> Result<Vec<u8>, TraceError> {
    let mut buf = Vec::with_capacity(64 + trace.inputs.len() * 4);
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&postcard::to_allocvec(trace)?);
    Ok(buf)
}

pub fn from_bytes(bytes: &[u8]) -> Result<SessionTrace, TraceError> {
    if bytes.len() < MAGIC.len() + 1 || &bytes[..4] != MAGIC || bytes[4] != VERSION {
        return Err(TraceError::MagicOrVersion);
    }
    let trace: SessionTrace = postcard::from_bytes(&bytes[5..])?;
    if trace.meta.steps as usize != trace.inputs.len() {
        return Err(TraceError::Malformed { steps: trace.meta.steps, inputs: trace.inputs.len() });
    }
    Ok(trace)
}

pub fn write_to_path<P: AsRef<Path>>(path: P, trace: &SessionTrace) -> Result<(), TraceError> {
    fs::write(path, to_bytes(trace)?)?;
    Ok(())
}

pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<SessionTrace, TraceError> {
    let bytes = fs::read(path)?;
    from_bytes(&bytes)
}

/// Re-run the recorded inputs on a fresh game with the recorded seed.
pub fn replay(trace: &SessionTrace) -> Result<ReplayReport, TraceError> {
    let seed = trace.meta.seed;
    let mut rejected = 0;
    let (final_grid, final_score) = match &trace.meta.ruleset {
        Ruleset::Slide(config) => {
            let mut game = SlideGame::with_seed(config.clone(), 0, seed)?;
            for (i, input) in trace.inputs.iter().enumerate() {
                let Input::Slide(dir) = input else {
                    return Err(TraceError::WrongInput(i));
                };
                if !game.apply_move(*dir).changed {
                    rejected += 1;
                }
            }
            (game.grid().clone(), game.score())
        }
        Ruleset::Chain(rules) => {
            let mut game = ChainGame::with_seed(rules.clone(), 0, seed)?;
            for (i, input) in trace.inputs.iter().enumerate() {
                let Input::Chain(chain) = input else {
                    return Err(TraceError::WrongInput(i));
                };
                if !game.merge_chain(chain)?.is_merged() {
                    rejected += 1;
                }
            }
            (game.grid().clone(), game.score())
        }
    };
    let matches = rejected == 0 && final_grid == trace.final_grid && final_score == trace.meta.final_score;
    Ok(ReplayReport { steps: trace.inputs.len(), rejected, final_score, final_grid, matches })
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn record_slide(seed: u64, moves: &[Move]) -> SessionTrace {
        let config = SlideConfig::default();
        let mut game = SlideGame::with_seed(config.clone(), 0, seed).unwrap();
        let mut inputs = Vec::new();
        for &dir in moves {
            if game.apply_move(dir).changed {
                inputs.push(Input::Slide(dir));
            }
        }
        SessionTrace {
            meta: TraceMeta {
                ruleset: Ruleset::Slide(config),
                seed,
                steps: inputs.len() as u32,
                start_unix_s: 1_700_000_000,
                final_score: game.score(),
                highest_tile: game.grid().highest_tile(),
                engine_str: Some("test".to_string()),
            },
            inputs,
            final_grid: game.grid().clone(),
        }
    }

    #[test]
    fn round_trip_file() {
        let trace = record_slide(5, &[Move::Left, Move::Up, Move::Right, Move::Down]);
        let tmp = NamedTempFile::new().unwrap();
        write_to_path(tmp.path(), &trace).unwrap();
        let loaded = read_from_path(tmp.path()).unwrap();
        assert_eq!(loaded, trace);
    }

    #[test]
    fn replay_reproduces_slide_session() {
        let moves = [Move::Left, Move::Down, Move::Right, Move::Up].repeat(6);
        let trace = record_slide(99, &moves);
        let report = replay(&trace).unwrap();
        assert!(report.matches, "{report:?}");
        assert_eq!(report.rejected, 0);
        assert_eq!(report.final_score, trace.meta.final_score);
    }

    #[test]
    fn replay_reproduces_chain_session() {
        let rules = ChainRules::escalating();
        let mut game = ChainGame::with_seed(rules.clone(), 0, 8).unwrap();
        let mut inputs = Vec::new();
        for _ in 0..10 {
            let Some(chain) = game.hint() else { break };
            assert!(game.merge_chain(&chain).unwrap().is_merged());
            inputs.push(Input::Chain(chain));
        }
        let trace = SessionTrace {
            meta: TraceMeta {
                ruleset: Ruleset::Chain(rules),
                seed: 8,
                steps: inputs.len() as u32,
                start_unix_s: 0,
                final_score: game.score(),
                highest_tile: game.max_tile(),
                engine_str: None,
            },
            inputs,
            final_grid: game.grid().clone(),
        };
        let bytes = to_bytes(&trace).unwrap();
        let report = replay(&from_bytes(&bytes).unwrap()).unwrap();
        assert!(report.matches, "{report:?}");
    }

    #[test]
    fn detects_tampered_trace() {
        let mut trace = record_slide(3, &[Move::Left, Move::Up, Move::Left]);
        trace.meta.final_score += 4;
        assert!(!replay(&trace).unwrap().matches);
    }

    #[test]
    fn rejects_foreign_input() {
        let mut trace = record_slide(3, &[Move::Left]);
        trace.inputs.push(Input::Chain(vec![Coord::new(0, 0), Coord::new(0, 1)]));
        trace.meta.steps += 1;
        assert!(matches!(replay(&trace), Err(TraceError::WrongInput(_))));
    }

    #[test]
    fn rejects_bad_header() {
        let trace = record_slide(1, &[Move::Up]);
        let mut bytes = to_bytes(&trace).unwrap();
        bytes[0] = b'X';
        assert!(matches!(from_bytes(&bytes), Err(TraceError::MagicOrVersion)));
        assert!(matches!(from_bytes(&bytes[..3]), Err(TraceError::MagicOrVersion)));
    }

    #[test]
    fn rejects_step_mismatch() {
        let mut trace = record_slide(1, &[Move::Up, Move::Left]);
        trace.meta.steps += 1;
        let bytes = to_bytes(&trace).unwrap();
        assert!(matches!(from_bytes(&bytes), Err(TraceError::Malformed { .. })));
    }
}
