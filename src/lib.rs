//! tile-merge: grid engines for 2048-style slide games and 2248-style chain-merge games
//!
//! This crate provides:
//! - Shared grid primitives, weighted spawning and a bounded undo stack (`engine`)
//! - The slide game: four-direction shifts with pairwise merges (`slide`)
//! - The chain game: merge paths of equal tiles, classic or escalating rules (`chain`)
//! - Seeded session traces that replay exactly (`trace`) and an unattended player (`autoplay`)
//!
//! Quick start:
//! ```
//! use tile_merge::engine::Move;
//! use tile_merge::slide::{SlideConfig, SlideGame};
//!
//! // Seeded games spawn the same tiles every time
//! let mut game = SlideGame::with_seed(SlideConfig::default(), 0, 42).unwrap();
//! assert_eq!(game.grid().tiles().filter(|&(_, v)| v != 0).count(), 2);
//! let out = game.apply_move(Move::Left);
//! if out.changed {
//!     assert!(game.can_undo());
//! }
//! ```
//!
//! Chain games take the traced cells in order:
//! ```
//! use tile_merge::chain::{ChainGame, ChainRules};
//! use tile_merge::engine::{Coord, Grid};
//!
//! let grid = Grid::from_rows(vec![vec![2, 2, 4], vec![0, 0, 4], vec![0, 0, 0]]).unwrap();
//! let mut rules = ChainRules::classic();
//! rules.size = 3;
//! let mut game = ChainGame::from_grid(rules, grid, 0, 0, 7).unwrap();
//! let out = game.merge_chain(&[Coord::new(0, 0), Coord::new(0, 1)]).unwrap();
//! assert_eq!(out.result().map(|r| r.total_value), Some(4));
//! assert_eq!(game.score(), 4);
//! ```
//!
//! The engines never touch storage or rendering: best scores come in as plain
//! numbers and changes go out as [`engine::GameEvent`]s.
pub mod autoplay;
pub mod chain;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod slide;
pub mod trace;
