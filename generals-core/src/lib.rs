//! Generals Core - game rules, fog of war, and evaluators
//!
//! This crate provides the core game logic:
//! - Board geometry (square grid, row-major storage)
//! - Game state, combat and income rules
//! - Per-player fog-of-war views
//! - Evaluator boundary, feature encoding and evaluator persistence

pub mod board;
pub mod error;
pub mod mapgen;
pub mod game;
pub mod view;
pub mod action;
pub mod encode;
pub mod eval;
pub mod persist;
pub mod training;

// Re-exports for convenient access
pub use board::{Board, Coord, Direction, PlayerId, Tile, TileType, ALL_DIRECTIONS, MAX_SIDE};
pub use error::{ActionError, EvaluatorError, MapGenerationError, PersistError};
pub use mapgen::MapConfig;
pub use game::{Game, Move, PlayerInfo, LAND_INCOME_PERIOD};
pub use view::{PlayerView, ViewTile, ViewType};
pub use action::ActionSpace;
pub use encode::{encode, Features, PLANES};
pub use eval::{Evaluation, Evaluator, HeuristicEvaluator, Priors, UniformEvaluator};
pub use persist::EvaluatorMeta;
pub use training::{reward, TrainingContext};
