//! Generals MCTS - simultaneous-move tree search and self-play
//!
//! This crate provides:
//! - Arena-backed search tree over joint moves
//! - `run_mcts` producing per-player policies and root values
//! - Self-play driver exporting training samples as JSON Lines

pub mod error;
pub mod tree;
pub mod search;
pub mod selfplay;

use serde::{Deserialize, Serialize};

pub use error::{SearchError, SelfPlayError};
pub use search::{run_mcts, SearchResult};
pub use selfplay::{GameRecord, SelfPlayConfig, TrainingSample};
pub use tree::{MctsNode, MctsTree, NodeId};

/// MCTS configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    pub simulations: u32,
    /// Exploration constant `c` in the UCB score
    pub exploration: f32,
    /// Candidate moves kept per player before taking the joint product
    pub top_k: usize,
    /// Prior given to passing
    pub pass_prior: f32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            simulations: 100,
            exploration: 1.41, // sqrt(2)
            top_k: 5,
            pass_prior: 0.05,
        }
    }
}
