//! Search and self-play errors

use generals_core::{EvaluatorError, MapGenerationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),

    #[error("search needs at least one simulation")]
    ZeroSimulations,
}

#[derive(Debug, Error)]
pub enum SelfPlayError {
    #[error(transparent)]
    MapGeneration(#[from] MapGenerationError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("failed to encode features: {0}")]
    Encode(#[source] EvaluatorError),

    #[error("invalid self-play configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to write samples: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize sample: {0}")]
    Serialize(#[from] serde_json::Error),
}
