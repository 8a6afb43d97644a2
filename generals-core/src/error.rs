//! Error types for map generation, evaluation, and persistence

use std::path::PathBuf;

use thiserror::Error;

use crate::board::PlayerId;

/// Errors raised while building a new map
#[derive(Debug, Error)]
pub enum MapGenerationError {
    #[error("invalid board dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid player count {players} for a {width}x{height} board")]
    InvalidPlayerCount {
        players: usize,
        width: usize,
        height: usize,
    },

    #[error("could not place general for {player} after {attempts} attempts")]
    GeneralPlacement { player: PlayerId, attempts: u32 },

    #[error("general for player {player} at ({x}, {y}) is off the {width}x{height} board")]
    GeneralOutOfBounds {
        player: usize,
        x: u8,
        y: u8,
        width: usize,
        height: usize,
    },
}

/// Errors raised when mapping policy indices back to moves
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    #[error("action index {index} is outside a policy of length {size}")]
    OutOfRange { index: usize, size: usize },
}

/// Errors raised by an evaluator
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("board {width}x{height} exceeds evaluator maximum {max_width}x{max_height}")]
    BoardTooLarge {
        width: usize,
        height: usize,
        max_width: usize,
        max_height: usize,
    },
}

/// Errors raised while saving or loading evaluator files
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
}
