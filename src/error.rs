use std::path::PathBuf;

use crate::game::MoveError;

/// Errors raised while building or running a [`Network`](crate::brain::Network).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    #[error("invalid network configuration: {0}")]
    Config(String),

    #[error("shape mismatch in {context}: expected {expected:?}, got {found:?}")]
    Shape {
        context: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// Errors raised by agents while choosing actions or learning from outcomes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    #[error("no legal action available")]
    NoLegalAction,

    #[error("invalid agent configuration: {0}")]
    Config(String),

    #[error("legal-action mask has width {found}, network has {expected} outputs")]
    MaskWidth { expected: usize, found: usize },

    #[error("network error: {0}")]
    Network(#[from] NetworkError),
}

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("no 'latest' pointer found in {0}")]
    NoLatest(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("snapshot is not a valid network: {0}")]
    InvalidSnapshot(#[from] NetworkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while playing or training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("{agent} selected illegal action {action} (legal: {legal:?})")]
    IllegalAction {
        agent: String,
        action: usize,
        legal: Vec<usize>,
    },

    #[error("{expected} seats need {expected} agents, got {found}")]
    SeatCount { expected: usize, found: usize },

    #[error("game rejected move: {0}")]
    Move(#[from] MoveError),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),

    #[error("failed to build network: {0}")]
    Network(#[from] NetworkError),

    #[error("failed to build agent: {0}")]
    Agent(#[from] AgentError),

    #[error("failed to load pretrained network: {0}")]
    Checkpoint(#[from] CheckpointError),
}
