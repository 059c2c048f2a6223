use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("Oracle did not answer within {0:?}")]
    OracleTimeout(Duration),

    #[error("Malformed oracle payload: {0}")]
    Malformed(String),

    #[error("Invalid concept: {0}")]
    InvalidConcept(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Animation error: {0}")]
    Animation(String),

    #[error("Not supported: {0}")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
