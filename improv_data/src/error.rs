//! Error types shared by the data layer.

use thiserror::Error;

/// A dotted path that cannot address anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path '{path}' has an empty segment at position {position}")]
    EmptySegment { path: String, position: usize },
}

/// Failures reported by a durable storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrainError {
    #[error("failed to read '{key}' from brain: {message}")]
    Read { key: String, message: String },

    #[error("failed to write '{key}' to brain: {message}")]
    Write { key: String, message: String },
}

/// Engine options that could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid options document: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A response middleware refused to let a response continue.
#[derive(Debug, Error)]
#[error("response middleware '{middleware}' failed: {source}")]
pub struct MiddlewareError {
    pub middleware: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl MiddlewareError {
    pub fn new(
        middleware: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            middleware: middleware.into(),
            source: source.into(),
        }
    }
}
