//! Engine errors.

use improv_data::{BrainError, ConfigError, MiddlewareError, PathError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImprovError {
    /// The engine could not be constructed. A programming error, never masked.
    #[error("{engine}: {message}")]
    Construction { engine: String, message: String },

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Brain(#[from] BrainError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("placeholder delimiters must not be empty (open '{open}', close '{close}')")]
    EmptyDelimiter { open: String, close: String },

    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("no engine is bound to a host")]
    Unbound,
}

pub type Result<T> = std::result::Result<T, ImprovError>;

impl From<ImprovError> for MiddlewareError {
    fn from(error: ImprovError) -> Self {
        MiddlewareError::new(crate::ENGINE_NAME, error)
    }
}
