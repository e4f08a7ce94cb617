//! Error types for the stack scene

use thiserror::Error;

use crate::pool::PoolError;

/// Main error type for the stack scene
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing fields in the mastery dataset. Fatal for an
    /// initialization: no partial stack is built.
    #[error("Data parse error: {0}")]
    DataParse(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[source] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    /// A trigger arrived in a state that does not accept it.
    #[error("Cannot {trigger} while {state}")]
    InvalidTransition {
        state: &'static str,
        trigger: &'static str,
    },

    #[error("No stack at index {0}")]
    UnknownStack(usize),
}
