use thiserror::Error;

/// Errors produced while feeding an engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequiturError {
    /// The token is empty and cannot stand as a terminal. Nothing was changed.
    #[error("empty token at input position {position}")]
    InvalidToken { position: usize },
}

pub type Result<T, E = SequiturError> = std::result::Result<T, E>;
