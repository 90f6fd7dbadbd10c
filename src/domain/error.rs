// Engine error taxonomy
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown widget type: {0}")]
    InvalidWidgetType(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("gateway request failed: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl EngineError {
    /// Wrap a gateway failure, keeping only the displayable message.
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }
}
