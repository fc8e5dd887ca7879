/// Convenience result type used across scenepaint.
pub type PaintResult<T> = Result<T, PaintError>;

/// Top-level error taxonomy used by renderer APIs.
#[derive(thiserror::Error, Debug)]
pub enum PaintError {
    /// Invalid caller-provided data (dimensions, pixel buffers, image bytes).
    #[error("validation error: {0}")]
    Validation(String),

    /// Fatal backend initialization failure (no GPU context, shader compile or link failure).
    #[error("initialization error: {0}")]
    Init(String),

    /// Errors while creating, resizing or reading back a drawing surface.
    #[error("surface error: {0}")]
    Surface(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PaintError {
    /// Build a [`PaintError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PaintError::Init`] value.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Build a [`PaintError::Surface`] value.
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    /// Build a [`PaintError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for fatal initialization failures.
    pub fn is_init(&self) -> bool {
        matches!(self, Self::Init(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
