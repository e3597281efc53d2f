/// Convenience result type used across Montage.
pub type MontageResult<T> = Result<T, MontageError>;

/// Top-level error taxonomy used by timeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum MontageError {
    /// Invalid timeline or track construction parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid placement request (unknown track, unresolved alignment, bad timing).
    #[error("placement error: {0}")]
    Placement(String),

    /// Ownership violations detected while resolving the composition forest.
    #[error("structural error: {0}")]
    Structural(String),

    /// Errors while serializing the forest to output text.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing the timeline model.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MontageError {
    /// Build a [`MontageError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`MontageError::Placement`] value.
    pub fn placement(msg: impl Into<String>) -> Self {
        Self::Placement(msg.into())
    }

    /// Build a [`MontageError::Structural`] value.
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    /// Build a [`MontageError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`MontageError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
