/// Convenience result type used across the dressing room core.
pub type RoomResult<T> = Result<T, RoomError>;

/// Top-level error taxonomy.
///
/// Asset and capture failures are normally absorbed by the caller and degrade to placeholder
/// rendering; composition failures are handed back to the poster caller as a result.
#[derive(thiserror::Error, Debug)]
pub enum RoomError {
    /// Invalid user-provided data or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or corrupt mesh resource. Never cached, so a later load retries.
    #[error("asset load error: {0}")]
    AssetLoad(String),

    /// Garment references bones its body skeleton does not define.
    #[error("binding mismatch: {0}")]
    BindingMismatch(String),

    /// Viewport absent or not yet initialized.
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),

    /// Poster flattening or encoding failed.
    #[error("composition error: {0}")]
    Composition(String),

    /// A poster cycle is already running.
    #[error("pipeline busy: {0}")]
    Busy(String),

    /// Errors when serializing or deserializing configuration and rig documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RoomError {
    /// Build a [`RoomError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RoomError::AssetLoad`] value.
    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    /// Build a [`RoomError::BindingMismatch`] value.
    pub fn binding_mismatch(msg: impl Into<String>) -> Self {
        Self::BindingMismatch(msg.into())
    }

    /// Build a [`RoomError::CaptureUnavailable`] value.
    pub fn capture_unavailable(msg: impl Into<String>) -> Self {
        Self::CaptureUnavailable(msg.into())
    }

    /// Build a [`RoomError::Composition`] value.
    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    /// Build a [`RoomError::Busy`] value.
    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    /// Build a [`RoomError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AssetLoad(_) | Self::Composition(_) | Self::Busy(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
