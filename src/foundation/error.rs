/// Convenience result alias used across the crate.
pub type SvgaResult<T> = Result<T, SvgaError>;

/// Error taxonomy for decoding, building, playback and rendering.
///
/// Decode and build errors are fatal to the call that produced them. `RenderTransient` is
/// per-frame: the player logs it and keeps ticking.
#[derive(thiserror::Error, Debug)]
pub enum SvgaError {
    /// Bad magic, short header or a malformed body.
    #[error("format error: {0}")]
    Format(String),

    /// The header declares a major version this crate cannot decode.
    #[error("unsupported format version {major}.{minor}")]
    Version {
        /// Declared major version.
        major: u8,
        /// Declared minor version.
        minor: u8,
    },

    /// A declared length or fixed-width field runs past the end of the buffer.
    #[error("truncated input: {0}")]
    Truncated(String),

    /// An image referenced by a sprite could not be decoded.
    #[error("image decode error for key '{key}': {message}")]
    ImageDecode {
        /// Image key of the failing payload.
        key: String,
        /// Decoder message.
        message: String,
    },

    /// A playback operation was invoked before any entity was mounted.
    #[error("no video entity is mounted")]
    NotMounted,

    /// The operation is not valid in the player's current state.
    #[error("invalid player state: {0}")]
    InvalidState(String),

    /// The player was destroyed; no further operation is valid.
    #[error("player has been destroyed")]
    Destroyed,

    /// A single frame failed to render.
    #[error("render error: {0}")]
    RenderTransient(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SvgaError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn truncated(msg: impl Into<String>) -> Self {
        Self::Truncated(msg.into())
    }

    pub fn image_decode(key: impl Into<String>, msg: impl std::fmt::Display) -> Self {
        Self::ImageDecode {
            key: key.into(),
            message: msg.to_string(),
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::RenderTransient(msg.into())
    }

    /// Return `true` for errors produced while reading the container.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::Format(_) | Self::Version { .. } | Self::Truncated(_)
        )
    }
}
