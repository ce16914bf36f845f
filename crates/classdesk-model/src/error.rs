//! Error types for the model layer.

/// Errors raised while encoding or decoding model values.
///
/// Only the codec produces these today. A persisted [`SessionRecord`]
/// that fails to decode surfaces here before the session layer decides
/// to treat it as absent.
///
/// [`SessionRecord`]: crate::SessionRecord
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
