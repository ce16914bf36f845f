//! Codecs for persisting model values as text.
//!
//! Local storage only holds strings, so anything we persist there goes
//! through a [`Codec`]. The session layer is generic over the codec;
//! [`JsonCodec`] is the default.

use serde::{Serialize, de::DeserializeOwned};

use crate::ModelError;

/// Converts values to and from their stored string form.
///
/// `Send + Sync + 'static` so a codec can live inside a session store
/// that is shared across Tokio tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value for storage.
    ///
    /// # Errors
    /// Returns [`ModelError::Encode`] if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ModelError>;

    /// Parses a stored value back.
    ///
    /// # Errors
    /// Returns [`ModelError::Decode`] if the text is malformed or has
    /// the wrong shape.
    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, ModelError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use classdesk_model::{Codec, JsonCodec, SessionId, SessionRecord, UserId};
///
/// let record = SessionRecord {
///     user_id: UserId::from("u1"),
///     session_id: SessionId::from("s1"),
/// };
/// let text = JsonCodec.encode(&record).unwrap();
/// let back: SessionRecord = JsonCodec.decode(&text).unwrap();
/// assert_eq!(record, back);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ModelError> {
        serde_json::to_string(value).map_err(ModelError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, ModelError> {
        serde_json::from_str(data).map_err(ModelError::Decode)
    }
}
