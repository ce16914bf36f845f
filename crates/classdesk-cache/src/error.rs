//! Error types for the entity cache.

use classdesk_remote::RemoteError;

/// Errors that can occur while refreshing or writing through the cache.
///
/// None of them leave the mirror in a state the remote store didn't
/// confirm: a failed refresh keeps whatever collections did load, and a
/// failed mutation leaves the mirror untouched.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A collection fetch failed during a refresh.
    #[error("failed to refresh {collection}: {source}")]
    Refresh {
        collection: &'static str,
        #[source]
        source: RemoteError,
    },

    /// The remote store rejected a write.
    #[error("{collection} write rejected: {source}")]
    Mutation {
        collection: &'static str,
        #[source]
        source: RemoteError,
    },

    /// An update matched no row.
    #[error("{collection} {id} not found")]
    NotFound { collection: &'static str, id: String },
}
