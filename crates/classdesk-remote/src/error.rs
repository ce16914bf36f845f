//! Error types for the remote store boundary.

/// Errors a [`RemoteStore`](crate::RemoteStore) call can return.
///
/// Adapters map their own failures (HTTP status, SQL error, network
/// timeout) into these variants so the session and cache layers can
/// react without knowing which backend they talk to.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Credentials were rejected, the account doesn't exist, or sign-up
    /// was refused.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The store refused a read or write on a table (constraint
    /// violation, permission rule, missing key column).
    #[error("{table}: request rejected: {message}")]
    Rejected { table: String, message: String },

    /// A row came back in a shape the typed row can't hold.
    #[error("{table}: row decode failed: {source}")]
    Decode {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    /// The rpc function doesn't exist on the store.
    #[error("unknown rpc function: {0}")]
    UnknownRpc(String),

    /// The store couldn't be reached or didn't answer.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
}

impl RemoteError {
    pub(crate) fn rejected(table: &str, message: impl Into<String>) -> Self {
        Self::Rejected {
            table: table.to_string(),
            message: message.into(),
        }
    }
}
