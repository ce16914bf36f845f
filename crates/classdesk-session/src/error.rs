//! Error types for the session layer.

use classdesk_model::UserId;
use classdesk_remote::RemoteError;

/// Errors that can occur while restoring, creating, or ending a session.
///
/// Every variant leaves the [`SessionStore`](crate::SessionStore) in a
/// well-defined state: the one it was in before the failed call
/// (normally `Anonymous`).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The remote store rejected the credentials or the sign-up.
    #[error("authentication failed: {0}")]
    Auth(#[source] RemoteError),

    /// This storage scope already holds a live session for the account.
    #[error("account {0} already has another active session")]
    ConcurrentSession(UserId),

    /// Auth succeeded but the profile row couldn't be read.
    #[error("could not load profile for {user_id}: {reason}")]
    ProfileLoad { user_id: UserId, reason: String },

    /// The registry refused the session claim.
    #[error("could not claim session: {0}")]
    ClaimFailed(#[source] RemoteError),

    /// Local storage couldn't be read or written.
    #[error("local storage failed: {0}")]
    Storage(#[from] std::io::Error),

    /// The session record couldn't be encoded for storage.
    #[error("could not encode session record: {0}")]
    Encode(#[from] classdesk_model::ModelError),
}
