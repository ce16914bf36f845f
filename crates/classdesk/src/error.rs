//! Unified error type for the Classdesk client.

use classdesk_cache::CacheError;
use classdesk_model::ModelError;
use classdesk_remote::RemoteError;
use classdesk_session::SessionError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `classdesk` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate. The
/// `#[from]` attribute on each variant lets `?` convert sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum ClassdeskError {
    /// A model error (record encode/decode).
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A remote store call failed outside a session or cache flow.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A session flow failed (auth, concurrent session, profile load).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A cache refresh or mutation failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The environment carried an unusable setting.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
