//! Session types: configuration, lifecycle state, and flow payloads.

use classdesk_model::{Role, SessionId, UserIdentity};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Storage key holding the serialized [`SessionRecord`].
    ///
    /// [`SessionRecord`]: classdesk_model::SessionRecord
    pub storage_key: String,
}

impl SessionConfig {
    pub const DEFAULT_STORAGE_KEY: &'static str = "teaching-platform-active-session";
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: Self::DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the session store is in its lifecycle.
///
/// ```text
///   Anonymous ──(restore/login/register)──→ Authenticating ──→ Authenticated
///       ↑                                        │                  │
///       └──────────────(failure)─────────────────┘                  │
///       └──────────────────────────(logout)─────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated(ActiveSession),
}

impl SessionState {
    pub fn active(&self) -> Option<&ActiveSession> {
        match self {
            Self::Authenticated(active) => Some(active),
            _ => None,
        }
    }
}

/// The identity and session id of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub identity: UserIdentity,
    pub session_id: SessionId,
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Everything the registration form collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Role,
    /// Ask the store to send a confirmation mail pointing at
    /// `email_redirect_to`.
    pub require_email_verification: bool,
    pub email_redirect_to: Option<String>,
}

/// What a successful registration tells the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterOutcome {
    /// The store wants the email confirmed before the next sign-in.
    pub needs_email_confirmation: bool,
}
