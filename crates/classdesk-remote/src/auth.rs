//! Request and response types for the store's auth sub-API.

use classdesk_model::{Role, UserId};
use serde::{Deserialize, Serialize};

/// Email/password credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// The store's own notion of a signed-in session.
///
/// This is the auth provider's session, not a Classdesk session claim.
/// Its `user_id` is what [`RemoteStore::get_session`] lets a reloaded
/// client recover.
///
/// [`RemoteStore::get_session`]: crate::RemoteStore::get_session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: UserId,
    pub access_token: String,
}

/// A new account request. The profile metadata is handed to the store,
/// which creates the `user_profiles` row itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub requested_role: Role,
    /// Where the confirmation mail should send the user back to.
    pub email_redirect_to: Option<String>,
}

/// What sign-up produced.
///
/// When the store requires email confirmation, `user_id` is set but
/// `session` is `None` until the user confirms and signs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpOutcome {
    pub user_id: Option<UserId>,
    pub session: Option<AuthSession>,
}
