//! The session store: the client's one source of "who is signed in".
//!
//! It owns three pieces of state and keeps them in step:
//!
//! - the in-memory [`SessionState`] (identity + session id);
//! - the local [`SessionRecord`] in [`LocalStorage`];
//! - the remote registry entry, through [`SessionRegistry`].
//!
//! # Serialization
//!
//! Lifecycle calls (`restore_session`, `login_with_email`,
//! `register_with_email`, `logout`) run one at a time behind an async
//! gate. Two navigations racing to restore the session therefore fetch
//! the profile once: the second caller waits, then finds the store
//! already authenticated.
//!
//! # Failure
//!
//! A failed flow puts the in-memory state back to what it was before the
//! call. Nothing is half-signed-in after an error.

use std::sync::{Arc, PoisonError, RwLock};

use classdesk_model::{
    Codec, JsonCodec, Role, SessionId, SessionRecord, UserId, UserIdentity,
};
use classdesk_remote::{Credentials, Query, RemoteError, RemoteStore, SignUpRequest};
use tokio::sync::Mutex;

use crate::{
    ActiveSession, LocalStorage, RegisterOutcome, RegisterRequest,
    SessionConfig, SessionError, SessionRegistry, SessionState, default_route,
};

/// Restores, creates, and tears down the current user's session.
///
/// Construct one per client process and share it (it is `Send + Sync`).
pub struct SessionStore<R, S, C = JsonCodec> {
    remote: Arc<R>,
    storage: Arc<S>,
    registry: SessionRegistry<R>,
    codec: C,
    config: SessionConfig,
    state: RwLock<SessionState>,
    gate: Mutex<()>,
}

impl<R: RemoteStore, S: LocalStorage> SessionStore<R, S, JsonCodec> {
    /// Creates an anonymous store persisting its record as JSON.
    pub fn new(remote: Arc<R>, storage: Arc<S>, config: SessionConfig) -> Self {
        Self::with_codec(remote, storage, config, JsonCodec)
    }
}

impl<R, S, C> SessionStore<R, S, C>
where
    R: RemoteStore,
    S: LocalStorage,
    C: Codec,
{
    /// Creates an anonymous store with a custom record codec.
    pub fn with_codec(
        remote: Arc<R>,
        storage: Arc<S>,
        config: SessionConfig,
        codec: C,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(Arc::clone(&remote)),
            remote,
            storage,
            codec,
            config,
            state: RwLock::new(SessionState::Anonymous),
            gate: Mutex::new(()),
        }
    }

    // -- Accessors -----------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.active().is_some()
    }

    pub fn active(&self) -> Option<ActiveSession> {
        self.state().active().cloned()
    }

    pub fn identity(&self) -> Option<UserIdentity> {
        self.active().map(|a| a.identity)
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.active().map(|a| a.session_id)
    }

    pub fn role(&self) -> Option<Role> {
        self.active().map(|a| a.identity.role)
    }

    /// Landing route for the current user, or the login page.
    pub fn default_route(&self) -> &'static str {
        default_route(self.role())
    }

    pub fn registry(&self) -> &SessionRegistry<R> {
        &self.registry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // -- Lifecycle -----------------------------------------------------

    /// Brings back the session a previous page load left behind.
    ///
    /// Does nothing when already authenticated. Otherwise resolves a
    /// user from the local [`SessionRecord`] or, failing that, from the
    /// remote store's own auth session. A resolved user's profile is
    /// loaded; a session id is reused from the local record if there was
    /// one, or minted and claimed if not.
    ///
    /// Resolving no user is not an error: the store stays anonymous.
    ///
    /// # Errors
    /// - [`SessionError::ProfileLoad`] if the profile row can't be read
    /// - [`SessionError::ClaimFailed`] if a fresh claim is rejected
    pub async fn restore_session(&self) -> Result<(), SessionError> {
        let _gate = self.gate.lock().await;
        if self.is_authenticated() {
            return Ok(());
        }
        let previous = self.begin();
        let result = self.restore_inner().await;
        self.settle(previous, &result);
        result
    }

    async fn restore_inner(&self) -> Result<(), SessionError> {
        let existing = self.read_record();
        let user_id = match &existing {
            Some(record) => record.user_id.clone(),
            None => match self.remote.get_session().await {
                Ok(Some(auth)) => auth.user_id,
                Ok(None) => {
                    self.set_state(SessionState::Anonymous);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not read remote auth session");
                    self.set_state(SessionState::Anonymous);
                    return Ok(());
                }
            },
        };

        let identity = self.load_identity(&user_id).await?;
        let session_id = match existing {
            Some(record) => record.session_id,
            None => self.claim_new(&user_id).await?,
        };
        tracing::info!(%user_id, %session_id, "session restored");
        self.authenticate(identity, session_id);
        Ok(())
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    /// - [`SessionError::Auth`] if the store rejects the credentials
    /// - [`SessionError::ConcurrentSession`] if this storage scope
    ///   already holds a different session for the same account
    /// - [`SessionError::ProfileLoad`] / [`SessionError::ClaimFailed`]
    pub async fn login_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserIdentity, SessionError> {
        let _gate = self.gate.lock().await;
        let previous = self.begin();
        let current = previous.active().map(|a| a.session_id.clone());
        let result = self.login_inner(email, password, current.as_ref()).await;
        self.settle(previous, &result);
        result
    }

    async fn login_inner(
        &self,
        email: &str,
        password: &str,
        current: Option<&SessionId>,
    ) -> Result<UserIdentity, SessionError> {
        let auth = self
            .remote
            .sign_in(&Credentials::new(email, password))
            .await
            .map_err(SessionError::Auth)?;
        self.check_conflict(&auth.user_id, current)?;

        let identity = self.load_identity(&auth.user_id).await?;
        let session_id = self.claim_new(&auth.user_id).await?;
        tracing::info!(user_id = %auth.user_id, %session_id, "logged in");
        self.authenticate(identity.clone(), session_id);
        Ok(identity)
    }

    /// Creates an account and signs into it.
    ///
    /// When the store wants the email confirmed first, the outcome says
    /// so; the session is still established for the new user id.
    ///
    /// # Errors
    /// Same as [`login_with_email`](Self::login_with_email), plus
    /// [`SessionError::Auth`] when sign-up yields no user id at all.
    pub async fn register_with_email(
        &self,
        request: RegisterRequest,
    ) -> Result<RegisterOutcome, SessionError> {
        let _gate = self.gate.lock().await;
        let previous = self.begin();
        let current = previous.active().map(|a| a.session_id.clone());
        let result = self.register_inner(request, current.as_ref()).await;
        self.settle(previous, &result);
        result
    }

    async fn register_inner(
        &self,
        request: RegisterRequest,
        current: Option<&SessionId>,
    ) -> Result<RegisterOutcome, SessionError> {
        let email_redirect_to = if request.require_email_verification {
            request.email_redirect_to
        } else {
            None
        };
        let outcome = self
            .remote
            .sign_up(&SignUpRequest {
                email: request.email,
                password: request.password,
                full_name: request.full_name,
                phone: request.phone,
                requested_role: request.role,
                email_redirect_to,
            })
            .await
            .map_err(SessionError::Auth)?;

        let needs_email_confirmation = outcome.session.is_none();
        let user_id = outcome
            .session
            .map(|s| s.user_id)
            .or(outcome.user_id)
            .ok_or_else(|| {
                SessionError::Auth(RemoteError::Auth(
                    "registered; confirm your email before signing in".into(),
                ))
            })?;
        self.check_conflict(&user_id, current)?;

        let identity = self.load_identity(&user_id).await?;
        let session_id = self.claim_new(&user_id).await?;
        tracing::info!(%user_id, %session_id, needs_email_confirmation, "registered");
        self.authenticate(identity, session_id);
        Ok(RegisterOutcome {
            needs_email_confirmation,
        })
    }

    /// Signs out.
    ///
    /// The local record is erased only if it still belongs to this
    /// session. Remote sign-out is always attempted, and the in-memory
    /// session is always cleared, even when sign-out fails.
    pub async fn logout(&self) {
        let _gate = self.gate.lock().await;
        let current = self.session_id();

        if let Some(record) = self.read_record() {
            if current.as_ref() == Some(&record.session_id) {
                if let Err(e) = self.storage.remove(&self.config.storage_key) {
                    tracing::warn!(error = %e, "could not erase local session record");
                }
            }
        }
        if let Err(e) = self.remote.sign_out().await {
            tracing::warn!(error = %e, "remote sign-out failed; clearing local session anyway");
        }

        self.set_state(SessionState::Anonymous);
        tracing::info!(session_id = ?current.map(|s| s.0), "logged out");
    }

    // -- Internals -----------------------------------------------------

    /// Reads the local record. Unreadable or corrupt records count as
    /// absent.
    pub fn read_record(&self) -> Option<SessionRecord> {
        let raw = match self.storage.get(&self.config.storage_key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "could not read local session record");
                return None;
            }
        };
        match self.codec.decode(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::error!(error = %e, "failed to parse local session record");
                None
            }
        }
    }

    fn write_record(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let raw = self.codec.encode(record)?;
        self.storage.set(&self.config.storage_key, &raw)?;
        Ok(())
    }

    /// Rejects a login that would displace a different live session for
    /// the same account held in this storage scope.
    fn check_conflict(
        &self,
        user_id: &UserId,
        current: Option<&SessionId>,
    ) -> Result<(), SessionError> {
        match self.read_record() {
            Some(record)
                if record.user_id == *user_id
                    && Some(&record.session_id) != current =>
            {
                tracing::warn!(%user_id, "another session is active in this storage scope");
                Err(SessionError::ConcurrentSession(user_id.clone()))
            }
            _ => Ok(()),
        }
    }

    async fn load_identity(&self, user_id: &UserId) -> Result<UserIdentity, SessionError> {
        let profile_error = |reason: String| SessionError::ProfileLoad {
            user_id: user_id.clone(),
            reason,
        };
        let rows = self
            .remote
            .select::<UserIdentity>(&Query::all().eq("id", user_id.as_str()))
            .await
            .map_err(|e| profile_error(e.to_string()))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| profile_error("no profile row".into()))
    }

    /// Mints a session id, claims it remotely, and persists it locally.
    async fn claim_new(&self, user_id: &UserId) -> Result<SessionId, SessionError> {
        let session_id = SessionId::generate();
        self.registry
            .claim(user_id, &session_id)
            .await
            .map_err(SessionError::ClaimFailed)?;
        self.write_record(&SessionRecord {
            user_id: user_id.clone(),
            session_id: session_id.clone(),
        })?;
        Ok(session_id)
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn begin(&self) -> SessionState {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *state, SessionState::Authenticating)
    }

    fn settle<T>(&self, previous: SessionState, result: &Result<T, SessionError>) {
        if let Err(e) = result {
            tracing::info!(error = %e, "session flow failed");
            self.set_state(previous);
        }
    }

    fn authenticate(&self, identity: UserIdentity, session_id: SessionId) {
        self.set_state(SessionState::Authenticated(ActiveSession {
            identity,
            session_id,
        }));
    }
}
