//! The session registry: which session speaks for each account.
//!
//! The registry lives remotely as one row per user (`active_sessions`,
//! keyed on `user_id`). A claim is an upsert, so the most recent login
//! always wins and there is never more than one row per account.
//!
//! Nothing is pushed to the device that lost. Its local record simply
//! stops matching the registry, and that only matters the next time
//! that device logs in. A session already active in memory keeps
//! running.

use std::sync::Arc;

use classdesk_model::{SessionId, SessionRegistryEntry, UserId};
use classdesk_remote::{Query, RemoteError, RemoteStore, Row};

/// Claims and reads the authoritative session for an account.
pub struct SessionRegistry<R> {
    remote: Arc<R>,
}

// Hand-written so `R` itself needn't be `Clone`; only the `Arc` is cloned.
impl<R> Clone for SessionRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
        }
    }
}

impl<R: RemoteStore> SessionRegistry<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self { remote }
    }

    /// Makes `session_id` the authoritative session for `user_id`,
    /// overwriting whatever was there.
    ///
    /// # Errors
    /// Returns the store's error if the upsert is rejected.
    pub async fn claim(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<SessionRegistryEntry, RemoteError> {
        let entry = self
            .remote
            .upsert::<SessionRegistryEntry>(&SessionRegistryEntry {
                user_id: user_id.clone(),
                session_id: session_id.clone(),
            })
            .await?;
        tracing::info!(%user_id, %session_id, "session claimed");
        Ok(entry)
    }

    /// Reads the session currently registered for `user_id`.
    pub async fn current(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SessionId>, RemoteError> {
        let query = Query::all().eq(SessionRegistryEntry::KEY, user_id.as_str());
        let rows = self.remote.select::<SessionRegistryEntry>(&query).await?;
        Ok(rows.into_iter().next().map(|entry| entry.session_id))
    }
}
