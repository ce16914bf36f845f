//! `Client` builder and context object.
//!
//! A [`Client`] is the one place the session store, entity cache, and
//! route guard live. Build one per process and hand out references (or
//! an `Arc`) to whatever renders views.

use std::sync::Arc;

use classdesk_cache::EntityCache;
use classdesk_idle::{IdleConfig, IdleMonitor};
use classdesk_model::{UserId, UserIdentity};
use classdesk_remote::RemoteStore;
use classdesk_session::{
    LocalStorage, RegisterOutcome, RegisterRequest, SessionConfig, SessionStore,
};

use crate::{ClassdeskError, ClientConfig, Decision, RouteGuard, RouteTable};

/// Builder for a [`Client`].
///
/// # Example
///
/// ```rust,ignore
/// use classdesk::prelude::*;
///
/// let client = Client::builder(Arc::new(remote), Arc::new(MemoryStorage::new()))
///     .config(ClientConfig::from_env()?)
///     .build();
/// ```
pub struct ClientBuilder<R, S> {
    remote: Arc<R>,
    storage: Arc<S>,
    config: ClientConfig,
    routes: RouteTable,
}

impl<R: RemoteStore, S: LocalStorage> ClientBuilder<R, S> {
    pub fn new(remote: Arc<R>, storage: Arc<S>) -> Self {
        Self {
            remote,
            storage,
            config: ClientConfig::default(),
            routes: RouteTable::standard(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    pub fn idle_config(mut self, config: IdleConfig) -> Self {
        self.config.idle = config;
        self
    }

    /// Replaces the standard route table.
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn build(self) -> Client<R, S> {
        let session = SessionStore::new(
            Arc::clone(&self.remote),
            self.storage,
            self.config.session.clone(),
        );
        let cache = EntityCache::new(Arc::clone(&self.remote));
        tracing::debug!(
            storage_key = %self.config.session.storage_key,
            idle_timeout_secs = self.config.idle.timeout.as_secs(),
            "client built"
        );
        Client {
            remote: self.remote,
            session,
            cache,
            guard: RouteGuard::new(self.routes),
            config: self.config,
        }
    }
}

/// The client context: session, cache, and guard for one process.
pub struct Client<R, S> {
    remote: Arc<R>,
    session: SessionStore<R, S>,
    cache: EntityCache<R>,
    guard: RouteGuard,
    config: ClientConfig,
}

impl<R: RemoteStore, S: LocalStorage> Client<R, S> {
    pub fn builder(remote: Arc<R>, storage: Arc<S>) -> ClientBuilder<R, S> {
        ClientBuilder::new(remote, storage)
    }

    pub fn session(&self) -> &SessionStore<R, S> {
        &self.session
    }

    pub fn cache(&self) -> &EntityCache<R> {
        &self.cache
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Checks a navigation before the view renders.
    pub async fn navigate(&self, target: &str) -> Decision {
        let decision = self.guard.decide(target, &self.session, &self.cache).await;
        tracing::debug!(path = target, ?decision, "navigation decided");
        decision
    }

    /// Signs in. The cache is loaded on the next protected navigation.
    ///
    /// Signing in as a different account than the one already active
    /// drops the cached rows, which belong to the previous user.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserIdentity, ClassdeskError> {
        let previous = self.signed_in_user();
        let identity = self.session.login_with_email(email, password).await?;
        self.drop_cache_on_user_change(previous).await;
        Ok(identity)
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterOutcome, ClassdeskError> {
        let previous = self.signed_in_user();
        let outcome = self.session.register_with_email(request).await?;
        self.drop_cache_on_user_change(previous).await;
        Ok(outcome)
    }

    fn signed_in_user(&self) -> Option<UserId> {
        self.session.identity().map(|identity| identity.id)
    }

    async fn drop_cache_on_user_change(&self, previous: Option<UserId>) {
        let Some(previous) = previous else {
            return;
        };
        if self.signed_in_user().as_ref() != Some(&previous) {
            tracing::info!(previous_user = %previous, "account switched; dropping cached rows");
            self.cache.invalidate().await;
        }
    }

    /// Signs out and drops every cached row.
    ///
    /// The cache is emptied before the session is torn down, so no view
    /// can read the previous user's data once this starts.
    pub async fn logout(&self) {
        self.cache.invalidate().await;
        self.session.logout().await;
    }

    /// Starts an inactivity timer that logs this client out.
    ///
    /// The timer holds a weak reference: dropping the last `Arc<Client>`
    /// makes a later timeout a no-op. Call [`IdleMonitor::touch`] on
    /// user activity.
    pub fn spawn_idle_logout(self: &Arc<Self>) -> IdleMonitor {
        let client = Arc::downgrade(self);
        IdleMonitor::spawn(self.config.idle.clone(), move || async move {
            match client.upgrade() {
                Some(client) => {
                    tracing::info!("logging out after inactivity");
                    client.logout().await;
                }
                None => tracing::debug!("idle timeout after client dropped"),
            }
        })
    }
}
