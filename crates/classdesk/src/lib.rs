//! # Classdesk
//!
//! Session integrity and entity caching for the Classdesk teaching
//! platform client.
//!
//! Classdesk keeps one authoritative session per account, restores it
//! deterministically on reload, and mirrors the platform's entities
//! (teachers, students, bookings, payroll, leave requests) in a cache
//! that only ever shows what the remote store confirmed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use classdesk::prelude::*;
//!
//! # async fn run() -> Result<(), ClassdeskError> {
//! init_logging();
//! let backend = MemoryBackend::new();
//! let client = Client::builder(Arc::new(backend.connect()), Arc::new(MemoryStorage::new()))
//!     .config(ClientConfig::from_env()?)
//!     .build();
//!
//! client.login("admin@example.com", "password").await?;
//! assert_eq!(client.navigate("/system/accounts").await, Decision::Allow);
//! client.logout().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Layer | Crate |
//! |---|---|
//! | rows, ids, records | [`model`] |
//! | remote store boundary | [`remote`] |
//! | session registry and store | [`session`] |
//! | entity cache | [`cache`] |
//! | inactivity logout | [`idle`] |

mod client;
mod config;
mod error;
mod guard;
mod logging;

pub use client::{Client, ClientBuilder};
pub use config::{
    ClientConfig, ConfigError, IDLE_TIMEOUT_VAR, STORAGE_DIR_VAR, STORAGE_KEY_VAR,
};
pub use error::ClassdeskError;
pub use guard::{Decision, RouteGuard, RouteMeta, RouteTable};
pub use logging::{DEFAULT_LOG_FILTER, init_logging};

pub use classdesk_cache as cache;
pub use classdesk_idle as idle;
pub use classdesk_model as model;
pub use classdesk_remote as remote;
pub use classdesk_session as session;

/// The types most callers need, in one import.
pub mod prelude {
    pub use crate::{
        ClassdeskError, Client, ClientBuilder, ClientConfig, Decision, RouteGuard, RouteMeta,
        RouteTable, init_logging,
    };
    pub use classdesk_cache::{BookingView, CacheError, EntityCache, Mirror};
    pub use classdesk_idle::{IdleConfig, IdleMonitor};
    pub use classdesk_model::{Role, SessionId, UserId, UserIdentity};
    pub use classdesk_remote::{MemoryBackend, MemoryRemote, RemoteError, RemoteStore};
    pub use classdesk_session::{
        FileStorage, LocalStorage, MemoryStorage, RegisterRequest, SessionConfig, SessionError,
        SessionState, SessionStore,
    };
}
