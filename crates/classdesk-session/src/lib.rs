//! Session integrity for Classdesk.
//!
//! This crate decides who is signed in and keeps that answer consistent
//! across reloads, tabs, and devices:
//!
//! 1. **Restore**: bring back the session a previous page load left in
//!    [`LocalStorage`] ([`SessionStore::restore_session`])
//! 2. **Login / register**: mint a fresh session id and claim it in the
//!    remote [`SessionRegistry`], where the last login wins
//! 3. **Logout**: erase the local record only if it is still ours
//!
//! # How it fits in the stack
//!
//! ```text
//! Client context (above)  ← route guard, idle logout, cache invalidation
//!     ↕
//! Session Layer (this crate)  ← identity, session ids, local record
//!     ↕
//! Remote Layer (below)  ← auth calls, the active_sessions table
//! ```

mod error;
mod registry;
mod roles;
mod session;
mod storage;
mod store;

pub use error::SessionError;
pub use registry::SessionRegistry;
pub use roles::{
    ACCOUNTS_OVERVIEW_PATH, BOOKING_OVERVIEW_PATH, LOGIN_PATH, REGISTER_PATH,
    STUDENT_BOOKINGS_PATH, can_access_role, default_route,
};
pub use session::{
    ActiveSession, RegisterOutcome, RegisterRequest, SessionConfig, SessionState,
};
pub use storage::{FileStorage, LocalStorage, MemoryStorage};
pub use store::SessionStore;
