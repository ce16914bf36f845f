//! The remote store boundary for Classdesk.
//!
//! The hosted backend is reached through one narrow trait,
//! [`RemoteStore`], with typed requests and responses:
//!
//! - **Auth** — [`Credentials`], [`SignUpRequest`], [`AuthSession`]
//! - **Tables** — any [`Row`] type, filtered by a [`Query`]
//! - **Rpc** — stored functions such as [`SOFT_DELETE_RECORD`]
//!
//! [`MemoryBackend`] / [`MemoryRemote`] implement the trait in memory
//! for tests and the demo.
//!
//! # How it fits in the stack
//!
//! ```text
//! Session / Cache layers (above)  ← call RemoteStore
//!     ↕
//! Remote layer (this crate)       ← typed rows in, typed rows out
//!     ↕
//! Hosted backend (outside)        ← its own wire format and schema
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod memory;
mod query;
mod row;
mod store;

pub use auth::{AuthSession, Credentials, SignUpOutcome, SignUpRequest};
pub use error::RemoteError;
pub use memory::{AUTH, MemoryBackend, MemoryRemote, Operation};
pub use query::{Order, Query};
pub use row::Row;
pub use store::{RESTORE_RECORD, RecordRef, RemoteStore, SOFT_DELETE_RECORD};
