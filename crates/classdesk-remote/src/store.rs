//! The [`RemoteStore`] trait: everything the client asks of its backend.
//!
//! The hosted backend is opaque to us. We only rely on a handful of
//! CRUD-style table calls, an rpc escape hatch, and an auth sub-API.
//! Keeping that surface in one trait means the session and cache layers
//! can run against a real HTTP adapter in production and
//! [`MemoryRemote`](crate::MemoryRemote) in tests without changing.

use std::future::Future;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    AuthSession, Credentials, Query, RemoteError, Row, SignUpOutcome,
    SignUpRequest,
};

/// Rpc that marks a row deleted without removing it.
pub const SOFT_DELETE_RECORD: &str = "soft_delete_record";

/// Rpc that clears a soft delete. Answers with the restored row.
pub const RESTORE_RECORD: &str = "restore_record";

/// Arguments for [`SOFT_DELETE_RECORD`] and [`RESTORE_RECORD`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub table: String,
    pub id: String,
}

impl RecordRef {
    pub fn of<T: Row>(id: &str) -> Self {
        Self {
            table: T::TABLE.to_string(),
            id: id.to_string(),
        }
    }
}

/// A connection to the remote persistent store.
///
/// One value represents one client: its auth calls change *this*
/// client's signed-in session, while table calls read and write data
/// shared with every other client of the same store.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because a single store is shared (behind an
/// `Arc`) by the session store and the entity cache for the life of the
/// process.
pub trait RemoteStore: Send + Sync + 'static {
    // -- Auth ----------------------------------------------------------

    /// Signs in with email and password.
    ///
    /// # Errors
    /// [`RemoteError::Auth`] if the credentials are rejected.
    fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthSession, RemoteError>> + Send;

    /// Creates an account.
    fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> impl Future<Output = Result<SignUpOutcome, RemoteError>> + Send;

    /// Ends this client's auth session.
    fn sign_out(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Returns this client's current auth session, if any.
    fn get_session(
        &self,
    ) -> impl Future<Output = Result<Option<AuthSession>, RemoteError>> + Send;

    // -- Tables --------------------------------------------------------

    /// Reads every row of `T::TABLE` matching `query`.
    fn select<T: Row>(
        &self,
        query: &Query,
    ) -> impl Future<Output = Result<Vec<T>, RemoteError>> + Send;

    /// Inserts a new row and answers with the stored row
    /// (server-assigned id and timestamps filled in).
    fn insert<T: Row>(
        &self,
        draft: &T::Draft,
    ) -> impl Future<Output = Result<T, RemoteError>> + Send;

    /// Applies `patch` to every row matching `query`. Answers with the
    /// updated rows, which may be empty.
    fn update<T: Row>(
        &self,
        query: &Query,
        patch: &T::Patch,
    ) -> impl Future<Output = Result<Vec<T>, RemoteError>> + Send;

    /// Inserts or overwrites the row whose `T::KEY` column matches the
    /// draft's.
    fn upsert<T: Row>(
        &self,
        draft: &T::Draft,
    ) -> impl Future<Output = Result<T, RemoteError>> + Send;

    /// Deletes every row matching `query`. Answers with how many went.
    fn delete<T: Row>(
        &self,
        query: &Query,
    ) -> impl Future<Output = Result<u64, RemoteError>> + Send;

    /// Calls a stored function.
    fn rpc<A, T>(
        &self,
        function: &str,
        args: &A,
    ) -> impl Future<Output = Result<T, RemoteError>> + Send
    where
        A: Serialize + Sync,
        T: DeserializeOwned + Send;
}
