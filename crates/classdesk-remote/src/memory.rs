//! An in-memory remote store.
//!
//! [`MemoryBackend`] plays the hosted backend: tables of JSON rows plus
//! an account list, shared by every client connected to it.
//! [`MemoryRemote`] is one client's connection, with its own auth
//! session. Two `MemoryRemote`s from the same backend behave like two
//! devices signed in to the same project: they see the same data but
//! sign in and out independently.
//!
//! The backend also emulates the parts of the hosted store the client
//! relies on without calling directly:
//!
//! - sign-up creates the `user_profiles` row (a database trigger upstream);
//! - inserts assign `id`, `created_at`, and `updated_at`;
//! - selects skip rows whose `deleted_at` is set;
//! - [`SOFT_DELETE_RECORD`] and [`RESTORE_RECORD`] rpc functions.
//!
//! Tests use the fault switches ([`fail_table`](MemoryBackend::fail_table),
//! [`set_auth_down`](MemoryBackend::set_auth_down), ...) and
//! [`call_count`](MemoryBackend::call_count) to observe what the client
//! layers actually sent.
//!
//! # Locking
//!
//! State sits behind a `std::sync::Mutex` that is only ever held inside
//! synchronous closures, never across an `.await`. Every async call
//! yields once before touching state so concurrent callers genuinely
//! interleave.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{SecondsFormat, Utc};
use classdesk_model::{UserId, UserIdentity};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    AuthSession, Credentials, Query, RESTORE_RECORD, RecordRef, RemoteError,
    RemoteStore, Row, SOFT_DELETE_RECORD, SignUpOutcome, SignUpRequest,
};

/// Call-accounting key for auth operations.
pub const AUTH: &str = "auth";

/// The kind of call recorded by [`MemoryBackend::call_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SignIn,
    SignUp,
    SignOut,
    GetSession,
    Select,
    Insert,
    Update,
    Upsert,
    Delete,
    Rpc,
}

struct Account {
    user_id: UserId,
    password: String,
    confirmed: bool,
}

#[derive(Default)]
struct BackendState {
    tables: HashMap<String, Vec<Value>>,
    /// Keyed by email.
    accounts: HashMap<String, Account>,
    require_email_confirmation: bool,
    failing: HashSet<String>,
    auth_down: bool,
    sign_out_down: bool,
    calls: HashMap<(Operation, String), u64>,
}

impl BackendState {
    /// Records the call and applies any fault switched on for `target`.
    fn enter(&mut self, op: Operation, target: &str) -> Result<(), RemoteError> {
        *self.calls.entry((op, target.to_string())).or_default() += 1;
        if self.failing.contains(target) {
            return Err(RemoteError::Unavailable(format!(
                "{target} is failing"
            )));
        }
        Ok(())
    }

    fn table(&mut self, table: &str) -> &mut Vec<Value> {
        self.tables.entry(table.to_string()).or_default()
    }
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// The shared store. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<BackendState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new client connection with no auth session.
    pub fn connect(&self) -> MemoryRemote {
        MemoryRemote {
            backend: self.clone(),
            session: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// When on, sign-up answers without a session and sign-in is refused
    /// until [`confirm_email`](Self::confirm_email) is called.
    pub fn require_email_confirmation(&self, on: bool) {
        self.lock().require_email_confirmation = on;
    }

    /// Creates a confirmed account and its profile row.
    pub fn add_account(
        &self,
        identity: &UserIdentity,
        password: &str,
    ) -> Result<(), RemoteError> {
        let row = to_object(UserIdentity::TABLE, identity)?;
        let mut state = self.lock();
        state.accounts.insert(
            identity.email.clone(),
            Account {
                user_id: identity.id.clone(),
                password: password.to_string(),
                confirmed: true,
            },
        );
        upsert_row(state.table(UserIdentity::TABLE), UserIdentity::KEY, row)?;
        Ok(())
    }

    pub fn confirm_email(&self, email: &str) {
        if let Some(account) = self.lock().accounts.get_mut(email) {
            account.confirmed = true;
        }
    }

    /// Writes rows directly, bypassing faults and call accounting.
    pub fn seed<T: Row>(&self, rows: &[T]) -> Result<(), RemoteError> {
        let objects = rows
            .iter()
            .map(|row| to_object(T::TABLE, row))
            .collect::<Result<Vec<_>, _>>()?;
        let mut state = self.lock();
        let table = state.table(T::TABLE);
        for object in objects {
            upsert_row(table, T::KEY, object)?;
        }
        Ok(())
    }

    /// Reads every row of `T::TABLE`, soft-deleted ones included.
    pub fn rows<T: Row>(&self) -> Result<Vec<T>, RemoteError> {
        let rows = self
            .lock()
            .tables
            .get(T::TABLE)
            .cloned()
            .unwrap_or_default();
        rows.into_iter().map(|v| decode(T::TABLE, v)).collect()
    }

    /// Makes every call whose target is `table` (a table name, rpc
    /// function name, or [`AUTH`]) fail with
    /// [`RemoteError::Unavailable`].
    pub fn fail_table(&self, table: &str) {
        self.lock().failing.insert(table.to_string());
    }

    pub fn heal_table(&self, table: &str) {
        self.lock().failing.remove(table);
    }

    /// Makes sign-in and sign-up fail as if the auth service were down.
    pub fn set_auth_down(&self, down: bool) {
        self.lock().auth_down = down;
    }

    /// Makes sign-out fail. The client's auth session is still dropped.
    pub fn set_sign_out_down(&self, down: bool) {
        self.lock().sign_out_down = down;
    }

    /// How many `op` calls targeted `table` so far.
    pub fn call_count(&self, op: Operation, table: &str) -> u64 {
        self.lock()
            .calls
            .get(&(op, table.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn run<R>(
        &self,
        op: Operation,
        target: &str,
        f: impl FnOnce(&mut BackendState) -> Result<R, RemoteError>,
    ) -> Result<R, RemoteError> {
        let mut state = self.lock();
        state.enter(op, target)?;
        let result = f(&mut state);
        if let Err(e) = &result {
            tracing::debug!(?op, target, error = %e, "memory backend call failed");
        }
        result
    }
}

// ---------------------------------------------------------------------------
// MemoryRemote
// ---------------------------------------------------------------------------

/// One client's connection to a [`MemoryBackend`].
pub struct MemoryRemote {
    backend: MemoryBackend,
    session: Mutex<Option<AuthSession>>,
}

impl MemoryRemote {
    /// The backend this client talks to.
    pub fn backend(&self) -> &MemoryBackend {
        &self.backend
    }

    fn session_slot(&self) -> MutexGuard<'_, Option<AuthSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open_session(&self, user_id: UserId) -> AuthSession {
        let session = AuthSession {
            user_id,
            access_token: uuid::Uuid::new_v4().to_string(),
        };
        *self.session_slot() = Some(session.clone());
        session
    }
}

impl RemoteStore for MemoryRemote {
    async fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, RemoteError> {
        tokio::task::yield_now().await;
        let user_id = self.backend.run(Operation::SignIn, AUTH, |state| {
            if state.auth_down {
                return Err(RemoteError::Unavailable("auth service down".into()));
            }
            let account = state
                .accounts
                .get(&credentials.email)
                .filter(|a| a.password == credentials.password)
                .ok_or_else(|| {
                    RemoteError::Auth("invalid login credentials".into())
                })?;
            if !account.confirmed {
                return Err(RemoteError::Auth("email not confirmed".into()));
            }
            Ok(account.user_id.clone())
        })?;
        Ok(self.open_session(user_id))
    }

    async fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> Result<SignUpOutcome, RemoteError> {
        tokio::task::yield_now().await;
        let (user_id, confirmed) =
            self.backend.run(Operation::SignUp, AUTH, |state| {
                if state.auth_down {
                    return Err(RemoteError::Unavailable(
                        "auth service down".into(),
                    ));
                }
                if state.accounts.contains_key(&request.email) {
                    return Err(RemoteError::Auth(
                        "user already registered".into(),
                    ));
                }
                let user_id = UserId::new(uuid::Uuid::new_v4().to_string());
                let confirmed = !state.require_email_confirmation;
                let profile = UserIdentity {
                    id: user_id.clone(),
                    role: request.requested_role,
                    display_name: request.full_name.clone(),
                    email: request.email.clone(),
                    phone: request.phone.clone(),
                };
                let row = to_object(UserIdentity::TABLE, &profile)?;
                insert_row(state.table(UserIdentity::TABLE), UserIdentity::KEY, row)?;
                state.accounts.insert(
                    request.email.clone(),
                    Account {
                        user_id: user_id.clone(),
                        password: request.password.clone(),
                        confirmed,
                    },
                );
                Ok((user_id, confirmed))
            })?;

        let session = confirmed.then(|| self.open_session(user_id.clone()));
        Ok(SignUpOutcome {
            user_id: Some(user_id),
            session,
        })
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        tokio::task::yield_now().await;
        // The local auth session goes regardless of what the server says.
        self.session_slot().take();
        self.backend.run(Operation::SignOut, AUTH, |state| {
            if state.sign_out_down {
                return Err(RemoteError::Unavailable("sign-out failed".into()));
            }
            Ok(())
        })
    }

    async fn get_session(&self) -> Result<Option<AuthSession>, RemoteError> {
        tokio::task::yield_now().await;
        self.backend.run(Operation::GetSession, AUTH, |_| Ok(()))?;
        Ok(self.session_slot().clone())
    }

    async fn select<T: Row>(&self, query: &Query) -> Result<Vec<T>, RemoteError> {
        tokio::task::yield_now().await;
        let rows = self.backend.run(Operation::Select, T::TABLE, |state| {
            let mut rows: Vec<Value> = state
                .table(T::TABLE)
                .iter()
                .filter(|row| !is_deleted(row) && query.matches(row))
                .cloned()
                .collect();
            query.sort(&mut rows);
            Ok(rows)
        })?;
        rows.into_iter().map(|v| decode(T::TABLE, v)).collect()
    }

    async fn insert<T: Row>(&self, draft: &T::Draft) -> Result<T, RemoteError> {
        tokio::task::yield_now().await;
        let object = to_object(T::TABLE, draft)?;
        let row = self.backend.run(Operation::Insert, T::TABLE, |state| {
            insert_row(state.table(T::TABLE), T::KEY, object)
        })?;
        decode(T::TABLE, row)
    }

    async fn update<T: Row>(
        &self,
        query: &Query,
        patch: &T::Patch,
    ) -> Result<Vec<T>, RemoteError> {
        tokio::task::yield_now().await;
        let patch = to_object(T::TABLE, patch)?;
        let rows = self.backend.run(Operation::Update, T::TABLE, |state| {
            let stamp = now();
            let mut updated = Vec::new();
            for row in state.table(T::TABLE).iter_mut() {
                if is_deleted(row) || !query.matches(row) {
                    continue;
                }
                if let Value::Object(fields) = row {
                    for (column, value) in &patch {
                        fields.insert(column.clone(), value.clone());
                    }
                    fields.insert("updated_at".into(), stamp.clone());
                }
                updated.push(row.clone());
            }
            Ok(updated)
        })?;
        rows.into_iter().map(|v| decode(T::TABLE, v)).collect()
    }

    async fn upsert<T: Row>(&self, draft: &T::Draft) -> Result<T, RemoteError> {
        tokio::task::yield_now().await;
        let object = to_object(T::TABLE, draft)?;
        let row = self.backend.run(Operation::Upsert, T::TABLE, |state| {
            upsert_row(state.table(T::TABLE), T::KEY, object)
        })?;
        decode(T::TABLE, row)
    }

    async fn delete<T: Row>(&self, query: &Query) -> Result<u64, RemoteError> {
        tokio::task::yield_now().await;
        self.backend.run(Operation::Delete, T::TABLE, |state| {
            let table = state.table(T::TABLE);
            let before = table.len();
            table.retain(|row| !query.matches(row));
            Ok((before - table.len()) as u64)
        })
    }

    async fn rpc<A, T>(&self, function: &str, args: &A) -> Result<T, RemoteError>
    where
        A: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        tokio::task::yield_now().await;
        let args = serde_json::to_value(args)
            .map_err(|e| RemoteError::rejected(function, e.to_string()))?;
        let row = self.backend.run(Operation::Rpc, function, |state| {
            let deleted_at = match function {
                SOFT_DELETE_RECORD => now(),
                RESTORE_RECORD => Value::Null,
                other => return Err(RemoteError::UnknownRpc(other.to_string())),
            };
            let target: RecordRef = serde_json::from_value(args)
                .map_err(|e| RemoteError::rejected(function, e.to_string()))?;
            let row = state
                .table(&target.table)
                .iter_mut()
                .find(|row| row.get("id").and_then(Value::as_str) == Some(target.id.as_str()))
                .ok_or_else(|| {
                    RemoteError::rejected(&target.table, format!("no record {}", target.id))
                })?;
            if let Value::Object(fields) = row {
                fields.insert("deleted_at".into(), deleted_at);
                fields.insert("updated_at".into(), now());
            }
            Ok(row.clone())
        })?;
        decode(function, row)
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn is_deleted(row: &Value) -> bool {
    !matches!(row.get("deleted_at"), None | Some(Value::Null))
}

fn to_object<S: Serialize + ?Sized>(
    table: &str,
    value: &S,
) -> Result<Map<String, Value>, RemoteError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(RemoteError::rejected(table, "payload is not an object")),
        Err(e) => Err(RemoteError::rejected(table, e.to_string())),
    }
}

fn decode<T: DeserializeOwned>(table: &str, row: Value) -> Result<T, RemoteError> {
    serde_json::from_value(row).map_err(|source| RemoteError::Decode {
        table: table.to_string(),
        source,
    })
}

fn key_of<'a>(row: &'a Value, key: &str) -> Option<&'a Value> {
    row.get(key).filter(|v| !v.is_null())
}

fn insert_row(
    table: &mut Vec<Value>,
    key: &str,
    mut fields: Map<String, Value>,
) -> Result<Value, RemoteError> {
    let id = fields
        .entry(key.to_string())
        .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()))
        .clone();
    if table.iter().any(|row| key_of(row, key) == Some(&id)) {
        return Err(RemoteError::Rejected {
            table: key.to_string(),
            message: format!("duplicate key {id}"),
        });
    }
    let stamp = now();
    fields.entry("created_at".to_string()).or_insert_with(|| stamp.clone());
    fields.entry("updated_at".to_string()).or_insert(stamp);
    let row = Value::Object(fields);
    table.push(row.clone());
    Ok(row)
}

fn upsert_row(
    table: &mut Vec<Value>,
    key: &str,
    mut fields: Map<String, Value>,
) -> Result<Value, RemoteError> {
    let id = fields
        .get(key)
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or_else(|| RemoteError::Rejected {
            table: key.to_string(),
            message: "missing conflict column".into(),
        })?;
    let Some(index) = table.iter().position(|row| key_of(row, key) == Some(&id)) else {
        return insert_row(table, key, fields);
    };
    if let Some(created) = table[index].get("created_at").cloned() {
        fields.entry("created_at".to_string()).or_insert(created);
    }
    fields.insert("updated_at".into(), now());
    let row = Value::Object(fields);
    table[index] = row.clone();
    Ok(row)
}

#[cfg(test)]
mod tests {
    use classdesk_model::{
        Role, SessionId, SessionRegistryEntry, Student, StudentDraft, StudentPatch,
        StudentStatus,
    };

    use super::*;

    fn jane() -> UserIdentity {
        UserIdentity {
            id: UserId::from("u1"),
            role: Role::Teacher,
            display_name: "Teacher Jane".into(),
            email: "jane@example.com".into(),
            phone: None,
        }
    }

    fn draft() -> StudentDraft {
        StudentDraft {
            profile_id: UserId::from("u2"),
            status: StudentStatus::Trial,
        }
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password_returns_auth_error() {
        let backend = MemoryBackend::new();
        backend.add_account(&jane(), "secret").unwrap();
        let remote = backend.connect();

        let result = remote
            .sign_in(&Credentials::new("jane@example.com", "nope"))
            .await;

        assert!(matches!(result, Err(RemoteError::Auth(_))));
        assert_eq!(remote.get_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_in_sessions_are_per_client() {
        let backend = MemoryBackend::new();
        backend.add_account(&jane(), "secret").unwrap();
        let a = backend.connect();
        let b = backend.connect();

        a.sign_in(&Credentials::new("jane@example.com", "secret"))
            .await
            .unwrap();

        assert!(a.get_session().await.unwrap().is_some());
        assert!(b.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile_row() {
        let backend = MemoryBackend::new();
        let remote = backend.connect();

        let outcome = remote
            .sign_up(&SignUpRequest {
                email: "ray@example.com".into(),
                password: "pw".into(),
                full_name: "Student Ray".into(),
                phone: None,
                requested_role: Role::Student,
                email_redirect_to: None,
            })
            .await
            .unwrap();

        let user_id = outcome.user_id.unwrap();
        assert!(outcome.session.is_some());
        let profiles: Vec<UserIdentity> = remote
            .select(&Query::all().eq("id", user_id.as_str()))
            .await
            .unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].role, Role::Student);
    }

    #[tokio::test]
    async fn test_sign_up_with_confirmation_has_no_session() {
        let backend = MemoryBackend::new();
        backend.require_email_confirmation(true);
        let remote = backend.connect();
        let request = SignUpRequest {
            email: "ray@example.com".into(),
            password: "pw".into(),
            full_name: "Student Ray".into(),
            phone: None,
            requested_role: Role::Student,
            email_redirect_to: Some("https://app.example.com/login".into()),
        };

        let outcome = remote.sign_up(&request).await.unwrap();
        assert!(outcome.user_id.is_some());
        assert!(outcome.session.is_none());

        let credentials = Credentials::new("ray@example.com", "pw");
        assert!(matches!(
            remote.sign_in(&credentials).await,
            Err(RemoteError::Auth(_))
        ));
        backend.confirm_email("ray@example.com");
        assert!(remote.sign_in(&credentials).await.is_ok());
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let remote = MemoryBackend::new().connect();

        let student: Student = remote.insert::<Student>(&draft()).await.unwrap();

        assert!(!student.id.as_str().is_empty());
        assert_eq!(student.created_at, student.updated_at);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_on_key_column() {
        let backend = MemoryBackend::new();
        let remote = backend.connect();
        let user_id = UserId::from("u1");

        for token in ["s1", "s2"] {
            remote
                .upsert::<SessionRegistryEntry>(&SessionRegistryEntry {
                    user_id: user_id.clone(),
                    session_id: SessionId::from(token),
                })
                .await
                .unwrap();
        }

        let rows = backend.rows::<SessionRegistryEntry>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].session_id, SessionId::from("s2"));
    }

    #[tokio::test]
    async fn test_update_returns_only_matching_rows() {
        let remote = MemoryBackend::new().connect();
        let a: Student = remote.insert::<Student>(&draft()).await.unwrap();
        remote.insert::<Student>(&draft()).await.unwrap();

        let updated: Vec<Student> = remote
            .update::<Student>(
                &Query::all().eq("id", a.id.as_str()),
                &StudentPatch {
                    status: Some(StudentStatus::Active),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].status, StudentStatus::Active);
    }

    #[tokio::test]
    async fn test_failing_table_rejects_calls_and_counts_them() {
        let backend = MemoryBackend::new();
        backend.fail_table(Student::TABLE);
        let remote = backend.connect();

        let result = remote.select::<Student>(&Query::all()).await;

        assert!(matches!(result, Err(RemoteError::Unavailable(_))));
        assert_eq!(backend.call_count(Operation::Select, Student::TABLE), 1);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_row_until_restored() {
        let remote = MemoryBackend::new().connect();
        let student: Student = remote.insert::<Student>(&draft()).await.unwrap();
        let target = RecordRef::of::<Student>(student.id.as_str());

        let deleted: Student = remote.rpc(SOFT_DELETE_RECORD, &target).await.unwrap();
        assert!(deleted.deleted_at.is_some());
        assert!(remote.select::<Student>(&Query::all()).await.unwrap().is_empty());

        let restored: Student = remote.rpc(RESTORE_RECORD, &target).await.unwrap();
        assert!(restored.deleted_at.is_none());
        assert_eq!(remote.select::<Student>(&Query::all()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rpc_unknown_function_returns_error() {
        let remote = MemoryBackend::new().connect();
        let result: Result<Value, _> = remote
            .rpc("drop_everything", &RecordRef::of::<Student>("x"))
            .await;
        assert!(matches!(result, Err(RemoteError::UnknownRpc(_))));
    }
}
