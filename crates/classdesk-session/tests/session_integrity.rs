//! Integration tests for session integrity across tabs and devices.
//!
//! A "device" here is a `SessionStore` with its own storage scope and its
//! own remote connection; two stores sharing one storage are two tabs.

use std::sync::Arc;

use classdesk_model::{Role, UserId, UserIdentity};
use classdesk_remote::{MemoryBackend, MemoryRemote};
use classdesk_session::{
    FileStorage, LocalStorage, MemoryStorage, SessionConfig, SessionError,
    SessionState, SessionStore,
};

fn admin() -> UserIdentity {
    UserIdentity {
        id: UserId::from("admin-1"),
        role: Role::Admin,
        display_name: "Admin May".into(),
        email: "admin@example.com".into(),
        phone: Some("0900-000-000".into()),
    }
}

fn backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.add_account(&admin(), "pw").unwrap();
    backend
}

fn device<S: LocalStorage>(
    backend: &MemoryBackend,
    storage: Arc<S>,
) -> SessionStore<MemoryRemote, S> {
    SessionStore::new(Arc::new(backend.connect()), storage, SessionConfig::default())
}

// =========================================================================
// Last login wins
// =========================================================================

#[tokio::test]
async fn test_second_device_login_takes_over_registry() {
    let backend = backend();
    let laptop = device(&backend, Arc::new(MemoryStorage::new()));
    let phone = device(&backend, Arc::new(MemoryStorage::new()));

    laptop.login_with_email("admin@example.com", "pw").await.unwrap();
    phone.login_with_email("admin@example.com", "pw").await.unwrap();

    let registered = phone.registry().current(&admin().id).await.unwrap();
    assert_eq!(registered, phone.session_id());
    assert_ne!(registered, laptop.session_id());
}

#[tokio::test]
async fn test_displaced_device_keeps_running_until_it_logs_in_again() {
    let backend = backend();
    let laptop = device(&backend, Arc::new(MemoryStorage::new()));
    let phone = device(&backend, Arc::new(MemoryStorage::new()));
    laptop.login_with_email("admin@example.com", "pw").await.unwrap();

    phone.login_with_email("admin@example.com", "pw").await.unwrap();

    // No push revocation: the laptop is still signed in locally.
    assert!(laptop.is_authenticated());
    assert_eq!(laptop.default_route(), "/system/accounts");

    // Its own next login reclaims the account.
    laptop.login_with_email("admin@example.com", "pw").await.unwrap();
    let registered = laptop.registry().current(&admin().id).await.unwrap();
    assert_eq!(registered, laptop.session_id());
}

// =========================================================================
// Tabs sharing one storage scope
// =========================================================================

#[tokio::test]
async fn test_second_tab_restores_instead_of_logging_in() {
    let backend = backend();
    let storage = Arc::new(MemoryStorage::new());
    let first_tab = device(&backend, Arc::clone(&storage));
    let second_tab = device(&backend, Arc::clone(&storage));
    first_tab.login_with_email("admin@example.com", "pw").await.unwrap();

    let login = second_tab.login_with_email("admin@example.com", "pw").await;
    assert!(matches!(login, Err(SessionError::ConcurrentSession(_))));

    second_tab.restore_session().await.unwrap();
    assert_eq!(second_tab.session_id(), first_tab.session_id());
}

#[tokio::test]
async fn test_tab_logout_after_takeover_keeps_new_record() {
    let backend = backend();
    let storage = Arc::new(MemoryStorage::new());
    let old_tab = device(&backend, Arc::clone(&storage));
    old_tab.login_with_email("admin@example.com", "pw").await.unwrap();

    // The record is cleared out from under the old tab, and a new tab
    // signs in with a fresh session.
    storage.remove(SessionConfig::DEFAULT_STORAGE_KEY).unwrap();
    let new_tab = device(&backend, Arc::clone(&storage));
    new_tab.login_with_email("admin@example.com", "pw").await.unwrap();

    old_tab.logout().await;

    assert_eq!(old_tab.state(), SessionState::Anonymous);
    let record = new_tab.read_record().unwrap();
    assert_eq!(Some(record.session_id), new_tab.session_id());
}

// =========================================================================
// Persistence across process restarts
// =========================================================================

#[tokio::test]
async fn test_file_storage_restores_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend();
    let before = device(&backend, Arc::new(FileStorage::new(dir.path())));
    before.login_with_email("admin@example.com", "pw").await.unwrap();
    let session_id = before.session_id();
    drop(before);

    let after = device(&backend, Arc::new(FileStorage::new(dir.path())));
    after.restore_session().await.unwrap();

    assert_eq!(after.session_id(), session_id);
    assert_eq!(after.identity(), Some(admin()));
}

#[tokio::test]
async fn test_custom_storage_key_is_respected() {
    let backend = backend();
    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(
        Arc::new(backend.connect()),
        Arc::clone(&storage),
        SessionConfig {
            storage_key: "staging-session".into(),
        },
    );

    store.login_with_email("admin@example.com", "pw").await.unwrap();

    assert!(storage.get("staging-session").unwrap().is_some());
    assert!(storage.get(SessionConfig::DEFAULT_STORAGE_KEY).unwrap().is_none());
}
