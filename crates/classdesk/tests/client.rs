//! End-to-end tests for the client context: navigation, multi-device
//! sessions, logout, and idle timeout.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use classdesk::model::{
    Booking, BookingId, BookingStatus, SessionRegistryEntry, Student, StudentId, StudentStatus,
    Teacher, TeacherId, TeacherStatus,
};
use classdesk::prelude::*;
use classdesk::remote::{Operation, Row};

// =========================================================================
// Fixtures
// =========================================================================

fn profile(id: &str, role: Role, name: &str, email: &str) -> UserIdentity {
    UserIdentity {
        id: UserId::from(id),
        role,
        display_name: name.into(),
        email: email.into(),
        phone: None,
    }
}

/// A backend with one account per role plus a teacher, a student and
/// one booking between them.
fn platform() -> MemoryBackend {
    let backend = MemoryBackend::new();
    let at = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
    backend
        .add_account(&profile("u-admin", Role::Admin, "Admin May", "admin@example.com"), "pw")
        .unwrap();
    backend
        .add_account(
            &profile("u-t1", Role::Teacher, "Teacher Jane", "teacher@example.com"),
            "pw",
        )
        .unwrap();
    backend
        .add_account(
            &profile("u-s1", Role::Student, "Student Ray", "student@example.com"),
            "pw",
        )
        .unwrap();
    backend
        .add_account(&profile("u-e1", Role::Employee, "Clerk Lin", "clerk@example.com"), "pw")
        .unwrap();
    backend
        .seed(&[Teacher {
            id: TeacherId::from("t1"),
            profile_id: UserId::from("u-t1"),
            status: TeacherStatus::Active,
            specialties: vec!["ielts".into()],
            languages: vec!["en".into()],
            hourly_rate: 35.0,
            bank_name: None,
            bank_account: None,
            deleted_at: None,
            created_at: at,
            updated_at: at,
        }])
        .unwrap();
    backend
        .seed(&[Student {
            id: StudentId::from("s1"),
            profile_id: UserId::from("u-s1"),
            status: StudentStatus::Active,
            deleted_at: None,
            created_at: at,
            updated_at: at,
        }])
        .unwrap();
    backend
        .seed(&[Booking {
            id: BookingId::from("b1"),
            student_id: StudentId::from("s1"),
            teacher_id: TeacherId::from("t1"),
            scheduled_start: at,
            scheduled_end: at + chrono::Duration::hours(1),
            status: BookingStatus::Scheduled,
            contract_id: None,
            zoom_account_id: None,
            created_at: at,
            updated_at: at,
        }])
        .unwrap();
    backend
}

fn client_with(
    backend: &MemoryBackend,
    storage: Arc<MemoryStorage>,
) -> Client<MemoryRemote, MemoryStorage> {
    Client::builder(Arc::new(backend.connect()), storage).build()
}

fn client(backend: &MemoryBackend) -> Client<MemoryRemote, MemoryStorage> {
    client_with(backend, Arc::new(MemoryStorage::new()))
}

fn redirect(path: &str) -> Decision {
    Decision::Redirect {
        path: path.into(),
        redirect_to: None,
    }
}

// =========================================================================
// Route guard
// =========================================================================

#[tokio::test]
async fn test_navigate_anonymous_protected_redirects_with_target() {
    let backend = platform();
    let client = client(&backend);

    let decision = client.navigate("/system/payroll?month=2024-02").await;

    assert_eq!(
        decision,
        Decision::Redirect {
            path: "/login".into(),
            redirect_to: Some("/system/payroll?month=2024-02".into()),
        }
    );
    assert!(!client.cache().is_initialized());
}

#[tokio::test]
async fn test_navigate_anonymous_public_allows() {
    let backend = platform();
    let client = client(&backend);

    assert_eq!(client.navigate("/login").await, Decision::Allow);
    assert_eq!(client.navigate("/register").await, Decision::Allow);
}

#[tokio::test]
async fn test_navigate_signed_in_login_page_goes_to_landing() {
    let backend = platform();
    let client = client(&backend);
    client.login("teacher@example.com", "pw").await.unwrap();

    assert_eq!(client.navigate("/login").await, redirect("/courses/overview"));
}

#[tokio::test]
async fn test_navigate_allowed_role_initializes_cache() {
    let backend = platform();
    let client = client(&backend);
    client.login("admin@example.com", "pw").await.unwrap();

    assert_eq!(client.navigate("/system/accounts").await, Decision::Allow);

    assert!(client.cache().is_initialized());
    let view = client.cache().booking_view().await;
    assert_eq!(view[0].student_name.as_deref(), Some("Student Ray"));
    assert_eq!(view[0].teacher_name.as_deref(), Some("Teacher Jane"));
}

#[tokio::test]
async fn test_navigate_forbidden_role_goes_to_landing() {
    let backend = platform();
    let client = client(&backend);
    client.login("student@example.com", "pw").await.unwrap();

    assert_eq!(client.navigate("/system/roles").await, redirect("/students/bookings"));
    assert_eq!(client.navigate("/students/bookings").await, Decision::Allow);
}

#[tokio::test]
async fn test_navigate_employee_has_no_landing_page() {
    let backend = platform();
    let client = client(&backend);
    client.login("clerk@example.com", "pw").await.unwrap();

    assert_eq!(client.navigate("/courses/overview").await, redirect("/login"));
    assert_eq!(client.navigate("/login").await, Decision::Allow);
}

#[tokio::test]
async fn test_navigate_unknown_and_root_go_to_login() {
    let backend = platform();
    let client = client(&backend);

    assert_eq!(client.navigate("/no/such/page").await, redirect("/login"));
    assert_eq!(client.navigate("/").await, redirect("/login"));
}

#[tokio::test]
async fn test_navigate_cache_failure_still_allows() {
    let backend = platform();
    backend.fail_table(Booking::TABLE);
    let client = client(&backend);
    client.login("admin@example.com", "pw").await.unwrap();

    assert_eq!(client.navigate("/courses/overview").await, Decision::Allow);

    assert!(!client.cache().is_initialized());
    assert_eq!(client.cache().snapshot().await.teachers.len(), 1);
}

#[tokio::test]
async fn test_navigate_restores_session_after_reload() {
    let backend = platform();
    let storage = Arc::new(MemoryStorage::new());
    let before = client_with(&backend, Arc::clone(&storage));
    before.login("teacher@example.com", "pw").await.unwrap();
    let session_id = before.session().session_id();

    let reloaded = client_with(&backend, storage);

    assert_eq!(reloaded.navigate("/system/leave").await, Decision::Allow);
    assert_eq!(reloaded.session().session_id(), session_id);
}

#[tokio::test]
async fn test_navigate_repeatedly_loads_cache_once() {
    let backend = platform();
    let client = client(&backend);
    client.login("admin@example.com", "pw").await.unwrap();

    for path in ["/system/accounts", "/courses/teachers", "/system/payroll"] {
        assert_eq!(client.navigate(path).await, Decision::Allow);
    }

    assert_eq!(backend.call_count(Operation::Select, Teacher::TABLE), 1);
}

// =========================================================================
// Multi-device sessions
// =========================================================================

#[tokio::test]
async fn test_displaced_device_restore_still_authenticated() {
    let backend = platform();
    let device_a = client(&backend);
    let device_b = client(&backend);
    device_a.login("admin@example.com", "pw").await.unwrap();
    let original = device_a.session().session_id();

    device_b.login("admin@example.com", "pw").await.unwrap();
    device_a.session().restore_session().await.unwrap();

    // No live revocation: device A keeps its session until it logs in
    // again, even though the registry now names device B.
    assert!(device_a.session().is_authenticated());
    assert_eq!(device_a.session().session_id(), original);
    let registered = device_a
        .session()
        .registry()
        .current(&UserId::from("u-admin"))
        .await
        .unwrap();
    assert_eq!(registered, device_b.session().session_id());
    assert_ne!(registered, original);
}

#[tokio::test]
async fn test_displaced_device_reload_keeps_original_sid_without_claiming() {
    let backend = platform();
    let storage_a = Arc::new(MemoryStorage::new());
    let device_a = client_with(&backend, Arc::clone(&storage_a));
    let device_b = client(&backend);
    device_a.login("admin@example.com", "pw").await.unwrap();
    let original = device_a.session().session_id();
    device_b.login("admin@example.com", "pw").await.unwrap();
    let claims = backend.call_count(Operation::Upsert, SessionRegistryEntry::TABLE);

    let reloaded_a = client_with(&backend, storage_a);

    assert_eq!(reloaded_a.navigate("/system/accounts").await, Decision::Allow);
    assert_eq!(reloaded_a.session().session_id(), original);
    assert_eq!(
        backend.call_count(Operation::Upsert, SessionRegistryEntry::TABLE),
        claims
    );
    let registered = reloaded_a
        .session()
        .registry()
        .current(&UserId::from("u-admin"))
        .await
        .unwrap();
    assert_eq!(registered, device_b.session().session_id());
}

// =========================================================================
// Switching accounts
// =========================================================================

#[tokio::test]
async fn test_login_as_other_user_reloads_cache() {
    let backend = platform();
    let client = client(&backend);
    client.login("admin@example.com", "pw").await.unwrap();
    client.navigate("/system/accounts").await;
    assert!(client.cache().is_initialized());

    client.login("teacher@example.com", "pw").await.unwrap();

    assert!(!client.cache().is_initialized());
    assert_eq!(client.cache().snapshot().await, Mirror::default());
    assert_eq!(client.navigate("/courses/overview").await, Decision::Allow);
    assert_eq!(backend.call_count(Operation::Select, Teacher::TABLE), 2);
    assert_eq!(client.session().role(), Some(Role::Teacher));
}

#[tokio::test]
async fn test_login_again_as_same_user_keeps_cache() {
    let backend = platform();
    let client = client(&backend);
    client.login("admin@example.com", "pw").await.unwrap();
    client.navigate("/system/accounts").await;

    client.login("admin@example.com", "pw").await.unwrap();
    client.navigate("/system/payroll").await;

    assert!(client.cache().is_initialized());
    assert_eq!(backend.call_count(Operation::Select, Teacher::TABLE), 1);
}

// =========================================================================
// Logout
// =========================================================================

#[tokio::test]
async fn test_logout_clears_session_and_cache() {
    let backend = platform();
    let client = client(&backend);
    client.login("admin@example.com", "pw").await.unwrap();
    client.navigate("/system/accounts").await;

    client.logout().await;

    assert_eq!(client.session().state(), SessionState::Anonymous);
    assert!(!client.cache().is_initialized());
    assert_eq!(client.cache().snapshot().await, Mirror::default());
    assert!(matches!(
        client.navigate("/system/accounts").await,
        Decision::Redirect { .. }
    ));
}

#[tokio::test]
async fn test_logout_then_other_user_sees_fresh_cache() {
    let backend = platform();
    let client = client(&backend);
    client.login("admin@example.com", "pw").await.unwrap();
    client.navigate("/system/accounts").await;
    client.logout().await;

    client.login("teacher@example.com", "pw").await.unwrap();
    client.navigate("/courses/overview").await;

    assert_eq!(backend.call_count(Operation::Select, Teacher::TABLE), 2);
    assert_eq!(client.session().role(), Some(Role::Teacher));
}

#[tokio::test]
async fn test_login_error_converts_to_classdesk_error() {
    let backend = platform();
    let client = client(&backend);

    let result = client.login("admin@example.com", "nope").await;

    assert!(matches!(
        result,
        Err(ClassdeskError::Session(SessionError::Auth(_)))
    ));
}

// =========================================================================
// Idle logout
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_idle_logout_signs_out_after_timeout() {
    let backend = platform();
    let client = Arc::new(
        Client::builder(Arc::new(backend.connect()), Arc::new(MemoryStorage::new()))
            .idle_config(IdleConfig::with_timeout(Duration::from_secs(60)))
            .build(),
    );
    client.login("admin@example.com", "pw").await.unwrap();
    let monitor = client.spawn_idle_logout();

    tokio::time::sleep(Duration::from_secs(45)).await;
    monitor.touch();
    tokio::time::sleep(Duration::from_secs(45)).await;
    assert!(client.session().is_authenticated());

    tokio::time::sleep(Duration::from_secs(30)).await;
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
    assert!(!client.session().is_authenticated());
    assert!(!monitor.is_running());
}
