use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use classdesk::model::{
    Booking, BookingDraft, BookingId, BookingStatus, LeaveRequest, LeaveRequestId, LeaveStatus,
    Payroll, PayrollId, PayrollStatus, Student, StudentId, StudentStatus, Teacher, TeacherId,
    TeacherStatus,
};
use classdesk::prelude::*;
use classdesk::remote::RemoteError;

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

fn profile(id: &str, role: Role, name: &str, email: &str) -> UserIdentity {
    UserIdentity {
        id: UserId::from(id),
        role,
        display_name: name.into(),
        email: email.into(),
        phone: None,
    }
}

fn seed(backend: &MemoryBackend) -> Result<(), RemoteError> {
    let now = Utc::now();
    let tomorrow_9 = (now + Duration::days(1))
        .date_naive()
        .and_hms_opt(9, 0, 0)
        .map(|t| Utc.from_utc_datetime(&t))
        .unwrap_or(now);
    let yesterday_15 = (now - Duration::days(1))
        .date_naive()
        .and_hms_opt(15, 0, 0)
        .map(|t| Utc.from_utc_datetime(&t))
        .unwrap_or(now);
    let month_start = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| Utc.from_utc_datetime(&t))
        .unwrap_or(now);

    for (user, password) in [
        (profile("admin-1", Role::Admin, "Admin User", "admin@example.com"), "admin"),
        (profile("teacher-1", Role::Teacher, "Teacher Jane", "teacher@example.com"), "teacher"),
        (profile("teacher-2", Role::Teacher, "Teacher Mike", "mike@example.com"), "teacher"),
        (profile("student-1", Role::Student, "Student Ray", "student@example.com"), "student"),
        (profile("student-2", Role::Student, "Student Wendy", "wendy@example.com"), "student"),
    ] {
        backend.add_account(&user, password)?;
    }

    backend.seed(&[
        Teacher {
            id: TeacherId::from("teacher-1"),
            profile_id: UserId::from("teacher-1"),
            status: TeacherStatus::Active,
            specialties: vec!["IELTS".into(), "Business English".into()],
            languages: vec!["EN".into(), "ZH".into()],
            hourly_rate: 35.0,
            bank_name: Some("Taiwan Bank".into()),
            bank_account: Some("123-456-789".into()),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        },
        Teacher {
            id: TeacherId::from("teacher-2"),
            profile_id: UserId::from("teacher-2"),
            status: TeacherStatus::Pending,
            specialties: vec!["Conversation".into()],
            languages: vec!["EN".into()],
            hourly_rate: 28.0,
            bank_name: None,
            bank_account: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        },
    ])?;
    backend.seed(&[
        Student {
            id: StudentId::from("student-1"),
            profile_id: UserId::from("student-1"),
            status: StudentStatus::Active,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        },
        Student {
            id: StudentId::from("student-2"),
            profile_id: UserId::from("student-2"),
            status: StudentStatus::Trial,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        },
    ])?;
    backend.seed(&[
        Booking {
            id: BookingId::from("booking-1"),
            student_id: StudentId::from("student-1"),
            teacher_id: TeacherId::from("teacher-1"),
            scheduled_start: tomorrow_9,
            scheduled_end: tomorrow_9 + Duration::hours(1),
            status: BookingStatus::Scheduled,
            contract_id: None,
            zoom_account_id: None,
            created_at: now,
            updated_at: now,
        },
        Booking {
            id: BookingId::from("booking-2"),
            student_id: StudentId::from("student-2"),
            teacher_id: TeacherId::from("teacher-2"),
            scheduled_start: yesterday_15,
            scheduled_end: yesterday_15 + Duration::hours(1),
            status: BookingStatus::Completed,
            contract_id: None,
            zoom_account_id: None,
            created_at: now,
            updated_at: now,
        },
    ])?;
    backend.seed(&[Payroll {
        id: PayrollId::from("payroll-1"),
        teacher_id: TeacherId::from("teacher-1"),
        period_start: month_start,
        period_end: month_start + Duration::days(30),
        total_lessons: 18,
        total_hours: 18.0,
        base_amount: 630.0,
        bonus_amount: 50.0,
        deduction_amount: 20.0,
        final_amount: 660.0,
        status: PayrollStatus::Pending,
        created_at: now,
        updated_at: now,
    }])?;
    backend.seed(&[
        LeaveRequest {
            id: LeaveRequestId::from("leave-1"),
            teacher_id: TeacherId::from("teacher-1"),
            date: (now + Duration::days(2)).date_naive(),
            reason: "Medical appointment".into(),
            status: LeaveStatus::Pending,
            created_at: now,
            updated_at: now,
        },
        LeaveRequest {
            id: LeaveRequestId::from("leave-2"),
            teacher_id: TeacherId::from("teacher-2"),
            date: (now + Duration::days(3)).date_naive(),
            reason: "Family trip".into(),
            status: LeaveStatus::Approved,
            created_at: now,
            updated_at: now,
        },
    ])?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

fn show(path: &str, decision: &Decision) {
    match decision {
        Decision::Allow => eprintln!("  {path:<28} → allow"),
        Decision::Redirect { path: to, redirect_to } => match redirect_to {
            Some(back) => eprintln!("  {path:<28} → {to} (then back to {back})"),
            None => eprintln!("  {path:<28} → {to}"),
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), ClassdeskError> {
    // A missing .env is fine; the defaults cover everything.
    let _ = dotenvy::dotenv();
    init_logging();

    let mut config = ClientConfig::from_env()?;
    let storage_dir = config
        .storage_dir
        .get_or_insert_with(|| std::env::temp_dir().join("classdesk-admin-console"))
        .clone();
    eprintln!("local session storage: {}", storage_dir.display());

    let backend = MemoryBackend::new();
    seed(&backend)?;

    let storage = Arc::new(FileStorage::new(&storage_dir));
    let client = Arc::new(
        Client::builder(Arc::new(backend.connect()), Arc::clone(&storage))
            .config(config)
            .build(),
    );
    let idle = client.spawn_idle_logout();

    eprintln!("\nbefore login:");
    for path in ["/system/accounts", "/login"] {
        show(path, &client.navigate(path).await);
    }

    let admin = client.login("admin@example.com", "admin").await?;
    idle.touch();
    eprintln!("\nsigned in as {} ({})", admin.display_name, admin.role);
    for path in ["/login", "/system/accounts", "/students/bookings"] {
        show(path, &client.navigate(path).await);
    }

    let cache = client.cache();
    cache
        .update_teacher_status(&TeacherId::from("teacher-2"), TeacherStatus::Active)
        .await?;
    cache.approve_leave(&LeaveRequestId::from("leave-1")).await?;
    cache
        .update_payroll_status(&PayrollId::from("payroll-1"), PayrollStatus::Completed)
        .await?;
    let start = Utc::now() + Duration::days(7);
    cache
        .add_booking(&BookingDraft {
            student_id: StudentId::from("student-2"),
            teacher_id: TeacherId::from("teacher-1"),
            scheduled_start: start,
            scheduled_end: start + Duration::minutes(50),
            status: BookingStatus::Scheduled,
            contract_id: None,
            zoom_account_id: None,
        })
        .await?;

    eprintln!("\nbookings:");
    for row in cache.booking_view().await {
        eprintln!(
            "  {:<38} {} with {} ({:?})",
            row.booking.id.as_str(),
            row.student_name.as_deref().unwrap_or("?"),
            row.teacher_name.as_deref().unwrap_or("?"),
            row.booking.status,
        );
    }

    // The same account signs in on a second device. This device keeps
    // its session until it next logs in.
    let phone = Client::builder(Arc::new(backend.connect()), Arc::new(MemoryStorage::new())).build();
    phone.login("admin@example.com", "admin").await?;
    let registered = client.session().registry().current(&admin.id).await?;
    eprintln!(
        "\nregistry now names {:?}; this device still holds {:?}",
        registered.map(|s| s.0),
        client.session().session_id().map(|s| s.0),
    );

    client.logout().await;
    idle.stop();
    eprintln!("\nafter logout:");
    show("/system/accounts", &client.navigate("/system/accounts").await);
    let record_left = storage
        .get(&client.session().config().storage_key)
        .ok()
        .flatten()
        .is_some();
    tracing::info!(record_left, "walkthrough finished");
    Ok(())
}
