//! Domain entities mirrored from the remote store.
//!
//! Each table has three shapes:
//!
//! - the **row** (`Teacher`) — the canonical record the remote store
//!   returns, including server-assigned id and timestamps;
//! - the **draft** (`TeacherDraft`) — what a client sends on insert;
//!   nothing the server assigns;
//! - the **patch** (`TeacherPatch`) — a partial update where `None`
//!   fields are left out of the payload entirely.
//!
//! The cache only ever stores rows. Drafts and patches never reach the
//! mirror, so it can't show a value the remote didn't accept.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{BookingId, LeaveRequestId, PayrollId, StudentId, TeacherId, UserId};

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeacherStatus {
    Pending,
    Active,
    Suspended,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Trial,
    Active,
    Suspended,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

// ---------------------------------------------------------------------------
// Teacher
// ---------------------------------------------------------------------------

/// A teacher record. 1:1 with a [`UserIdentity`](crate::UserIdentity)
/// through `profile_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub profile_id: UserId,
    pub status: TeacherStatus,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub hourly_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherDraft {
    pub profile_id: UserId,
    pub status: TeacherStatus,
    pub specialties: Vec<String>,
    pub languages: Vec<String>,
    pub hourly_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TeacherStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
}

// ---------------------------------------------------------------------------
// Student
// ---------------------------------------------------------------------------

/// A student record. 1:1 with a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub profile_id: UserId,
    pub status: StudentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDraft {
    pub profile_id: UserId,
    pub status: StudentStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StudentStatus>,
}

// ---------------------------------------------------------------------------
// Booking
// ---------------------------------------------------------------------------

/// One scheduled lesson between a student and a teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_account_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom_account_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_end: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Payroll
// ---------------------------------------------------------------------------

/// A teacher's pay for one period. Amounts are in the platform currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payroll {
    pub id: PayrollId,
    pub teacher_id: TeacherId,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_lessons: u32,
    pub total_hours: f64,
    pub base_amount: f64,
    pub bonus_amount: f64,
    pub deduction_amount: f64,
    pub final_amount: f64,
    pub status: PayrollStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollDraft {
    pub teacher_id: TeacherId,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_lessons: u32,
    pub total_hours: f64,
    pub base_amount: f64,
    pub bonus_amount: f64,
    pub deduction_amount: f64,
    pub final_amount: f64,
    pub status: PayrollStatus,
}

impl PayrollDraft {
    /// `base + bonus - deduction`, the figure `final_amount` should hold.
    pub fn computed_final(&self) -> f64 {
        self.base_amount + self.bonus_amount - self.deduction_amount
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayrollPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PayrollStatus>,
}

// ---------------------------------------------------------------------------
// LeaveRequest
// ---------------------------------------------------------------------------

/// A teacher asking for a day off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub teacher_id: TeacherId,
    pub date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequestDraft {
    pub teacher_id: TeacherId,
    pub date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequestPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LeaveStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_status_no_show_is_snake_case() {
        let json = serde_json::to_string(&BookingStatus::NoShow).unwrap();
        assert_eq!(json, "\"no_show\"");
    }

    #[test]
    fn test_patch_omits_unset_fields() {
        let patch = TeacherPatch {
            status: Some(TeacherStatus::Active),
            ..TeacherPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "active" }));
    }

    #[test]
    fn test_teacher_row_tolerates_missing_optional_columns() {
        let json = serde_json::json!({
            "id": "t1",
            "profile_id": "u1",
            "status": "pending",
            "hourly_rate": 28.0,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
        });
        let teacher: Teacher = serde_json::from_value(json).unwrap();
        assert!(teacher.specialties.is_empty());
        assert_eq!(teacher.bank_name, None);
        assert_eq!(teacher.deleted_at, None);
    }

    #[test]
    fn test_payroll_draft_computed_final() {
        let draft = PayrollDraft {
            teacher_id: TeacherId::from("t1"),
            period_start: Utc::now(),
            period_end: Utc::now(),
            total_lessons: 18,
            total_hours: 18.0,
            base_amount: 630.0,
            bonus_amount: 50.0,
            deduction_amount: 20.0,
            final_amount: 660.0,
            status: PayrollStatus::Pending,
        };
        assert_eq!(draft.computed_final(), draft.final_amount);
    }
}
