//! The [`Row`] trait: how a typed record maps onto a remote table.

use classdesk_model::{
    Booking, BookingDraft, BookingPatch, LeaveRequest, LeaveRequestDraft,
    LeaveRequestPatch, Payroll, PayrollDraft, PayrollPatch,
    SessionRegistryEntry, Student, StudentDraft, StudentPatch, Teacher,
    TeacherDraft, TeacherPatch, UserIdentity, UserIdentityPatch,
};
use serde::{Serialize, de::DeserializeOwned};

/// A record type that lives in one remote table.
///
/// Each implementor names its table, its key column, and the payload
/// shapes it accepts for inserts (`Draft`) and partial updates (`Patch`).
/// The store always answers with the full `Self` row.
pub trait Row: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Remote table name.
    const TABLE: &'static str;

    /// Column that identifies a row; `upsert` conflicts on it.
    const KEY: &'static str = "id";

    /// Insert/upsert payload.
    type Draft: Serialize + Send + Sync;

    /// Partial update payload.
    type Patch: Serialize + Send + Sync;

    /// This row's key value.
    fn key(&self) -> &str;
}

impl Row for UserIdentity {
    const TABLE: &'static str = "user_profiles";
    type Draft = UserIdentity;
    type Patch = UserIdentityPatch;

    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl Row for SessionRegistryEntry {
    const TABLE: &'static str = "active_sessions";
    const KEY: &'static str = "user_id";
    type Draft = SessionRegistryEntry;
    type Patch = SessionRegistryEntry;

    fn key(&self) -> &str {
        self.user_id.as_str()
    }
}

impl Row for Teacher {
    const TABLE: &'static str = "teachers";
    type Draft = TeacherDraft;
    type Patch = TeacherPatch;

    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl Row for Student {
    const TABLE: &'static str = "students";
    type Draft = StudentDraft;
    type Patch = StudentPatch;

    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl Row for Booking {
    const TABLE: &'static str = "bookings";
    type Draft = BookingDraft;
    type Patch = BookingPatch;

    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl Row for Payroll {
    const TABLE: &'static str = "teacher_payrolls";
    type Draft = PayrollDraft;
    type Patch = PayrollPatch;

    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl Row for LeaveRequest {
    const TABLE: &'static str = "teacher_leave_requests";
    type Draft = LeaveRequestDraft;
    type Patch = LeaveRequestPatch;

    fn key(&self) -> &str {
        self.id.as_str()
    }
}
