//! Data model for Classdesk.
//!
//! This crate defines the values every other layer passes around:
//!
//! - **Identity** ([`UserIdentity`], [`Role`]) — who is signed in.
//! - **Session records** ([`SessionRecord`], [`SessionRegistryEntry`]) —
//!   the local and remote halves of a session claim.
//! - **Entities** ([`Teacher`], [`Student`], [`Booking`], [`Payroll`],
//!   [`LeaveRequest`]) with their drafts and patches.
//! - **Codecs** ([`Codec`], [`JsonCodec`]) for persisting values as text.
//!
//! # Architecture
//!
//! ```text
//! Session / Cache (above)  ← hold these types
//!     ↕
//! Model (this crate)       ← plain data, no I/O
//!     ↕
//! Remote store (beside)    ← serializes these as table rows
//! ```

mod codec;
mod entity;
mod error;
mod identity;
mod ids;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use entity::{
    Booking, BookingDraft, BookingPatch, BookingStatus, LeaveRequest,
    LeaveRequestDraft, LeaveRequestPatch, LeaveStatus, Payroll, PayrollDraft,
    PayrollPatch, PayrollStatus, Student, StudentDraft, StudentPatch,
    StudentStatus, Teacher, TeacherDraft, TeacherPatch, TeacherStatus,
};
pub use error::ModelError;
pub use identity::{
    Role, SessionRecord, SessionRegistryEntry, UserIdentity, UserIdentityPatch,
};
pub use ids::{
    BookingId, LeaveRequestId, PayrollId, SessionId, StudentId, TeacherId,
    UserId,
};
