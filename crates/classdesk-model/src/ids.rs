//! Identifier newtypes.
//!
//! Every row the remote store hands back is keyed by an opaque string
//! (usually a UUID). We wrap each one in its own type so a booking's
//! `student_id` can't be passed where a `TeacherId` is expected, even
//! though both are `String` underneath.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares a string-backed id newtype with the usual conversions.
///
/// `#[serde(transparent)]` keeps the wire form a bare string, so
/// `TeacherId("t1")` serializes as `"t1"` rather than `{ "0": "t1" }`.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wraps any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrows the raw id.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifies a user account (the `user_profiles` row and the auth user).
    UserId
);
string_id!(
    /// Identifies a teacher record.
    TeacherId
);
string_id!(
    /// Identifies a student record.
    StudentId
);
string_id!(
    /// Identifies a lesson booking.
    BookingId
);
string_id!(
    /// Identifies a payroll period for one teacher.
    PayrollId
);
string_id!(
    /// Identifies a teacher's leave request.
    LeaveRequestId
);
string_id!(
    /// An opaque session token minted on every successful login or
    /// registration. Never reused.
    SessionId
);

impl SessionId {
    /// Mints a fresh session token (UUID v4, 122 bits of randomness).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
