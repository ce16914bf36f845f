//! Who is signed in, and which session speaks for them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{SessionId, UserId};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The account role that decides which views a user may open.
///
/// Serialized lowercase (`"admin"`, `"teacher"`, ...) to match the
/// `user_profiles.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Employee,
}

impl Role {
    /// The lowercase column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// UserIdentity
// ---------------------------------------------------------------------------

/// A user's profile row. Loaded once per session and treated as
/// immutable until the next restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub role: Role,
    /// Stored remotely as `full_name`.
    #[serde(rename = "full_name")]
    pub display_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Partial update of a profile. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(rename = "full_name", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// ---------------------------------------------------------------------------
// Session records
// ---------------------------------------------------------------------------

/// The local claim persisted in client storage: "this browser scope
/// holds session `session_id` for user `user_id`".
///
/// Exactly one of these exists per storage scope. Its absence means the
/// scope holds no claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub user_id: UserId,
    pub session_id: SessionId,
}

/// The remote registry row: the one session id the remote store
/// currently recognizes as authoritative for `user_id`.
///
/// One row per user, overwritten on every claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRegistryEntry {
    pub user_id: UserId,
    pub session_id: SessionId,
}

impl From<SessionRecord> for SessionRegistryEntry {
    fn from(record: SessionRecord) -> Self {
        Self {
            user_id: record.user_id,
            session_id: record.session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"employee\"").unwrap();
        assert_eq!(role, Role::Employee);
    }

    #[test]
    fn test_user_identity_reads_full_name_column() {
        let json = r#"{"id":"u1","role":"teacher","full_name":"Teacher Jane","email":"jane@example.com"}"#;
        let user: UserIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(user.display_name, "Teacher Jane");
        assert_eq!(user.phone, None);
    }

    #[test]
    fn test_session_record_uses_camel_case_keys() {
        let record = SessionRecord {
            user_id: UserId::from("u1"),
            session_id: SessionId::from("s1"),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"userId":"u1","sessionId":"s1"}"#);
    }
}
