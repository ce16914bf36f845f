//! The mirror: in-memory copies of every cached collection.

use classdesk_model::{Booking, LeaveRequest, Payroll, Student, Teacher, UserIdentity};
use classdesk_remote::{Order, Query, Row};

/// Local copies of the remote collections.
///
/// Only ever holds rows the remote store returned. Rows are kept in the
/// order the refresh query produced them; rows added later by a mutation
/// are appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mirror {
    pub users: Vec<UserIdentity>,
    pub teachers: Vec<Teacher>,
    pub students: Vec<Student>,
    pub bookings: Vec<Booking>,
    pub payrolls: Vec<Payroll>,
    pub leave_requests: Vec<LeaveRequest>,
}

impl Mirror {
    /// Replaces the row with the same key, or appends it.
    pub(crate) fn reconcile<T: Mirrored>(&mut self, row: T) {
        let rows = T::slot(self);
        match rows.iter().position(|r| r.key() == row.key()) {
            Some(index) => rows[index] = row,
            None => rows.push(row),
        }
    }

    pub(crate) fn remove<T: Mirrored>(&mut self, key: &str) {
        T::slot(self).retain(|r| r.key() != key);
    }
}

/// A row type with a home in the [`Mirror`].
pub(crate) trait Mirrored: Row {
    /// Query a refresh uses to load the whole collection.
    fn refresh_query() -> Query {
        Query::all().order_by("created_at", Order::Desc)
    }

    fn slot(mirror: &mut Mirror) -> &mut Vec<Self>;
}

impl Mirrored for UserIdentity {
    fn slot(mirror: &mut Mirror) -> &mut Vec<Self> {
        &mut mirror.users
    }
}

impl Mirrored for Teacher {
    fn slot(mirror: &mut Mirror) -> &mut Vec<Self> {
        &mut mirror.teachers
    }
}

impl Mirrored for Student {
    fn slot(mirror: &mut Mirror) -> &mut Vec<Self> {
        &mut mirror.students
    }
}

impl Mirrored for Booking {
    fn refresh_query() -> Query {
        Query::all().order_by("scheduled_start", Order::Desc)
    }

    fn slot(mirror: &mut Mirror) -> &mut Vec<Self> {
        &mut mirror.bookings
    }
}

impl Mirrored for Payroll {
    fn refresh_query() -> Query {
        Query::all().order_by("period_start", Order::Desc)
    }

    fn slot(mirror: &mut Mirror) -> &mut Vec<Self> {
        &mut mirror.payrolls
    }
}

impl Mirrored for LeaveRequest {
    fn slot(mirror: &mut Mirror) -> &mut Vec<Self> {
        &mut mirror.leave_requests
    }
}

#[cfg(test)]
mod tests {
    use classdesk_model::{Role, UserId};

    use super::*;

    fn user(id: &str, name: &str) -> UserIdentity {
        UserIdentity {
            id: UserId::from(id),
            role: Role::Student,
            display_name: name.into(),
            email: format!("{id}@example.com"),
            phone: None,
        }
    }

    #[test]
    fn test_reconcile_new_key_appends() {
        let mut mirror = Mirror::default();
        mirror.reconcile(user("u1", "Ray"));
        mirror.reconcile(user("u2", "Kim"));
        assert_eq!(mirror.users.len(), 2);
        assert_eq!(mirror.users[1].display_name, "Kim");
    }

    #[test]
    fn test_reconcile_existing_key_replaces_in_place() {
        let mut mirror = Mirror::default();
        mirror.reconcile(user("u1", "Ray"));
        mirror.reconcile(user("u2", "Kim"));

        mirror.reconcile(user("u1", "Raymond"));

        assert_eq!(mirror.users.len(), 2);
        assert_eq!(mirror.users[0].display_name, "Raymond");
    }

    #[test]
    fn test_remove_drops_only_matching_key() {
        let mut mirror = Mirror::default();
        mirror.reconcile(user("u1", "Ray"));
        mirror.reconcile(user("u2", "Kim"));

        mirror.remove::<UserIdentity>("u1");

        assert_eq!(mirror.users, vec![user("u2", "Kim")]);
    }
}
