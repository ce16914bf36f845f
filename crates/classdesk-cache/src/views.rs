//! Derived views: joins over the mirror, computed on every read.
//!
//! Nothing here holds state of its own, so a view can never disagree
//! with the collections it was built from. A dangling reference (a
//! teacher whose profile isn't loaded, a booking for an archived
//! student) yields `None` for the joined fields instead of dropping the
//! row.

use std::collections::HashMap;

use classdesk_model::{Booking, Student, StudentId, Teacher, TeacherId, UserId, UserIdentity};

use crate::Mirror;

/// A teacher row joined with its profile.
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherProfile {
    pub teacher: Teacher,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// A student row joined with its profile.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentProfile {
    pub student: Student,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// A booking with the names of both parties.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingView {
    pub booking: Booking,
    pub student_name: Option<String>,
    pub teacher_name: Option<String>,
}

impl Mirror {
    pub fn teacher_profiles(&self) -> Vec<TeacherProfile> {
        let users = self.users_by_id();
        self.teachers
            .iter()
            .map(|teacher| {
                let profile = users.get(&teacher.profile_id);
                TeacherProfile {
                    teacher: teacher.clone(),
                    display_name: profile.map(|u| u.display_name.clone()),
                    email: profile.map(|u| u.email.clone()),
                }
            })
            .collect()
    }

    pub fn student_profiles(&self) -> Vec<StudentProfile> {
        let users = self.users_by_id();
        self.students
            .iter()
            .map(|student| {
                let profile = users.get(&student.profile_id);
                StudentProfile {
                    student: student.clone(),
                    display_name: profile.map(|u| u.display_name.clone()),
                    email: profile.map(|u| u.email.clone()),
                }
            })
            .collect()
    }

    pub fn booking_view(&self) -> Vec<BookingView> {
        let users = self.users_by_id();
        let students: HashMap<&StudentId, &UserId> = self
            .students
            .iter()
            .map(|s| (&s.id, &s.profile_id))
            .collect();
        let teachers: HashMap<&TeacherId, &UserId> = self
            .teachers
            .iter()
            .map(|t| (&t.id, &t.profile_id))
            .collect();
        let name = |profile: Option<&&UserId>| {
            profile
                .and_then(|id| users.get(*id))
                .map(|u| u.display_name.clone())
        };

        self.bookings
            .iter()
            .map(|booking| BookingView {
                booking: booking.clone(),
                student_name: name(students.get(&booking.student_id)),
                teacher_name: name(teachers.get(&booking.teacher_id)),
            })
            .collect()
    }

    fn users_by_id(&self) -> HashMap<&UserId, &UserIdentity> {
        self.users.iter().map(|u| (&u.id, u)).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use classdesk_model::{BookingId, BookingStatus, Role, StudentStatus, TeacherStatus};

    use super::*;

    fn user(id: &str, role: Role, name: &str) -> UserIdentity {
        UserIdentity {
            id: UserId::from(id),
            role,
            display_name: name.into(),
            email: format!("{id}@example.com"),
            phone: None,
        }
    }

    fn mirror() -> Mirror {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        Mirror {
            users: vec![
                user("u-s1", Role::Student, "Student Ray"),
                user("u-t1", Role::Teacher, "Teacher Jane"),
            ],
            teachers: vec![Teacher {
                id: TeacherId::from("t1"),
                profile_id: UserId::from("u-t1"),
                status: TeacherStatus::Active,
                specialties: vec!["conversation".into()],
                languages: vec!["en".into()],
                hourly_rate: 35.0,
                bank_name: None,
                bank_account: None,
                deleted_at: None,
                created_at: at,
                updated_at: at,
            }],
            students: vec![Student {
                id: StudentId::from("s1"),
                profile_id: UserId::from("u-s1"),
                status: StudentStatus::Active,
                deleted_at: None,
                created_at: at,
                updated_at: at,
            }],
            bookings: vec![Booking {
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
            }],
            ..Mirror::default()
        }
    }

    #[test]
    fn test_booking_view_joins_both_display_names() {
        let view = mirror().booking_view();

        assert_eq!(view.len(), 1);
        assert_eq!(view[0].booking.id, BookingId::from("b1"));
        assert_eq!(view[0].student_name.as_deref(), Some("Student Ray"));
        assert_eq!(view[0].teacher_name.as_deref(), Some("Teacher Jane"));
    }

    #[test]
    fn test_booking_view_dangling_student_keeps_row() {
        let mut mirror = mirror();
        mirror.students.clear();

        let view = mirror.booking_view();

        assert_eq!(view.len(), 1);
        assert_eq!(view[0].student_name, None);
        assert_eq!(view[0].teacher_name.as_deref(), Some("Teacher Jane"));
    }

    #[test]
    fn test_teacher_profiles_follow_profile_edits() {
        let mut mirror = mirror();
        mirror.users[1].display_name = "Jane Doe".into();

        let profiles = mirror.teacher_profiles();

        assert_eq!(profiles[0].display_name.as_deref(), Some("Jane Doe"));
        assert_eq!(profiles[0].email.as_deref(), Some("u-t1@example.com"));
    }

    #[test]
    fn test_student_profiles_joins_profile() {
        let profiles = mirror().student_profiles();

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].display_name.as_deref(), Some("Student Ray"));
    }
}
