//! Role checks and landing routes.

use classdesk_model::Role;

/// Sign-in page.
pub const LOGIN_PATH: &str = "/login";

/// Registration page.
pub const REGISTER_PATH: &str = "/register";

/// Admin landing page.
pub const ACCOUNTS_OVERVIEW_PATH: &str = "/system/accounts";

/// Teacher landing page.
pub const BOOKING_OVERVIEW_PATH: &str = "/courses/overview";

/// Student landing page.
pub const STUDENT_BOOKINGS_PATH: &str = "/students/bookings";

/// Returns `true` if `role` may open a view restricted to `allowed`.
///
/// An empty list means the view is open to every signed-in role.
pub fn can_access_role(role: Role, allowed: &[Role]) -> bool {
    allowed.is_empty() || allowed.contains(&role)
}

/// Where a user with `role` lands after signing in.
pub fn default_route(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Admin) => ACCOUNTS_OVERVIEW_PATH,
        Some(Role::Teacher) => BOOKING_OVERVIEW_PATH,
        Some(Role::Student) => STUDENT_BOOKINGS_PATH,
        Some(Role::Employee) | None => LOGIN_PATH,
    }
}
