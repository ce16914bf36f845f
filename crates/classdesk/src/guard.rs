//! The route guard: may this navigation go ahead?
//!
//! The UI layer asks before rendering any view. Every route carries a
//! [`RouteMeta`]; the guard combines it with the session and cache to
//! produce a [`Decision`]:
//!
//! ```text
//! public route ──→ restore ──→ signed in on /login or /register? ──→ landing page
//!                                                             else ──→ allow
//!
//! protected ─────→ restore ──→ anonymous? ──→ /login?redirect=<target>
//!                     │
//!                     └──→ load cache (failure is logged, not fatal)
//!                            └──→ role allowed? ──→ allow
//!                                          else ──→ landing page
//! ```

use std::collections::BTreeMap;

use classdesk_cache::EntityCache;
use classdesk_model::{Codec, Role};
use classdesk_remote::RemoteStore;
use classdesk_session::{
    ACCOUNTS_OVERVIEW_PATH, BOOKING_OVERVIEW_PATH, LOGIN_PATH, LocalStorage, REGISTER_PATH,
    STUDENT_BOOKINGS_PATH, SessionStore, can_access_role,
};

// ---------------------------------------------------------------------------
// Route metadata
// ---------------------------------------------------------------------------

/// What the guard needs to know about a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    /// Open without signing in.
    pub public: bool,
    /// Roles allowed in. Empty means every signed-in role.
    pub required_roles: Vec<Role>,
}

impl RouteMeta {
    pub fn public() -> Self {
        Self {
            public: true,
            required_roles: Vec::new(),
        }
    }

    pub fn roles(roles: &[Role]) -> Self {
        Self {
            public: false,
            required_roles: roles.to_vec(),
        }
    }
}

/// The outcome of a navigation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Render the target.
    Allow,
    /// Go to `path` instead. `redirect_to` is where to return after a
    /// successful login.
    Redirect {
        path: String,
        redirect_to: Option<String>,
    },
}

impl Decision {
    fn to(path: &str) -> Self {
        Self::Redirect {
            path: path.to_string(),
            redirect_to: None,
        }
    }
}

/// The application's routes, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<String, RouteMeta>,
    aliases: BTreeMap<String, String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, meta: RouteMeta) -> Self {
        self.routes.insert(path.to_string(), meta);
        self
    }

    /// Makes `from` redirect straight to `to`.
    pub fn alias(mut self, from: &str, to: &str) -> Self {
        self.aliases.insert(from.to_string(), to.to_string());
        self
    }

    pub fn get(&self, path: &str) -> Option<&RouteMeta> {
        self.routes.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// The teaching platform's route list.
    pub fn standard() -> Self {
        use Role::{Admin, Student, Teacher};

        Self::new()
            .alias("/", LOGIN_PATH)
            .route(LOGIN_PATH, RouteMeta::public())
            .route(REGISTER_PATH, RouteMeta::public())
            .route(ACCOUNTS_OVERVIEW_PATH, RouteMeta::roles(&[Admin]))
            .route("/system/roles", RouteMeta::roles(&[Admin]))
            .route("/system/payroll", RouteMeta::roles(&[Admin]))
            .route("/system/leave", RouteMeta::roles(&[Admin, Teacher]))
            .route("/courses/teachers", RouteMeta::roles(&[Admin, Teacher]))
            .route("/courses/teacher-accounts", RouteMeta::roles(&[Admin, Teacher]))
            .route(BOOKING_OVERVIEW_PATH, RouteMeta::roles(&[Admin, Teacher]))
            .route(STUDENT_BOOKINGS_PATH, RouteMeta::roles(&[Admin, Teacher, Student]))
    }
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Decides navigations against a [`RouteTable`].
#[derive(Debug, Clone)]
pub struct RouteGuard {
    table: RouteTable,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(RouteTable::standard())
    }
}

impl RouteGuard {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Checks a navigation to `target`, a full path that may carry a
    /// query string.
    ///
    /// Never fails: restore and cache errors are logged and folded into
    /// the decision.
    pub async fn decide<R, S, C>(
        &self,
        target: &str,
        session: &SessionStore<R, S, C>,
        cache: &EntityCache<R>,
    ) -> Decision
    where
        R: RemoteStore,
        S: LocalStorage,
        C: Codec,
    {
        let path = target.split(['?', '#']).next().unwrap_or(target);
        if let Some(to) = self.table.aliases.get(path) {
            return Decision::to(to);
        }
        let Some(meta) = self.table.get(path) else {
            tracing::debug!(path = target, "unknown route");
            return Decision::to(LOGIN_PATH);
        };

        if let Err(e) = session.restore_session().await {
            tracing::warn!(error = %e, "session restore failed; treating as signed out");
        }

        if meta.public {
            let landing = session.default_route();
            // A role without a landing page lands on /login itself.
            if session.is_authenticated()
                && (path == LOGIN_PATH || path == REGISTER_PATH)
                && landing != path
            {
                return Decision::to(landing);
            }
            return Decision::Allow;
        }

        let Some(role) = session.role() else {
            return Decision::Redirect {
                path: LOGIN_PATH.to_string(),
                redirect_to: Some(target.to_string()),
            };
        };

        if let Err(e) = cache.ensure_initialized().await {
            tracing::warn!(error = %e, "cache sync failed; continuing with partial data");
        }

        if !can_access_role(role, &meta.required_roles) {
            tracing::debug!(path = target, %role, "role not allowed; sending to landing page");
            return Decision::to(session.default_route());
        }
        Decision::Allow
    }
}
