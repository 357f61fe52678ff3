//! Route table and role-based navigation guard
//!
//! Routes are grouped under three layouts: the guest pages, the methodist
//! area and the student area. Every navigation is checked against the
//! session by [`evaluate`], a pure function, so the rules can be tested
//! without a router at all.

mod routes;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::auth::Role;
use crate::error::{Error, Result};
use crate::session::{Session, SessionView};

pub use routes::{default_routes, Layout, RouteDef, RouteTarget};

/// Path of the login page
pub const LOGIN_PATH: &str = "/login";

/// Redirects followed in one navigation before it is treated as a loop
const MAX_REDIRECTS: usize = 8;

/// Something that can take the user to a path
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// What a route asks of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement {
    Public,
    RequiresAuth,
    RequiresGuest,
    /// Signed in with this role; implies `RequiresAuth`
    RequiresRole(Role),
}

impl RouteRequirement {
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::RequiresAuth | Self::RequiresRole(_))
    }
}

/// Guard verdict for one navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Redirect(String),
}

/// Landing page for a role
pub fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::Methodist => "/methodist/dashboard",
        Role::Student => "/student/dashboard",
    }
}

fn redirect_unless_there(target: &str, destination: &str) -> NavigationDecision {
    if target == destination {
        NavigationDecision::Allow
    } else {
        NavigationDecision::Redirect(destination.to_string())
    }
}

/// Decide whether the session may enter `target`.
///
/// Rules, first match wins:
/// 1. auth required, no token: go to `/login`
/// 2. guests only, token present: go to the role's dashboard
/// 3. role required, loaded user has another role: go to that user's dashboard
/// 4. otherwise allow
///
/// Rules 2 and 3 allow the navigation when `target` already is the dashboard.
/// Without a loaded user rule 2 falls back to the student dashboard and rule 3
/// does not apply.
pub fn evaluate(
    session: &SessionView,
    target: &str,
    requirement: RouteRequirement,
) -> NavigationDecision {
    if requirement.requires_auth() && !session.authenticated {
        return NavigationDecision::Redirect(LOGIN_PATH.to_string());
    }

    if requirement == RouteRequirement::RequiresGuest && session.authenticated {
        let destination = dashboard_path(session.role.unwrap_or(Role::Student));
        return redirect_unless_there(target, destination);
    }

    if let RouteRequirement::RequiresRole(required) = requirement {
        if let Some(role) = session.role {
            if role != required {
                return redirect_unless_there(target, dashboard_path(role));
            }
        }
    }

    NavigationDecision::Allow
}

/// A path matched against the route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// Path without query or fragment
    pub path: String,
    pub name: Option<&'static str>,
    pub layout: Option<Layout>,
    pub requirement: RouteRequirement,
    pub params: HashMap<String, String>,
    /// Static redirect declared by the route
    pub redirect: Option<&'static str>,
}

/// The route table plus the current location
pub struct Router {
    routes: Vec<RouteDef>,
    session: Session,
    current: RwLock<Option<ResolvedRoute>>,
}

impl Router {
    /// Router over the application's route table
    pub fn new(session: Session) -> Self {
        Self::with_routes(session, default_routes())
    }

    pub fn with_routes(session: Session, routes: Vec<RouteDef>) -> Self {
        Self {
            routes,
            session,
            current: RwLock::new(None),
        }
    }

    /// Match a path against the table
    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute> {
        let path = strip_path(path);
        self.routes.iter().find_map(|route| {
            route.match_path(&path).map(|params| ResolvedRoute {
                path: path.clone(),
                name: route.name,
                layout: route.layout,
                requirement: route.requirement,
                params,
                redirect: match route.target {
                    RouteTarget::Redirect(to) => Some(to),
                    RouteTarget::View => None,
                },
            })
        })
    }

    /// Navigate to a path, following static and guard redirects.
    ///
    /// Returns the path the navigation ended on.
    pub fn push(&self, path: &str) -> Result<String> {
        let mut target = path.to_string();

        for _ in 0..MAX_REDIRECTS {
            let route = self
                .resolve(&target)
                .ok_or_else(|| Error::navigation(format!("No route matches '{}'", target)))?;

            if let Some(to) = route.redirect {
                target = to.to_string();
                continue;
            }

            match evaluate(&self.session.view(), &route.path, route.requirement) {
                NavigationDecision::Allow => {
                    let landed = route.path.clone();
                    log::debug!("Navigated to {}", landed);
                    *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(route);
                    return Ok(landed);
                }
                NavigationDecision::Redirect(to) => {
                    log::debug!("Guard redirected {} to {}", route.path, to);
                    target = to;
                }
            }
        }

        Err(Error::navigation(format!("Redirect loop while navigating to '{}'", path)))
    }

    /// The route the last successful navigation landed on
    pub fn current(&self) -> Option<ResolvedRoute> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_path(&self) -> Option<String> {
        self.current().map(|route| route.path)
    }
}

impl Navigator for Router {
    fn navigate(&self, path: &str) {
        if let Err(err) = self.push(path) {
            log::warn!("Navigation to {} failed: {}", path, err);
        }
    }
}

fn strip_path(path: &str) -> String {
    let end = path.find(|c| c == '?' || c == '#').unwrap_or(path.len());
    let path = &path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
