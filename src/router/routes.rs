//! The application's route table

use std::collections::HashMap;

use super::RouteRequirement;
use crate::auth::Role;

/// Page shell a route renders in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Login and registration
    Guest,
    Methodist,
    Student,
}

/// What a matched route does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    View,
    Redirect(&'static str),
}

/// One entry of the route table. Path segments starting with `:` capture a parameter.
#[derive(Debug, Clone)]
pub struct RouteDef {
    pub path: String,
    pub name: Option<&'static str>,
    pub layout: Option<Layout>,
    pub requirement: RouteRequirement,
    pub target: RouteTarget,
}

impl RouteDef {
    pub fn view(
        path: &str,
        name: &'static str,
        layout: Layout,
        requirement: RouteRequirement,
    ) -> Self {
        Self {
            path: path.to_string(),
            name: Some(name),
            layout: Some(layout),
            requirement,
            target: RouteTarget::View,
        }
    }

    pub fn redirect(path: &str, to: &'static str) -> Self {
        Self {
            path: path.to_string(),
            name: None,
            layout: None,
            requirement: RouteRequirement::Public,
            target: RouteTarget::Redirect(to),
        }
    }

    /// Match a normalized path, returning the captured parameters
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let pattern: Vec<&str> = self.path.split('/').filter(|s| !s.is_empty()).collect();
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if pattern.len() != actual.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (expected, segment) in pattern.iter().zip(actual.iter()) {
            match expected.strip_prefix(':') {
                Some(name) => {
                    params.insert(name.to_string(), segment.to_string());
                }
                None if expected == segment => {}
                None => return None,
            }
        }

        Some(params)
    }
}

fn area(
    prefix: &str,
    layout: Layout,
    role: Role,
    children: &[(&str, &'static str)],
) -> Vec<RouteDef> {
    children
        .iter()
        .map(|(path, name)| {
            RouteDef::view(
                &format!("{}/{}", prefix, path),
                name,
                layout,
                RouteRequirement::RequiresRole(role),
            )
        })
        .collect()
}

/// Routes of the web client, in matching order
pub fn default_routes() -> Vec<RouteDef> {
    let mut routes = vec![
        RouteDef::redirect("/", "/login"),
        RouteDef::view("/login", "login", Layout::Guest, RouteRequirement::RequiresGuest),
        RouteDef::view("/register", "register", Layout::Guest, RouteRequirement::RequiresGuest),
    ];

    routes.extend(area(
        "/methodist",
        Layout::Methodist,
        Role::Methodist,
        &[
            ("dashboard", "methodist-dashboard"),
            ("courses", "methodist-courses"),
            ("courses/create", "methodist-course-create"),
            ("courses/:id/edit", "methodist-course-edit"),
            ("results", "methodist-results"),
            ("cases", "methodist-cases"),
            ("cases/create", "methodist-case-create"),
            ("cases/:id/edit", "methodist-case-edit"),
        ],
    ));

    routes.extend(area(
        "/student",
        Layout::Student,
        Role::Student,
        &[
            ("dashboard", "student-dashboard"),
            ("courses", "student-courses"),
            ("courses/:id", "student-course-detail"),
            ("tests/:id", "student-test"),
            ("tests/:id/result", "student-test-result"),
            ("cases", "student-cases"),
            ("cases/:id", "student-case-detail"),
        ],
    ));

    routes
}
