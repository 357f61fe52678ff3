//! Types for authentication and user management

use serde::{Deserialize, Serialize};

/// The only authorization discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Takes tests and cases, never sees answer keys before submitting
    Student,
    /// Authors courses, tests and cases
    Methodist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Methodist => "methodist",
        }
    }
}

/// User profile as returned by `/auth/me` and `/users/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

/// Login credentials
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration form
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

/// Token issued by `/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The access token
    pub access_token: String,

    /// The token type, "bearer"
    #[serde(default)]
    pub token_type: Option<String>,
}
