//! Authentication and user session management

mod types;

use crate::error::{Error, Result};
use crate::fetch::ApiClient;
use crate::session::Session;

pub use types::*;

/// Outcome of restoring a persisted session at startup
#[derive(Debug, Clone, PartialEq)]
pub enum Hydration {
    /// No token was persisted
    Anonymous,
    /// The persisted token was accepted and the profile loaded
    Restored(User),
    /// The profile request failed; a 401 has already ended the session
    Rejected(String),
}

/// Store for the signed-in user. The only public writer of the session.
pub struct AuthStore {
    api: ApiClient,
    session: Session,
}

impl AuthStore {
    /// Create a new AuthStore over the client's session
    pub fn new(api: ApiClient) -> Self {
        let session = api.session().clone();
        Self { api, session }
    }

    /// The current token
    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    /// The loaded user profile
    pub fn user(&self) -> Option<User> {
        self.session.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Sign in with email and password, then load the profile.
    ///
    /// Does not navigate; see [`CoursewareClient::sign_in`](crate::CoursewareClient::sign_in).
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let credentials = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response: AuthResponse = self.api.post("/auth/login", &credentials).await?;
        self.session.set_token(&response.access_token)?;
        log::info!("Signed in as {}", email);

        self.fetch_user()
            .await?
            .ok_or_else(|| Error::general("Session ended before the profile was loaded"))
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, data: &RegisterRequest) -> Result<()> {
        self.api
            .request(reqwest::Method::POST, "/auth/register")
            .json(data)?
            .execute_unit()
            .await
    }

    /// Load the profile for the current token; `None` without a token
    pub async fn fetch_user(&self) -> Result<Option<User>> {
        if !self.session.is_authenticated() {
            return Ok(None);
        }

        let user: User = self.api.get("/auth/me").await?;
        self.session.set_user(user.clone());
        Ok(Some(user))
    }

    /// Clear token, user and the persisted copy. Safe to call repeatedly.
    pub fn logout(&self) {
        if self.session.is_authenticated() {
            log::info!("Signed out");
        }
        self.session.clear();
    }

    /// Restore the profile for a persisted token.
    ///
    /// Failures are logged and reported in the returned [`Hydration`], never as an error.
    pub async fn hydrate(&self) -> Hydration {
        if !self.session.is_authenticated() {
            return Hydration::Anonymous;
        }

        match self.fetch_user().await {
            Ok(Some(user)) => Hydration::Restored(user),
            Ok(None) => Hydration::Anonymous,
            Err(err) => {
                log::warn!("Could not restore the saved session: {}", err);
                Hydration::Rejected(err.to_string())
            }
        }
    }
}
