//! Courseware Client Library
//!
//! Client-side state and navigation for a courseware platform where
//! methodists author courses, tests and case studies and students take them.
//! One [`CoursewareClient`] wires a shared [`Session`](session::Session) into
//! the HTTP client, the router and the domain stores.

pub mod auth;
pub mod cases;
pub mod config;
pub mod courses;
pub mod error;
pub mod fetch;
pub mod router;
pub mod session;
pub mod testing;

mod store;

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::auth::{AuthStore, Hydration};
use crate::cases::CasesStore;
use crate::config::Config;
use crate::courses::CoursesStore;
use crate::error::{Error, Result};
use crate::fetch::ApiClient;
use crate::router::{dashboard_path, Router};
use crate::session::{FileTokenStore, Session, TokenStore};
use crate::testing::TestsStore;

pub use courseware_storage::{FileUpload, ObjectStorage, S3Options, StorageError, StorageUploader};

/// The main entry point: session, router and stores sharing one API client
pub struct CoursewareClient {
    session: Session,
    router: Arc<Router>,
    api: ApiClient,
    auth: AuthStore,
    courses: CoursesStore,
    tests: TestsStore,
    cases: CasesStore,
    storage: Option<Arc<dyn ObjectStorage>>,
    hydration: OnceCell<Hydration>,
}

impl CoursewareClient {
    /// Create a new client
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use courseware_client::{config::Config, session::MemoryTokenStore, CoursewareClient};
    ///
    /// let config = Config::new("http://localhost:8000/api").unwrap();
    /// let client = CoursewareClient::new(config, Arc::new(MemoryTokenStore::new())).unwrap();
    /// assert!(!client.session().is_authenticated());
    /// ```
    pub fn new(config: Config, token_store: Arc<dyn TokenStore>) -> Result<Self> {
        let session = Session::new(token_store);
        let router = Arc::new(Router::new(session.clone()));
        let api = ApiClient::new(&config.api_url, session.clone(), router.clone(), &config.options)?;

        let storage = match config.storage {
            Some(options) => {
                let uploader = StorageUploader::new(options, config.options.http_client()?);
                Some(Arc::new(uploader) as Arc<dyn ObjectStorage>)
            }
            None => None,
        };

        Ok(Self {
            auth: AuthStore::new(api.clone()),
            courses: CoursesStore::new(api.clone()),
            tests: TestsStore::new(api.clone()),
            cases: CasesStore::new(api.clone()),
            session,
            router,
            api,
            storage,
            hydration: OnceCell::new(),
        })
    }

    /// Build from the environment, persisting the token in `path`
    pub fn from_env(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config = Config::from_env()?;
        let token_store = FileTokenStore::new(path, &config.options.token_key);
        Self::new(config, Arc::new(token_store))
    }

    /// Replace the object storage backend
    pub fn with_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Restore the persisted session. Runs once; later calls return the first outcome.
    pub async fn initialize(&self) -> Hydration {
        self.hydration
            .get_or_init(|| async {
                let hydration = self.auth.hydrate().await;
                log::debug!("Session hydrated: {:?}", hydration);
                hydration
            })
            .await
            .clone()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    pub fn courses(&self) -> &CoursesStore {
        &self.courses
    }

    pub fn tests(&self) -> &TestsStore {
        &self.tests
    }

    pub fn cases(&self) -> &CasesStore {
        &self.cases
    }

    /// The configured object storage
    pub fn storage(&self) -> Result<&dyn ObjectStorage> {
        self.storage
            .as_deref()
            .ok_or_else(|| Error::config("Object storage is not configured"))
    }

    /// Sign in and go to the user's dashboard. Returns the path landed on.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String> {
        let user = self.auth.login(email, password).await?;
        self.router.push(dashboard_path(user.role))
    }

    /// Sign out and go to the login page
    pub fn sign_out(&self) -> Result<String> {
        self.auth.logout();
        self.router.push(router::LOGIN_PATH)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{Role, User};
    pub use crate::config::{ClientOptions, Config};
    pub use crate::error::{Error, Result};
    pub use crate::session::{FileTokenStore, MemoryTokenStore, TokenStore};
    pub use crate::CoursewareClient;
}
