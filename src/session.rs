//! Session context shared by the API client, the auth store and the router
//!
//! The session is the only piece of state the whole client agrees on: the
//! bearer token and, once fetched, the profile of the user it belongs to.
//! Reading is public. Writing is crate-private and reached through
//! [`AuthStore`](crate::auth::AuthStore) (and the 401 handler, which performs
//! the same logout).

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};

use crate::auth::{Role, User};
use crate::error::{Error, Result};

/// Synchronous key-value side channel holding the persisted token
pub trait TokenStore: Send + Sync {
    /// Read the persisted token
    fn load(&self) -> Option<String>;

    /// Persist a token, replacing any previous one
    fn save(&self, token: &str) -> Result<()>;

    /// Remove the persisted token. Removing a missing token is not an error.
    fn clear(&self) -> Result<()>;
}

/// Token store that lives as long as the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a token already persisted
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Token store backed by a JSON object file, one key per entry
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
}

impl FileTokenStore {
    pub fn new(path: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            key: key.to_string(),
        }
    }

    fn read_entries(&self) -> Result<Map<String, Value>> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Map::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(err) => Err(Error::persistence(err)),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(Error::persistence)?;
            }
        }
        let text = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, text).map_err(Error::persistence)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        match self.read_entries() {
            Ok(entries) => entries
                .get(&self.key)
                .and_then(Value::as_str)
                .map(str::to_string),
            Err(err) => {
                log::warn!("Ignoring unreadable token file {}: {}", self.path.display(), err);
                None
            }
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(self.key.clone(), Value::String(token.to_string()));
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<()> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(_) => Map::new(),
        };
        if entries.remove(&self.key).is_none() && !self.path.exists() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}

/// What the navigation guard needs to know about the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionView {
    pub authenticated: bool,
    /// Role of the loaded user, `None` until the profile is fetched
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

/// Shared handle to the session. Cloning is cheap; clones see the same state.
#[derive(Clone)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
    store: Arc<dyn TokenStore>,
}

impl Session {
    /// Create a session, loading the persisted token once
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let token = store.load();
        Self {
            state: Arc::new(RwLock::new(SessionState { token, user: None })),
            store,
        }
    }

    /// Session backed by a [`MemoryTokenStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The bearer token
    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    /// The loaded user profile
    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    /// Role of the loaded user
    pub fn role(&self) -> Option<Role> {
        self.read().user.as_ref().map(|user| user.role)
    }

    /// Token presence is the only gate; the token itself is never inspected
    pub fn is_authenticated(&self) -> bool {
        self.read().token.is_some()
    }

    /// Snapshot for the navigation guard
    pub fn view(&self) -> SessionView {
        let state = self.read();
        SessionView {
            authenticated: state.token.is_some(),
            role: state.user.as_ref().map(|user| user.role),
        }
    }

    pub(crate) fn set_token(&self, token: &str) -> Result<()> {
        self.store.save(token)?;
        self.write().token = Some(token.to_string());
        Ok(())
    }

    pub(crate) fn set_user(&self, user: User) {
        self.write().user = Some(user);
    }

    /// Drop token, user and the persisted copy
    pub(crate) fn clear(&self) {
        {
            let mut state = self.write();
            state.token = None;
            state.user = None;
        }
        if let Err(err) = self.store.clear() {
            log::warn!("Failed to clear persisted token: {}", err);
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Session")
            .field("authenticated", &state.token.is_some())
            .field("user", &state.user.as_ref().map(|user| user.id))
            .finish()
    }
}
