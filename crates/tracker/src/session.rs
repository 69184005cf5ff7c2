//! Client session identity.
//!
//! An opaque id generated once per storage scope and reused for every
//! event from that client. Storage failures fall back to an id that lives
//! as long as the provider.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use portfolio_core::{generate_session_id, limits::MAX_SESSION_ID_LEN};
use tracing::{debug, warn};

use crate::error::Result;

/// Storage key used by the browser client.
pub const SESSION_STORAGE_KEY: &str = "portfolio_session_id";

/// Persistent slot for one session id.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>>;

    fn store(&self, session_id: &str) -> Result<()>;
}

/// Stores the id in a single file.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/portfolio_session_id`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SESSION_STORAGE_KEY))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, session_id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, session_id)?;
        Ok(())
    }
}

/// Process-lifetime storage.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    slot: Mutex<Option<String>>,
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot.lock().clone())
    }

    fn store(&self, session_id: &str) -> Result<()> {
        *self.slot.lock() = Some(session_id.to_string());
        Ok(())
    }
}

/// Hands out the client's session id, creating it on first use.
pub struct SessionIdProvider {
    storage: Arc<dyn SessionStorage>,
    current: Mutex<Option<String>>,
}

impl SessionIdProvider {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            current: Mutex::new(None),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStorage::default()))
    }

    pub fn get_or_create(&self) -> String {
        let mut current = self.current.lock();
        if let Some(id) = current.as_ref() {
            return id.clone();
        }

        let id = match self.storage.load() {
            Ok(Some(stored)) if is_usable(&stored) => stored,
            Ok(_) => self.create(),
            Err(e) => {
                warn!(error = %e, "Session storage unreadable, using process-lifetime id");
                self.create()
            }
        };

        *current = Some(id.clone());
        id
    }

    fn create(&self) -> String {
        let id = generate_session_id();
        match self.storage.store(&id) {
            Ok(()) => debug!("Created session id"),
            Err(e) => warn!(error = %e, "Failed to persist session id"),
        }
        id
    }
}

fn is_usable(id: &str) -> bool {
    !id.is_empty() && id.chars().count() <= MAX_SESSION_ID_LEN
}
