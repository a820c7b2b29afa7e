//! Access/refresh token storage.
//!
//! The token pair is held behind [`SessionStore`] so every component that
//! needs it receives the store explicitly. [`FileSessionStore`] keeps the two
//! tokens under the `access` and `refresh` keys of a small TOML file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::models::TokenPair;

/// The current token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "access")]
    pub access_token: String,
    #[serde(rename = "refresh")]
    pub refresh_token: String,
}

impl From<TokenPair> for Session {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access,
            refresh_token: tokens.refresh,
        }
    }
}

/// Read/write/clear access to the session.
pub trait SessionStore: Send + Sync {
    /// The stored session, if any.
    fn get(&self) -> Option<Session>;

    /// Replace the stored session.
    fn set(&self, session: Session) -> Result<()>;

    /// Forget the stored session.
    fn clear(&self) -> Result<()>;

    /// Whether a non-empty access token is stored.
    fn is_authenticated(&self) -> bool {
        self.get().is_some_and(|s| !s.access_token.is_empty())
    }
}

/// Session kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: RwLock::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<Session> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, session: Session) -> Result<()> {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Session cached in memory and written through to a file.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    inner: RwLock<Option<Session>>,
}

impl FileSessionStore {
    /// Open the store at `path`, reading any session saved by a previous run.
    ///
    /// An unreadable session file is treated as logged out.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let session = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session file: {}", path.display()))?;
            match toml::from_str::<Session>(&contents) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!("Ignoring malformed session file {}: {}", path.display(), e);
                    None
                }
            }
        } else {
            None
        };

        tracing::debug!(
            "Opened session store at {} (logged in: {})",
            path.display(),
            session.is_some()
        );

        Ok(Self {
            path,
            inner: RwLock::new(session),
        })
    }

    /// Default location of the session file.
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir().context("Could not determine data directory")?;
        Ok(data_dir.join("empdesk").join("session.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<Session> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, session: Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create session directory: {}", parent.display()))?;
        }

        let contents = toml::to_string(&session).context("Failed to serialize session")?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;

        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;

        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove session file: {}", self.path.display()))?;
        }
        Ok(())
    }
}
