use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::core::user::{Session, User};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Persistent home of the auth token and user profile.
///
/// Read on every authenticated request, written by login, cleared by logout.
pub trait SessionStore: Send + Sync {
    fn token(&self) -> Result<Option<String>, SessionError>;
    fn user(&self) -> Result<Option<User>, SessionError>;
    fn save(&self, session: &Session) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;

    fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(match self.token()? {
            Some(token) => Some(Session {
                token,
                user: self.user()?,
            }),
            None => None,
        })
    }
}

/// On-disk layout: one JSON object with the fixed `token` and `user` keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, rename = "token", skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, rename = "user", skip_serializing_if = "Option::is_none")]
    user: Option<User>,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            token: Some(session.token.clone()),
            user: session.user.clone(),
        }
    }
}

/// Session kept in a JSON file, normally `<data dir>/taskdesk/session.json`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoredSession, SessionError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredSession::default());
            }
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(StoredSession::default());
        }
        serde_json::from_str(&text).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn io_err(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.read()?.token.filter(|t| !t.is_empty()))
    }

    fn user(&self) -> Result<Option<User>, SessionError> {
        Ok(self.read()?.user)
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let stored = StoredSession::from(session);
        let json = serde_json::to_string_pretty(&stored).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(|e| self.io_err(e))?;

        // The token is a bearer credential; keep it owner-readable only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_err(e))?;
        }

        log::debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("Removed session file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// Session held only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<StoredSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: &Session) -> Self {
        Self {
            inner: Mutex::new(StoredSession::from(session)),
        }
    }

    fn snapshot(&self) -> StoredSession {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace(&self, stored: StoredSession) {
        *self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = stored;
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.snapshot().token.filter(|t| !t.is_empty()))
    }

    fn user(&self) -> Result<Option<User>, SessionError> {
        Ok(self.snapshot().user)
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        self.replace(StoredSession::from(session));
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.replace(StoredSession::default());
        Ok(())
    }
}
