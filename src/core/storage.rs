//! # Session Storage
//!
//! A string key/value store scoped to one browsing session, mirroring the
//! web `sessionStorage` API. `AppState` persists its context here.
//!
//! Two backends:
//!
//! - [`FileStorage`]: one JSON file per session under `~/.quizshell/sessions/`,
//!   so relaunching with the same session id behaves like a page reload.
//!   Writes use atomic rename (write `.tmp`, then `rename()`).
//! - [`MemoryStorage`]: process-local, with optional quota and a "disabled"
//!   mode for exercising failure paths.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::lock;

#[derive(Debug)]
pub enum StorageError {
    /// Storage is turned off (private mode, user setting).
    Disabled,
    /// Writing would exceed the storage quota.
    QuotaExceeded { needed: usize, quota: usize },
    Io(io::Error),
    Encode(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Disabled => write!(f, "session storage is disabled"),
            StorageError::QuotaExceeded { needed, quota } => {
                write!(f, "session storage quota exceeded ({needed} > {quota} bytes)")
            }
            StorageError::Io(e) => write!(f, "session storage I/O error: {e}"),
            StorageError::Encode(e) => write!(f, "session storage encode error: {e}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Session-scoped string storage.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

// ============================================================================
// In-Memory Backend
// ============================================================================

#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
    disabled: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes whose total stored size would exceed `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Every operation fails with [`StorageError::Disabled`].
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.disabled {
            return Err(StorageError::Disabled);
        }
        Ok(lock(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Disabled);
        }
        let mut items = lock(&self.items);
        if let Some(quota) = self.quota {
            let others: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Disabled);
        }
        lock(&self.items).remove(key);
        Ok(())
    }
}

// ============================================================================
// File Backend
// ============================================================================

/// On-disk layout of one session file.
#[derive(Serialize, Deserialize, Default, Debug)]
struct StoredSession {
    updated_at: i64,
    items: BTreeMap<String, String>,
}

pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

/// Returns `~/.quizshell/sessions/`, creating it if needed.
pub fn sessions_dir() -> io::Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?;
    let dir = home.join(".quizshell").join("sessions");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Generate a new UUID v4 session ID.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl FileStorage {
    /// Opens (or starts) the session file `<dir>/<session_id>.json`.
    ///
    /// An unreadable or corrupt file is logged and treated as empty.
    pub fn open(dir: &Path, session_id: &str) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{session_id}.json"));

        let items = match fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<StoredSession>(&json) {
                Ok(stored) => {
                    debug!("Loaded {} storage item(s) from {}", stored.items.len(), path.display());
                    stored.items
                }
                Err(e) => {
                    warn!("Discarding corrupt session file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let stored = StoredSession {
            updated_at: Utc::now().timestamp(),
            items: items.clone(),
        };
        atomic_write_json(&self.path, &stored)
    }
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StorageError> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data).map_err(StorageError::Encode)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = lock(&self.items);
        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&items) {
            // Keep memory and disk in agreement.
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = lock(&self.items);
        if items.remove(key).is_some() {
            self.flush(&items)?;
        }
        Ok(())
    }
}
