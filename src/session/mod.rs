//! Persisted session state (bearer token and role).
//!
//! The store is a flat string map written through to a JSON file on every
//! mutation, so a completed login is on disk before anything reads it.
//! Nothing else in the crate touches the session file directly.
//!
//! Concurrent processes are last-writer-wins; there is no locking.

mod role;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub use role::{Role, role_label};

pub const TOKEN_KEY: &str = "token";
pub const ROLE_KEY: &str = "role";

/// Snapshot of the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub role: Role,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Key/value session store, optionally backed by a file.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl SessionStore {
    /// Open the store at `path`. A missing or malformed file is an empty
    /// session.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = read_values(&path).unwrap_or_default();
        Self {
            path: Some(path),
            values,
        }
    }

    /// A store that is never persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        self.values.insert(key.to_string(), value.into());
        self.persist()
    }

    /// Remove every key and delete the backing file.
    pub fn clear(&mut self) -> Result<()> {
        self.values.clear();
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Role string exactly as the server returned it.
    pub fn raw_role(&self) -> Option<&str> {
        self.get(ROLE_KEY).filter(|r| !r.is_empty())
    }

    pub fn session(&self) -> Session {
        Session {
            token: self.token().map(str::to_string),
            role: Role::from_optional(self.raw_role()),
        }
    }

    /// Store the credentials of a successful login in one write.
    pub fn save_login(&mut self, token: &str, role: &str) -> Result<()> {
        self.values.insert(TOKEN_KEY.to_string(), token.to_string());
        self.values.insert(ROLE_KEY.to_string(), role.to_string());
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.values).map_err(io::Error::other)?;
        let mut file = open_private(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

fn read_values(path: &Path) -> Option<BTreeMap<String, String>> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
