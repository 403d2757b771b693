//! services/client/src/adapters/storage.rs
//!
//! File-backed implementation of the `SessionStore` port. The snapshot is a
//! small JSON document holding the last known profile.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use event_planner_core::domain::User;
use event_planner_core::ports::{PortError, PortResult, SessionStore};
use serde::{Deserialize, Serialize};
use tracing::debug;

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
}

#[derive(Serialize, Deserialize)]
struct SnapshotRecord {
    id: i64,
    username: String,
    email: String,
    #[serde(default)]
    role: Option<String>,
    saved_at: DateTime<Utc>,
}

impl SnapshotRecord {
    fn from_domain(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            saved_at: Utc::now(),
        }
    }

    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            role: self.role,
        }
    }
}

fn storage_error(path: &Path, e: impl std::fmt::Display) -> PortError {
    PortError::Storage(format!("{}: {}", path.display(), e))
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> PortResult<Option<User>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(&self.path, e)),
        };
        let record: SnapshotRecord =
            serde_json::from_str(&raw).map_err(|e| storage_error(&self.path, e))?;
        Ok(Some(record.to_domain()))
    }

    fn save(&self, user: &User) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&SnapshotRecord::from_domain(user))
            .map_err(|e| storage_error(&self.path, e))?;
        fs::write(&self.path, json).map_err(|e| storage_error(&self.path, e))?;
        debug!(path = %self.path.display(), "Saved session snapshot.");
        Ok(())
    }

    fn clear(&self) -> PortResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(&self.path, e)),
        }
    }

    fn contains(&self) -> bool {
        self.path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Some("ORGANIZER".to_string()),
        }
    }

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert!(!store.contains());
        assert_eq!(store.load().unwrap(), None);

        store.save(&user()).unwrap();
        assert!(store.contains());
        assert_eq!(store.load().unwrap(), Some(user()));

        store.clear().unwrap();
        assert!(!store.contains());
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_snapshot_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(matches!(store.load(), Err(PortError::Storage(_))));
    }
}
