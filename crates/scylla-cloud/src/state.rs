//! Persistence of committed cluster records
//!
//! Manages the `.scylla-cloud/state.json` file which holds the last
//! committed [`ResourceData`] of every managed cluster, keyed by its
//! configuration label.

use crate::error::{CloudError, Result};
use crate::schema::ResourceData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const STATE_DIR: &str = ".scylla-cloud";
const STATE_FILE: &str = "state.json";
const STATE_STAGING: &str = "state.json.tmp";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";
const STATE_VERSION: u32 = 1;
pub const LOCK_STALE_AFTER_HOURS: i64 = 1;

/// Every committed cluster record of a project, keyed by label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the record under `key`, keeping its creation time
    pub fn set_resource(&mut self, key: impl Into<String>, data: ResourceData) {
        let now = Utc::now();
        self.resources
            .entry(key.into())
            .and_modify(|r| {
                r.data = data.clone();
                r.updated_at = now;
            })
            .or_insert_with(|| ResourceState::new(data));
        self.updated_at = now;
    }

    pub fn remove_resource(&mut self, key: &str) -> Option<ResourceState> {
        let removed = self.resources.remove(key)?;
        self.updated_at = Utc::now();
        Some(removed)
    }

    pub fn get_resource(&self, key: &str) -> Option<&ResourceState> {
        self.resources.get(key)
    }

    /// Committed records by key, as consumed by planning
    pub fn records(&self) -> BTreeMap<String, ResourceData> {
        self.resources
            .iter()
            .map(|(k, r)| (k.clone(), r.data.clone()))
            .collect()
    }
}

/// One committed record with its bookkeeping timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    pub data: ResourceData,
    /// First commit; kept across later commits of the same label
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(data: ResourceData) -> Self {
        let now = Utc::now();
        Self {
            data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Reads and writes the state directory of one project
pub struct StateManager {
    dir: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            dir: project_root.as_ref().join(STATE_DIR),
        }
    }

    fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Committed records, empty when nothing was saved yet
    pub async fn load(&self) -> Result<GlobalState> {
        let content = match fs::read_to_string(self.file(STATE_FILE)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No state file in {}", self.dir.display());
                return Ok(GlobalState::new());
            }
            Err(e) => return Err(e.into()),
        };

        let state: GlobalState = serde_json::from_str(&content)?;
        if state.version > STATE_VERSION {
            return Err(CloudError::State(format!(
                "state was written by a newer release (version {}, supported {})",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!(clusters = state.resources.len(), "Loaded state");
        Ok(state)
    }

    /// Replace the state file, copying the previous one to the backup
    ///
    /// The new content is staged next to the state file and renamed over it,
    /// so a crash mid-write leaves the old file intact.
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.file(STATE_FILE);
        let staged = self.file(STATE_STAGING);
        fs::write(&staged, serde_json::to_vec_pretty(state)?).await?;

        if fs::try_exists(&path).await? {
            fs::copy(&path, self.file(STATE_BACKUP)).await?;
        }
        fs::rename(&staged, &path).await?;

        tracing::debug!(clusters = state.resources.len(), "Saved state");
        Ok(())
    }

    /// Take the advisory lock; a lock older than [`LOCK_STALE_AFTER_HOURS`] is broken
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.file(LOCK_FILE);

        let holder = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };
        let content = serde_json::to_vec_pretty(&holder)?;

        for _ in 0..2 {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(&content).await?;
                    file.flush().await?;
                    tracing::debug!("Acquired state lock");
                    return Ok(StateLock {
                        path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let existing: LockInfo =
                        serde_json::from_str(&fs::read_to_string(&path).await?)?;
                    let age = Utc::now().signed_duration_since(existing.acquired_at);
                    if age.num_hours() < LOCK_STALE_AFTER_HOURS {
                        return Err(CloudError::Lock(format!(
                            "held by {} since {}",
                            existing.holder, existing.acquired_at
                        )));
                    }
                    tracing::warn!(holder = %existing.holder, "Breaking stale state lock");
                    fs::remove_file(&path).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CloudError::Lock(
            "lock file reappeared while breaking a stale lock".to_string(),
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// Held state lock, removed on [`release`](Self::release) or drop
pub struct StateLock {
    path: PathBuf,
    released: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!("Released state lock");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::attr;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_state_save_load() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = GlobalState::new();
        state.set_resource(
            "orders",
            ResourceData::imported("42").with_attribute(attr::NAME, "orders"),
        );

        manager.save(&state).await.unwrap();

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.resources.len(), 1);
        let record = &loaded.get_resource("orders").unwrap().data;
        assert_eq!(record.id(), "42");
        assert_eq!(record.get_attribute::<String>(attr::NAME).as_deref(), Some("orders"));
    }

    #[tokio::test]
    async fn test_empty_state() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let state = manager.load().await.unwrap();
        assert!(state.resources.is_empty());
    }

    #[tokio::test]
    async fn test_second_save_keeps_backup() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = GlobalState::new();
        manager.save(&state).await.unwrap();
        state.set_resource("orders", ResourceData::imported("42"));
        manager.save(&state).await.unwrap();

        assert!(temp_dir.path().join(STATE_DIR).join(STATE_BACKUP).exists());
    }

    #[tokio::test]
    async fn test_set_resource_keeps_created_at() {
        let mut state = GlobalState::new();
        state.set_resource("orders", ResourceData::imported("42"));
        let created = state.get_resource("orders").unwrap().created_at;

        state.set_resource("orders", ResourceData::imported("43"));
        let record = state.get_resource("orders").unwrap();
        assert_eq!(record.created_at, created);
        assert_eq!(record.data.id(), "43");
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_until_released() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let lock = manager.acquire_lock().await.unwrap();
        let err = manager.acquire_lock().await.err().unwrap();
        assert!(matches!(err, CloudError::Lock(_)));

        lock.release().await.unwrap();
        manager.acquire_lock().await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_lock_is_broken() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let dir = temp_dir.path().join(STATE_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        let stale = LockInfo {
            holder: "crashed-host".to_string(),
            acquired_at: Utc::now() - chrono::Duration::hours(2),
        };
        std::fs::write(dir.join(LOCK_FILE), serde_json::to_string(&stale).unwrap()).unwrap();

        let lock = manager.acquire_lock().await.unwrap();
        lock.release().await.unwrap();
        assert!(!dir.join(LOCK_FILE).exists());
    }

    #[tokio::test]
    async fn test_dropped_lock_is_removed() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        drop(manager.acquire_lock().await.unwrap());
        assert!(!temp_dir.path().join(STATE_DIR).join(LOCK_FILE).exists());
    }
}
