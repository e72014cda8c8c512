//! JSON-file settings store.
//!
//! A single `config.json` under the data directory holds everything that
//! survives a restart: the allow-list, pending access requests, record
//! defaults, and the RPC API tokens. Loaded once at startup; every mutation
//! rewrites the file under the write lock.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::constant_time_eq;
use crate::config::RecordDefaults;

pub const SETTINGS_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub allowed_users: Vec<i64>,
    #[serde(default)]
    pub pending_requests: Vec<PendingRequest>,
    #[serde(default = "default_ttl")]
    pub default_ttl: u32,
    #[serde(default = "default_proxied")]
    pub default_proxied: bool,
    #[serde(default)]
    pub api_tokens: Vec<String>,
}

fn default_ttl() -> u32 {
    300
}

fn default_proxied() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allowed_users: Vec::new(),
            pending_requests: Vec::new(),
            default_ttl: default_ttl(),
            default_proxied: default_proxied(),
            api_tokens: Vec::new(),
        }
    }
}

/// An access request from a user not on the allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRequest {
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub requested_at: DateTime<Utc>,
}

pub struct ConfigStore {
    path: PathBuf,
    inner: RwLock<Settings>,
}

impl ConfigStore {
    /// Open (or initialize) the settings file under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        let path = data_dir.join(SETTINGS_FILE);

        let settings = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            inner: RwLock::new(settings),
        })
    }

    pub fn record_defaults(&self) -> RecordDefaults {
        let settings = self.read();
        RecordDefaults {
            ttl: settings.default_ttl,
            proxied: settings.default_proxied,
        }
    }

    pub fn allowed_users(&self) -> Vec<i64> {
        self.read().allowed_users.clone()
    }

    pub fn add_allowed_user(&self, user_id: i64) -> Result<()> {
        self.update(|settings| {
            if !settings.allowed_users.contains(&user_id) {
                settings.allowed_users.push(user_id);
            }
            Ok(())
        })
    }

    pub fn pending_requests(&self) -> Vec<PendingRequest> {
        self.read().pending_requests.clone()
    }

    pub fn is_pending(&self, user_id: i64) -> bool {
        self.read()
            .pending_requests
            .iter()
            .any(|r| r.user_id == user_id)
    }

    pub fn add_pending_request(&self, request: PendingRequest) -> Result<()> {
        self.update(|settings| {
            if settings
                .pending_requests
                .iter()
                .any(|r| r.user_id == request.user_id)
            {
                bail!("request already pending");
            }
            settings.pending_requests.push(request);
            Ok(())
        })
    }

    /// Returns whether a request for `user_id` existed.
    pub fn remove_pending_request(&self, user_id: i64) -> Result<bool> {
        let mut found = false;
        self.update(|settings| {
            let before = settings.pending_requests.len();
            settings.pending_requests.retain(|r| r.user_id != user_id);
            found = settings.pending_requests.len() != before;
            Ok(())
        })?;
        Ok(found)
    }

    pub fn api_tokens(&self) -> Vec<String> {
        self.read().api_tokens.clone()
    }

    pub fn add_api_token(&self, token: &str) -> Result<()> {
        self.update(|settings| {
            if settings.api_tokens.iter().any(|t| t == token) {
                bail!("API token already exists");
            }
            settings.api_tokens.push(token.to_string());
            Ok(())
        })
    }

    pub fn remove_api_token(&self, index: usize) -> Result<String> {
        let mut removed = None;
        self.update(|settings| {
            if index >= settings.api_tokens.len() {
                bail!("no API token at index {index}");
            }
            removed = Some(settings.api_tokens.remove(index));
            Ok(())
        })?;
        removed.context("token removal lost")
    }

    /// Constant-time membership check: every stored token is compared even
    /// after a match, so timing does not reveal which (or whether any) token
    /// matched.
    pub fn is_valid_api_token(&self, token: &str) -> bool {
        let settings = self.read();
        settings
            .api_tokens
            .iter()
            .fold(false, |acc, stored| {
                acc | constant_time_eq(stored.as_bytes(), token.as_bytes())
            })
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Settings) -> Result<()>,
    {
        let mut settings = self.write();
        f(&mut settings)?;
        self.persist(&settings)
    }

    fn persist(&self, settings: &Settings) -> Result<()> {
        let data = serde_json::to_string_pretty(settings).context("serialize settings")?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

/// Merge the CLI-seeded allow-list with the persisted one.
pub fn merged_allow_list(seed: &[i64], store: &ConfigStore) -> HashSet<i64> {
    let mut allowed: HashSet<i64> = seed.iter().copied().collect();
    allowed.extend(store.allowed_users());
    allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request(user_id: i64) -> PendingRequest {
        PendingRequest {
            user_id,
            username: Some("alice".into()),
            first_name: Some("Alice".into()),
            last_name: None,
            requested_at: Utc::now(),
        }
    }

    #[test]
    fn defaults_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::open(dir.path()).unwrap();
        let defaults = store.record_defaults();
        assert_eq!(defaults.ttl, 300);
        assert!(defaults.proxied);
        assert!(store.allowed_users().is_empty());
        assert!(store.api_tokens().is_empty());
    }

    #[test]
    fn mutations_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = ConfigStore::open(dir.path()).unwrap();
            store.add_allowed_user(42).unwrap();
            store.add_allowed_user(42).unwrap(); // no duplicate
            store.add_api_token("deadbeef").unwrap();
            store.add_pending_request(request(7)).unwrap();
        }

        let store = ConfigStore::open(dir.path()).unwrap();
        assert_eq!(store.allowed_users(), vec![42]);
        assert_eq!(store.api_tokens(), vec!["deadbeef".to_string()]);
        assert!(store.is_pending(7));
    }

    #[test]
    fn pending_request_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::open(dir.path()).unwrap();

        store.add_pending_request(request(7)).unwrap();
        assert!(store.add_pending_request(request(7)).is_err());
        assert!(store.remove_pending_request(7).unwrap());
        assert!(!store.remove_pending_request(7).unwrap());
        assert!(!store.is_pending(7));
    }

    #[test]
    fn token_validation_and_removal() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::open(dir.path()).unwrap();

        store.add_api_token("tok-one").unwrap();
        store.add_api_token("tok-two").unwrap();
        assert!(store.add_api_token("tok-one").is_err());

        assert!(store.is_valid_api_token("tok-two"));
        assert!(!store.is_valid_api_token("tok-three"));
        assert!(!store.is_valid_api_token(""));

        let removed = store.remove_api_token(0).unwrap();
        assert_eq!(removed, "tok-one");
        assert!(!store.is_valid_api_token("tok-one"));
        assert!(store.remove_api_token(5).is_err());
    }

    #[test]
    fn merged_allow_list_unions_both_sources() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::open(dir.path()).unwrap();
        store.add_allowed_user(2).unwrap();

        let merged = merged_allow_list(&[1, 2], &store);
        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&1) && merged.contains(&2));
    }
}
