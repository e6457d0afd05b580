//! Local cache of authentication results for `login-as --use-cache`.
//!
//! One JSON file per `pool_id:username` key under the state directory:
//!
//! - `USERPOOL_STATE_DIR` if set
//! - otherwise the platform state directory (`$XDG_STATE_HOME`, `~/.local/state`)
//!
//! joined with `userpool-tools`. Entries are considered expired 60 seconds
//! before the token's literal expiry and are deleted when found stale.

use crate::userpool::auth::AuthResponse;
use crate::utils::time::{expires_at, is_expired};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const APP_DIR: &str = "userpool-tools";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no cached entry")]
    Missing,

    #[error("cached entry has expired")]
    Expired,

    #[error("token cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("token cache entry is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk form of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    response: AuthResponse,
    expires_at: DateTime<Utc>,
}

/// Directory-backed token cache.
#[derive(Debug, Clone)]
pub struct TokenCache {
    dir: PathBuf,
}

impl TokenCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache under the default state directory.
    pub fn from_env() -> Self {
        Self::new(Self::default_dir())
    }

    /// Resolve the state directory, respecting `USERPOOL_STATE_DIR`.
    pub fn default_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("USERPOOL_STATE_DIR") {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }

        dirs::state_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("state")))
            .unwrap_or_else(|| PathBuf::from(".local/state"))
            .join(APP_DIR)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache key for a user of a pool.
    pub fn key(pool_id: &str, username: &str) -> String {
        format!("{}:{}", pool_id, username)
    }

    /// File for `key`, with path-unsafe characters replaced by `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| match c {
                ':' | '/' | '\\' => '_',
                other => other,
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }

    pub fn save(&self, key: &str, response: &AuthResponse) -> Result<(), CacheError> {
        self.save_at(key, response, Utc::now())
    }

    /// Store `response` as issued at `now`.
    pub fn save_at(
        &self,
        key: &str,
        response: &AuthResponse,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let expires_in = response
            .authentication_result
            .as_ref()
            .map_or(0, |result| result.expires_in);
        let entry = CacheEntry {
            response: response.clone(),
            expires_at: expires_at(now, expires_in),
        };

        fs::create_dir_all(&self.dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.dir, fs::Permissions::from_mode(0o700))?;
        }

        let path = self.path_for(key);
        fs::write(&path, serde_json::to_vec(&entry)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        debug!(path = %path.display(), expires_at = %entry.expires_at, "cached authentication result");
        Ok(())
    }

    pub fn load(&self, key: &str) -> Result<AuthResponse, CacheError> {
        self.load_at(key, Utc::now())
    }

    /// Load the entry for `key` as seen at `now`. A stale entry is deleted.
    pub fn load_at(&self, key: &str, now: DateTime<Utc>) -> Result<AuthResponse, CacheError> {
        let path = self.path_for(key);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(CacheError::Missing),
            Err(e) => return Err(e.into()),
        };
        let entry: CacheEntry = serde_json::from_slice(&data)?;

        if is_expired(entry.expires_at, now) {
            debug!(path = %path.display(), "removing expired cache entry");
            fs::remove_file(&path)?;
            return Err(CacheError::Expired);
        }

        Ok(entry.response)
    }
}
