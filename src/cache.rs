//! File-backed memoization of remote entity sets.
//!
//! One JSON file per (entity kind, scope) under the downloads directory:
//!
//! ```text
//! downloads/
//!   site_info.json
//!   users_courses_<userid>.json
//!   enrolled_<course>.json
//!   assignments_<course>.json
//!   submissions_<course>_<assignment>.json
//! ```
//!
//! A file that exists is trusted as-is. Nothing expires; entries go away only
//! through [`EntityCache::invalidate`], [`EntityCache::clear`], or by hand.

use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    SiteInfo,
    Courses { userid: i64 },
    Enrolled { course_id: i64 },
    Assignments { course_id: i64 },
    Submissions { course_id: i64, assignment_id: i64 },
}

impl CacheKey {
    pub fn file_name(&self) -> String {
        match self {
            CacheKey::SiteInfo => "site_info.json".into(),
            CacheKey::Courses { userid } => format!("users_courses_{userid}.json"),
            CacheKey::Enrolled { course_id } => format!("enrolled_{course_id}.json"),
            CacheKey::Assignments { course_id } => format!("assignments_{course_id}.json"),
            CacheKey::Submissions {
                course_id,
                assignment_id,
            } => format!("submissions_{course_id}_{assignment_id}.json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityCache {
    dir: PathBuf,
}

impl EntityCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Returns the cached entry for `key`, or runs `fetch`, persists its result
    /// and returns it. A failing `fetch` leaves the cache untouched.
    pub async fn fetch_or_load<T, F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let path = self.path(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                debug!(file = %path.display(), "cache hit");
                return Ok(serde_json::from_slice(&bytes)?);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        debug!(file = %path.display(), "cache miss");
        let value = fetch().await?;
        let bytes = serde_json::to_vec(&value)?;
        fs::create_dir_all(&self.dir).await?;
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(&bytes).await?;
                file.flush().await?;
            }
            // another invocation won the race; its file stands
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }
        Ok(value)
    }

    /// Writes `value` under `key` unconditionally. Used for snapshots that are
    /// refreshed on every call rather than gating one.
    pub async fn store<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.path(key), serde_json::to_vec(value)?).await?;
        Ok(())
    }

    /// Deletes one entry. Returns whether it existed.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool> {
        match fs::remove_file(self.path(key)).await {
            Ok(()) => {
                info!(file = %key.file_name(), "cache entry removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes every JSON entry in the cache directory.
    pub async fn clear(&self) -> Result<usize> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        info!(removed, dir = %self.dir.display(), "cache cleared");
        Ok(removed)
    }
}
