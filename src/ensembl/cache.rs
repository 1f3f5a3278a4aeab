//! On-disk HTTP response cache
//!
//! Each successful response body is stored as one JSON file named after the
//! SHA-256 of the request. Entries older than the TTL are ignored unless the
//! caller asks for stale data (offline runs).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;

use crate::error::NegFeatError;

/// A cached response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// Request URL including query string
    pub url: String,
    pub body: String,
    pub saved_at: DateTime<Utc>,
}

/// Stable cache key for a request
///
/// Query parameters are sorted so their order does not matter.
///
/// ```
/// use ferro_negfeat::ensembl::cache::cache_key;
///
/// let a = cache_key("https://x/y", &[("b", "2"), ("a", "1")], "application/json");
/// let b = cache_key("https://x/y", &[("a", "1"), ("b", "2")], "application/json");
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn cache_key(url: &str, params: &[(&str, &str)], accept: &str) -> String {
    let mut sorted: Vec<_> = params.to_vec();
    sorted.sort();
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    for (key, value) in sorted {
        hasher.update(b"\x00");
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    hasher.update(b"\x00accept=");
    hasher.update(accept.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Response cache rooted at a directory
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Option<Duration>,
    memory: RwLock<HashMap<String, CachedResponse>>,
}

impl ResponseCache {
    /// Create a cache in `dir`; a TTL of zero hours never expires entries
    pub fn new(dir: impl AsRef<Path>, ttl_hours: u64) -> Result<Self, NegFeatError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let ttl = if ttl_hours == 0 {
            None
        } else {
            Some(Duration::hours(i64::try_from(ttl_hours).unwrap_or(i64::MAX / 3600)))
        };
        Ok(Self {
            dir,
            ttl,
            memory: RwLock::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn is_fresh(&self, entry: &CachedResponse, now: DateTime<Utc>) -> bool {
        match self.ttl {
            None => true,
            Some(ttl) => now - entry.saved_at <= ttl,
        }
    }

    /// Look up an entry
    ///
    /// With `allow_stale`, expired entries are still returned.
    pub fn get(&self, key: &str, allow_stale: bool) -> Option<CachedResponse> {
        let now = Utc::now();
        let cached = self
            .memory
            .read()
            .ok()
            .and_then(|memory| memory.get(key).cloned());
        let entry = match cached {
            Some(entry) => entry,
            None => {
                let content = fs::read_to_string(self.entry_path(key)).ok()?;
                match serde_json::from_str::<CachedResponse>(&content) {
                    Ok(entry) => {
                        if let Ok(mut memory) = self.memory.write() {
                            memory.insert(key.to_string(), entry.clone());
                        }
                        entry
                    }
                    Err(e) => {
                        log::warn!("ignoring unreadable cache entry {}: {}", key, e);
                        return None;
                    }
                }
            }
        };
        if allow_stale || self.is_fresh(&entry, now) {
            Some(entry)
        } else {
            log::debug!("cache entry {} expired (saved {})", key, entry.saved_at.to_rfc3339());
            None
        }
    }

    /// Store a response body
    ///
    /// The entry file is written to a temporary file and renamed into
    /// place, so readers never see a partial entry.
    pub fn put(&self, key: &str, url: &str, body: &str) -> Result<CachedResponse, NegFeatError> {
        let entry = CachedResponse {
            url: url.to_string(),
            body: body.to_string(),
            saved_at: Utc::now(),
        };
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(serde_json::to_string(&entry)?.as_bytes())?;
        tmp.persist(self.entry_path(key))
            .map_err(|e| NegFeatError::from(e.error))?;
        if let Ok(mut memory) = self.memory.write() {
            memory.insert(key.to_string(), entry.clone());
        }
        Ok(entry)
    }

    /// Number of entries on disk
    pub fn len(&self) -> usize {
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
