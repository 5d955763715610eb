//! Durable, content-addressed request cache.
//!
//! Entries are keyed by the SHA-256 of the canonicalized request URL and
//! stored as `<dir>/<sha256>.json`. Writes publish atomically via a temp
//! file and rename; a partially written entry is never visible. Expired
//! entries are treated as absent and removed eagerly on access.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use lcars_types::LcarsError;

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    payload: String, // base64
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Hits since construction.
    pub hits: u64,
    /// Misses since construction (including expiries and disabled lookups).
    pub misses: u64,
    /// `hits / (hits + misses)`, 0 when nothing was looked up.
    pub hit_rate: f64,
    /// Entries currently on disk.
    pub entries: usize,
    /// Total bytes of entry files on disk.
    pub total_bytes: u64,
    /// Oldest entry timestamp on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest: Option<DateTime<Utc>>,
    /// Newest entry timestamp on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Counters {
    hits: u64,
    misses: u64,
}

/// TTL-bounded on-disk cache for raw provider responses.
///
/// When disabled every operation is a no-op reporting a miss. Concurrent
/// writers to the same key are last-writer-wins at the byte level.
pub struct RequestCache {
    dir: PathBuf,
    enabled: bool,
    counters: Mutex<Counters>,
}

impl RequestCache {
    /// A cache rooted at `dir`. The directory is created lazily on first
    /// write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
            counters: Mutex::new(Counters::default()),
        }
    }

    /// SHA-256 hex fingerprint of a canonicalized request URL.
    #[must_use]
    pub fn fingerprint(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.trim().as_bytes());
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::fingerprint(url)))
    }

    fn record_hit(&self) {
        self.counters.lock().expect("mutex poisoned").hits += 1;
    }

    fn record_miss(&self) {
        self.counters.lock().expect("mutex poisoned").misses += 1;
    }

    /// Look up a payload. Expired entries are removed and reported as
    /// misses.
    pub async fn get(&self, url: &str) -> Option<Vec<u8>> {
        if !self.enabled {
            self.record_miss();
            return None;
        }
        let path = self.entry_path(url);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(_) => {
                self.record_miss();
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(
                    target: "lcars::middleware::cache",
                    event = "corrupt_entry",
                    path = %path.display(),
                    %err,
                    "removing unreadable cache entry"
                );
                let _ = tokio::fs::remove_file(&path).await;
                self.record_miss();
                return None;
            }
        };
        if Utc::now() > entry.expires_at {
            let _ = tokio::fs::remove_file(&path).await;
            self.record_miss();
            return None;
        }
        match BASE64.decode(entry.payload.as_bytes()) {
            Ok(payload) => {
                self.record_hit();
                tracing::debug!(target: "lcars::middleware::cache", event = "hit", url);
                Some(payload)
            }
            Err(_) => {
                let _ = tokio::fs::remove_file(&path).await;
                self.record_miss();
                None
            }
        }
    }

    /// Write a payload atomically with the given TTL.
    ///
    /// # Errors
    /// Returns `LcarsError::Storage` when the filesystem rejects the write;
    /// callers log and continue, the fetched payload is still returned.
    pub async fn set(&self, url: &str, payload: &[u8], ttl: Duration) -> Result<(), LcarsError> {
        if !self.enabled {
            return Ok(());
        }
        let now = Utc::now();
        let entry = CacheEntry {
            url: url.to_string(),
            cached_at: now,
            expires_at: now
                + chrono::Duration::from_std(ttl)
                    .map_err(|e| LcarsError::Storage(e.to_string()))?,
            payload: BASE64.encode(payload),
        };
        let bytes =
            serde_json::to_vec(&entry).map_err(|e| LcarsError::Storage(e.to_string()))?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| LcarsError::Storage(e.to_string()))?;
        let path = self.entry_path(url);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| LcarsError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| LcarsError::Storage(e.to_string()))?;
        tracing::debug!(
            target: "lcars::middleware::cache",
            event = "insert",
            url,
            ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            "cached payload"
        );
        Ok(())
    }

    /// Remove the entry for a URL, if present.
    pub async fn remove(&self, url: &str) {
        if self.enabled {
            let _ = tokio::fs::remove_file(self.entry_path(url)).await;
        }
    }

    /// Scan the cache directory and remove expired entries. Returns the
    /// number removed.
    pub async fn cleanup_expired(&self) -> usize {
        if !self.enabled {
            return 0;
        }
        let now = Utc::now();
        let mut removed = 0;
        for path in self.entry_files().await {
            if let Some(entry) = read_entry(&path).await
                && now > entry.expires_at
            {
                let _ = tokio::fs::remove_file(&path).await;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(
                target: "lcars::middleware::cache",
                event = "cleanup",
                removed,
                "removed expired cache entries"
            );
        }
        removed
    }

    /// Current counters plus an on-disk scan.
    pub async fn stats(&self) -> CacheStats {
        let (hits, misses) = {
            let counters = self.counters.lock().expect("mutex poisoned");
            (counters.hits, counters.misses)
        };
        let looked_up = hits + misses;
        let mut stats = CacheStats {
            hits,
            misses,
            hit_rate: if looked_up == 0 {
                0.0
            } else {
                hits as f64 / looked_up as f64
            },
            ..CacheStats::default()
        };
        if !self.enabled {
            return stats;
        }
        for path in self.entry_files().await {
            let Some(entry) = read_entry(&path).await else {
                continue;
            };
            stats.entries += 1;
            if let Ok(meta) = tokio::fs::metadata(&path).await {
                stats.total_bytes += meta.len();
            }
            stats.oldest = Some(match stats.oldest {
                Some(t) if t <= entry.cached_at => t,
                _ => entry.cached_at,
            });
            stats.newest = Some(match stats.newest {
                Some(t) if t >= entry.cached_at => t,
                _ => entry.cached_at,
            });
        }
        stats
    }

    async fn entry_files(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let Ok(mut dir) = tokio::fs::read_dir(&self.dir).await else {
            return out;
        };
        while let Ok(Some(item)) = dir.next_entry().await {
            let path = item.path();
            if path.extension().is_some_and(|e| e == "json") {
                out.push(path);
            }
        }
        out
    }
}

async fn read_entry(path: &Path) -> Option<CacheEntry> {
    let raw = tokio::fs::read(path).await.ok()?;
    serde_json::from_slice(&raw).ok()
}
