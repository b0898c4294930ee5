//! Day-scoped document cache.
//!
//! Stores per-stock JSON documents as `{dir}/{code}_{kind}_{YYYYMMDD}.json`.
//! A document is only valid on the day it was written; yesterday's file is
//! simply never looked up again. The cache is best effort: unreadable or
//! corrupt files are misses, and write failures are logged and swallowed.

use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed cache keyed by code, data kind and day.
#[derive(Debug, Clone)]
pub struct DocumentCache {
    dir: PathBuf,
}

impl DocumentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `code`/`kind` on `day`.
    pub fn path_for(&self, code: &str, kind: &str, day: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}_{}_{}.json", code, kind, day.format("%Y%m%d")))
    }

    /// Today's entry, if present and readable.
    pub fn load<T: DeserializeOwned>(&self, code: &str, kind: &str) -> Option<T> {
        self.load_on(code, kind, today())
    }

    /// Write today's entry.
    pub fn store<T: Serialize>(&self, code: &str, kind: &str, document: &T) {
        self.store_on(code, kind, today(), document)
    }

    pub fn load_on<T: DeserializeOwned>(&self, code: &str, kind: &str, day: NaiveDate) -> Option<T> {
        let path = self.path_for(code, kind, day);
        let content = fs::read_to_string(&path).ok()?;

        match serde_json::from_str(&content) {
            Ok(document) => {
                debug!(path = %path.display(), "Cache hit");
                Some(document)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt cache entry");
                None
            }
        }
    }

    pub fn store_on<T: Serialize>(&self, code: &str, kind: &str, day: NaiveDate, document: &T) {
        let path = self.path_for(code, kind, day);

        let result = fs::create_dir_all(&self.dir)
            .map_err(|e| e.to_string())
            .and_then(|_| serde_json::to_string_pretty(document).map_err(|e| e.to_string()))
            .and_then(|json| fs::write(&path, json).map_err(|e| e.to_string()));

        match result {
            Ok(()) => debug!(path = %path.display(), "Cache entry written"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to write cache entry"),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_path_layout() {
        let cache = DocumentCache::new("/tmp/cache");
        assert_eq!(
            cache.path_for("600519", "basic", day(5)),
            PathBuf::from("/tmp/cache/600519_basic_20240305.json")
        );
    }

    #[test]
    fn test_store_then_load_same_day() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DocumentCache::new(dir.path().join("nested"));
        let doc = json!({"code": "600519", "name": "贵州茅台"});

        cache.store_on("600519", "basic", day(5), &doc);
        let loaded: Option<Value> = cache.load_on("600519", "basic", day(5));
        assert_eq!(loaded, Some(doc));
    }

    #[test]
    fn test_entry_expires_next_day() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DocumentCache::new(dir.path());

        cache.store_on("600519", "basic", day(5), &json!({"code": "600519"}));
        let loaded: Option<Value> = cache.load_on("600519", "basic", day(6));
        assert!(loaded.is_none());
    }

    #[test]
    fn test_kind_is_part_of_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DocumentCache::new(dir.path());

        cache.store_on("600519", "basic", day(5), &json!({"code": "600519"}));
        let loaded: Option<Value> = cache.load_on("600519", "all", day(5));
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DocumentCache::new(dir.path());
        fs::write(cache.path_for("600519", "basic", day(5)), "{not json").unwrap();

        let loaded: Option<Value> = cache.load_on("600519", "basic", day(5));
        assert!(loaded.is_none());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        // Cache dir path is an existing regular file; nothing can be created under it.
        let cache = DocumentCache::new(&blocker);
        cache.store_on("600519", "basic", day(5), &json!({}));
        let loaded: Option<Value> = cache.load_on("600519", "basic", day(5));
        assert!(loaded.is_none());
    }
}
