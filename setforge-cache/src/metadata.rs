//! The crash-safe metadata index: `<cache_dir>/cache_metadata.json`. Losing
//! this file is acceptable (it triggers a rebuild scan over the `.json`
//! entry files); losing an individual entry file is not — those are written
//! atomically via temp-file-rename.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFileMeta {
    pub file_path: PathBuf,
    pub cache_path: PathBuf,
    pub cached_at: i64,
    pub last_accessed: i64,
    pub original_mtime: i64,
    pub cache_size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub created: i64,
    pub last_cleanup: i64,
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub files: BTreeMap<String, CacheFileMeta>,
}

impl CacheMetadata {
    #[must_use]
    pub fn new(now: i64) -> Self {
        Self {
            created: now,
            last_cleanup: now,
            total_files: 0,
            total_size_bytes: 0,
            files: BTreeMap::new(),
        }
    }

    /// Recompute `total_files`/`total_size_bytes` from `files`. Called after
    /// every mutation, per the invariant that these always agree with the
    /// live entry set.
    pub fn recompute_totals(&mut self) {
        self.total_files = self.files.len();
        self.total_size_bytes = self.files.values().map(|f| f.cache_size_bytes).sum();
    }
}

/// One cache record on disk: `<cache_dir>/<hex-key>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub file_path: PathBuf,
    pub cached_at: i64,
    pub analysis_data: setforge_features::FeatureRecord,
}
