//! Content-addressed on-disk cache of [`setforge_features::FeatureRecord`]s,
//! keyed by file identity (path + size + mtime + decoder profile) so that a
//! touched file invalidates itself automatically.
//!
//! Each record lives in its own `<hex-key>.json` file, written atomically via
//! temp-file-rename; a `cache_metadata.json` index tracks access times and
//! sizes for eviction. Losing the index is recoverable (`optimize` rescans
//! the entry files); losing an individual entry is not, hence the atomic
//! write.

pub mod errors;
pub mod key;
pub mod metadata;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;

use setforge_features::{FeatureRecord, TrackId};

pub use errors::{CacheError, CacheResult};
pub use key::{cache_key, mtime_matches, FileIdentity};
pub use metadata::{CacheEntry, CacheFileMeta, CacheMetadata};

const METADATA_FILE: &str = "cache_metadata.json";

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub created: i64,
    pub last_cleanup: i64,
}

/// One cache entry's listing-relevant fields, without paying for a full
/// [`FeatureRecord`] deserialization per entry.
#[derive(Debug, Clone)]
pub struct CacheEntrySummary {
    pub file_path: PathBuf,
    pub cached_at: i64,
    pub cache_size_bytes: u64,
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// The analysis cache (C4). One instance per cache directory; safe to share
/// across threads via `&AnalysisCache` (internal state is lock-protected).
pub struct AnalysisCache {
    cache_dir: PathBuf,
    decoder_profile_id: String,
    metadata: Mutex<CacheMetadata>,
    in_flight: Mutex<HashSet<TrackId>>,
    in_flight_done: Condvar,
}

impl AnalysisCache {
    /// Opens (or creates) the cache at `cache_dir`. If the metadata index is
    /// missing or unreadable, starts from an empty index rather than failing
    /// — an empty index just means every `get` misses until entries are
    /// rediscovered by [`Self::optimize`] or repopulated by [`Self::put`].
    ///
    /// # Errors
    /// Returns an error only if `cache_dir` cannot be created.
    pub fn open(cache_dir: impl Into<PathBuf>, decoder_profile_id: impl Into<String>) -> CacheResult<Self> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)?;

        let metadata = load_metadata(&cache_dir).unwrap_or_else(|| CacheMetadata::new(now_epoch_seconds()));

        Ok(Self {
            cache_dir,
            decoder_profile_id: decoder_profile_id.into(),
            metadata: Mutex::new(metadata),
            in_flight: Mutex::new(HashSet::new()),
            in_flight_done: Condvar::new(),
        })
    }

    fn entry_path(&self, hex_key: &str) -> PathBuf {
        self.cache_dir.join(format!("{hex_key}.json"))
    }

    /// `Some` iff a live record exists under the current key (derived from
    /// the file's current size/mtime) and the source file still exists.
    /// Touches `last_accessed` on a hit.
    ///
    /// # Errors
    /// Never returns an error for a cache miss; only for I/O failures while
    /// reading/writing the metadata index itself.
    pub fn get(&self, track_id: &TrackId) -> CacheResult<Option<FeatureRecord>> {
        let path = track_id.as_path();
        let Ok(identity) = FileIdentity::of(path) else {
            return Ok(None);
        };
        let hex_key = cache_key(track_id, identity, &self.decoder_profile_id);

        let has_entry = {
            let metadata = self.metadata.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            metadata.files.contains_key(&hex_key)
        };
        if !has_entry {
            return Ok(None);
        }

        match std::fs::read_to_string(self.entry_path(&hex_key)) {
            Ok(raw) => match serde_json::from_str::<CacheEntry>(&raw) {
                Ok(entry) => {
                    let mut metadata = self.metadata.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    if let Some(file_meta) = metadata.files.get_mut(&hex_key) {
                        file_meta.last_accessed = now_epoch_seconds();
                    }
                    Ok(Some(entry.analysis_data))
                }
                Err(err) => {
                    warn!("dropping unreadable cache entry {hex_key}: {err}");
                    self.drop_entry(&hex_key)?;
                    Ok(None)
                }
            },
            Err(_) => {
                self.drop_entry(&hex_key)?;
                Ok(None)
            }
        }
    }

    /// Writes `record` under the key derived from `track_id`'s current file
    /// identity. Durable: the entry file is written to a temp path in the
    /// same directory and renamed into place, so a crash mid-write never
    /// leaves a truncated entry visible.
    ///
    /// # Errors
    /// Propagates I/O and serialization failures; the source file not
    /// existing is also an error (there is no identity to key on).
    pub fn put(&self, track_id: &TrackId, record: &FeatureRecord) -> CacheResult<()> {
        let path = track_id.as_path();
        let identity = FileIdentity::of(path)?;
        let hex_key = cache_key(track_id, identity, &self.decoder_profile_id);

        let entry = CacheEntry {
            file_path: path.to_path_buf(),
            cached_at: now_epoch_seconds(),
            analysis_data: record.clone(),
        };
        let serialized = serde_json::to_vec_pretty(&entry)?;
        let cache_path = self.entry_path(&hex_key);
        atomic_write(&self.cache_dir, &cache_path, &serialized)?;

        let mut metadata = self.metadata.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        metadata.files.insert(
            hex_key,
            CacheFileMeta {
                file_path: path.to_path_buf(),
                cache_path,
                cached_at: entry.cached_at,
                last_accessed: entry.cached_at,
                original_mtime: identity.mtime_seconds,
                cache_size_bytes: serialized.len() as u64,
            },
        );
        metadata.recompute_totals();
        persist_metadata(&self.cache_dir, &metadata)
    }

    /// Removes the current entry for `track_id`, if any.
    ///
    /// # Errors
    /// Propagates I/O failures while updating the metadata index.
    pub fn remove(&self, track_id: &TrackId) -> CacheResult<()> {
        let path = track_id.as_path();
        let Ok(identity) = FileIdentity::of(path) else {
            return Ok(());
        };
        let hex_key = cache_key(track_id, identity, &self.decoder_profile_id);
        self.drop_entry(&hex_key)
    }

    fn drop_entry(&self, hex_key: &str) -> CacheResult<()> {
        let cache_path = self.entry_path(hex_key);
        let _ = std::fs::remove_file(&cache_path);

        let mut metadata = self.metadata.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        metadata.files.remove(hex_key);
        metadata.recompute_totals();
        persist_metadata(&self.cache_dir, &metadata)
    }

    /// Deletes every entry and resets the index.
    ///
    /// # Errors
    /// Propagates I/O failures while removing entry files or persisting the
    /// (now empty) index.
    pub fn clear(&self) -> CacheResult<()> {
        let mut metadata = self.metadata.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for file_meta in metadata.files.values() {
            let _ = std::fs::remove_file(&file_meta.cache_path);
        }
        *metadata = CacheMetadata::new(now_epoch_seconds());
        persist_metadata(&self.cache_dir, &metadata)
    }

    /// Verifies that every metadata entry points to an existing cache file
    /// *and* an existing source file; drops any that don't.
    ///
    /// # Errors
    /// Propagates I/O failures while persisting the pruned index.
    pub fn optimize(&self) -> CacheResult<()> {
        let mut metadata = self.metadata.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        metadata.files.retain(|_, file_meta| {
            file_meta.cache_path.exists() && file_meta.file_path.exists()
        });
        metadata.last_cleanup = now_epoch_seconds();
        metadata.recompute_totals();
        persist_metadata(&self.cache_dir, &metadata)
    }

    /// Deletes entries older than `max_age_days` by `last_accessed`; if the
    /// remaining total still exceeds `max_size_bytes`, evicts by
    /// least-recently-accessed until under budget.
    ///
    /// # Errors
    /// Propagates I/O failures while persisting the pruned index.
    pub fn evict(&self, max_age_days: u64, max_size_bytes: u64) -> CacheResult<()> {
        let mut metadata = self.metadata.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = now_epoch_seconds();
        let max_age_seconds = (max_age_days as i64).saturating_mul(86_400);

        let stale: Vec<String> = metadata
            .files
            .iter()
            .filter(|(_, m)| now.saturating_sub(m.last_accessed) > max_age_seconds)
            .map(|(k, _)| k.clone())
            .collect();
        for key in stale {
            if let Some(m) = metadata.files.remove(&key) {
                let _ = std::fs::remove_file(&m.cache_path);
            }
        }

        let mut total: u64 = metadata.files.values().map(|m| m.cache_size_bytes).sum();
        if total > max_size_bytes {
            let mut ordered: Vec<(String, i64)> = metadata
                .files
                .iter()
                .map(|(k, m)| (k.clone(), m.last_accessed))
                .collect();
            ordered.sort_by_key(|(_, accessed)| *accessed);
            for (key, _) in ordered {
                if total <= max_size_bytes {
                    break;
                }
                if let Some(m) = metadata.files.remove(&key) {
                    total = total.saturating_sub(m.cache_size_bytes);
                    let _ = std::fs::remove_file(&m.cache_path);
                }
            }
        }

        metadata.last_cleanup = now;
        metadata.recompute_totals();
        persist_metadata(&self.cache_dir, &metadata)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let metadata = self.metadata.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        CacheStats {
            total_files: metadata.total_files,
            total_size_bytes: metadata.total_size_bytes,
            created: metadata.created,
            last_cleanup: metadata.last_cleanup,
        }
    }

    /// Lists every cache entry's path/timestamp/size, newest first.
    #[must_use]
    pub fn list_entries(&self) -> Vec<CacheEntrySummary> {
        let metadata = self.metadata.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut entries: Vec<CacheEntrySummary> = metadata
            .files
            .values()
            .map(|f| CacheEntrySummary {
                file_path: f.file_path.clone(),
                cached_at: f.cached_at,
                cache_size_bytes: f.cache_size_bytes,
            })
            .collect();
        entries.sort_by(|a, b| b.cached_at.cmp(&a.cached_at));
        entries
    }

    /// Runs `extract` for `track_id` with at-most-one in-flight extraction
    /// per track: a concurrent caller for the same track blocks until the
    /// first finishes, then re-reads the cache rather than re-extracting.
    ///
    /// # Errors
    /// Propagates whatever `extract` or the underlying cache I/O returns.
    pub fn get_or_extract<E>(
        &self,
        track_id: &TrackId,
        extract: impl FnOnce() -> Result<FeatureRecord, E>,
    ) -> Result<FeatureRecord, E>
    where
        E: From<CacheError>,
    {
        if let Ok(Some(record)) = self.get(track_id) {
            return Ok(record);
        }

        loop {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if !in_flight.contains(track_id) {
                in_flight.insert(track_id.clone());
                break;
            }
            let _unused = self
                .in_flight_done
                .wait(in_flight)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Ok(Some(record)) = self.get(track_id) {
                return Ok(record);
            }
        }

        let outcome = extract();
        if let Ok(record) = &outcome {
            self.put(track_id, record).map_err(E::from)?;
        }

        let mut in_flight = self.in_flight.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        in_flight.remove(track_id);
        drop(in_flight);
        self.in_flight_done.notify_all();

        outcome
    }
}

fn load_metadata(cache_dir: &Path) -> Option<CacheMetadata> {
    let raw = std::fs::read_to_string(cache_dir.join(METADATA_FILE)).ok()?;
    serde_json::from_str(&raw).ok()
}

fn persist_metadata(cache_dir: &Path, metadata: &CacheMetadata) -> CacheResult<()> {
    let serialized = serde_json::to_vec_pretty(metadata)?;
    atomic_write(cache_dir, &cache_dir.join(METADATA_FILE), &serialized)
}

/// Write `content` to `target` via a temp file in `dir` followed by a rename,
/// so a reader never observes a partially-written file.
fn atomic_write(dir: &Path, target: &Path, content: &[u8]) -> CacheResult<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    std::io::Write::write_all(&mut tmp, content)?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use setforge_features::{KeyName, MoodKind, MoodVector};
    use tempfile::tempdir;

    fn sample_record(track_id: TrackId) -> FeatureRecord {
        let key = KeyName::c_major();
        FeatureRecord {
            track_id,
            duration_seconds: 180.0,
            bpm: 128.0,
            key,
            camelot: setforge_features::camelot_of(key),
            energy_score: 7.0,
            rms_loudness_db: -14.0,
            spectral_centroid_hz: 2500.0,
            onset_density_per_s: 3.0,
            mood: MoodVector::default(),
            mood_label: MoodKind::Driving,
            mood_confidence: 0.8,
            analyzed_at: 1000,
            source_mtime: 0,
            errors: setforge_features::FeatureFlags::empty(),
        }
    }

    fn touch(path: &Path) {
        std::fs::write(path, b"fake audio").unwrap();
    }

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let music = dir.path().join("track.flac");
        touch(&music);

        let cache = AnalysisCache::open(dir.path().join("cache"), "rodio-22050").unwrap();
        let track_id = TrackId::new(&music);
        let record = sample_record(track_id.clone());

        cache.put(&track_id, &record).unwrap();
        let fetched = cache.get(&track_id).unwrap();
        assert_eq!(fetched.unwrap().bpm, record.bpm);
    }

    #[test]
    fn touching_the_file_invalidates_the_entry() {
        let dir = tempdir().unwrap();
        let music = dir.path().join("track.flac");
        touch(&music);

        let cache = AnalysisCache::open(dir.path().join("cache"), "rodio-22050").unwrap();
        let track_id = TrackId::new(&music);
        cache.put(&track_id, &sample_record(track_id.clone())).unwrap();

        std::thread::sleep(std::time::Duration::from_secs(2));
        touch(&music);

        assert!(cache.get(&track_id).unwrap().is_none());
    }

    #[test]
    fn clear_empties_the_cache() {
        let dir = tempdir().unwrap();
        let music = dir.path().join("track.flac");
        touch(&music);

        let cache = AnalysisCache::open(dir.path().join("cache"), "rodio-22050").unwrap();
        let track_id = TrackId::new(&music);
        cache.put(&track_id, &sample_record(track_id.clone())).unwrap();
        cache.clear().unwrap();

        assert!(cache.get(&track_id).unwrap().is_none());
        assert_eq!(cache.stats().total_files, 0);
    }

    #[test]
    fn evict_with_zero_budget_empties_without_raising() {
        let dir = tempdir().unwrap();
        let music = dir.path().join("track.flac");
        touch(&music);

        let cache = AnalysisCache::open(dir.path().join("cache"), "rodio-22050").unwrap();
        let track_id = TrackId::new(&music);
        cache.put(&track_id, &sample_record(track_id.clone())).unwrap();

        cache.evict(365, 0).unwrap();
        assert_eq!(cache.stats().total_files, 0);
    }

    #[test]
    fn optimize_drops_entries_whose_source_vanished() {
        let dir = tempdir().unwrap();
        let music = dir.path().join("track.flac");
        touch(&music);

        let cache = AnalysisCache::open(dir.path().join("cache"), "rodio-22050").unwrap();
        let track_id = TrackId::new(&music);
        cache.put(&track_id, &sample_record(track_id.clone())).unwrap();

        std::fs::remove_file(&music).unwrap();
        cache.optimize().unwrap();
        assert_eq!(cache.stats().total_files, 0);
    }
}
