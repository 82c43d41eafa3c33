//! Cache key derivation: `sha256(track_id_bytes || file_size || mtime_seconds || decoder_profile_id)`.
//! Binding the key to `mtime` is how invalidation works — if a file's mtime
//! moves by more than a second, the key changes and the old entry goes stale.

use std::path::Path;

use sha2::{Digest, Sha256};

use setforge_features::TrackId;

use crate::errors::{CacheError, CacheResult};

/// Metadata of the file a cache key is derived from, snapshotted once so the
/// key and the stored `original_mtime` agree.
#[derive(Debug, Clone, Copy)]
pub struct FileIdentity {
    pub size_bytes: u64,
    pub mtime_seconds: i64,
}

impl FileIdentity {
    /// # Errors
    /// Returns [`CacheError::SourceMissing`] if `path` has no metadata (does
    /// not exist, or is otherwise unreadable).
    pub fn of(path: &Path) -> CacheResult<Self> {
        let metadata = std::fs::metadata(path).map_err(|_| CacheError::SourceMissing(path.to_path_buf()))?;
        let mtime_seconds = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs() as i64);
        Ok(Self {
            size_bytes: metadata.len(),
            mtime_seconds,
        })
    }
}

/// Derive the hex cache key for `track_id` decoded under `decoder_profile_id`.
#[must_use]
pub fn cache_key(track_id: &TrackId, identity: FileIdentity, decoder_profile_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(track_id.as_path().as_os_str().as_encoded_bytes());
    hasher.update(identity.size_bytes.to_le_bytes());
    hasher.update(identity.mtime_seconds.to_le_bytes());
    hasher.update(decoder_profile_id.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// The mtime-invalidation check: a cached record is only valid for `path` if
/// the file still exists and its mtime hasn't drifted by more than a second.
#[must_use]
pub fn mtime_matches(record_mtime: i64, path: &Path) -> bool {
    FileIdentity::of(path)
        .map(|identity| (identity.mtime_seconds - record_mtime).abs() <= 1)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_identity_yields_same_key() {
        let track_id = TrackId::new("/music/a.flac");
        let identity = FileIdentity {
            size_bytes: 1000,
            mtime_seconds: 100,
        };
        assert_eq!(
            cache_key(&track_id, identity, "rodio-22050"),
            cache_key(&track_id, identity, "rodio-22050")
        );
    }

    #[test]
    fn differing_mtime_yields_different_key() {
        let track_id = TrackId::new("/music/a.flac");
        let a = FileIdentity {
            size_bytes: 1000,
            mtime_seconds: 100,
        };
        let b = FileIdentity {
            size_bytes: 1000,
            mtime_seconds: 200,
        };
        assert_ne!(
            cache_key(&track_id, a, "rodio-22050"),
            cache_key(&track_id, b, "rodio-22050")
        );
    }

    #[test]
    fn differing_decoder_profile_yields_different_key() {
        let track_id = TrackId::new("/music/a.flac");
        let identity = FileIdentity {
            size_bytes: 1000,
            mtime_seconds: 100,
        };
        assert_ne!(
            cache_key(&track_id, identity, "rodio-22050"),
            cache_key(&track_id, identity, "rodio-44100")
        );
    }
}
