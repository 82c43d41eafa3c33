//! The data model shared by every downstream component: a track identity,
//! the immutable `FeatureRecord` a track is reduced to, and the mood vector.

use std::{collections::BTreeMap, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::camelot::{camelot_of, CamelotCode, KeyName, Mode};
use crate::errors::FeatureFlags;

/// A track's identity: the absolute, normalised filesystem path. Equality is
/// byte-identical path comparison after normalization; no canonicalization
/// against the filesystem is performed (the file need not exist to compare
/// two `TrackId`s).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(PathBuf);

impl TrackId {
    /// Normalizes `path` into a `TrackId`. Relative paths are resolved
    /// against the current working directory; `.`/`..` components are
    /// collapsed lexically (no filesystem access, so this also works for
    /// paths that don't exist yet).
    #[must_use]
    #[inline]
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };
        Self(normalize_lexically(&absolute))
    }

    #[must_use]
    #[inline]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for TrackId {
    #[inline]
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for TrackId {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, Serialize, Deserialize)]
pub enum MoodKind {
    Dark,
    Euphoric,
    Driving,
    Experimental,
    Progressive,
    PeakTime,
}

/// A probability-ish score per mood label. Entries need not sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodVector(BTreeMap<MoodKind, f64>);

impl MoodVector {
    #[must_use]
    #[inline]
    pub fn new(scores: impl IntoIterator<Item = (MoodKind, f64)>) -> Self {
        Self(scores.into_iter().collect())
    }

    #[must_use]
    #[inline]
    pub fn get(&self, mood: MoodKind) -> f64 {
        self.0.get(&mood).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn set(&mut self, mood: MoodKind, score: f64) {
        self.0.insert(mood, score);
    }

    /// `mood_label = argmax(mood)`. Ties broken by `MoodKind`'s declaration
    /// order (stable regardless of map iteration order).
    #[must_use]
    #[allow(clippy::missing_inline_in_public_items)]
    pub fn argmax(&self) -> MoodKind {
        MoodKind::iter()
            .max_by(|a, b| {
                self.get(*a)
                    .partial_cmp(&self.get(*b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(MoodKind::Dark)
    }

    #[must_use]
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (MoodKind, f64)> + '_ {
        self.0.iter().map(|(&k, &v)| (k, v))
    }
}

impl Default for MoodVector {
    #[inline]
    fn default() -> Self {
        Self::new(MoodKind::iter().map(|m| (m, 0.0)))
    }
}

/// The immutable feature record a track is reduced to. Fields that failed to
/// extract hold documented sentinel values rather than being absent; `errors`
/// records which stages fell back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub track_id: TrackId,
    pub duration_seconds: f64,
    pub bpm: f64,
    pub key: KeyName,
    pub camelot: CamelotCode,
    pub energy_score: f64,
    pub rms_loudness_db: f64,
    pub spectral_centroid_hz: f64,
    pub onset_density_per_s: f64,
    pub mood: MoodVector,
    pub mood_label: MoodKind,
    pub mood_confidence: f64,
    pub analyzed_at: i64,
    pub source_mtime: i64,
    pub errors: FeatureFlags,
}

/// Sentinel BPM used when tempo estimation fails.
pub const BPM_SENTINEL: f64 = 120.0;
/// Sentinel energy score used when the energy stage cannot be computed.
pub const ENERGY_SENTINEL: f64 = 5.0;

impl FeatureRecord {
    /// A record with every field at its documented sentinel, for the case
    /// where decoding succeeded but every downstream stage failed.
    #[must_use]
    #[allow(clippy::missing_inline_in_public_items)]
    pub fn sentinel(track_id: TrackId, duration_seconds: f64, now: i64, source_mtime: i64) -> Self {
        let key = KeyName::c_major();
        Self {
            track_id,
            duration_seconds,
            bpm: BPM_SENTINEL,
            key,
            camelot: camelot_of(key),
            energy_score: ENERGY_SENTINEL,
            rms_loudness_db: -60.0,
            spectral_centroid_hz: 500.0,
            onset_density_per_s: 0.0,
            mood: MoodVector::default(),
            mood_label: MoodKind::Dark,
            mood_confidence: 0.0,
            analyzed_at: now,
            source_mtime,
            errors: FeatureFlags::BPM_FAILED
                | FeatureFlags::KEY_UNKNOWN
                | FeatureFlags::MOOD_FAILED,
        }
    }

    /// Checks the cross-field invariant that `camelot` is always consistent
    /// with `key` (held by construction, verified here for tests/asserts).
    #[must_use]
    #[inline]
    pub fn camelot_consistent(&self) -> bool {
        camelot_of(self.key) == self.camelot
    }

    #[must_use]
    #[inline]
    pub const fn is_minor(&self) -> bool {
        matches!(self.key.mode, Mode::Minor)
    }
}

/// Tag-derived metadata, read separately from the audio signal itself (see
/// the `lofty` based reader in the decoder module). Distinct from
/// [`FeatureRecord`] because it can change without re-analysis (e.g. retagging)
/// and carries no sentinel convention: every field is simply absent when
/// unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub bitrate_kbps: Option<u32>,
    /// Whether the track is known to support time-stretching without
    /// audible artifacts; set by the validator's technical_mixing auto-fix.
    pub can_pitch_shift: bool,
}
