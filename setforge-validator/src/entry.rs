//! A single playlist position: the path that was resolved (or not), the
//! features extracted from it (if any), and its tag metadata.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use setforge_features::{FeatureRecord, TrackMetadata};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub path: PathBuf,
    /// `None` when the file no longer resolves; every other category check
    /// is skipped for an entry in that state.
    pub record: Option<FeatureRecord>,
    pub metadata: TrackMetadata,
}

impl PlaylistEntry {
    #[must_use]
    #[inline]
    pub fn new(path: impl Into<PathBuf>, record: FeatureRecord, metadata: TrackMetadata) -> Self {
        Self {
            path: path.into(),
            record: Some(record),
            metadata,
        }
    }

    #[must_use]
    #[inline]
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            record: None,
            metadata: TrackMetadata::default(),
        }
    }

    #[must_use]
    #[inline]
    pub fn exists(&self) -> bool {
        self.record.is_some()
    }
}
