//! Similarity index (C5): standardized feature vectors over the current
//! track population plus a k-NN query surface. Any mutation to the track set
//! invalidates the index; [`SimilarityIndex::rebuild`] must run before the
//! next query reflects it (a stale index may answer with obsolete neighbors,
//! but never with inconsistent memory, since rebuilding replaces the whole
//! structure atomically).

pub mod errors;
pub mod standardize;
pub mod vector;

use std::collections::{HashMap, HashSet};

use linfa_nn::distance::L2Dist;
use linfa_nn::{CommonNearestNeighbour, NearestNeighbour};
use ndarray::Array2;

use setforge_features::{FeatureRecord, TrackId};

pub use errors::{IndexError, IndexResult};
use standardize::Standardizer;
use vector::{feature_vector, DIM};

/// Library sizes at or below this use brute-force linear search (still meets
/// the latency floor and skips kd-tree build overhead); above it, a kd-tree.
const BRUTE_FORCE_THRESHOLD: usize = 1000;

pub struct SimilarityIndex {
    standardizer: Standardizer,
    track_ids: Vec<TrackId>,
    vectors: Array2<f64>,
    by_track: HashMap<TrackId, usize>,
}

impl SimilarityIndex {
    /// An index with no tracks; every query returns an empty result.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            standardizer: Standardizer::fit(&[]),
            track_ids: Vec::new(),
            vectors: Array2::zeros((0, DIM)),
            by_track: HashMap::new(),
        }
    }

    /// (Re)builds the index from scratch over `records`: refits the
    /// standardizer against this population and recomputes every
    /// standardized vector. This *is* the rebuild-on-mutation contract —
    /// callers call this once after any add/remove to the track set.
    #[must_use]
    pub fn rebuild(records: &[FeatureRecord]) -> Self {
        let raw: Vec<[f64; DIM]> = records.iter().map(feature_vector).collect();
        let standardizer = Standardizer::fit(&raw);

        let mut vectors = Array2::zeros((records.len(), DIM));
        let mut track_ids = Vec::with_capacity(records.len());
        let mut by_track = HashMap::with_capacity(records.len());
        for (i, (record, raw_vector)) in records.iter().zip(raw.iter()).enumerate() {
            let standardized = standardizer.transform(raw_vector);
            vectors.row_mut(i).assign(&ndarray::arr1(&standardized));
            track_ids.push(record.track_id.clone());
            by_track.insert(record.track_id.clone(), i);
        }

        Self {
            standardizer,
            track_ids,
            vectors,
            by_track,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.track_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.track_ids.is_empty()
    }

    fn standardized_query(&self, record: &FeatureRecord) -> [f64; DIM] {
        self.standardizer.transform(&feature_vector(record))
    }

    /// Up to `k` nearest neighbors of `query` (by standardized Euclidean
    /// distance), excluding any track id in `exclude`. Returns
    /// `(track_id, distance)` pairs, nearest first.
    ///
    /// # Errors
    /// Returns [`IndexError::Build`]/[`IndexError::Query`] if the underlying
    /// nearest-neighbor structure fails to construct or query — both
    /// effectively unreachable for finite, non-NaN input.
    pub fn k_nearest(
        &self,
        query: &FeatureRecord,
        k: usize,
        exclude: &HashSet<TrackId>,
    ) -> IndexResult<Vec<(TrackId, f64)>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let standardized = self.standardized_query(query);
        let query_view = ndarray::ArrayView1::from(&standardized[..]);

        let oversampled = (k + exclude.len() + 1).min(self.len());
        let backend = if self.len() <= BRUTE_FORCE_THRESHOLD {
            CommonNearestNeighbour::LinearSearch
        } else {
            CommonNearestNeighbour::KdTree
        };

        let nn_index = backend
            .from_batch(&self.vectors.view(), L2Dist)
            .map_err(|e| IndexError::Build(e.to_string()))?;
        let neighbors = nn_index
            .k_nearest(query_view, oversampled)
            .map_err(|e| IndexError::Query(e.to_string()))?;

        let mut out = Vec::with_capacity(k);
        for (point, index) in neighbors {
            let track_id = &self.track_ids[index];
            if exclude.contains(track_id) || track_id == &query.track_id {
                continue;
            }
            let distance = euclidean(&point, &query_view);
            out.push((track_id.clone(), distance));
            if out.len() == k {
                break;
            }
        }
        Ok(out)
    }

    #[must_use]
    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.by_track.contains_key(track_id)
    }
}

fn euclidean(a: &ndarray::CowArray<'_, f64, ndarray::Ix1>, b: &ndarray::ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use setforge_features::{camelot_of, KeyName, MoodKind, MoodVector};

    fn record(path: &str, bpm: f64, energy: f64) -> FeatureRecord {
        let key = KeyName::c_major();
        FeatureRecord {
            track_id: TrackId::new(path),
            duration_seconds: 200.0,
            bpm,
            key,
            camelot: camelot_of(key),
            energy_score: energy,
            rms_loudness_db: -14.0,
            spectral_centroid_hz: 2500.0,
            onset_density_per_s: 3.0,
            mood: MoodVector::default(),
            mood_label: MoodKind::Driving,
            mood_confidence: 0.5,
            analyzed_at: 0,
            source_mtime: 0,
            errors: setforge_features::FeatureFlags::empty(),
        }
    }

    #[test]
    fn nearest_neighbor_is_the_closest_bpm_track() {
        let records = vec![
            record("/a.flac", 128.0, 7.0),
            record("/b.flac", 129.0, 7.0),
            record("/c.flac", 180.0, 2.0),
        ];
        let index = SimilarityIndex::rebuild(&records);

        let neighbors = index.k_nearest(&records[0], 1, &HashSet::new()).unwrap();
        assert_eq!(neighbors[0].0, records[1].track_id);
    }

    #[test]
    fn excluded_tracks_never_appear() {
        let records = vec![
            record("/a.flac", 128.0, 7.0),
            record("/b.flac", 129.0, 7.0),
            record("/c.flac", 130.0, 7.0),
        ];
        let index = SimilarityIndex::rebuild(&records);

        let mut exclude = HashSet::new();
        exclude.insert(records[1].track_id.clone());
        let neighbors = index.k_nearest(&records[0], 2, &exclude).unwrap();
        assert!(neighbors.iter().all(|(id, _)| *id != records[1].track_id));
    }

    #[test]
    fn empty_index_returns_no_neighbors() {
        let index = SimilarityIndex::empty();
        let probe = record("/a.flac", 128.0, 7.0);
        assert!(index.k_nearest(&probe, 5, &HashSet::new()).unwrap().is_empty());
    }
}
