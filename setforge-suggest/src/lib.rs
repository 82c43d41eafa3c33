//! Suggestion engine (C6): transition scoring plus the two user-facing
//! suggestion queries, `similar` and `surprise`.

pub mod errors;
pub mod transition;

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use setforge_features::{CamelotCode, EnergyDirection, FeatureRecord, TrackId};
use setforge_index::SimilarityIndex;

pub use errors::{SuggestError, SuggestResult};
pub use transition::{camelot_compatible, transition_camelot, transition_score};

/// Bound on the `similar` LRU cache, per spec.
const SIMILAR_CACHE_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct Suggestion {
    pub track_id: TrackId,
    pub compat: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SimilarCacheKey {
    base: TrackId,
    k: usize,
    min_compat_bits: u64,
}

pub struct SuggestionEngine {
    cache: Mutex<LruCache<SimilarCacheKey, Vec<Suggestion>>>,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestionEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(SIMILAR_CACHE_CAPACITY).expect("capacity is nonzero"),
            )),
        }
    }

    /// `similar(base, k, exclude, min_compat)`: `3k` nearest neighbors from
    /// `index`, rescored by transition score at `target_energy = base.energy`,
    /// filtered to `>= min_compat`, top-`k` by `compat * (1 - normalized_distance)`.
    ///
    /// # Errors
    /// Propagates index query failures.
    pub fn similar(
        &self,
        index: &SimilarityIndex,
        records_by_id: &std::collections::HashMap<TrackId, FeatureRecord>,
        base: &FeatureRecord,
        k: usize,
        exclude: &HashSet<TrackId>,
        min_compat: f64,
    ) -> SuggestResult<Vec<Suggestion>> {
        let cache_key = SimilarCacheKey {
            base: base.track_id.clone(),
            k,
            min_compat_bits: min_compat.to_bits(),
        };
        if let Some(hit) = self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(&cache_key) {
            return Ok(hit.clone());
        }

        let mut exclude_with_base = exclude.clone();
        exclude_with_base.insert(base.track_id.clone());

        let neighbors = index.k_nearest(base, 3 * k.max(1), &exclude_with_base)?;
        let max_distance = neighbors
            .iter()
            .map(|(_, d)| *d)
            .fold(0.0_f64, f64::max)
            .max(f64::EPSILON);

        let mut scored: Vec<(f64, Suggestion)> = neighbors
            .into_iter()
            .filter_map(|(track_id, distance)| {
                let candidate = records_by_id.get(&track_id)?;
                let compat = transition_score(base, candidate, base.energy_score);
                if compat < min_compat {
                    return None;
                }
                let normalized_distance = distance / max_distance;
                Some((
                    compat * (1.0 - normalized_distance),
                    Suggestion {
                        track_id,
                        compat,
                        reason: "Harmonic match".to_string(),
                    },
                ))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        let result: Vec<Suggestion> = scored.into_iter().take(k).map(|(_, s)| s).collect();

        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .put(cache_key, result.clone());
        Ok(result)
    }

    /// `surprise(base, pool, k)`: tracks at Camelot-distance exactly 2 along
    /// the same letter with `energy > base.energy + 0.5`, ranked by energy
    /// delta, top-`k`.
    #[must_use]
    pub fn surprise(base: &FeatureRecord, pool: &[FeatureRecord], k: usize) -> Vec<Suggestion> {
        let mut candidates: Vec<(f64, &FeatureRecord)> = pool
            .iter()
            .filter(|candidate| {
                candidate.track_id != base.track_id
                    && candidate.camelot.is_minor == base.camelot.is_minor
                    && camelot_distance_in_letters(base.camelot, candidate.camelot) == 2
                    && candidate.energy_score > base.energy_score + 0.5
            })
            .map(|candidate| (candidate.energy_score - base.energy_score, candidate))
            .collect();

        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        candidates
            .into_iter()
            .take(k)
            .map(|(_, candidate)| Suggestion {
                track_id: candidate.track_id.clone(),
                compat: transition_score(base, candidate, base.energy_score),
                reason: "\u{b1}2 Camelot + Energy Uplift (e2 > e1)".to_string(),
            })
            .collect()
    }

    /// Wraps C1's `suggest_next_keys` for callers that only want Camelot-only
    /// suggestions without scoring against a track pool.
    #[must_use]
    pub fn suggest_next_keys(base: CamelotCode, direction: EnergyDirection) -> Vec<(CamelotCode, &'static str, f64)> {
        base.suggest_next_keys(direction)
    }
}

fn camelot_distance_in_letters(base: CamelotCode, candidate: CamelotCode) -> i32 {
    let a = i32::from(base.number) - 1;
    let b = i32::from(candidate.number) - 1;
    let raw = (a - b).rem_euclid(12);
    raw.min(12 - raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use setforge_features::{camelot_of, CamelotCode, KeyName, MoodKind, MoodVector};

    fn record(path: &str, camelot_number: u8, is_minor: bool, bpm: f64, energy: f64) -> FeatureRecord {
        let key = setforge_features::key_of_camelot(CamelotCode::new(camelot_number, is_minor));
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
    fn surprise_requires_camelot_distance_two_and_energy_uplift() {
        let base = record("/a.flac", 8, false, 128.0, 5.0);
        let pool = vec![
            record("/b.flac", 10, false, 128.0, 6.0),
            record("/c.flac", 9, false, 128.0, 9.0),
            record("/d.flac", 6, false, 128.0, 9.0),
        ];
        let suggestions = SuggestionEngine::surprise(&base, &pool, 5);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].track_id, pool[0].track_id);
    }

    #[test]
    fn similar_respects_min_compat_and_k() {
        let records = vec![
            record("/a.flac", 8, false, 128.0, 7.0),
            record("/b.flac", 8, false, 129.0, 7.0),
            record("/c.flac", 1, true, 90.0, 1.0),
        ];
        let index = SimilarityIndex::rebuild(&records);
        let by_id: std::collections::HashMap<TrackId, FeatureRecord> =
            records.iter().map(|r| (r.track_id.clone(), r.clone())).collect();

        let engine = SuggestionEngine::new();
        let suggestions = engine
            .similar(&index, &by_id, &records[0], 5, &HashSet::new(), 0.0)
            .unwrap();
        assert!(suggestions.iter().any(|s| s.track_id == records[1].track_id));
    }
}
