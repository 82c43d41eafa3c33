//! Thread-safe, bounded memoization of transition scores keyed by
//! `(last_id, cand_id, round(target_energy, 1))`.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use setforge_features::{FeatureRecord, TrackId};
use setforge_suggest::transition_score;

const MEMO_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    last_id: TrackId,
    cand_id: TrackId,
    target_energy_decitenths: i64,
}

pub struct TransitionMemo {
    cache: Mutex<LruCache<MemoKey, f64>>,
}

impl Default for TransitionMemo {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionMemo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(MEMO_CAPACITY).expect("capacity is nonzero"),
            )),
        }
    }

    #[must_use]
    pub fn score(&self, last: &FeatureRecord, candidate: &FeatureRecord, target_energy: f64) -> f64 {
        let key = MemoKey {
            last_id: last.track_id.clone(),
            cand_id: candidate.track_id.clone(),
            target_energy_decitenths: (target_energy * 10.0).round() as i64,
        };

        if let Some(&hit) = self
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&key)
        {
            return hit;
        }

        let score = transition_score(last, candidate, target_energy);
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .put(key, score);
        score
    }
}
