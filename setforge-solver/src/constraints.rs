//! Soft and hard constraints applied while scoring candidates.

use std::collections::HashSet;

use setforge_features::{FeatureRecord, MoodKind, TrackId};

#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub bpm_range: Option<(f64, f64)>,
    pub energy_range: Option<(f64, f64)>,
    pub required_moods: Option<Vec<MoodKind>>,
    pub blacklist: HashSet<TrackId>,
}

impl Constraints {
    /// The multiplier applied to a candidate's transition score. `0.0` means
    /// the candidate is hard-excluded.
    #[must_use]
    pub fn multiplier(&self, candidate: &FeatureRecord) -> f64 {
        if self.blacklist.contains(&candidate.track_id) {
            return 0.0;
        }

        let mut multiplier = 1.0;

        if let Some((lo, hi)) = self.bpm_range {
            if candidate.bpm < lo || candidate.bpm > hi {
                multiplier *= 0.5;
            }
        }
        if let Some((lo, hi)) = self.energy_range {
            if candidate.energy_score < lo || candidate.energy_score > hi {
                multiplier *= 0.5;
            }
        }
        if let Some(moods) = &self.required_moods {
            let satisfied = moods.iter().any(|&mood| candidate.mood.get(mood) > 0.5);
            if !satisfied {
                multiplier *= 0.3;
            }
        }

        multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setforge_features::{camelot_of, KeyName, MoodVector};

    fn record(bpm: f64, energy: f64) -> FeatureRecord {
        let key = KeyName::c_major();
        FeatureRecord {
            track_id: TrackId::new("/a.flac"),
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
    fn blacklist_is_a_hard_zero() {
        let candidate = record(128.0, 7.0);
        let mut constraints = Constraints::default();
        constraints.blacklist.insert(candidate.track_id.clone());
        assert_eq!(constraints.multiplier(&candidate), 0.0);
    }

    #[test]
    fn out_of_bpm_range_is_a_soft_half_penalty() {
        let candidate = record(180.0, 7.0);
        let constraints = Constraints {
            bpm_range: Some((120.0, 130.0)),
            ..Constraints::default()
        };
        assert!((constraints.multiplier(&candidate) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn in_range_candidate_is_unaffected() {
        let candidate = record(125.0, 7.0);
        let constraints = Constraints {
            bpm_range: Some((120.0, 130.0)),
            energy_range: Some((5.0, 9.0)),
            ..Constraints::default()
        };
        assert!((constraints.multiplier(&candidate) - 1.0).abs() < 1e-9);
    }
}
