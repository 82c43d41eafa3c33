//! Transition score `s(a, b, target_energy) in [0, 1]`, the scoring kernel
//! shared by the suggestion engine and the playlist solver.

use setforge_features::{CompatLevel, FeatureRecord, MoodKind};

const CAMELOT_WEIGHT: f64 = 0.30;
const BPM_WEIGHT: f64 = 0.20;
const ENERGY_WEIGHT: f64 = 0.20;
const TARGET_WEIGHT: f64 = 0.20;
const MOOD_WEIGHT: f64 = 0.10;

const MOOD_TRANSITION_KINDS: [MoodKind; 4] = [
    MoodKind::Dark,
    MoodKind::Euphoric,
    MoodKind::Driving,
    MoodKind::Experimental,
];

fn camelot_component(a: &FeatureRecord, b: &FeatureRecord) -> f64 {
    let (ca, cb) = (a.camelot, b.camelot);
    if ca == cb {
        1.0
    } else if cb == ca.relative() {
        0.95
    } else {
        let (down, up) = ca.adjacent();
        if (cb == down || cb == up) && ca.is_minor == cb.is_minor {
            0.85
        } else if cb == ca.dominant() || cb == ca.subdominant() {
            0.8
        } else {
            0.3
        }
    }
}

fn bpm_component(a: &FeatureRecord, b: &FeatureRecord) -> f64 {
    (1.0 - (a.bpm - b.bpm).abs() / 20.0).max(0.0)
}

fn energy_component(a: &FeatureRecord, b: &FeatureRecord) -> f64 {
    (1.0 - (a.energy_score - b.energy_score).abs() / 3.0).max(0.0)
}

fn target_component(b: &FeatureRecord, target_energy: f64) -> f64 {
    (1.0 - (b.energy_score - target_energy).abs() / 2.0).max(0.0)
}

fn mood_component(a: &FeatureRecord, b: &FeatureRecord) -> f64 {
    let sum: f64 = MOOD_TRANSITION_KINDS
        .iter()
        .map(|&mood| 1.0 - (a.mood.get(mood) - b.mood.get(mood)).abs())
        .sum();
    sum / MOOD_TRANSITION_KINDS.len() as f64
}

/// `s = 0.30*camelot + 0.20*bpm + 0.20*energy + 0.20*target + 0.10*mood`.
#[must_use]
pub fn transition_score(a: &FeatureRecord, b: &FeatureRecord, target_energy: f64) -> f64 {
    (CAMELOT_WEIGHT * camelot_component(a, b)
        + BPM_WEIGHT * bpm_component(a, b)
        + ENERGY_WEIGHT * energy_component(a, b)
        + TARGET_WEIGHT * target_component(b, target_energy)
        + MOOD_WEIGHT * mood_component(a, b))
    .clamp(0.0, 1.0)
}

/// Camelot-only transition quality, used by the solver's `harmonic` term.
#[must_use]
pub fn transition_camelot(a: &FeatureRecord, b: &FeatureRecord) -> f64 {
    camelot_component(a, b)
}

/// Whether `a -> b` clears a Camelot compatibility bar, independent of the
/// full weighted score (used by the validator's `harmonic_flow` check).
#[must_use]
pub fn camelot_compatible(a: &FeatureRecord, b: &FeatureRecord, level: CompatLevel) -> bool {
    a.camelot.is_compatible_at(b.camelot, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use setforge_features::{camelot_of, KeyName, MoodVector};

    fn record(camelot_number: u8, is_minor: bool, bpm: f64, energy: f64) -> FeatureRecord {
        let key = setforge_features::key_of_camelot(setforge_features::CamelotCode::new(camelot_number, is_minor));
        FeatureRecord {
            track_id: setforge_features::TrackId::new("/a.flac"),
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
    fn identical_tracks_score_perfectly() {
        let a = record(8, false, 128.0, 7.0);
        let score = transition_score(&a, &a, 7.0);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn distant_camelot_and_bpm_scores_low() {
        let a = record(1, false, 90.0, 2.0);
        let b = record(7, true, 175.0, 9.0);
        assert!(transition_score(&a, &b, 2.0) < 0.5);
    }

    #[test]
    fn score_is_always_bounded() {
        let a = record(8, false, 128.0, 7.0);
        let b = record(9, false, 140.0, 9.0);
        let score = transition_score(&a, &b, 5.0);
        assert!((0.0..=1.0).contains(&score));
    }
}
