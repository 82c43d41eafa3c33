//! Fixed-order feature vector derived from a `FeatureRecord`, for standardized
//! Euclidean nearest-neighbor search.

use setforge_features::{FeatureRecord, MoodKind};

pub const DIM: usize = 10;

/// `harmonic_ratio` is not computed by the current extractor (spectral
/// energy in harmonic band vs total); the spec allows a constant default
/// when unestimated.
pub const DEFAULT_HARMONIC_RATIO: f64 = 0.5;

/// `key_numeric`: maps `(camelot_number, letter)` into `[0, 1]` via
/// `((number - 1) + 12*is_minor) / 23`.
#[must_use]
pub fn key_numeric(record: &FeatureRecord) -> f64 {
    let code = record.camelot;
    let base = f64::from(code.number - 1);
    let shifted = if code.is_minor { base + 12.0 } else { base };
    shifted / 23.0
}

/// Build the raw (pre-standardization) feature vector for `record`, in the
/// fixed order:
/// `[bpm/200, key_numeric, energy/10, mood_dark, mood_euphoric, mood_driving,
///   mood_experimental, centroid/8000, onset_density/10, harmonic_ratio]`.
#[must_use]
pub fn feature_vector(record: &FeatureRecord) -> [f64; DIM] {
    [
        record.bpm / 200.0,
        key_numeric(record),
        record.energy_score / 10.0,
        record.mood.get(MoodKind::Dark),
        record.mood.get(MoodKind::Euphoric),
        record.mood.get(MoodKind::Driving),
        record.mood.get(MoodKind::Experimental),
        record.spectral_centroid_hz / 8000.0,
        record.onset_density_per_s / 10.0,
        DEFAULT_HARMONIC_RATIO,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use setforge_features::{camelot_of, CamelotCode, KeyName, MoodVector};

    fn base_record() -> FeatureRecord {
        let key = KeyName::c_major();
        FeatureRecord {
            track_id: setforge_features::TrackId::new("/a.flac"),
            duration_seconds: 200.0,
            bpm: 128.0,
            key,
            camelot: camelot_of(key),
            energy_score: 7.0,
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
    fn vector_entries_are_in_unit_range() {
        let record = base_record();
        let vector = feature_vector(&record);
        for value in vector {
            assert!((0.0..=1.0).contains(&value), "{value} out of range");
        }
    }

    #[test]
    fn key_numeric_major_and_minor_are_distinct_halves() {
        let major = CamelotCode::new(8, false);
        let minor = CamelotCode::new(8, true);
        let mut record = base_record();
        record.camelot = major;
        let major_value = key_numeric(&record);
        record.camelot = minor;
        let minor_value = key_numeric(&record);
        assert!(minor_value > major_value);
    }
}
