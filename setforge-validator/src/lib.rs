//! Playlist quality validation (C8): independent of the solver, scores a
//! finished playlist, reports issues per category, and can apply the
//! issues marked safe to auto-fix.

pub mod aggregate;
pub mod autofix;
pub mod checks;
pub mod entry;
pub mod issue;

pub use aggregate::{aggregate, CategoryWeights, QualityScore};
pub use autofix::{apply_fixes, FixOutcome};
pub use checks::ValidationLevel;
pub use entry::PlaylistEntry;
pub use issue::{Category, Issue, IssueKind};

/// An ordered, validated sequence of tracks; the thing C8 scores and C7
/// produces.
pub type Playlist = Vec<PlaylistEntry>;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub score: QualityScore,
    pub issues: Vec<Issue>,
}

/// Runs the category checks for `level` and aggregates the result.
#[must_use]
pub fn validate(playlist: &[PlaylistEntry], weights: CategoryWeights, level: ValidationLevel) -> ValidationReport {
    let issues = checks::run_all(playlist, level);
    let score = aggregate(&issues, weights);
    ValidationReport { score, issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setforge_features::{camelot_of, FeatureFlags, KeyName, MoodKind, MoodVector, TrackId};

    fn entry(bpm: f64, energy: f64) -> PlaylistEntry {
        let key = KeyName::c_major();
        let record = setforge_features::FeatureRecord {
            track_id: TrackId::new("/track.flac"),
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
            errors: FeatureFlags::empty(),
        };
        PlaylistEntry::new("/track.flac", record, Default::default())
    }

    #[test]
    fn a_clean_short_playlist_scores_perfectly() {
        let playlist = vec![entry(120.0, 5.0), entry(122.0, 5.5)];
        let report = validate(&playlist, CategoryWeights::default(), ValidationLevel::Standard);
        assert!((report.score.percent - 100.0).abs() < 1e-6);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn a_large_tempo_jump_lowers_the_score_and_is_reported() {
        let playlist = vec![entry(120.0, 5.0), entry(170.0, 5.0)];
        let report = validate(&playlist, CategoryWeights::default(), ValidationLevel::Standard);
        assert!(report.score.percent < 100.0);
        assert!(report.issues.iter().any(|i| i.category == Category::TempoFlow));
    }
}
