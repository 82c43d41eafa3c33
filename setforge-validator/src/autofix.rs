//! Applies `auto_fixable` issues in place, re-scoring after each one and
//! rolling it back if it would not improve (or would worsen) the overall
//! score. Idempotent: running it twice on an already-fixed playlist is a
//! no-op the second time, since the fixed state raises no more issues of
//! that kind.

use crate::aggregate::{aggregate, CategoryWeights};
use crate::checks::{run_all, ValidationLevel};
use crate::entry::PlaylistEntry;
use crate::issue::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    Applied,
    SkippedWouldNotImprove,
    NotApplicable,
}

/// Applies the tempo_flow fix (set the later track's effective bpm to the
/// mean of the pair) and the technical_mixing fix (`can_pitch_shift = true`)
/// wherever doing so does not reduce the overall score. Always re-scores at
/// `ValidationLevel::Standard`, which covers both fixable categories,
/// independent of whatever level the caller validates the finished playlist
/// at.
pub fn apply_fixes(playlist: &mut [PlaylistEntry], weights: CategoryWeights) -> Vec<FixOutcome> {
    let mut outcomes = Vec::new();

    let tempo_issues: Vec<usize> = run_all(playlist, ValidationLevel::Standard)
        .into_iter()
        .filter(|issue| issue.category == Category::TempoFlow && issue.auto_fixable)
        .filter_map(|issue| issue.track_index)
        .collect();

    for index in tempo_issues {
        if index == 0 || index >= playlist.len() {
            continue;
        }
        let Some(prev_bpm) = playlist[index - 1].record.as_ref().map(|r| r.bpm) else {
            continue;
        };
        let Some(current_bpm) = playlist[index].record.as_ref().map(|r| r.bpm) else {
            continue;
        };
        let mean_bpm = (prev_bpm + current_bpm) / 2.0;
        let before = aggregate(&run_all(playlist, ValidationLevel::Standard), weights).percent;

        let original = current_bpm;
        if let Some(record) = playlist[index].record.as_mut() {
            record.bpm = mean_bpm;
        }

        let after = aggregate(&run_all(playlist, ValidationLevel::Standard), weights).percent;
        if after + f64::EPSILON < before {
            if let Some(record) = playlist[index].record.as_mut() {
                record.bpm = original;
            }
            outcomes.push(FixOutcome::SkippedWouldNotImprove);
        } else {
            outcomes.push(FixOutcome::Applied);
        }
    }

    let mixing_issues: Vec<usize> = run_all(playlist, ValidationLevel::Standard)
        .into_iter()
        .filter(|issue| issue.category == Category::TechnicalMixing && issue.auto_fixable)
        .filter_map(|issue| issue.track_index)
        .collect();

    for index in mixing_issues {
        if index >= playlist.len() || playlist[index].metadata.can_pitch_shift {
            outcomes.push(FixOutcome::NotApplicable);
            continue;
        }
        let before_local = aggregate(&run_all(playlist, ValidationLevel::Standard), weights).percent;
        playlist[index].metadata.can_pitch_shift = true;
        let after_local = aggregate(&run_all(playlist, ValidationLevel::Standard), weights).percent;
        if after_local + f64::EPSILON < before_local {
            playlist[index].metadata.can_pitch_shift = false;
            outcomes.push(FixOutcome::SkippedWouldNotImprove);
        } else {
            outcomes.push(FixOutcome::Applied);
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use setforge_features::{camelot_of, FeatureFlags, KeyName, MoodKind, MoodVector, TrackId};

    fn entry(bpm: f64) -> PlaylistEntry {
        let key = KeyName::c_major();
        let record = setforge_features::FeatureRecord {
            track_id: TrackId::new("/track.flac"),
            duration_seconds: 200.0,
            bpm,
            key,
            camelot: camelot_of(key),
            energy_score: 5.0,
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
    fn tempo_fix_pulls_the_jump_toward_the_pair_mean() {
        let mut playlist = vec![entry(120.0), entry(170.0)];
        apply_fixes(&mut playlist, CategoryWeights::default());
        let fixed_bpm = playlist[1].record.as_ref().unwrap().bpm;
        assert!((fixed_bpm - 145.0).abs() < 1e-9);
    }

    #[test]
    fn running_fixes_twice_is_idempotent() {
        let mut playlist = vec![entry(120.0), entry(170.0)];
        apply_fixes(&mut playlist, CategoryWeights::default());
        let after_first = playlist.clone();
        apply_fixes(&mut playlist, CategoryWeights::default());
        assert_eq!(playlist, after_first);
    }
}
