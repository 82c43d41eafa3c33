//! The nine category checks. Each takes the full playlist and returns the
//! issues that category found; an empty vec means the category is clean.

use serde::{Deserialize, Serialize};
use setforge_features::CompatLevel;

use crate::entry::PlaylistEntry;
use crate::issue::{Category, Issue, IssueKind};

const MIN_BITRATE_KBPS: u32 = 128;
const MAX_ENERGY_DELTA: f64 = 3.0;
const MAX_BPM_DELTA_FLOW: f64 = 20.0;
const MAX_BPM_DELTA_MIXING: f64 = 5.0;
const HIGH_ENERGY_THRESHOLD: f64 = 8.0;
const MAX_CONSECUTIVE_SAME_ARTIST: usize = 2;
const MAX_CONSECUTIVE_SAME_GENRE: usize = 3;

/// Toggles which of the nine category checks run. `Basic` limits checks to
/// the ones a DJ would call non-negotiable; each tier up adds the checks
/// that matter more the more seriously the set is being prepared, ending
/// with `Expert` running everything including `crowd_engagement`'s
/// suggestion-level heuristics.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    Basic,
    #[default]
    Standard,
    Professional,
    Expert,
}

/// Runs the category checks appropriate to `level` and concatenates their
/// issues.
#[must_use]
pub fn run_all(playlist: &[PlaylistEntry], level: ValidationLevel) -> Vec<Issue> {
    let mut issues = Vec::new();
    issues.extend(file_existence(playlist));
    issues.extend(audio_quality(playlist));
    issues.extend(tempo_flow(playlist));

    if level == ValidationLevel::Basic {
        return issues;
    }
    issues.extend(harmonic_flow(playlist));
    issues.extend(energy_flow(playlist));
    issues.extend(technical_mixing(playlist));

    if level == ValidationLevel::Standard {
        return issues;
    }
    issues.extend(mood_progression(playlist));
    issues.extend(diversity(playlist));

    if level == ValidationLevel::Professional {
        return issues;
    }
    issues.extend(crowd_engagement(playlist));
    issues
}

pub fn file_existence(playlist: &[PlaylistEntry]) -> Vec<Issue> {
    playlist
        .iter()
        .enumerate()
        .filter(|(_, entry)| !entry.exists())
        .map(|(i, entry)| {
            Issue::new(
                IssueKind::Error,
                Category::FileExistence,
                format!("track at position {i} does not resolve: {}", entry.path.display()),
                1.0,
                false,
            )
            .at(i)
        })
        .collect()
}

pub fn audio_quality(playlist: &[PlaylistEntry]) -> Vec<Issue> {
    playlist
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let bitrate = entry.metadata.bitrate_kbps?;
            if bitrate < MIN_BITRATE_KBPS {
                Some(
                    Issue::new(
                        IssueKind::Warning,
                        Category::AudioQuality,
                        format!("bitrate {bitrate} kbps is below the {MIN_BITRATE_KBPS} kbps floor"),
                        0.8,
                        false,
                    )
                    .at(i),
                )
            } else {
                None
            }
        })
        .collect()
}

fn adjacent_pairs<'a>(playlist: &'a [PlaylistEntry]) -> impl Iterator<Item = (usize, &'a PlaylistEntry, &'a PlaylistEntry)> {
    playlist.windows(2).enumerate().filter_map(|(i, pair)| {
        let (a, b) = (&pair[0], &pair[1]);
        if a.exists() && b.exists() {
            Some((i + 1, a, b))
        } else {
            None
        }
    })
}

pub fn harmonic_flow(playlist: &[PlaylistEntry]) -> Vec<Issue> {
    adjacent_pairs(playlist)
        .filter_map(|(i, a, b)| {
            let (a, b) = (a.record.as_ref()?, b.record.as_ref()?);
            if a.camelot.is_compatible_at(b.camelot, CompatLevel::Extended) {
                None
            } else {
                Some(
                    Issue::new(
                        IssueKind::Warning,
                        Category::HarmonicFlow,
                        format!("{} -> {} is outside the extended harmonic set", a.camelot, b.camelot),
                        0.7,
                        false,
                    )
                    .at(i),
                )
            }
        })
        .collect()
}

pub fn energy_flow(playlist: &[PlaylistEntry]) -> Vec<Issue> {
    adjacent_pairs(playlist)
        .filter_map(|(i, a, b)| {
            let (a, b) = (a.record.as_ref()?, b.record.as_ref()?);
            let delta = (b.energy_score - a.energy_score).abs();
            if delta <= MAX_ENERGY_DELTA {
                None
            } else {
                Some(
                    Issue::new(
                        IssueKind::Warning,
                        Category::EnergyFlow,
                        format!("energy jump of {delta:.1} exceeds the {MAX_ENERGY_DELTA} ceiling"),
                        0.6,
                        false,
                    )
                    .at(i),
                )
            }
        })
        .collect()
}

pub fn tempo_flow(playlist: &[PlaylistEntry]) -> Vec<Issue> {
    adjacent_pairs(playlist)
        .filter_map(|(i, a, b)| {
            let (a, b) = (a.record.as_ref()?, b.record.as_ref()?);
            let delta = (b.bpm - a.bpm).abs();
            if delta <= MAX_BPM_DELTA_FLOW {
                None
            } else {
                Some(
                    Issue::new(
                        IssueKind::Warning,
                        Category::TempoFlow,
                        format!("tempo jump of {delta:.1} bpm exceeds the {MAX_BPM_DELTA_FLOW} bpm ceiling"),
                        0.5,
                        true,
                    )
                    .at(i),
                )
            }
        })
        .collect()
}

pub fn mood_progression(playlist: &[PlaylistEntry]) -> Vec<Issue> {
    let len = playlist.len();
    if len < 2 {
        return Vec::new();
    }
    let changes = adjacent_pairs(playlist)
        .filter(|(_, a, b)| a.record.as_ref().map(|r| r.mood_label) != b.record.as_ref().map(|r| r.mood_label))
        .count();
    let required = len / 3;
    if changes >= required {
        Vec::new()
    } else {
        vec![Issue::new(
            IssueKind::Info,
            Category::MoodProgression,
            format!("only {changes} mood changes across {len} tracks, expected at least {required}"),
            0.3,
            false,
        )]
    }
}

fn consecutive_run_violations<'a, F>(
    playlist: &'a [PlaylistEntry],
    field: F,
    max_run: usize,
) -> Vec<usize>
where
    F: Fn(&'a PlaylistEntry) -> Option<&'a str>,
{
    let mut violations = Vec::new();
    let mut run_value: Option<&str> = None;
    let mut run_len = 0usize;

    for (i, entry) in playlist.iter().enumerate() {
        let value = field(entry);
        if value.is_some() && value == run_value {
            run_len += 1;
        } else {
            run_value = value;
            run_len = 1;
        }
        if value.is_some() && run_len > max_run {
            violations.push(i);
        }
    }
    violations
}

pub fn diversity(playlist: &[PlaylistEntry]) -> Vec<Issue> {
    let mut issues: Vec<Issue> = consecutive_run_violations(
        playlist,
        |entry| entry.metadata.artist.as_deref(),
        MAX_CONSECUTIVE_SAME_ARTIST,
    )
    .into_iter()
    .map(|i| {
        Issue::new(
            IssueKind::Warning,
            Category::Diversity,
            format!("same artist appears more than {MAX_CONSECUTIVE_SAME_ARTIST} times consecutively"),
            0.4,
            false,
        )
        .at(i)
    })
    .collect();

    issues.extend(
        consecutive_run_violations(
            playlist,
            |entry| entry.metadata.genre.as_deref(),
            MAX_CONSECUTIVE_SAME_GENRE,
        )
        .into_iter()
        .map(|i| {
            Issue::new(
                IssueKind::Warning,
                Category::Diversity,
                format!("same genre appears more than {MAX_CONSECUTIVE_SAME_GENRE} times consecutively"),
                0.4,
                false,
            )
            .at(i)
        }),
    );

    issues
}

pub fn technical_mixing(playlist: &[PlaylistEntry]) -> Vec<Issue> {
    playlist
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let (a, b) = (&pair[0], &pair[1]);
            let (record_a, record_b) = (a.record.as_ref()?, b.record.as_ref()?);
            let delta = (record_b.bpm - record_a.bpm).abs();
            if delta <= MAX_BPM_DELTA_MIXING || b.metadata.can_pitch_shift {
                None
            } else {
                Some(
                    Issue::new(
                        IssueKind::Warning,
                        Category::TechnicalMixing,
                        format!("tempo jump of {delta:.1} bpm exceeds the unassisted mixing range"),
                        0.6,
                        true,
                    )
                    .at(i + 1),
                )
            }
        })
        .collect()
}

pub fn crowd_engagement(playlist: &[PlaylistEntry]) -> Vec<Issue> {
    let len = playlist.len();
    if len == 0 {
        return Vec::new();
    }
    let high_energy_count = playlist
        .iter()
        .filter(|entry| entry.record.as_ref().is_some_and(|r| r.energy_score > HIGH_ENERGY_THRESHOLD))
        .count();
    let required = len / 5;
    if high_energy_count >= required {
        Vec::new()
    } else {
        vec![Issue::new(
            IssueKind::Suggestion,
            Category::CrowdEngagement,
            format!("only {high_energy_count} high-energy tracks across {len}, expected at least {required}"),
            0.2,
            false,
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setforge_features::{camelot_of, FeatureFlags, KeyName, MoodKind, MoodVector, TrackId};

    fn entry(camelot_number: u8, bpm: f64, energy: f64, mood: MoodKind) -> PlaylistEntry {
        let key = setforge_features::key_of_camelot(setforge_features::CamelotCode::new(camelot_number, false));
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
            mood_label: mood,
            mood_confidence: 0.5,
            analyzed_at: 0,
            source_mtime: 0,
            errors: FeatureFlags::empty(),
        };
        PlaylistEntry::new("/track.flac", record, Default::default())
    }

    #[test]
    fn missing_file_raises_a_file_existence_error() {
        let playlist = vec![PlaylistEntry::missing("/gone.flac")];
        let issues = file_existence(&playlist);
        assert_eq!(issues.len(), 1);
        assert!((issues[0].severity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn large_tempo_jump_is_flagged_as_auto_fixable() {
        let playlist = vec![entry(8, 120.0, 5.0, MoodKind::Driving), entry(8, 170.0, 5.0, MoodKind::Driving)];
        let issues = tempo_flow(&playlist);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].auto_fixable);
    }

    #[test]
    fn low_engagement_playlist_raises_a_suggestion() {
        let playlist: Vec<PlaylistEntry> = (0..10).map(|_| entry(8, 120.0, 3.0, MoodKind::Driving)).collect();
        let issues = crowd_engagement(&playlist);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Suggestion);
    }

    #[test]
    fn sufficient_mood_variety_raises_nothing() {
        let moods = [
            MoodKind::Dark,
            MoodKind::Euphoric,
            MoodKind::Driving,
            MoodKind::Experimental,
            MoodKind::Progressive,
            MoodKind::PeakTime,
        ];
        let playlist: Vec<PlaylistEntry> = moods.iter().map(|&m| entry(8, 120.0, 5.0, m)).collect();
        assert!(mood_progression(&playlist).is_empty());
    }
}
