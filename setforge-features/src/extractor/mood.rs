//! Mood classification (C3 stage 5): a pluggable capability,
//! `MoodClassifier { predict, classes }`, with two concrete variants wired
//! behind the same trait — a rule-based classifier (always available) and an
//! optional gradient-boosted tree classifier loaded from a trained artifact.

use crate::types::{MoodKind, MoodVector};

/// The feature vector a mood classifier consumes: `(energy_score, centroid_hz, bpm, is_minor)`.
#[derive(Debug, Clone, Copy)]
pub struct MoodFeatures {
    pub energy_score: f64,
    pub centroid_hz: f64,
    pub bpm: f64,
    pub is_minor: bool,
}

pub trait MoodClassifier {
    fn predict(&self, features: MoodFeatures) -> MoodVector;
    fn classes(&self) -> &'static [MoodKind];
}

struct MoodRule {
    mood: MoodKind,
    energy: (f64, f64),
    centroid: (f64, f64),
    bpm: (f64, f64),
    /// Bias applied when the predicate's mode condition holds: `Some(true)`
    /// rewards minor keys, `Some(false)` rewards major keys.
    mode_bias: Option<(bool, f64)>,
}

const RULES: &[MoodRule] = &[
    MoodRule {
        mood: MoodKind::Dark,
        energy: (1.0, 6.0),
        centroid: (500.0, 3000.0),
        bpm: (120.0, 140.0),
        mode_bias: Some((true, 0.14)),
    },
    MoodRule {
        mood: MoodKind::Euphoric,
        energy: (7.0, 10.0),
        centroid: (2000.0, 8000.0),
        bpm: (125.0, 135.0),
        mode_bias: Some((false, 0.16)),
    },
    MoodRule {
        mood: MoodKind::Driving,
        energy: (6.0, 9.0),
        centroid: (1500.0, 5000.0),
        bpm: (120.0, 135.0),
        mode_bias: None,
    },
    MoodRule {
        mood: MoodKind::Experimental,
        energy: (2.0, 8.0),
        centroid: (1000.0, 6000.0),
        bpm: (80.0, 150.0),
        mode_bias: None,
    },
    MoodRule {
        mood: MoodKind::Progressive,
        energy: (5.0, 8.0),
        centroid: (1500.0, 4000.0),
        bpm: (120.0, 130.0),
        mode_bias: None,
    },
    MoodRule {
        mood: MoodKind::PeakTime,
        energy: (8.0, 10.0),
        centroid: (2500.0, 7000.0),
        bpm: (128.0, 138.0),
        mode_bias: None,
    },
];

const PREDICATE_WEIGHT: f64 = 0.2;

fn in_range(value: f64, (lo, hi): (f64, f64)) -> bool {
    value >= lo && value <= hi
}

/// Deterministic interval-predicate scorer: always available, never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleMoodClassifier;

impl MoodClassifier for RuleMoodClassifier {
    #[allow(clippy::missing_inline_in_public_items)]
    fn predict(&self, features: MoodFeatures) -> MoodVector {
        let mut mood = MoodVector::default();

        for rule in RULES {
            let mut score = 0.0;
            let mut max_score = 0.0;

            for satisfied in [
                in_range(features.energy_score, rule.energy),
                in_range(features.centroid_hz, rule.centroid),
                in_range(features.bpm, rule.bpm),
            ] {
                max_score += PREDICATE_WEIGHT;
                if satisfied {
                    score += PREDICATE_WEIGHT;
                }
            }

            if let Some((wants_minor, bias)) = rule.mode_bias {
                max_score += bias;
                if features.is_minor == wants_minor {
                    score += bias;
                }
            }

            let normalized = if max_score > 0.0 { score / max_score } else { 0.0 };
            mood.set(rule.mood, normalized);
        }

        mood
    }

    #[inline]
    fn classes(&self) -> &'static [MoodKind] {
        const CLASSES: [MoodKind; 6] = [
            MoodKind::Dark,
            MoodKind::Euphoric,
            MoodKind::Driving,
            MoodKind::Experimental,
            MoodKind::Progressive,
            MoodKind::PeakTime,
        ];
        &CLASSES
    }
}

#[cfg(feature = "ort-mood")]
pub mod tree {
    //! Optional gradient-boosted tree classifier, loaded from a trained ONNX
    //! artifact. Falls back to [`super::RuleMoodClassifier`] at the call site
    //! if no artifact is configured; never invoked implicitly.

    use super::{MoodClassifier, MoodFeatures};
    use crate::types::{MoodKind, MoodVector};
    use std::path::Path;

    pub struct TreeMoodClassifier {
        session: ort::session::Session,
    }

    impl TreeMoodClassifier {
        /// # Errors
        /// Returns an error if the model file cannot be loaded by the ONNX
        /// runtime.
        #[inline]
        pub fn load(model_path: &Path) -> ort::Result<Self> {
            let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
            Ok(Self { session })
        }
    }

    impl MoodClassifier for TreeMoodClassifier {
        #[allow(clippy::missing_inline_in_public_items)]
        fn predict(&self, features: MoodFeatures) -> MoodVector {
            use ort::value::Tensor;

            let input = [
                features.energy_score,
                features.centroid_hz,
                features.bpm,
                f64::from(u8::from(features.is_minor)),
            ];
            let Ok(tensor) = Tensor::from_array(([1usize, 4], input.to_vec())) else {
                return MoodVector::default();
            };
            let Ok(outputs) = self.session.run(ort::inputs![tensor]) else {
                return MoodVector::default();
            };
            let Some((_, value)) = outputs.iter().next() else {
                return MoodVector::default();
            };
            let Ok((_, data)) = value.try_extract_tensor::<f32>() else {
                return MoodVector::default();
            };

            let mut mood = MoodVector::default();
            for (kind, score) in MoodKind::iter().zip(data.iter()) {
                mood.set(kind, f64::from(*score));
            }
            mood
        }

        #[inline]
        fn classes(&self) -> &'static [MoodKind] {
            const CLASSES: [MoodKind; 6] = [
                MoodKind::Dark,
                MoodKind::Euphoric,
                MoodKind::Driving,
                MoodKind::Experimental,
                MoodKind::Progressive,
                MoodKind::PeakTime,
            ];
            &CLASSES
        }
    }

    use strum::IntoEnumIterator;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn all_predicates_satisfied_gives_confidence_one() {
        let classifier = RuleMoodClassifier;
        let features = MoodFeatures {
            energy_score: 9.0,
            centroid_hz: 2500.0,
            bpm: 130.0,
            is_minor: false,
        };
        let mood = classifier.predict(features);
        assert!((mood.get(MoodKind::PeakTime) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn argmax_matches_the_dominant_mood() {
        let classifier = RuleMoodClassifier;
        let features = MoodFeatures {
            energy_score: 2.0,
            centroid_hz: 1200.0,
            bpm: 125.0,
            is_minor: true,
        };
        let mood = classifier.predict(features);
        assert_eq!(mood.argmax(), MoodKind::Dark);
    }

    #[test]
    fn classes_lists_all_six_moods() {
        assert_eq!(RuleMoodClassifier.classes().len(), 6);
    }

    #[test]
    fn no_predicates_satisfied_gives_zero() {
        let classifier = RuleMoodClassifier;
        let features = MoodFeatures {
            energy_score: -100.0,
            centroid_hz: -100.0,
            bpm: -100.0,
            is_minor: false,
        };
        let mood = classifier.predict(features);
        for kind in [MoodKind::Dark, MoodKind::Euphoric, MoodKind::Driving] {
            assert_eq!(mood.get(kind), 0.0);
        }
    }
}
