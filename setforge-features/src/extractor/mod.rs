//! Feature extraction (C3): orchestrates decode -> tempo -> key -> spectral
//! -> energy -> mood into one immutable `FeatureRecord`, substituting
//! documented sentinels (rather than aborting) for any stage past decode
//! that fails.

pub mod energy;
pub mod key;
pub mod mood;
pub mod spectral;
pub mod tempo;

use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::camelot::camelot_of;
use crate::decoder::AudioDecoder;
use crate::errors::{ExtractionResult, FeatureFlags};
use crate::types::{FeatureRecord, TrackId, BPM_SENTINEL};

use energy::EnergyWeights;
use mood::{MoodClassifier, MoodFeatures};

/// Wall-clock budget per file, per spec. Checked between stages; expiry
/// writes a sentinel record with `errors |= TIMEOUT` rather than failing.
pub const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(60);
/// Analysis window length passed to the decoder.
pub const DEFAULT_MAX_SECONDS: f64 = 120.0;

pub struct ExtractorConfig {
    pub max_seconds: f64,
    pub timeout: Duration,
    pub energy_weights: EnergyWeights,
}

impl Default for ExtractorConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_seconds: DEFAULT_MAX_SECONDS,
            timeout: EXTRACTION_TIMEOUT,
            energy_weights: EnergyWeights::default(),
        }
    }
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn source_mtime(path: &Path) -> i64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs() as i64)
}

/// Run the full C3 pipeline for `path`. Errors only propagate from decoding
/// (`FileMissing`/`FileTooShort`/`DecodeFailed`); everything past that point
/// degrades to a sentinel + flag rather than aborting.
#[allow(clippy::missing_inline_in_public_items)]
pub fn extract(
    path: &Path,
    decoder: &dyn AudioDecoder,
    mood_classifier: &dyn MoodClassifier,
    config: &ExtractorConfig,
) -> ExtractionResult<FeatureRecord> {
    let deadline = Instant::now() + config.timeout;
    let mtime = source_mtime(path);

    let audio = decoder.decode(path, config.max_seconds)?;
    let duration_seconds = audio.duration_seconds();
    let track_id = TrackId::new(path);

    if Instant::now() >= deadline {
        let mut record = FeatureRecord::sentinel(track_id, duration_seconds, now_epoch_seconds(), mtime);
        record.errors |= FeatureFlags::TIMEOUT;
        return Ok(record);
    }

    let mut errors = FeatureFlags::empty();

    let bpm = match tempo::estimate_bpm(&audio.samples, audio.sample_rate) {
        Some(estimate) => estimate.bpm,
        None => {
            errors |= FeatureFlags::BPM_FAILED;
            BPM_SENTINEL
        }
    };

    if Instant::now() >= deadline {
        errors |= FeatureFlags::TIMEOUT;
        let mut record =
            FeatureRecord::sentinel(track_id, duration_seconds, now_epoch_seconds(), mtime);
        record.bpm = bpm;
        record.errors |= errors;
        return Ok(record);
    }

    let key_detection = key::detect_key(&audio.samples, audio.sample_rate);
    let (key, mood_key_bias) = if key_detection.confidence <= 0.0 {
        errors |= FeatureFlags::KEY_UNKNOWN;
        (crate::camelot::KeyName::c_major(), false)
    } else {
        (
            key_detection.key,
            matches!(key_detection.key.mode, crate::camelot::Mode::Minor),
        )
    };
    let camelot = camelot_of(key);

    let descriptors = spectral::compute_spectral(&audio.samples, audio.sample_rate, duration_seconds);
    let energy_score = energy::energy_score(
        descriptors.rms_loudness_db,
        descriptors.spectral_centroid_hz,
        descriptors.onset_density_per_s,
        config.energy_weights,
    );

    let mood = mood_classifier.predict(MoodFeatures {
        energy_score,
        centroid_hz: descriptors.spectral_centroid_hz,
        bpm,
        is_minor: mood_key_bias,
    });
    let mood_label = mood.argmax();
    let mood_confidence = mood.get(mood_label);

    Ok(FeatureRecord {
        track_id,
        duration_seconds,
        bpm,
        key,
        camelot,
        energy_score,
        rms_loudness_db: descriptors.rms_loudness_db,
        spectral_centroid_hz: descriptors.spectral_centroid_hz,
        onset_density_per_s: descriptors.onset_density_per_s,
        mood,
        mood_label,
        mood_confidence,
        analyzed_at: now_epoch_seconds(),
        source_mtime: mtime,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{DecodedAudio, MIN_DURATION_SECONDS};
    use crate::errors::ExtractionError;
    use mood::RuleMoodClassifier;
    use std::f32::consts::PI;

    struct FakeDecoder {
        samples: Vec<f32>,
        sample_rate: u32,
    }

    impl AudioDecoder for FakeDecoder {
        fn profile_id(&self) -> &'static str {
            "fake-decoder"
        }
        fn decode(&self, _path: &Path, _max_seconds: f64) -> ExtractionResult<DecodedAudio> {
            if (self.samples.len() as f64) < MIN_DURATION_SECONDS * f64::from(self.sample_rate) {
                return Err(ExtractionError::FileTooShort(Path::new("fake").to_path_buf()));
            }
            Ok(DecodedAudio {
                samples: self.samples.clone(),
                sample_rate: self.sample_rate,
            })
        }
    }

    fn tone(freq: f32, secs: f32, sr: u32) -> Vec<f32> {
        let n = (secs * sr as f32) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sr as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn extract_produces_camelot_consistent_record() {
        let decoder = FakeDecoder {
            samples: tone(440.0, 12.0, 22050),
            sample_rate: 22050,
        };
        let classifier = RuleMoodClassifier;
        let config = ExtractorConfig::default();
        let record = extract(Path::new("/tmp/fake.wav"), &decoder, &classifier, &config).unwrap();

        assert!(record.camelot_consistent());
        assert_eq!(record.mood_label, record.mood.argmax());
        assert!(record.bpm >= 60.0 && record.bpm <= 200.0);
        assert!(record.energy_score >= 1.0 && record.energy_score <= 10.0);
    }

    #[test]
    fn extract_propagates_decode_errors() {
        let decoder = FakeDecoder {
            samples: vec![0.0; 100],
            sample_rate: 22050,
        };
        let classifier = RuleMoodClassifier;
        let config = ExtractorConfig::default();
        let err = extract(Path::new("/tmp/short.wav"), &decoder, &classifier, &config).unwrap_err();
        assert!(matches!(err, ExtractionError::FileTooShort(_)));
    }
}
