//! rodio + rubato decoder backend: decode any container rodio/symphonia
//! understands, downmix to mono, resample to a fixed target rate.

use std::{f32::consts::SQRT_2, fs::File, io::BufReader, path::Path};

use rodio::Source;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::errors::{ExtractionError, ExtractionResult};

use super::{check_exists, AudioDecoder, DecodedAudio, MIN_DURATION_SECONDS};

/// Target sample rate this decoder profile commits to. Changing this value
/// changes `profile_id` and therefore invalidates every cached record.
pub const SAMPLE_RATE: u32 = 22050;

pub struct RodioDecoder;

impl RodioDecoder {
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for RodioDecoder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDecoder for RodioDecoder {
    #[inline]
    fn profile_id(&self) -> &'static str {
        "rodio-22050"
    }

    #[allow(clippy::missing_inline_in_public_items)]
    fn decode(&self, path: &Path, max_seconds: f64) -> ExtractionResult<DecodedAudio> {
        check_exists(path)?;

        let file = BufReader::new(File::open(path)?);
        let source = rodio::Decoder::new(file)?.convert_samples::<f32>();

        let num_channels = source.channels() as usize;
        let sample_rate = source.sample_rate();
        if num_channels == 0 {
            return Err(ExtractionError::DecodeFailed(
                "audio source has no channels".to_owned(),
            ));
        }

        let max_interleaved = (max_seconds * f64::from(sample_rate)) as usize * num_channels;
        let interleaved: Vec<f32> = source.take(max_interleaved.max(num_channels)).collect();

        // Channels are interleaved ([l, r, l, r, ...]); collapse to mono by
        // averaging, with the stereo case using the common sqrt(2)/2 scaling
        // to avoid clipping on correlated channels.
        let mono_sample_array: Vec<f32> = match num_channels {
            1 => interleaved,
            2 => interleaved
                .chunks_exact(2)
                .map(|chunk| (chunk[0] + chunk[1]) * SQRT_2 / 2.)
                .collect(),
            n => {
                log::warn!(
                    "audio source for {} has {n} channels, downmixing by averaging",
                    path.display()
                );
                interleaved
                    .chunks_exact(n)
                    .map(|chunk| chunk.iter().sum::<f32>() / n as f32)
                    .collect()
            }
        };

        let resampled = if sample_rate == SAMPLE_RATE {
            mono_sample_array
        } else {
            resample(&mono_sample_array, sample_rate, SAMPLE_RATE)?
        };

        let duration = resampled.len() as f64 / f64::from(SAMPLE_RATE);
        if duration < MIN_DURATION_SECONDS {
            return Err(ExtractionError::FileTooShort(path.to_path_buf()));
        }

        Ok(DecodedAudio {
            samples: resampled,
            sample_rate: SAMPLE_RATE,
        })
    }
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> ExtractionResult<Vec<f32>> {
    if samples.is_empty() {
        return Ok(Vec::new());
    }
    let mut resampler = FastFixedIn::new(
        f64::from(to_rate) / f64::from(from_rate),
        1.0,
        PolynomialDegree::Cubic,
        samples.len(),
        1,
    )?;
    Ok(resampler.process(&[samples], None)?[0].clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_id_is_stable() {
        assert_eq!(RodioDecoder::new().profile_id(), "rodio-22050");
    }

    #[test]
    fn decode_reports_missing_file() {
        let err = RodioDecoder::new()
            .decode(Path::new("/nonexistent/track.flac"), 120.0)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::FileMissing(_)));
    }

    #[test]
    fn resample_identity_when_rates_match() {
        let samples = vec![0.1_f32; 1000];
        let out = resample(&samples, SAMPLE_RATE, SAMPLE_RATE).unwrap();
        // FastFixedIn with ratio 1.0 is still a real resample pass; just
        // check it doesn't blow up and preserves roughly the same length.
        assert!((out.len() as i64 - samples.len() as i64).abs() < 64);
    }

    #[test]
    fn resample_empty_is_empty() {
        assert!(resample(&[], 44100, 22050).unwrap().is_empty());
    }
}
