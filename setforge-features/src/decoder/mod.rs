//! Audio decoding contract (C2): turn an arbitrary audio file into mono f32
//! PCM at a fixed sample rate.

use std::path::Path;

mod rodio_backend;
mod tags;
pub use rodio_backend::RodioDecoder;
pub use tags::read_tags;

use crate::errors::{ExtractionError, ExtractionResult};

/// Minimum clip length accepted for analysis.
pub const MIN_DURATION_SECONDS: f64 = 10.0;

/// Decoded, resampled mono audio ready for feature extraction.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    #[must_use]
    #[inline]
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Trait used to implement a decoder backend. `decode` must downmix to mono
/// and resample to a single fixed rate the implementation commits to for its
/// whole lifetime (that rate becomes part of the cache key, see
/// [`AudioDecoder::profile_id`]).
pub trait AudioDecoder {
    /// A stable identifier for this decoder's (backend, target sample rate)
    /// combination. Cache entries are only valid for the profile that
    /// produced them.
    fn profile_id(&self) -> &'static str;

    /// Decode and resample `path`, truncating to `max_seconds` of audio
    /// measured at the source sample rate.
    ///
    /// # Errors
    /// `FileMissing` if `path` does not exist, `FileTooShort` if the decoded
    /// clip is under [`MIN_DURATION_SECONDS`], `DecodeFailed` for any codec
    /// error. Never falls back silently.
    fn decode(&self, path: &Path, max_seconds: f64) -> ExtractionResult<DecodedAudio>;
}

pub(crate) fn check_exists(path: &Path) -> ExtractionResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ExtractionError::FileMissing(path.to_path_buf()))
    }
}
