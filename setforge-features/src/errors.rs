use thiserror::Error;

/// Failure modes of decoding + extracting a single file. Surfaced to the
/// caller of `analyze_file`; never retried automatically.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("file does not exist: {0}")]
    FileMissing(std::path::PathBuf),
    #[error("file is shorter than the minimum analysis window (10s): {0}")]
    FileTooShort(std::path::PathBuf),
    #[error("failed to decode audio: {0}")]
    DecodeFailed(String),
    #[error("extraction exceeded its wall-clock budget")]
    Timeout,
}

impl From<std::io::Error> for ExtractionError {
    #[inline]
    fn from(e: std::io::Error) -> Self {
        Self::DecodeFailed(e.to_string())
    }
}

impl From<rodio::decoder::DecoderError> for ExtractionError {
    #[inline]
    fn from(e: rodio::decoder::DecoderError) -> Self {
        Self::DecodeFailed(e.to_string())
    }
}

impl From<rubato::ResampleError> for ExtractionError {
    #[inline]
    fn from(e: rubato::ResampleError) -> Self {
        Self::DecodeFailed(e.to_string())
    }
}

impl From<rubato::ResamplerConstructionError> for ExtractionError {
    #[inline]
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        Self::DecodeFailed(e.to_string())
    }
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

bitflags::bitflags! {
    /// Per-stage extraction fallback flags (`FeatureFallback` in the error
    /// design: never an error, a bit recording that a sentinel value was
    /// substituted for a stage that could not be computed).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FeatureFlags: u8 {
        const BPM_FAILED  = 0b0000_0001;
        const KEY_UNKNOWN = 0b0000_0010;
        const MOOD_FAILED = 0b0000_0100;
        const TIMEOUT     = 0b0000_1000;
    }
}
