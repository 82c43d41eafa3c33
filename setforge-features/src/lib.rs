//! Feature types, the Camelot wheel, audio decoding and feature extraction
//! for harmonic-mixing playlist engineering.
//!
//! We use rodio to decode audio files (already a dependency for playback
//! elsewhere in the workspace) and rubato to resample to a fixed analysis
//! rate. Every stage past decoding degrades to a documented sentinel rather
//! than failing the whole extraction; see [`errors::FeatureFlags`].

#![deny(clippy::missing_inline_in_public_items)]

pub mod camelot;
pub mod decoder;
pub mod errors;
pub mod extractor;
pub mod types;
pub mod utils;

pub use camelot::{
    camelot_of, key_of_camelot, CamelotCode, CompatLevel, EnergyDirection, KeyName, Mode,
    TransitionQuality,
};
pub use decoder::{read_tags, AudioDecoder, DecodedAudio, RodioDecoder, MIN_DURATION_SECONDS};
pub use errors::{ExtractionError, ExtractionResult, FeatureFlags};
pub use extractor::energy::EnergyWeights;
pub use extractor::mood::{MoodClassifier, RuleMoodClassifier};
pub use extractor::{extract, ExtractorConfig};
pub use types::{
    FeatureRecord, MoodKind, MoodVector, TrackId, TrackMetadata, BPM_SENTINEL, ENERGY_SENTINEL,
};
