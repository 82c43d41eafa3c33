//! Parses `Setforge.toml`, environment variables (`SETFORGE_*`), and hands
//! back a fully-validated [`Settings`] for [`crate::context::CoreContext`]
//! to build the rest of the stack from.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use setforge_features::EnergyWeights;
use setforge_validator::{CategoryWeights, ValidationLevel};

use crate::errors::CoreError;

pub static DEFAULT_CONFIG: &str = include_str!("../Setforge.toml");

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub decoder: DecoderSettings,
    #[serde(default)]
    pub extractor: ExtractorSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub solver: SolverSettings,
    #[serde(default)]
    pub validator: ValidatorSettings,
}

impl Default for Settings {
    #[inline]
    fn default() -> Self {
        Self {
            decoder: DecoderSettings::default(),
            extractor: ExtractorSettings::default(),
            cache: CacheSettings::default(),
            solver: SolverSettings::default(),
            validator: ValidatorSettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`, then overlays `SETFORGE_*` environment
    /// variables (e.g. `SETFORGE_CACHE_DIR`).
    ///
    /// # Errors
    /// Returns an error if the file cannot be parsed, or if any of the
    /// weight vectors (`extractor.weights`, `solver.weights`,
    /// `validator.weights`) do not sum to `1.0` within `1e-6`.
    #[inline]
    pub fn init(path: PathBuf) -> Result<Self, CoreError> {
        let built = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("SETFORGE"))
            .build()?;

        let settings: Self = built.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), CoreError> {
        check_sums_to_one("extractor.weights", &[
            self.extractor.weights.rms,
            self.extractor.weights.centroid,
            self.extractor.weights.onset,
        ])?;
        check_sums_to_one("solver.weights", &[
            self.solver.weights.curve_match,
            self.solver.weights.harmonic,
            self.solver.weights.flow,
            self.solver.weights.diversity,
        ])?;
        check_sums_to_one("validator.weights", &[
            self.validator.weights.harmonic,
            self.validator.weights.energy,
            self.validator.weights.tempo,
            self.validator.weights.mood,
            self.validator.weights.diversity,
            self.validator.weights.technical,
            self.validator.weights.crowd,
        ])?;
        Ok(())
    }

    /// Path to the config file, creating it (with the default contents) if
    /// it doesn't already exist.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined or
    /// created, or if writing the default file fails.
    #[inline]
    pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
        let config_dir = crate::get_config_dir().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string())
        })?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)?;
        }

        let config_file = config_dir.join("Setforge.toml");
        if !config_file.exists() {
            std::fs::write(&config_file, DEFAULT_CONFIG)?;
        }

        Ok(config_file)
    }
}

fn check_sums_to_one(name: &str, weights: &[f64]) -> Result<(), CoreError> {
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > 1e-6 {
        return Err(CoreError::InvalidWeights(format!(
            "{name} must sum to 1.0, got {sum}"
        )));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct DecoderSettings {
    /// Target sample rate for C2; also folded into the cache's
    /// `decoder_profile_id` so a rate change invalidates stale entries.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_max_seconds")]
    pub max_seconds: f64,
}

const fn default_sample_rate() -> u32 {
    22_050
}

const fn default_max_seconds() -> f64 {
    120.0
}

impl Default for DecoderSettings {
    #[inline]
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            max_seconds: default_max_seconds(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct ExtractorSettings {
    #[serde(default)]
    pub weights: EnergyWeights,
}

impl Default for ExtractorSettings {
    #[inline]
    fn default() -> Self {
        Self {
            weights: EnergyWeights::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CacheSettings {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
}

fn default_cache_dir() -> PathBuf {
    crate::get_data_dir()
        .map(|dir| dir.join("cache"))
        .unwrap_or_else(|_| PathBuf::from("./setforge-cache"))
}

const fn default_max_age_days() -> u64 {
    90
}

const fn default_max_size_mb() -> u64 {
    500
}

impl Default for CacheSettings {
    #[inline]
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            max_age_days: default_max_age_days(),
            max_size_mb: default_max_size_mb(),
        }
    }
}

/// Overrides for C7's state-scoring weights (`0.4/0.3/0.2/0.1` by default,
/// matching spec.md §4.7). [`setforge_solver::SolverConfig`] carries its own
/// copy ([`setforge_solver::ScoreWeights`]) since beam/pruning tuning and
/// score weighting are independent knobs; `Library::solve` overwrites the
/// caller-supplied config's weights with this one before searching, so a
/// configured `solver.weights` always governs the actual search.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct SolverScoreWeights {
    pub curve_match: f64,
    pub harmonic: f64,
    pub flow: f64,
    pub diversity: f64,
}

impl Default for SolverScoreWeights {
    #[inline]
    fn default() -> Self {
        Self {
            curve_match: 0.4,
            harmonic: 0.3,
            flow: 0.2,
            diversity: 0.1,
        }
    }
}

impl From<SolverScoreWeights> for setforge_solver::ScoreWeights {
    #[inline]
    fn from(w: SolverScoreWeights) -> Self {
        Self {
            curve_match: w.curve_match,
            harmonic: w.harmonic,
            flow: w.flow,
            diversity: w.diversity,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct SolverSettings {
    #[serde(default = "default_beam_width")]
    pub beam_width: usize,
    #[serde(default = "default_early_stop")]
    pub early_stop: f64,
    #[serde(default = "default_pruning_threshold")]
    pub pruning_threshold: f64,
    #[serde(default)]
    pub max_workers: Option<NonZeroUsize>,
    #[serde(default)]
    pub weights: SolverScoreWeights,
}

const fn default_beam_width() -> usize {
    5
}

const fn default_early_stop() -> f64 {
    0.95
}

const fn default_pruning_threshold() -> f64 {
    0.1
}

impl Default for SolverSettings {
    #[inline]
    fn default() -> Self {
        Self {
            beam_width: default_beam_width(),
            early_stop: default_early_stop(),
            pruning_threshold: default_pruning_threshold(),
            max_workers: None,
            weights: SolverScoreWeights::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct ValidatorSettings {
    #[serde(default)]
    pub level: ValidationLevel,
    #[serde(default)]
    pub weights: CategoryWeights,
}

impl Default for ValidatorSettings {
    #[inline]
    fn default() -> Self {
        Self {
            level: ValidationLevel::default(),
            weights: CategoryWeights::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_settings_have_weights_that_sum_to_one() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn mis_summed_extractor_weights_are_rejected() {
        let mut settings = Settings::default();
        settings.extractor.weights.rms = 0.9;
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidWeights(_)));
    }

    #[test]
    fn loading_a_toml_file_overrides_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[decoder]
sample_rate = 44100
max_seconds = 90.0

[solver]
beam_width = 8
"#,
        )
        .unwrap();

        let settings = Settings::init(config_path).unwrap();
        assert_eq!(settings.decoder.sample_rate, 44_100);
        assert_eq!(settings.solver.beam_width, 8);
        assert_eq!(settings.cache.max_age_days, default_max_age_days());
    }

    #[test]
    fn the_bundled_default_config_parses_and_validates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, DEFAULT_CONFIG).unwrap();

        let settings = Settings::init(config_path);
        assert!(settings.is_ok(), "error: {:?}", settings.err());
    }
}
