//! Energy score (C3 stage 4): linearly normalize rms/centroid/onset-density
//! against fixed ranges, weighted-sum, rescale to `[1, 10]`.

/// Normalization ranges and weights, overridable via configuration
/// (`extractor.weights`); these are the spec defaults.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct EnergyWeights {
    pub rms: f64,
    pub centroid: f64,
    pub onset: f64,
}

impl Default for EnergyWeights {
    #[inline]
    fn default() -> Self {
        Self {
            rms: 0.4,
            centroid: 0.3,
            onset: 0.3,
        }
    }
}

const RMS_RANGE: (f64, f64) = (-60.0, -10.0);
const CENTROID_RANGE: (f64, f64) = (500.0, 8000.0);
const ONSET_RANGE: (f64, f64) = (0.0, 10.0);

fn normalize(value: f64, (min, max): (f64, f64)) -> f64 {
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// `energy_score = 1 + 9 * (w_rms*rms01 + w_centroid*cent01 + w_onset*onset01)`.
#[must_use]
#[inline]
pub fn energy_score(
    rms_db: f64,
    centroid_hz: f64,
    onset_density: f64,
    weights: EnergyWeights,
) -> f64 {
    let rms01 = normalize(rms_db, RMS_RANGE);
    let cent01 = normalize(centroid_hz, CENTROID_RANGE);
    let onset01 = normalize(onset_density, ONSET_RANGE);

    let e01 = weights.rms * rms01 + weights.centroid * cent01 + weights.onset * onset01;
    (1.0 + 9.0 * e01).clamp(1.0, 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_inputs_give_floor_score() {
        let score = energy_score(-60.0, 500.0, 0.0, EnergyWeights::default());
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ceiling_inputs_give_ceiling_score() {
        let score = energy_score(-10.0, 8000.0, 10.0, EnergyWeights::default());
        assert!((score - 10.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_inputs_are_clamped_not_extrapolated() {
        let score = energy_score(0.0, 20000.0, 999.0, EnergyWeights::default());
        assert!((score - 10.0).abs() < 1e-9);
        let score = energy_score(-120.0, -100.0, -5.0, EnergyWeights::default());
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn score_is_always_in_bounds() {
        for rms in [-80.0, -40.0, -5.0] {
            for centroid in [100.0, 3000.0, 10000.0] {
                for onset in [-1.0, 5.0, 20.0] {
                    let score = energy_score(rms, centroid, onset, EnergyWeights::default());
                    assert!((1.0..=10.0).contains(&score));
                }
            }
        }
    }
}
