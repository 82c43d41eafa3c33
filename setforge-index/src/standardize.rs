//! Column-wise z-score standardization, fit over the currently indexed
//! population and reused (not refit) for query vectors.

use crate::vector::DIM;

#[derive(Debug, Clone, Copy)]
pub struct Standardizer {
    pub mean: [f64; DIM],
    pub std: [f64; DIM],
}

impl Standardizer {
    /// Fit `(mean, std)` per column over `vectors`. An all-constant column
    /// gets `std = 1.0` so standardization is a no-op for it rather than a
    /// division by zero.
    #[must_use]
    pub fn fit(vectors: &[[f64; DIM]]) -> Self {
        let n = vectors.len().max(1) as f64;
        let mut mean = [0.0; DIM];
        for vector in vectors {
            for (m, &value) in mean.iter_mut().zip(vector.iter()) {
                *m += value / n;
            }
        }

        let mut variance = [0.0; DIM];
        for vector in vectors {
            for (v, (&value, &m)) in variance.iter_mut().zip(vector.iter().zip(mean.iter())) {
                *v += (value - m).powi(2) / n;
            }
        }

        let mut std = [1.0; DIM];
        for (s, v) in std.iter_mut().zip(variance.iter()) {
            if *v > 1e-12 {
                *s = v.sqrt();
            }
        }

        Self { mean, std }
    }

    #[must_use]
    pub fn transform(&self, vector: &[f64; DIM]) -> [f64; DIM] {
        let mut out = [0.0; DIM];
        for ((o, &value), (&mean, &std)) in out
            .iter_mut()
            .zip(vector.iter())
            .zip(self.mean.iter().zip(self.std.iter()))
        {
            *o = (value - mean) / std;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardized_population_has_zero_mean() {
        let vectors = vec![[1.0; DIM], [3.0; DIM], [5.0; DIM]];
        let standardizer = Standardizer::fit(&vectors);
        let transformed: Vec<[f64; DIM]> = vectors.iter().map(|v| standardizer.transform(v)).collect();
        let mean: f64 = transformed.iter().map(|v| v[0]).sum::<f64>() / transformed.len() as f64;
        assert!(mean.abs() < 1e-9);
    }

    #[test]
    fn constant_column_does_not_divide_by_zero() {
        let vectors = vec![[0.5; DIM], [0.5; DIM]];
        let standardizer = Standardizer::fit(&vectors);
        let transformed = standardizer.transform(&[0.5; DIM]);
        assert!(transformed.iter().all(|v| v.is_finite()));
    }
}
