//! BPM estimation (C3 stage 1): onset-envelope autocorrelation. Picks the
//! candidate in `[60, 200]` BPM with maximum autocorrelation, tie-breaking
//! to the candidate nearest 120.

use crate::utils::stft;

const FRAME_SIZE: usize = 2048;
const HOP_SIZE: usize = 1024;
const MIN_BPM: f64 = 60.0;
const MAX_BPM: f64 = 200.0;

/// Spectral-flux onset envelope: per frame, the sum of positive
/// frame-to-frame magnitude increases across frequency bins.
#[must_use]
#[allow(clippy::missing_inline_in_public_items)]
pub fn onset_envelope(samples: &[f32]) -> Vec<f64> {
    if samples.len() <= FRAME_SIZE {
        return Vec::new();
    }
    let spectrogram = stft(samples, FRAME_SIZE, HOP_SIZE);
    let n_bins = spectrogram.shape()[0];
    let n_frames = spectrogram.shape()[1];
    if n_frames < 2 {
        return Vec::new();
    }

    let mut envelope = Vec::with_capacity(n_frames - 1);
    for frame in 1..n_frames {
        let mut flux = 0.0;
        for bin in 0..n_bins {
            let diff = spectrogram[[bin, frame]] - spectrogram[[bin, frame - 1]];
            if diff > 0.0 {
                flux += diff;
            }
        }
        envelope.push(flux);
    }
    envelope
}

fn autocorrelation_at_lag(envelope: &[f64], lag: usize) -> f64 {
    if lag == 0 || lag >= envelope.len() {
        return 0.0;
    }
    let mean = envelope.iter().sum::<f64>() / envelope.len() as f64;
    let mut sum = 0.0;
    for i in 0..envelope.len() - lag {
        sum += (envelope[i] - mean) * (envelope[i + lag] - mean);
    }
    sum
}

/// Result of BPM estimation before sentinel fallback is applied.
pub struct TempoEstimate {
    pub bpm: f64,
    pub confidence: f64,
}

/// Estimate BPM from decoded samples at `sample_rate`. Returns `None` if the
/// clip is too short to build a usable onset envelope (caller substitutes
/// the sentinel and sets `BPM_FAILED`).
#[must_use]
#[allow(clippy::missing_inline_in_public_items)]
pub fn estimate_bpm(samples: &[f32], sample_rate: u32) -> Option<TempoEstimate> {
    let envelope = onset_envelope(samples);
    if envelope.len() < 4 {
        return None;
    }

    let frame_rate = f64::from(sample_rate) / HOP_SIZE as f64;
    let min_lag = (60.0 * frame_rate / MAX_BPM).round().max(1.0) as usize;
    let max_lag = (60.0 * frame_rate / MIN_BPM).round() as usize;
    let max_lag = max_lag.min(envelope.len().saturating_sub(1));
    if min_lag >= max_lag {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    let mut max_score = f64::MIN;
    for lag in min_lag..=max_lag {
        let score = autocorrelation_at_lag(&envelope, lag);
        let bpm = 60.0 * frame_rate / lag as f64;
        let better = match best {
            None => true,
            Some((_, best_score)) if score > best_score => true,
            Some((best_lag, best_score))
                if (score - best_score).abs() < f64::EPSILON =>
            {
                let best_bpm = 60.0 * frame_rate / best_lag as f64;
                (bpm - 120.0).abs() < (best_bpm - 120.0).abs()
            }
            _ => false,
        };
        if better {
            best = Some((lag, score));
            max_score = score.max(max_score);
        }
    }

    let (best_lag, best_score) = best?;
    let bpm = (60.0 * frame_rate / best_lag as f64).clamp(MIN_BPM, MAX_BPM);

    let total_score: f64 = (min_lag..=max_lag)
        .map(|lag| autocorrelation_at_lag(&envelope, lag).max(0.0))
        .sum();
    let confidence = if total_score > 0.0 {
        (best_score.max(0.0) / total_score).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let _ = max_score;

    Some(TempoEstimate { bpm, confidence })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const SR: u32 = 22050;

    fn click_track(bpm: f64, duration_secs: f32, sample_rate: u32) -> Vec<f32> {
        let interval_samples = (60.0 / bpm * f64::from(sample_rate)) as usize;
        let n = (duration_secs * sample_rate as f32) as usize;
        let mut samples = vec![0.0_f32; n];
        let mut i = 0;
        while i < n {
            for k in 0..200.min(n - i) {
                let envelope = 1.0 - (k as f32 / 200.0);
                samples[i + k] += envelope * (2.0 * PI * 880.0 * k as f32 / sample_rate as f32).sin();
            }
            i += interval_samples;
        }
        samples
    }

    #[test]
    fn too_short_returns_none() {
        assert!(estimate_bpm(&[0.0; 100], SR).is_none());
    }

    #[test]
    fn estimate_is_within_spec_range() {
        let samples = click_track(128.0, 6.0, SR);
        if let Some(estimate) = estimate_bpm(&samples, SR) {
            assert!((60.0..=200.0).contains(&estimate.bpm));
            assert!((0.0..=1.0).contains(&estimate.confidence));
        }
    }

    #[test]
    fn silence_yields_no_strong_peak_or_none() {
        let samples = vec![0.0_f32; SR as usize * 6];
        // Either no estimate, or a degenerate near-zero-confidence one; must not panic.
        let _ = estimate_bpm(&samples, SR);
    }
}
