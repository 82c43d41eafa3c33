//! Spectral descriptors (C3 stage 3): frame the signal (frame 2048, hop
//! 1024), report mean RMS loudness in dB, mean spectral centroid in Hz, and
//! onset density (onsets per second).

use crate::utils::stft;

use super::tempo::onset_envelope;

pub const FRAME_SIZE: usize = 2048;
pub const HOP_SIZE: usize = 1024;

pub struct SpectralDescriptors {
    pub rms_loudness_db: f64,
    pub spectral_centroid_hz: f64,
    pub onset_density_per_s: f64,
}

#[must_use]
#[allow(clippy::missing_inline_in_public_items)]
pub fn compute_spectral(samples: &[f32], sample_rate: u32, duration_seconds: f64) -> SpectralDescriptors {
    let rms_db = mean_rms_db(samples);
    let centroid = mean_spectral_centroid_hz(samples, sample_rate);
    let onset_density = onset_density_per_second(samples, duration_seconds);

    SpectralDescriptors {
        rms_loudness_db: rms_db,
        spectral_centroid_hz: centroid,
        onset_density_per_s: onset_density,
    }
}

fn mean_rms_db(samples: &[f32]) -> f64 {
    if samples.len() < FRAME_SIZE {
        return -60.0;
    }
    let rms_values: Vec<f64> = samples
        .windows(FRAME_SIZE)
        .step_by(HOP_SIZE)
        .map(|frame| {
            let sum_sq: f64 = frame.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
            (sum_sq / frame.len() as f64).sqrt()
        })
        .collect();

    let mean_rms = rms_values.iter().sum::<f64>() / rms_values.len().max(1) as f64;
    20.0 * (mean_rms + 1e-9).log10()
}

fn mean_spectral_centroid_hz(samples: &[f32], sample_rate: u32) -> f64 {
    if samples.len() <= FRAME_SIZE {
        return 500.0;
    }
    let spectrogram = stft(samples, FRAME_SIZE, HOP_SIZE);
    let n_bins = spectrogram.shape()[0];
    let n_frames = spectrogram.shape()[1];
    if n_frames == 0 {
        return 500.0;
    }

    let mut centroids = Vec::with_capacity(n_frames);
    for frame in 0..n_frames {
        let mut weighted = 0.0;
        let mut total = 0.0;
        for bin in 0..n_bins {
            let freq = bin as f64 * f64::from(sample_rate) / FRAME_SIZE as f64;
            let magnitude = spectrogram[[bin, frame]];
            weighted += freq * magnitude;
            total += magnitude;
        }
        if total > 0.0 {
            centroids.push(weighted / total);
        }
    }

    if centroids.is_empty() {
        500.0
    } else {
        centroids.iter().sum::<f64>() / centroids.len() as f64
    }
}

fn onset_density_per_second(samples: &[f32], duration_seconds: f64) -> f64 {
    if duration_seconds <= 0.0 {
        return 0.0;
    }
    let envelope = onset_envelope(samples);
    if envelope.len() < 3 {
        return 0.0;
    }

    let mean = envelope.iter().sum::<f64>() / envelope.len() as f64;
    let variance = envelope.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / envelope.len() as f64;
    let threshold = mean + variance.sqrt();

    let mut onsets = 0usize;
    for i in 1..envelope.len() - 1 {
        if envelope[i] > threshold && envelope[i] >= envelope[i - 1] && envelope[i] >= envelope[i + 1]
        {
            onsets += 1;
        }
    }

    onsets as f64 / duration_seconds
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const SR: u32 = 22050;

    fn tone(freq: f32, secs: f32, sr: u32) -> Vec<f32> {
        let n = (secs * sr as f32) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sr as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn silence_yields_floor_rms_db() {
        let samples = vec![0.0_f32; SR as usize * 3];
        let d = compute_spectral(&samples, SR, 3.0);
        assert!(d.rms_loudness_db < -50.0);
    }

    #[test]
    fn louder_signal_has_higher_rms_db() {
        let quiet = compute_spectral(&tone(440.0, 3.0, SR).iter().map(|s| s * 0.01).collect::<Vec<_>>(), SR, 3.0);
        let loud = compute_spectral(&tone(440.0, 3.0, SR), SR, 3.0);
        assert!(loud.rms_loudness_db > quiet.rms_loudness_db);
    }

    #[test]
    fn higher_frequency_has_higher_centroid() {
        let low = compute_spectral(&tone(200.0, 3.0, SR), SR, 3.0);
        let high = compute_spectral(&tone(4000.0, 3.0, SR), SR, 3.0);
        assert!(high.spectral_centroid_hz > low.spectral_centroid_hz);
    }

    #[test]
    fn onset_density_is_non_negative() {
        let d = compute_spectral(&tone(440.0, 3.0, SR), SR, 3.0);
        assert!(d.onset_density_per_s >= 0.0);
    }

    #[test]
    fn too_short_clip_returns_sentinel_shape_values() {
        let d = compute_spectral(&[0.0; 100], SR, 100.0 / f64::from(SR));
        assert_eq!(d.rms_loudness_db, -60.0);
        assert_eq!(d.spectral_centroid_hz, 500.0);
    }
}
