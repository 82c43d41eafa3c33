use log::warn;
use ndarray::{arr1, s, Array, Array2};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;

#[must_use]
#[inline]
pub fn reflect_pad(array: &[f32], pad: usize) -> Vec<f32> {
    debug_assert!(pad < array.len(), "Padding is too large");
    let prefix = array[1..=pad].iter().rev().copied().collect::<Vec<f32>>();
    let suffix = array[(array.len() - 2) - pad + 1..array.len() - 1]
        .iter()
        .rev()
        .copied()
        .collect::<Vec<f32>>();
    let mut output = Vec::with_capacity(prefix.len() + array.len() + suffix.len());

    output.extend(prefix);
    output.extend(array);
    output.extend(suffix);
    output
}

/// Short-time Fourier transform magnitude spectrogram: rows are frequency
/// bins (`window_length / 2 + 1`), columns are frames. Hann-windowed.
#[must_use]
#[allow(clippy::missing_inline_in_public_items)]
pub fn stft(signal: &[f32], window_length: usize, hop_length: usize) -> Array2<f64> {
    debug_assert!(window_length % 2 == 0, "Window length must be even");
    debug_assert!(window_length < signal.len(), "Signal is too short");
    debug_assert!(hop_length < window_length, "Hop length is too large");
    let mut stft = Array2::zeros((signal.len().div_ceil(hop_length), window_length / 2 + 1));
    let signal = reflect_pad(signal, window_length / 2);

    let mut hann_window = Array::zeros(window_length + 1);
    #[allow(clippy::cast_precision_loss)]
    for n in 0..window_length {
        hann_window[[n]] =
            0.5f32.mul_add(-f32::cos(2. * n as f32 * PI / (window_length as f32)), 0.5);
    }
    hann_window = hann_window.slice_move(s![0..window_length]);
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(window_length);

    for (window, mut stft_col) in signal
        .windows(window_length)
        .step_by(hop_length)
        .zip(stft.rows_mut())
    {
        let mut signal = (arr1(window) * &hann_window).mapv(|x| Complex::new(x, 0.));
        if let Some(s) = signal.as_slice_mut() {
            fft.process(s);
        } else {
            warn!("non-contiguous slice found for stft; expect slow performances.");
            fft.process(&mut signal.to_vec());
        }

        stft_col.assign(
            &signal
                .slice(s![..=window_length / 2])
                .mapv(|x| f64::from(x.re.hypot(x.im))),
        );
    }
    stft.permuted_axes((1, 0))
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean<T: Clone + Into<f64>>(input: &[T]) -> f64 {
    if input.is_empty() {
        return 0.;
    }
    input.iter().map(|x| x.clone().into()).sum::<f64>() / input.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mean() {
        let numbers = vec![0.0_f64, 1.0, 2.0, 3.0, 4.0];
        assert!((mean(&numbers) - 2.0).abs() < f64::EPSILON * 10.0);
    }

    #[test]
    fn test_mean_empty() {
        let numbers: Vec<f64> = vec![];
        assert_eq!(mean(&numbers), 0.0);
    }

    #[test]
    fn test_reflect_pad() {
        let array = Array::range(0., 100_000., 1.);

        let output = reflect_pad(array.as_slice().unwrap(), 3);
        assert_eq!(&output[..4], &[3.0, 2.0, 1.0, 0.]);
        assert_eq!(&output[3..100_003], array.to_vec());
        assert_eq!(&output[100_003..100_006], &[99998.0, 99997.0, 99996.0]);
    }

    #[test]
    fn test_stft_shape_is_nonempty() {
        let signal: Vec<f32> = (0..4096)
            .map(|i| (i as f32 * 0.05).sin())
            .collect();
        let result = stft(&signal, 2048, 512);
        assert!(!result.is_empty());
        assert_eq!(result.shape()[0], 2048 / 2 + 1);
    }
}
