//! # Fast Fourier Transform (FFT) Module
//!
//! This module defines the seam between the converter and whatever produces
//! a spectrum for a block, plus the default provider built on RustFFT.
//!
//! ## Features
//! - `SpectralTransform` trait for pluggable spectrum providers
//! - High-performance FFT using RustFFT, plans cached per block size
//! - Optional DC offset removal and Hann windowing
//! - Fallible working-buffer allocation

use rustfft::{FftPlanner, num_complex::Complex};

use crate::error::TransformError;

/// One spectral bin: its centre frequency and amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    /// Centre frequency in Hz.
    pub frequency: f64,
    /// Amplitude, `|re| + |im|` of the bin.
    pub amplitude: f64,
}

/// Produces the spectrum of one block of samples.
///
/// Implementations must return exactly one [`Bin`] per entry of `bin_freqs`,
/// in the same order and carrying the same frequency. Failure has to be
/// reported as an error, never as an empty spectrum.
pub trait SpectralTransform: Send {
    fn spectrum(
        &mut self,
        samples: &[f64],
        block_size: usize,
        bin_freqs: &[f64],
    ) -> Result<Vec<Bin>, TransformError>;
}

/// Pre-conditioning applied to a block before the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    /// Samples are transformed as given.
    #[default]
    Rectangular,
    /// DC offset removal followed by a Hann taper.
    Hann,
}

/// Removes the DC offset from a signal by making its average value zero.
///
/// # Arguments
/// * `signal` - Audio signal to process (modified in-place)
fn remove_dc_offset(signal: &mut [Complex<f64>]) {
    let len = signal.len();
    if len == 0 { return; }
    let avg = signal.iter().map(|c| c.re).sum::<f64>() / len as f64;
    if avg.abs() > 1e-9 {
        for sample in signal.iter_mut() {
            sample.re -= avg;
        }
    }
}

/// Applies a Hann window to the input buffer to reduce spectral leakage.
///
/// # Arguments
/// * `buffer` - Audio buffer to window (modified in-place)
fn apply_hann_window(buffer: &mut [Complex<f64>]) {
    let n = buffer.len();
    if n < 2 { return; }
    let n_minus_1 = (n - 1) as f64;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / n_minus_1).cos());
        sample.re *= multiplier;
    }
}

/// Spectrum provider backed by a forward RustFFT transform.
pub struct RustFftTransform {
    planner: FftPlanner<f64>,
    window: Window,
}

impl Default for RustFftTransform {
    fn default() -> Self {
        Self::new(Window::default())
    }
}

impl RustFftTransform {
    pub fn new(window: Window) -> Self {
        Self { planner: FftPlanner::new(), window }
    }
}

impl std::fmt::Debug for RustFftTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustFftTransform").field("window", &self.window).finish_non_exhaustive()
    }
}

impl SpectralTransform for RustFftTransform {
    /// Performs a forward FFT on one block and sums the absolute real and
    /// imaginary parts of each bin.
    ///
    /// # Errors
    /// * `BlockSize` - `samples` is not exactly `block_size` long
    /// * `Allocation` - the complex working buffer could not be reserved
    fn spectrum(
        &mut self,
        samples: &[f64],
        block_size: usize,
        bin_freqs: &[f64],
    ) -> Result<Vec<Bin>, TransformError> {
        if samples.len() != block_size {
            return Err(TransformError::BlockSize { expected: block_size, actual: samples.len() });
        }

        let mut buffer: Vec<Complex<f64>> = Vec::new();
        buffer
            .try_reserve_exact(block_size)
            .map_err(|_| TransformError::Allocation { len: block_size })?;
        buffer.extend(samples.iter().map(|&sample| Complex { re: sample, im: 0.0 }));

        if self.window == Window::Hann {
            remove_dc_offset(&mut buffer);
            apply_hann_window(&mut buffer);
        }

        let fft = self.planner.plan_fft_forward(block_size);
        fft.process(&mut buffer);

        Ok(bin_freqs
            .iter()
            .zip(buffer.iter())
            .map(|(&frequency, c)| Bin { frequency, amplitude: c.re.abs() + c.im.abs() })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::DerivedRanges;

    fn sine(freq: f64, sample_rate: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn one_bin_per_frequency() {
        let ranges = DerivedRanges::compute(44100, 1024);
        let mut fft = RustFftTransform::default();
        let bins = fft.spectrum(&vec![0.0; 1024], 1024, &ranges.bin_freqs).unwrap();
        assert_eq!(bins.len(), 512);
        assert!(bins.iter().all(|b| b.amplitude == 0.0));
        assert_eq!(bins[3].frequency, ranges.bin_freqs[3]);
    }

    #[test]
    fn bin_centred_tone_peaks_in_its_bin() {
        // bin 16 of a 256 point block at 8 kHz sits at exactly 500 Hz
        let ranges = DerivedRanges::compute(8000, 256);
        let signal = sine(500.0, 8000.0, 256);
        let mut fft = RustFftTransform::default();
        let bins = fft.spectrum(&signal, 256, &ranges.bin_freqs).unwrap();
        let peak = bins
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.amplitude.total_cmp(&b.1.amplitude))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 16);
        // a unit sine puts N/2 into |im| of its bin
        assert!((bins[16].amplitude - 128.0).abs() < 1e-6);
    }

    #[test]
    fn amplitude_sums_absolute_parts() {
        // a unit impulse at sample 1 gives e^{-2πik/N}: |re| + |im| peaks off-axis
        let mut signal = vec![0.0; 8];
        signal[1] = 1.0;
        let bin_freqs: Vec<f64> = (0..4).map(|i| i as f64).collect();
        let bins = RustFftTransform::default().spectrum(&signal, 8, &bin_freqs).unwrap();
        assert!((bins[0].amplitude - 1.0).abs() < 1e-12);
        assert!((bins[1].amplitude - std::f64::consts::SQRT_2).abs() < 1e-12);
        assert!((bins[2].amplitude - 1.0).abs() < 1e-12);
    }

    #[test]
    fn wrong_block_length_is_rejected() {
        let err = RustFftTransform::default().spectrum(&[0.0; 100], 128, &[]).unwrap_err();
        assert!(matches!(err, TransformError::BlockSize { expected: 128, actual: 100 }));
    }

    #[test]
    fn hann_window_removes_dc() {
        let signal = vec![0.5; 64];
        let bin_freqs: Vec<f64> = (0..32).map(|i| i as f64).collect();
        let bins = RustFftTransform::new(Window::Hann).spectrum(&signal, 64, &bin_freqs).unwrap();
        assert!(bins[0].amplitude < 1e-9);
    }
}
