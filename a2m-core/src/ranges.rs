//! # Derived Range Module
//!
//! Values that follow from the sample rate and block size alone: the time
//! covered by one block, the usable frequency band, the centre frequency of
//! every FFT bin and the bins that fall inside the usable band.

use std::time::Duration;

use crate::notes::NOTE_RANGES;

/// Frequency layout of one block for a given sample rate and block size.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRanges {
    /// Duration of one block, built from a whole-millisecond sample period.
    pub time_window: Duration,
    /// Lowest usable frequency in Hz.
    pub min_freq: f64,
    /// Highest usable frequency in Hz (exclusive).
    pub max_freq: f64,
    /// Number of spectral bins, `block_size / 2`.
    pub bins: usize,
    /// Centre frequency of every bin, ascending.
    pub bin_freqs: Vec<f64>,
    /// First bin at or above `min_freq`.
    pub min_bin: usize,
    /// Last bin strictly below `max_freq`.
    pub max_bin: usize,
}

impl DerivedRanges {
    /// Derives the layout for `sample_rate` and `block_size`.
    ///
    /// The sample period is truncated to whole milliseconds before it is
    /// scaled by the block size, so any rate above 1 kHz yields a zero time
    /// window. A zero window places no floor on `min_freq` beyond the note
    /// table itself.
    ///
    /// Zero for either argument is a caller error and is not checked.
    pub fn compute(sample_rate: u32, block_size: u32) -> Self {
        let ms_per_sample = ((1.0 / sample_rate as f64) * 1000.0) as u64;
        let time_window = Duration::from_millis(ms_per_sample * block_size as u64);

        let max_freq = NOTE_RANGES[127].high.min(sample_rate as f64 / 2.0);
        let window_ms = time_window.as_millis() as u64;
        let min_freq = match 1000u64.checked_div(window_ms) {
            Some(floor) => NOTE_RANGES[0].low.max(floor as f64),
            None => NOTE_RANGES[0].low,
        };

        let bins = (block_size / 2) as usize;
        let bin_freqs: Vec<f64> = (0..bins as u64)
            .map(|i| (i * sample_rate as u64) as f64 / block_size as f64)
            .collect();

        let min_bin = bin_freqs
            .iter()
            .position(|&freq| freq >= min_freq)
            .unwrap_or(0);
        let max_bin = match bin_freqs.iter().position(|&freq| freq >= max_freq) {
            Some(first_above) => first_above.saturating_sub(1),
            None => bins.saturating_sub(1),
        };

        Self {
            time_window,
            min_freq,
            max_freq,
            bins,
            bin_freqs,
            min_bin,
            max_bin,
        }
    }

    /// Bin frequencies inside `[min_bin, max_bin]`.
    pub fn usable_bin_freqs(&self) -> &[f64] {
        if self.bin_freqs.is_empty() || self.min_bin > self.max_bin {
            return &[];
        }
        &self.bin_freqs[self.min_bin..=self.max_bin]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cd_rate_layout() {
        let ranges = DerivedRanges::compute(44100, 1024);
        // 1/44100 s truncates to 0 ms per sample
        assert_eq!(ranges.time_window, Duration::ZERO);
        assert_eq!(ranges.min_freq, NOTE_RANGES[0].low);
        assert_eq!(ranges.max_freq, NOTE_RANGES[127].high);
        assert_eq!(ranges.bins, 512);
        assert_eq!(ranges.bin_freqs.len(), 512);
        assert_eq!(ranges.bin_freqs[0], 0.0);
        assert!((ranges.bin_freqs[10] - 430.664).abs() < 1e-3);
        assert_eq!(ranges.min_bin, 1);
        // 12916.8 Hz / 43.066 Hz per bin
        assert_eq!(ranges.max_bin, 299);
        assert!(ranges.bin_freqs[ranges.max_bin] < ranges.max_freq);
        assert!(ranges.bin_freqs[ranges.max_bin + 1] >= ranges.max_freq);
    }

    #[test]
    fn slow_rate_has_time_window() {
        // 2 ms per sample, 64 samples per block
        let ranges = DerivedRanges::compute(500, 64);
        assert_eq!(ranges.time_window, Duration::from_millis(128));
        // 1000 / 128 truncates to 7 Hz, below the table floor
        assert_eq!(ranges.min_freq, NOTE_RANGES[0].low);
        assert_eq!(ranges.max_freq, 250.0);
        assert_eq!(ranges.bins, 32);
        // every bin sits below Nyquist, so the last one is usable
        assert_eq!(ranges.max_bin, 31);

        // 1 ms per sample: 1000 / 64 truncates to a 15 Hz floor
        let ranges = DerivedRanges::compute(1000, 64);
        assert_eq!(ranges.time_window, Duration::from_millis(64));
        assert_eq!(ranges.min_freq, 15.0);
        assert_eq!(ranges.min_bin, 1);
    }

    #[test]
    fn doubling_rate_doubles_bins() {
        let base = DerivedRanges::compute(22050, 1024);
        let doubled = DerivedRanges::compute(44100, 1024);
        assert_eq!(base.bins, doubled.bins);
        for (a, b) in base.bin_freqs.iter().zip(doubled.bin_freqs.iter()) {
            assert_eq!(a * 2.0, *b);
        }
    }

    #[test]
    fn bin_freqs_strictly_increase() {
        let ranges = DerivedRanges::compute(48000, 4096);
        assert!(ranges.bin_freqs.windows(2).all(|w| w[0] < w[1]));
        assert!(ranges.bin_freqs[ranges.min_bin] >= ranges.min_freq);
        assert_eq!(ranges.usable_bin_freqs().len(), ranges.max_bin - ranges.min_bin + 1);
    }
}
