//! # Note Range Module
//!
//! This module provides the frequency band of every pitch level under
//! 12-tone equal temperament. The table is derived once from a single seed
//! band and shared read-only by every converter.
//!
//! ## Features
//! - 128 pitch levels (C-1 to G9)
//! - Contiguous bands: each `low` is the midpoint to the previous pitch
//! - Lookup of the pitch whose band contains a frequency

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::PITCH_COUNT;

/// 12th root of 2, the ratio between adjacent semitones.
pub const SEMITONE_RATIO: f64 = 1.0594630943592953;

/// Seed band for pitch 0 (C-1, roughly 8.18 Hz).
const SEED: NoteRange = NoteRange {
    low: 7.946362749,
    mid: 8.1757989155,
    high: 8.4188780665,
};

/// Frequency boundaries of one pitch level, in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoteRange {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl NoteRange {
    /// Whether `freq` falls inside this band (both edges inclusive).
    pub fn contains(&self, freq: f64) -> bool {
        self.low <= freq && freq <= self.high
    }
}

/// Statically computed bands for all 128 pitch levels.
///
/// Each `mid` is the previous `mid` times [`SEMITONE_RATIO`], so pitch 69
/// lands on 440 Hz. The table is computed on first use.
pub static NOTE_RANGES: Lazy<[NoteRange; PITCH_COUNT]> = Lazy::new(generate_note_ranges);

/// Builds the band table from the seed band.
///
/// Exposed so the derivation can be checked independently of the static.
pub fn generate_note_ranges() -> [NoteRange; PITCH_COUNT] {
    let mut ranges = [SEED; PITCH_COUNT];

    for i in 1..PITCH_COUNT {
        let mid = SEMITONE_RATIO * ranges[i - 1].mid;
        ranges[i] = NoteRange {
            low: (mid + ranges[i - 1].mid) / 2.0,
            mid,
            high: (mid + SEMITONE_RATIO * mid) / 2.0,
        };
    }
    ranges
}

/// Finds the first pitch, in ascending order, whose band contains `freq`.
///
/// # Returns
/// * `Some(pitch)` - Lowest matching pitch level
/// * `None` - Frequency is outside the whole table
pub fn pitch_for_frequency(freq: f64) -> Option<u8> {
    NOTE_RANGES
        .iter()
        .position(|range| range.contains(freq))
        .map(|pitch| pitch as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        let a4 = NOTE_RANGES[69];
        assert!((a4.mid - 440.0).abs() < 0.01, "A4 mid was {}", a4.mid);
        assert!(a4.low < 440.0 && 440.0 < a4.high);
    }

    #[test]
    fn middle_c_reference() {
        assert!((NOTE_RANGES[60].mid - 261.6256).abs() < 0.01);
    }

    #[test]
    fn bands_are_ordered_and_contiguous() {
        for (i, range) in NOTE_RANGES.iter().enumerate() {
            assert!(range.low < range.mid && range.mid < range.high, "pitch {i}");
        }
        for pair in NOTE_RANGES.windows(2) {
            let ratio = pair[1].mid / pair[0].mid;
            assert!((ratio - 2f64.powf(1.0 / 12.0)).abs() < 1e-12);
            // high[i] and low[i+1] come from different products of the same mids
            assert!((pair[0].high - pair[1].low).abs() / pair[1].low < 1e-9);
        }
    }

    #[test]
    fn derivation_is_reproducible() {
        let a = generate_note_ranges();
        let b = generate_note_ranges();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.mid.to_bits(), y.mid.to_bits());
            assert_eq!(x.low.to_bits(), y.low.to_bits());
            assert_eq!(x.high.to_bits(), y.high.to_bits());
        }
        assert_eq!(a[0], SEED);
    }

    #[test]
    fn frequency_lookup() {
        assert_eq!(pitch_for_frequency(440.0), Some(69));
        assert_eq!(pitch_for_frequency(8.0), Some(0));
        assert_eq!(pitch_for_frequency(1.0), None);
        assert_eq!(pitch_for_frequency(20_000.0), None);
    }
}
