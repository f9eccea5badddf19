//! # Pitch Mapping Module
//!
//! Turns a single spectral observation into a note: frequency to pitch
//! through the note table, scale snapping, transposition, and amplitude to
//! velocity.

use std::collections::HashMap;

use tracing::debug;

use crate::MAX_PITCH;
use crate::error::{ConvertError, Result};
use crate::notes::pitch_for_frequency;

/// Maps an amplitude on a 0-100 scale linearly onto a 0-127 velocity.
pub fn amplitude_to_velocity(amplitude: f64) -> u8 {
    (127.0 * amplitude / 100.0).round().clamp(0.0, 127.0) as u8
}

/// Finds the allowed scale degree closest to `degree`.
///
/// Entries of 12 and above are not scale degrees and are ignored. When two
/// candidates are equally close the lower one wins.
///
/// # Returns
/// * `Some(degree)` - Nearest allowed degree
/// * `None` - The set holds no valid degree
pub fn nearest_degree(degree: u8, pitch_set: &[u8]) -> Option<u8> {
    pitch_set
        .iter()
        .copied()
        .filter(|&candidate| candidate < 12)
        .min_by_key(|&candidate| (candidate.abs_diff(degree), candidate))
}

/// Snaps `pitch` onto the closest allowed degree within its own octave.
///
/// An empty `pitch_set` leaves the pitch untouched.
pub fn snap_to_key(pitch: u8, pitch_set: &[u8]) -> Result<u8> {
    if pitch_set.is_empty() {
        return Ok(pitch);
    }
    let degree = pitch % 12;
    let snapped = nearest_degree(degree, pitch_set)
        .ok_or(ConvertError::NoNearestDegree { degree })?;
    // the top octave stops at 127, so G9 + a degree above 7 has to stay in range
    Ok((12 * (pitch / 12)).saturating_add(snapped).min(MAX_PITCH))
}

/// Applies a semitone offset, clamping into the valid pitch range.
pub fn transpose_pitch(pitch: u8, transpose: i32) -> u8 {
    (pitch as i32).saturating_add(transpose).clamp(0, MAX_PITCH as i32) as u8
}

/// Memoizing frequency-to-pitch lookup.
///
/// Results depend on the pitch set and transpose they were computed with.
/// Callers must [`clear`](PitchMapper::clear) the memo whenever either
/// changes.
#[derive(Debug, Default)]
pub struct PitchMapper {
    memo: HashMap<u64, u8>,
}

impl PitchMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `freq` to a pitch, snapping and transposing it.
    ///
    /// Frequencies outside the note table map to pitch 0 before transposition.
    pub fn freq_to_pitch(&mut self, freq: f64, pitch_set: &[u8], transpose: i32) -> Result<u8> {
        let key = freq.to_bits();
        if let Some(&pitch) = self.memo.get(&key) {
            return Ok(pitch);
        }

        let pitch = match pitch_for_frequency(freq) {
            Some(pitch) => transpose_pitch(snap_to_key(pitch, pitch_set)?, transpose),
            None => transpose_pitch(0, transpose),
        };
        self.memo.insert(key, pitch);
        Ok(pitch)
    }

    /// Drops every memoized frequency.
    pub fn clear(&mut self) {
        if !self.memo.is_empty() {
            debug!(entries = self.memo.len(), "clearing pitch memo");
        }
        self.memo.clear();
    }

    /// Number of memoized frequencies.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_endpoints() {
        assert_eq!(amplitude_to_velocity(0.0), 0);
        assert_eq!(amplitude_to_velocity(50.0), 64);
        assert_eq!(amplitude_to_velocity(100.0), 127);
        assert_eq!(amplitude_to_velocity(250.0), 127);
        assert_eq!(amplitude_to_velocity(-5.0), 0);
    }

    #[test]
    fn major_triad_tie_goes_low() {
        let triad = [0, 4, 7];
        assert_eq!(snap_to_key(2, &triad).unwrap(), 0);
        assert_eq!(snap_to_key(14, &triad).unwrap(), 12);
        assert_eq!(snap_to_key(3, &triad).unwrap(), 4);
        assert_eq!(snap_to_key(11, &triad).unwrap(), 7);
        assert_eq!(snap_to_key(66, &triad).unwrap(), 67);
    }

    #[test]
    fn unsorted_pitch_set() {
        assert_eq!(nearest_degree(10, &[7, 0, 11, 4]), Some(11));
        assert_eq!(nearest_degree(9, &[7, 0, 11, 4]), Some(7));
        assert_eq!(nearest_degree(0, &[5]), Some(5));
        assert_eq!(nearest_degree(11, &[5]), Some(5));
    }

    #[test]
    fn empty_set_is_identity() {
        for pitch in 0..=MAX_PITCH {
            assert_eq!(snap_to_key(pitch, &[]).unwrap(), pitch);
        }
    }

    #[test]
    fn set_without_degrees_fails() {
        let err = snap_to_key(61, &[12, 40]).unwrap_err();
        assert!(matches!(err, ConvertError::NoNearestDegree { degree: 1 }));
    }

    #[test]
    fn top_octave_is_clamped() {
        // 120 is C9, the octave only runs to G9 (127)
        assert_eq!(snap_to_key(125, &[11]).unwrap(), 127);
    }

    #[test]
    fn transpose_clamps() {
        assert_eq!(transpose_pitch(60, 12), 72);
        assert_eq!(transpose_pitch(5, -12), 0);
        assert_eq!(transpose_pitch(120, 12), 127);
        assert_eq!(transpose_pitch(60, i32::MAX), 127);
        assert_eq!(transpose_pitch(60, i32::MIN), 0);
        assert_eq!(transpose_pitch(127, i32::MAX), 127);
    }

    #[test]
    fn freq_to_pitch_snaps_and_transposes() {
        let mut mapper = PitchMapper::new();
        // 440 Hz is A4 (69), degree 9 snaps to 7 in {0, 4, 7}
        assert_eq!(mapper.freq_to_pitch(440.0, &[0, 4, 7], 0).unwrap(), 67);

        let mut mapper = PitchMapper::new();
        assert_eq!(mapper.freq_to_pitch(440.0, &[], -2).unwrap(), 67);
        assert_eq!(mapper.freq_to_pitch(20_000.0, &[], 5).unwrap(), 5);
        assert_eq!(mapper.len(), 2);
    }

    #[test]
    fn memo_is_keyed_by_frequency_only() {
        let mut mapper = PitchMapper::new();
        assert_eq!(mapper.freq_to_pitch(440.0, &[], 0).unwrap(), 69);
        // a stale entry wins until the memo is cleared
        assert_eq!(mapper.freq_to_pitch(440.0, &[], 3).unwrap(), 69);
        mapper.clear();
        assert!(mapper.is_empty());
        assert_eq!(mapper.freq_to_pitch(440.0, &[], 3).unwrap(), 72);
    }
}
