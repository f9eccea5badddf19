//! Configuration parameters for note conversion

use serde::{Deserialize, Serialize};

/// How the aggregated notes are cut down when `note_count` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSelection {
    /// Sort by velocity ascending and keep `note_count + 1` entries.
    ///
    /// This keeps the quietest notes and one more than asked for. It is the
    /// long-standing output of the converter and stays the default.
    #[default]
    QuietestInclusive,
    /// Sort by velocity descending and keep exactly `note_count` entries.
    Loudest,
}

/// Converter configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Sample rate in Hz (default: 44100)
    pub sample_rate: u32,

    /// Samples per block handed to `convert` (default: 1024)
    pub block_size: u32,

    /// Fraction of full velocity a note needs to be reported (default: 0.0)
    /// Zero still drops notes with velocity 0
    pub activation_level: f64,

    /// Semitone offset applied after scale snapping (default: 0)
    pub transpose: i32,

    /// Allowed scale degrees 0-11; empty disables snapping (default: empty)
    pub pitch_set: Vec<u8>,

    /// Inclusive [low, high] pitch bound for reported notes (default: [0, 127])
    pub pitch_range: [u8; 2],

    /// Maximum number of notes per block, 0 = unbounded (default: 0)
    pub note_count: usize,

    /// Selection rule applied when `note_count` is non-zero
    pub selection: NoteSelection,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_size: 1024,
            activation_level: 0.0,
            transpose: 0,
            pitch_set: Vec::new(),
            pitch_range: [0, 127],
            note_count: 0,
            selection: NoteSelection::default(),
        }
    }
}

impl ConverterConfig {
    /// Minimum velocity a note needs to be reported.
    ///
    /// An activation level of zero maps to 1 so silent bins never show up.
    pub fn velocity_limit(&self) -> u8 {
        if self.activation_level != 0.0 {
            (127.0 * self.activation_level).round().clamp(0.0, 127.0) as u8
        } else {
            1
        }
    }
}
