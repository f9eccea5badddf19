// a2m-core/src/lib.rs

//! The core logic for the audio-to-note converter.
//! This crate is responsible for mapping a block of audio samples onto a
//! small set of musical notes: the equal-temperament note table, the
//! converter configuration and its derived frequency ranges, pitch and
//! velocity mapping, and per-block note aggregation. It is completely
//! headless and contains no capture or file decoding code.

pub mod aggregate;
pub mod config;
pub mod converter;
pub mod error;
pub mod fft;
pub mod mapping;
pub mod notes;
pub mod ranges;

pub use config::{ConverterConfig, NoteSelection};
pub use converter::Converter;
pub use error::{ConvertError, Result, TransformError};
pub use fft::{Bin, RustFftTransform, SpectralTransform, Window};
pub use notes::{NoteRange, NOTE_RANGES};
pub use ranges::DerivedRanges;

use std::cmp::Ordering;

use serde::Serialize;

/// Highest pitch level, inclusive.
pub const MAX_PITCH: u8 = 127;

/// Number of pitch levels in the note table.
pub const PITCH_COUNT: usize = 128;

/// A single detected note for one block.
// `count` is skipped on output; it only matters while aggregating.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Note {
    /// Pitch level (0-127).
    pub pitch: u8,
    /// Averaged velocity (0-127).
    pub velocity: u8,
    /// Number of spectral bins folded into this note.
    #[serde(skip)]
    pub count: u32,
}

impl Note {
    pub fn new(pitch: u8, velocity: u8) -> Self {
        Self { pitch, velocity, count: 0 }
    }
}

/// Notes are identified by pitch and velocity; the accumulator count is ignored.
impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.pitch == other.pitch && self.velocity == other.velocity
    }
}

impl Eq for Note {}

/// Notes order by velocity. Equal velocities fall back to pitch so the
/// ordering agrees with equality.
impl Ord for Note {
    fn cmp(&self, other: &Self) -> Ordering {
        self.velocity
            .cmp(&other.velocity)
            .then(self.pitch.cmp(&other.pitch))
    }
}

impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
