//! # Note Aggregation Module
//!
//! Folds every (pitch, velocity) observation of one block into at most one
//! note per pitch, then filters and truncates the result.

use crate::config::NoteSelection;
use crate::{Note, PITCH_COUNT};

/// Running per-pitch velocity average for one block.
#[derive(Debug, Clone)]
pub struct NoteAccumulator {
    slots: [Note; PITCH_COUNT],
}

impl Default for NoteAccumulator {
    fn default() -> Self {
        Self { slots: [Note::default(); PITCH_COUNT] }
    }
}

impl NoteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one observation into its pitch slot.
    ///
    /// The average is kept in integer arithmetic and truncates on every step,
    /// so earlier observations carry slightly more weight.
    pub fn add(&mut self, pitch: u8, velocity: u8) {
        let slot = &mut self.slots[pitch as usize];
        slot.pitch = pitch;
        let total = slot.velocity as u64 * slot.count as u64 + velocity as u64;
        slot.velocity = (total / (slot.count as u64 + 1)) as u8;
        slot.count += 1;
    }

    /// Every observed pitch in ascending pitch order.
    pub fn notes(&self) -> Vec<Note> {
        self.slots.iter().filter(|note| note.count > 0).copied().collect()
    }
}

/// Cuts `notes` down to the configured note count.
///
/// A `note_count` of zero returns the notes unchanged.
pub fn select_notes(
    mut notes: Vec<Note>,
    note_count: usize,
    selection: NoteSelection,
) -> Vec<Note> {
    if note_count == 0 {
        return notes;
    }
    match selection {
        NoteSelection::QuietestInclusive => {
            notes.sort();
            notes.truncate(note_count.saturating_add(1));
        }
        NoteSelection::Loudest => {
            notes.sort_by(|a, b| b.cmp(a));
            notes.truncate(note_count);
        }
    }
    notes
}
