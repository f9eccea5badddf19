//! # Converter Module
//!
//! The conversion pipeline: one block of samples goes through the spectral
//! transform, every bin is mapped onto a note observation, and the
//! observations are aggregated into the block's note list.
//!
//! ## Concurrency
//! All mutable state sits behind a single mutex. Every setter and the whole
//! of [`Converter::convert`] hold it, so concurrent callers serialize and a
//! conversion always sees one consistent configuration. Internal helpers
//! receive the locked state by reference and never lock again.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace, warn};

use crate::aggregate::{NoteAccumulator, select_notes};
use crate::config::{ConverterConfig, NoteSelection};
use crate::error::Result;
use crate::fft::{Bin, RustFftTransform, SpectralTransform};
use crate::mapping::{PitchMapper, amplitude_to_velocity};
use crate::ranges::DerivedRanges;
use crate::Note;

fn derive_ranges(config: &ConverterConfig) -> DerivedRanges {
    let ranges = DerivedRanges::compute(config.sample_rate, config.block_size);
    debug!(
        sample_rate = config.sample_rate,
        block_size = config.block_size,
        time_window_ms = ranges.time_window.as_millis() as u64,
        min_freq = ranges.min_freq,
        max_freq = ranges.max_freq,
        min_bin = ranges.min_bin,
        max_bin = ranges.max_bin,
        usable_bins = ranges.usable_bin_freqs().len(),
        "derived frequency ranges"
    );
    ranges
}

/// Everything guarded by the converter lock.
#[derive(Debug)]
struct State<T> {
    config: ConverterConfig,
    ranges: DerivedRanges,
    velocity_limit: u8,
    mapper: PitchMapper,
    transform: T,
}

impl<T: SpectralTransform> State<T> {
    fn determine_ranges(&mut self) {
        self.ranges = derive_ranges(&self.config);
    }

    fn samples_to_freqs(&mut self, samples: &[f64]) -> Result<Vec<Bin>> {
        let block_size = self.config.block_size as usize;
        self.transform
            .spectrum(samples, block_size, &self.ranges.bin_freqs)
            .map_err(|err| {
                warn!(%err, block_size, "spectral transform failed");
                err.into()
            })
    }

    fn freqs_to_notes(&mut self, bins: &[Bin]) -> Result<Vec<Note>> {
        let mut accumulator = NoteAccumulator::new();
        for bin in bins {
            let pitch = self
                .mapper
                .freq_to_pitch(bin.frequency, &self.config.pitch_set, self.config.transpose)?;
            accumulator.add(pitch, amplitude_to_velocity(bin.amplitude));
        }

        let [low, high] = self.config.pitch_range;
        let notes: Vec<Note> = accumulator
            .notes()
            .into_iter()
            .filter(|note| note.velocity >= self.velocity_limit)
            .filter(|note| (low..=high).contains(&note.pitch))
            .collect();

        Ok(select_notes(notes, self.config.note_count, self.config.selection))
    }
}

/// Converts blocks of audio samples into notes.
///
/// The converter owns its configuration and the frequency layout derived
/// from it. `T` is the spectrum provider; by default a RustFFT transform.
#[derive(Debug)]
pub struct Converter<T = RustFftTransform> {
    state: Mutex<State<T>>,
}

impl Converter<RustFftTransform> {
    /// Creates a converter backed by the default FFT transform.
    pub fn new(config: ConverterConfig) -> Self {
        Self::with_transform(config, RustFftTransform::default())
    }
}

impl<T: SpectralTransform> Converter<T> {
    /// Creates a converter that takes its spectra from `transform`.
    pub fn with_transform(config: ConverterConfig, transform: T) -> Self {
        let state = State {
            velocity_limit: config.velocity_limit(),
            ranges: derive_ranges(&config),
            config,
            mapper: PitchMapper::new(),
            transform,
        };
        Self { state: Mutex::new(state) }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // a panic mid-conversion leaves no half-written derived state behind
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_sample_rate(&self, sample_rate: u32) {
        let mut state = self.lock();
        state.config.sample_rate = sample_rate;
        state.determine_ranges();
    }

    pub fn set_block_size(&self, block_size: u32) {
        let mut state = self.lock();
        state.config.block_size = block_size;
        state.determine_ranges();
    }

    pub fn set_activation_level(&self, activation_level: f64) {
        let mut state = self.lock();
        state.config.activation_level = activation_level;
        state.velocity_limit = state.config.velocity_limit();
    }

    /// Changes the transpose offset and drops memoized pitches.
    pub fn set_transpose(&self, transpose: i32) {
        let mut state = self.lock();
        state.config.transpose = transpose;
        state.mapper.clear();
    }

    /// Changes the allowed scale degrees and drops memoized pitches.
    pub fn set_pitch_set(&self, pitch_set: Vec<u8>) {
        let mut state = self.lock();
        state.config.pitch_set = pitch_set;
        state.mapper.clear();
    }

    pub fn set_pitch_range(&self, pitch_range: [u8; 2]) {
        self.lock().config.pitch_range = pitch_range;
    }

    pub fn set_note_count(&self, note_count: usize) {
        self.lock().config.note_count = note_count;
    }

    pub fn set_selection(&self, selection: NoteSelection) {
        self.lock().config.selection = selection;
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ConverterConfig {
        self.lock().config.clone()
    }

    /// Snapshot of the current frequency layout.
    pub fn ranges(&self) -> DerivedRanges {
        self.lock().ranges.clone()
    }

    /// Minimum velocity a note needs to be reported.
    pub fn velocity_limit(&self) -> u8 {
        self.lock().velocity_limit
    }

    /// Converts one block of samples into its notes.
    ///
    /// `samples` must hold exactly `block_size` samples. The lock is held for
    /// the transform and the aggregation, so a concurrent caller waits for
    /// the whole conversion.
    ///
    /// # Errors
    /// * `Transform` - the provider could not produce a spectrum
    /// * `NoNearestDegree` - the pitch set holds no valid scale degree
    pub fn convert(&self, samples: &[f64]) -> Result<Vec<Note>> {
        let mut state = self.lock();
        let bins = state.samples_to_freqs(samples)?;
        let notes = state.freqs_to_notes(&bins)?;
        trace!(bins = bins.len(), notes = notes.len(), "converted block");
        Ok(notes)
    }

    /// Aggregates an already computed spectrum with the current configuration.
    pub fn freqs_to_notes(&self, bins: &[Bin]) -> Result<Vec<Note>> {
        self.lock().freqs_to_notes(bins)
    }
}
