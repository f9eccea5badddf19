//! # a2m - audio to note converter
//!
//! Command-line front end for `a2m-core`. It feeds blocks of audio from a
//! WAV file or a live input device through a [`Converter`] and prints the
//! notes of every block as one JSON line on stdout. Diagnostics go to stderr.
//!
//! ## Architecture
//! - **File mode**: decode, split into blocks, convert sequentially
//! - **Live mode**: CPAL callback frames blocks, a conversion thread consumes
//!   them over a bounded crossbeam channel
//! - **Table mode**: dump the note range table

mod audio;
mod wav;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use a2m_core::{Converter, ConverterConfig, NOTE_RANGES, Note, NoteSelection, RustFftTransform, Window};
use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Number of blocks that may queue up between capture and conversion.
const BLOCK_QUEUE: usize = 16;

/// a2m - transcribe audio blocks into notes
#[derive(Parser)]
#[command(name = "a2m")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a WAV file block by block
    File {
        /// Path to the input WAV file
        input: PathBuf,

        #[command(flatten)]
        convert: ConvertArgs,
    },
    /// Convert audio from the default input device
    Live {
        /// How long to capture, in seconds
        #[arg(long, default_value_t = 10)]
        seconds: u64,

        #[command(flatten)]
        convert: ConvertArgs,
    },
    /// Print the note range table as JSON
    Table,
}

/// Converter settings; flags override values from `--config`.
#[derive(Args)]
struct ConvertArgs {
    /// JSON file with converter settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Samples per block
    #[arg(long)]
    block_size: Option<u32>,

    /// Fraction of full velocity a note needs to be reported
    #[arg(long)]
    activation_level: Option<f64>,

    /// Semitone offset applied after scale snapping
    #[arg(long, allow_hyphen_values = true)]
    transpose: Option<i32>,

    /// Allowed scale degrees, e.g. 0,2,4,5,7,9,11
    #[arg(long, value_delimiter = ',')]
    pitch_set: Option<Vec<u8>>,

    /// Lowest and highest reported pitch, e.g. 21,108
    #[arg(long, value_delimiter = ',')]
    pitch_range: Option<Vec<u8>>,

    /// Maximum notes per block, 0 for no limit
    #[arg(long)]
    note_count: Option<usize>,

    /// Keep the loudest notes instead of the quietest when limiting
    #[arg(long)]
    loudest: bool,

    /// Window applied to each block before the FFT
    #[arg(long, value_enum, default_value_t = WindowArg::Rectangular)]
    window: WindowArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum WindowArg {
    Rectangular,
    Hann,
}

impl From<WindowArg> for Window {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Rectangular => Window::Rectangular,
            WindowArg::Hann => Window::Hann,
        }
    }
}

impl ConvertArgs {
    /// Builds the converter configuration for audio at `sample_rate`.
    fn to_config(&self, sample_rate: u32) -> Result<ConverterConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ConverterConfig::default(),
        };
        config.sample_rate = sample_rate;
        if let Some(block_size) = self.block_size {
            config.block_size = block_size;
        }
        if let Some(activation_level) = self.activation_level {
            config.activation_level = activation_level;
        }
        if let Some(transpose) = self.transpose {
            config.transpose = transpose;
        }
        if let Some(pitch_set) = &self.pitch_set {
            config.pitch_set = pitch_set.clone();
        }
        if let Some(range) = &self.pitch_range {
            let [low, high] = <[u8; 2]>::try_from(range.as_slice())
                .map_err(|_| anyhow!("--pitch-range takes exactly two pitches, got {}", range.len()))?;
            config.pitch_range = [low, high];
        }
        if let Some(note_count) = self.note_count {
            config.note_count = note_count;
        }
        if self.loudest {
            config.selection = NoteSelection::Loudest;
        }
        Ok(config)
    }

    fn converter(&self, sample_rate: u32) -> Result<Converter> {
        let config = self.to_config(sample_rate)?;
        info!(?config, "converter configuration");
        Ok(Converter::with_transform(config, RustFftTransform::new(self.window.into())))
    }
}

fn load_config(path: &Path) -> Result<ConverterConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))
}

/// One output line.
#[derive(Serialize)]
struct BlockNotes<'a> {
    block: usize,
    offset_ms: f64,
    notes: &'a [Note],
}

fn print_block(out: &mut impl Write, block: usize, offset_ms: f64, notes: &[Note]) -> Result<()> {
    let line = serde_json::to_string(&BlockNotes { block, offset_ms, notes })?;
    writeln!(out, "{line}")?;
    Ok(())
}

fn run_file(input: &Path, args: &ConvertArgs) -> Result<()> {
    let audio = wav::load_wav(input)?;
    let converter = args.converter(audio.sample_rate)?;
    let block_size = converter.config().block_size as usize;
    let ms_per_block = block_size as f64 * 1000.0 / audio.sample_rate as f64;

    let mut out = io::stdout().lock();
    let mut count = 0;
    for (index, block) in wav::blocks(&audio.samples, block_size).enumerate() {
        let notes = converter
            .convert(&block)
            .with_context(|| format!("failed to convert block {index}"))?;
        print_block(&mut out, index, index as f64 * ms_per_block, &notes)?;
        count += 1;
    }
    info!(blocks = count, "finished converting file");
    Ok(())
}

fn run_live(seconds: u64, args: &ConvertArgs) -> Result<()> {
    // the stream has to exist before the sample rate is known
    let block_size = args.to_config(audio::TARGET_SAMPLE_RATE)?.block_size as usize;
    let (sender, receiver) = crossbeam_channel::bounded::<Vec<f64>>(BLOCK_QUEUE);
    let (stream, sample_rate) = audio::start_audio_capture(sender, block_size)?;
    let converter = args.converter(sample_rate)?;
    let ms_per_block = block_size as f64 * 1000.0 / sample_rate as f64;

    let deadline = Instant::now() + Duration::from_secs(seconds);
    info!(seconds, "capturing");

    let worker = thread::spawn(move || -> Result<usize> {
        let mut out = io::stdout().lock();
        let mut index = 0;
        while let Ok(block) = receiver.recv_deadline(deadline) {
            let notes = converter
                .convert(&block)
                .with_context(|| format!("failed to convert block {index}"))?;
            print_block(&mut out, index, index as f64 * ms_per_block, &notes)?;
            index += 1;
        }
        Ok(index)
    });

    let blocks = worker
        .join()
        .map_err(|_| anyhow!("conversion thread panicked"))??;
    drop(stream);
    info!(blocks, "capture finished");
    Ok(())
}

fn run_table() -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, NOTE_RANGES.as_slice())?;
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::File { input, convert } => run_file(input, convert),
        Commands::Live { seconds, convert } => run_live(*seconds, convert),
        Commands::Table => run_table(),
    }
}
