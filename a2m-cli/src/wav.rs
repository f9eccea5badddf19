//! # WAV Input Module
//!
//! Decodes a WAV file into mono samples and cuts them into fixed-size blocks
//! for the converter.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

/// Decoded mono audio.
#[derive(Debug, Clone)]
pub struct MonoAudio {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
}

/// Loads a WAV file and down-mixes it to mono.
///
/// Integer PCM is scaled into [-1, 1]; float PCM is taken as is.
pub fn load_wav(path: &Path) -> Result<MonoAudio> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open WAV file '{}'", path.display()))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        bail!("WAV file '{}' declares zero channels", path.display());
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f64 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let channels = spec.channels as usize;
    let samples: Vec<f64> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f64>() / frame.len() as f64)
        .collect();

    info!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        frames = samples.len(),
        "loaded WAV file"
    );
    Ok(MonoAudio { samples, sample_rate: spec.sample_rate })
}

/// Splits `samples` into consecutive blocks, zero-padding the last one.
pub fn blocks(samples: &[f64], block_size: usize) -> impl Iterator<Item = Vec<f64>> + '_ {
    samples.chunks(block_size.max(1)).map(move |chunk| {
        let mut block = chunk.to_vec();
        block.resize(block_size, 0.0);
        block
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_block_is_padded() {
        let samples: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let blocks: Vec<Vec<f64>> = blocks(&samples, 4).collect();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1], vec![4.0, 5.0, 6.0, 7.0]);
        assert_eq!(blocks[2], vec![8.0, 9.0, 0.0, 0.0]);
    }

    #[test]
    fn stereo_is_mixed_down() {
        let path = std::env::temp_dir().join(format!("a2m-wav-test-{}.wav", std::process::id()));
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..4 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let audio = load_wav(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.samples, vec![0.25; 4]);
    }
}
