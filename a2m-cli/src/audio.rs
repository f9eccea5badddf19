//! # Audio Capture Module
//!
//! This module handles live audio capture using CPAL (Cross-Platform Audio Library).
//! It selects an input device, frames the incoming stream into converter-sized
//! blocks inside the audio callback, and hands the blocks to the conversion
//! thread over a bounded channel.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::Sender;
use anyhow::{Result, anyhow};
use tracing::{info, warn};

/// Sample rate requested from the input device.
pub const TARGET_SAMPLE_RATE: u32 = 44100;

/// Starts audio capture from the default input device.
///
/// Blocks of exactly `block_size` samples are sent on `sender`; blocks are
/// dropped rather than queued when the conversion thread falls behind.
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and sample rate
/// * `Err(e)` - Error if audio setup fails
pub fn start_audio_capture(sender: Sender<Vec<f64>>, block_size: usize) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host.default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    let device_name = device.name()?;
    info!(device = %device_name, "using audio input device");

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let sample_rate = clamp_sample_rate(&supported_config, TARGET_SAMPLE_RATE);
    let config = supported_config.with_sample_rate(cpal::SampleRate(sample_rate));
    let config: cpal::StreamConfig = config.into();

    info!(sample_rate, block_size, "selected input stream configuration");

    let err_fn = |err: cpal::StreamError| warn!(%err, "an error occurred on the audio stream");

    // This buffer will accumulate audio data from the callback.
    let mut audio_buffer: Vec<f64> = Vec::with_capacity(block_size * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            audio_buffer.extend(data.iter().map(|&s| f64::from(s)));

            while audio_buffer.len() >= block_size {
                let block = audio_buffer[..block_size].to_vec();

                // Send the block, ignoring errors if the channel is full.
                let _ = sender.try_send(block);

                audio_buffer.drain(..block_size);
            }
        },
        err_fn,
        None
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Only mono 32-bit float configurations qualify; among those the one whose
/// rate range lies closest to `target_rate` wins.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
            let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
            min_diff.min(max_diff)
        })
}

/// Picks `target_rate` if the range supports it, else the nearest edge.
fn clamp_sample_rate(range: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    target_rate.clamp(range.min_sample_rate().0, range.max_sample_rate().0)
}
