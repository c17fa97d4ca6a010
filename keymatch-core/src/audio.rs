//! # Audio Capture Module
//!
//! Thin cpal glue between the microphone and the analysis loop. Nothing
//! here estimates anything: the stream callback chops the input into
//! fixed-size mono frames and pushes them through a channel for the
//! session loop to consume. Kept deliberately dumb so the estimation
//! core stays pure and I/O-free.

use anyhow::{Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

/// Samples per analysis frame (~46 ms at 44.1 kHz).
pub const FRAME_SIZE: usize = 2048;

/// Preferred capture sample rate, in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 44100;

/// Starts capturing mono frames from the default input device.
///
/// Picks the f32 input configuration closest to
/// [`TARGET_SAMPLE_RATE`], then streams [`FRAME_SIZE`]-sample frames of
/// the first channel through `sender`. Frames are dropped silently when
/// the receiver lags; the analysis cadence is slower than the capture
/// rate, so losing frames is fine.
///
/// # Arguments
/// * `sender` - Channel the capture callback pushes frames into
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Live stream handle (capture stops
///   when it is dropped) and the actual sample rate
/// * `Err(e)` - No usable input device or configuration
pub fn start_capture(sender: Sender<Vec<f32>>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("no audio input device available"))?;

    eprintln!("[CAPTURE] Using input device: {}", device.name()?);

    let supported = device
        .supported_input_configs()?
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let below = (c.min_sample_rate().0 as i64 - TARGET_SAMPLE_RATE as i64).abs();
            let above = (c.max_sample_rate().0 as i64 - TARGET_SAMPLE_RATE as i64).abs();
            below.min(above)
        })
        .ok_or_else(|| anyhow!("no f32 input configuration found"))?;

    let rate = cpal::SampleRate(TARGET_SAMPLE_RATE)
        .clamp(supported.min_sample_rate(), supported.max_sample_rate());
    let config = supported.with_sample_rate(rate);
    let channels = config.channels() as usize;
    let sample_rate = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    eprintln!("[CAPTURE] Sample rate: {sample_rate} Hz, channels: {channels}");

    let err_fn = |err| eprintln!("[CAPTURE] Stream error: {err}");

    // Accumulates channel-0 samples across callbacks until a full frame
    // is available.
    let mut pending: Vec<f32> = Vec::with_capacity(FRAME_SIZE * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // Keep only the first channel of the interleaved input.
            pending.extend(data.iter().step_by(channels));

            while pending.len() >= FRAME_SIZE {
                let frame: Vec<f32> = pending.drain(..FRAME_SIZE).collect();
                // A full channel means the consumer is behind; drop the frame.
                let _ = sender.try_send(frame);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}
