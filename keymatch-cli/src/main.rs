//! # keymatch — match a song's key to your voice
//!
//! Command-line frontend for the keymatch core. Records a short voice
//! sample from the microphone, estimates the representative pitch of a
//! song file, and prints how many semitones the song should be
//! transposed so it sits in the singer's range. The pitch-shifting
//! transform itself is out of scope here; this tool only produces the
//! plan a shifter would consume.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use keymatch_core::aggregate::analyze_buffer;
use keymatch_core::pitch::PitchAlgorithm;
use keymatch_core::session::{CaptureSession, SAMPLE_INTERVAL, SESSION_BUDGET};
use keymatch_core::tuning::{nearest_note_name, plan_transposition};
use keymatch_core::{TransposePlan, audio};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "keymatch", version, about = "Voice-matched song transposition planner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record the voice for a few seconds and print its pitch
    Record {
        /// Estimation strategy to run per frame
        #[arg(long, value_enum, default_value_t = Algorithm::Autocorrelation)]
        algorithm: Algorithm,
    },
    /// Estimate the representative pitch of a WAV file
    Analyze {
        /// Path to the WAV file
        file: PathBuf,
        /// Estimation strategy to run per frame
        #[arg(long, value_enum, default_value_t = Algorithm::DifferenceFunction)]
        algorithm: Algorithm,
    },
    /// Compare a song against the voice and print the semitone shift
    Plan {
        /// Path to the song WAV
        song: PathBuf,
        /// Use a recorded voice WAV instead of the microphone
        #[arg(long)]
        voice: Option<PathBuf>,
        /// Write the plan as a JSON report
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

/// CLI-facing names for the core estimation strategies.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    DifferenceFunction,
    Autocorrelation,
}

impl From<Algorithm> for PitchAlgorithm {
    fn from(value: Algorithm) -> Self {
        match value {
            Algorithm::DifferenceFunction => PitchAlgorithm::DifferenceFunction,
            Algorithm::Autocorrelation => PitchAlgorithm::Autocorrelation,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Record { algorithm } => {
            let pitch = record_voice(algorithm.into())?
                .ok_or_else(|| anyhow!("no pitch found in the voice sample"))?;
            print_pitch("Voice", pitch);
        }
        Command::Analyze { file, algorithm } => {
            let pitch = analyze_wav(&file, algorithm.into())?
                .ok_or_else(|| anyhow!("no pitch found in {}", file.display()))?;
            print_pitch("Song", pitch);
        }
        Command::Plan { song, voice, report } => {
            let song_pitch = analyze_wav(&song, PitchAlgorithm::DifferenceFunction)?
                .ok_or_else(|| anyhow!("no pitch found in {}", song.display()))?;
            print_pitch("Song", song_pitch);

            let voice_pitch = match voice {
                Some(path) => analyze_wav(&path, PitchAlgorithm::Autocorrelation)?,
                None => record_voice(PitchAlgorithm::Autocorrelation)?,
            }
            .ok_or_else(|| anyhow!("no pitch found in the voice sample"))?;
            print_pitch("Voice", voice_pitch);

            let plan = plan_transposition(song_pitch, voice_pitch)
                .context("could not compute the semitone shift")?;
            println!(
                "Transpose the song by {} semitone{}",
                format_shift(plan.semitone_shift),
                if plan.semitone_shift.abs() == 1 { "" } else { "s" }
            );

            if let Some(path) = report {
                write_report(&plan, &path)?;
                println!("Report written to {}", path.display());
            }
        }
    }

    Ok(())
}

/// Samples the microphone for the session budget and reduces the window.
///
/// Drives a [`CaptureSession`] the way the core expects: the cpal
/// callback streams frames into a channel, and this loop feeds the
/// freshest frame to the session once per [`SAMPLE_INTERVAL`] until the
/// [`SESSION_BUDGET`] deadline fires.
fn record_voice(algorithm: PitchAlgorithm) -> Result<Option<f32>> {
    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Vec<f32>>(8);
    let (stream, sample_rate) =
        audio::start_capture(frame_tx).context("could not start audio capture")?;

    let mut session = CaptureSession::new(algorithm);
    session.start();
    eprintln!("[RECORD] Sampling for {} seconds, sing a steady note...", SESSION_BUDGET.as_secs());

    let ticker = crossbeam_channel::tick(SAMPLE_INTERVAL);
    let deadline = crossbeam_channel::after(SESSION_BUDGET);
    let mut latest_frame: Option<Vec<f32>> = None;

    loop {
        crossbeam_channel::select! {
            recv(frame_rx) -> frame => match frame {
                Ok(frame) => latest_frame = Some(frame),
                Err(_) => break, // capture thread went away
            },
            recv(ticker) -> _ => {
                if let Some(frame) = latest_frame.take() {
                    session.feed(&frame, sample_rate);
                }
            },
            recv(deadline) -> _ => break,
        }
    }

    drop(stream);
    let pitch = session.finish();
    eprintln!("[RECORD] Collected {} estimates", session.estimate_count());
    Ok(pitch)
}

/// Reads a WAV file and estimates its representative pitch.
fn analyze_wav(path: &Path, algorithm: PitchAlgorithm) -> Result<Option<f32>> {
    eprintln!("[ANALYZE] Reading {}", path.display());
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("could not open {}", path.display()))?;
    let spec = reader.spec();

    // Channel 0 only; the sweep works on mono samples in [-1, 1].
    let channels = spec.channels as usize;
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .step_by(channels)
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .step_by(channels)
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    eprintln!(
        "[ANALYZE] {} samples at {} Hz ({} channel{})",
        samples.len(),
        spec.sample_rate,
        channels,
        if channels == 1 { "" } else { "s" }
    );

    Ok(analyze_buffer(&samples, spec.sample_rate, algorithm))
}

fn write_report(plan: &TransposePlan, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(plan)?;
    std::fs::write(path, json).with_context(|| format!("could not write {}", path.display()))?;
    Ok(())
}

fn print_pitch(label: &str, freq: f32) {
    let (note, _) = nearest_note_name(freq);
    println!("{label} pitch: {freq:.1} Hz (~{note})");
}

fn format_shift(shift: i32) -> String {
    if shift > 0 { format!("+{shift}") } else { shift.to_string() }
}
