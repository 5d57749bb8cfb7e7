//! Application entry point — record the microphone to a WAV file.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse CLI flags and load [`AppConfig`] (default on first run); flags
//!    override the file.
//! 3. Open the output file and start a [`RecordingSession`] with a
//!    [`LevelMeter`] riding along as the frame forwarder.
//! 4. Start the cpal capture stream, feeding the session's channel.
//! 5. Wait on a [`tokio`] runtime for Ctrl-C or the time limit.
//! 6. Drop the stream, finish the session (drain + finalize), log a summary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use wav_recorder::{
    audio::{AudioCapture, LevelMeter},
    config::{AppConfig, AppPaths},
    session::RecordingSession,
    wav::StreamingWavWriter,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Record audio from an input device into a WAV file.
#[derive(Debug, Parser)]
#[command(name = "wav-recorder", version, about)]
struct Cli {
    /// Output file (overrides `recorder.output_dir` / `recorder.file_name`).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after this many seconds (default: until Ctrl-C).
    #[arg(short, long)]
    seconds: Option<f32>,

    /// Bits per sample stored in the file: 8, 16, 24 or 32.
    #[arg(short, long, value_parser = parse_bits)]
    bits: Option<u16>,

    /// Input device name (default: system default input).
    #[arg(short, long)]
    device: Option<String>,

    /// Settings file (default: platform config dir `settings.toml`).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_bits(s: &str) -> Result<u16, String> {
    match s.parse::<u16>() {
        Ok(bits @ (8 | 16 | 24 | 32)) => Ok(bits),
        _ => Err(format!("`{s}` is not one of 8, 16, 24, 32")),
    }
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(bits) = self.bits {
            config.recorder.bits_per_sample = bits;
        }
        if let Some(secs) = self.seconds {
            config.recorder.max_recording_secs = Some(secs);
        }
        if let Some(device) = &self.device {
            config.capture.device = Some(device.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Stop condition
// ---------------------------------------------------------------------------

/// Resolve when the user presses Ctrl-C or `limit` elapses.
async fn wait_for_stop(limit: Option<Duration>) {
    let timer = async {
        match limit {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Ctrl-C handler unavailable ({e}); waiting for time limit");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = interrupt => log::info!("interrupted, stopping recording"),
        _ = timer => log::info!("time limit reached, stopping recording"),
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Configuration
    let cli = Cli::parse();
    let paths = AppPaths::new();
    let settings_file = cli.config.clone().unwrap_or_else(|| paths.settings_file.clone());
    let mut config = AppConfig::load_from(&settings_file).unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e:#}); using defaults");
        AppConfig::default()
    });
    cli.apply(&mut config);

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| config.recorder.output_path(&paths));

    // 3. Writer + session
    let writer = StreamingWavWriter::builder(&output)
        .forwarder(LevelMeter::new(config.capture.level_report_every))
        .create()
        .with_context(|| format!("cannot open {}", output.display()))?;
    let session = RecordingSession::start(writer)?;

    // 4. Capture
    let capture = AudioCapture::new(
        config.capture.device.as_deref(),
        config.recorder.bits_per_sample,
    )
    .context("audio capture unavailable")?;
    let tx = session
        .sender()
        .context("recording session closed before capture started")?;
    let stream = capture
        .start(tx, config.recorder.source_id.clone())
        .context("failed to start audio stream")?;

    log::info!(
        "Recording from {} ({} Hz, {} ch, {}-bit) → {}",
        capture.device_name().unwrap_or_else(|| "default input".into()),
        capture.sample_rate(),
        capture.channels(),
        capture.bits_per_sample(),
        output.display()
    );

    // 5. Wait
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    let limit = config
        .recorder
        .max_recording_secs
        .filter(|s| *s > 0.0)
        .map(Duration::from_secs_f32);
    rt.block_on(wait_for_stop(limit));

    // 6. Stop capture first so no sender outlives the session.
    drop(stream);
    let summary = session.finish()?;

    match summary.format {
        Some(format) => log::info!(
            "Wrote {} ({:.2} s, {} bytes, {} frames, {format})",
            summary.path.display(),
            summary.duration_secs,
            summary.bytes_written,
            summary.frames
        ),
        None => log::warn!(
            "No audio was captured; {} is empty",
            summary.path.display()
        ),
    }

    Ok(())
}
