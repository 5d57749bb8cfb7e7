//! Streaming PCM → WAV recorder.
//!
//! - [`wav`] — the incremental RIFF/WAVE writer (header placeholder,
//!   sequential payload, size backfill on finalize).
//! - [`session`] — runs a writer on its own thread behind a frame channel.
//! - [`audio`] — `cpal` microphone capture and an input level meter.
//! - [`config`] — TOML settings and platform paths.

pub mod audio;
pub mod config;
pub mod session;
pub mod wav;
