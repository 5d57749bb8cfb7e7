//! Audio input side — microphone capture and level metering.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → quantize → PcmFrame (mpsc) → RecordingSession
//!                                                              └─ LevelMeter (forwarder)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::mpsc;
//! use wav_recorder::audio::AudioCapture;
//! use wav_recorder::wav::PcmFrame;
//!
//! let (tx, rx) = mpsc::channel::<PcmFrame>();
//! let capture = AudioCapture::new(None, 16).unwrap();
//! let _handle = capture.start(tx, None).unwrap(); // drops handle → stops stream
//!
//! while let Ok(frame) = rx.recv() {
//!     println!("received {} samples @ {}Hz", frame.samples.len(), frame.sample_rate);
//! }
//! ```

pub mod capture;
pub mod level;

pub use capture::{quantize, AudioCapture, CaptureError, StreamHandle};
pub use level::{Level, LevelMeter};
