//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] wraps the cpal host/device/stream lifecycle.  Call
//! [`AudioCapture::start`] to begin streaming [`PcmFrame`]s over an mpsc
//! channel.  The returned [`StreamHandle`] is a RAII guard — dropping it
//! stops the underlying cpal stream.
//!
//! cpal delivers `f32` samples; they are quantized here to the integer PCM
//! width the recording was configured for, so the WAV writer only ever sees
//! ready-to-store samples.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use thiserror::Error;

use crate::wav::{PcmFrame, PcmSamples};

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// Dropping this value calls `cpal::Stream::drop` which pauses/stops the
/// underlying hardware stream.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up or running the audio capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device not found: {0}")]
    UnknownDevice(String),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported PCM bit depth: {0} (expected 8, 16, 24 or 32)")]
    UnsupportedBits(u16),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// Quantization
// ---------------------------------------------------------------------------

/// Convert `f32` samples in `[-1.0, 1.0]` to integer PCM of `bits` width.
///
/// Out-of-range input is clamped.  8-bit output is unsigned (WAV convention).
pub fn quantize(samples: &[f32], bits: u16) -> Result<PcmSamples, CaptureError> {
    let clamp = |s: f32| s.clamp(-1.0, 1.0);
    let out = match bits {
        8 => PcmSamples::U8(
            samples
                .iter()
                .map(|&s| (clamp(s) * 127.0 + 128.0).round() as u8)
                .collect(),
        ),
        16 => PcmSamples::I16(
            samples
                .iter()
                .map(|&s| (clamp(s) * i16::MAX as f32).round() as i16)
                .collect(),
        ),
        24 => PcmSamples::I24(
            samples
                .iter()
                .map(|&s| (clamp(s) * 8_388_607.0).round() as i32)
                .collect(),
        ),
        32 => PcmSamples::I32(
            samples
                .iter()
                .map(|&s| (f64::from(clamp(s)) * f64::from(i32::MAX)).round() as i32)
                .collect(),
        ),
        other => return Err(CaptureError::UnsupportedBits(other)),
    };
    Ok(out)
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Microphone capture device wrapper built on top of `cpal`.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::mpsc;
/// use wav_recorder::audio::AudioCapture;
/// use wav_recorder::wav::PcmFrame;
///
/// let (tx, rx) = mpsc::channel::<PcmFrame>();
/// let capture = AudioCapture::new(None, 16).unwrap();
/// let _handle = capture.start(tx, None).unwrap();
/// // `_handle` keeps the stream alive; drop it to stop recording.
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    /// Native sample rate reported by the device (Hz).
    sample_rate: u32,
    /// Number of interleaved channels reported by the device.
    channels: u16,
    /// Integer PCM width frames are quantized to.
    bits_per_sample: u16,
}

impl AudioCapture {
    /// Open `device_name` (or the system default input when `None`).
    ///
    /// # Errors
    ///
    /// [`CaptureError::NoDevice`] / [`CaptureError::UnknownDevice`] when the
    /// device is missing, [`CaptureError::UnsupportedBits`] for a bit depth
    /// the WAV writer cannot store, and [`CaptureError::DefaultConfig`] when
    /// the device cannot report a stream configuration.
    pub fn new(device_name: Option<&str>, bits_per_sample: u16) -> Result<Self, CaptureError> {
        if !matches!(bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(CaptureError::UnsupportedBits(bits_per_sample));
        }

        let host = cpal::default_host();
        let device = match device_name {
            None => host.default_input_device().ok_or(CaptureError::NoDevice)?,
            Some(name) => host
                .input_devices()?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| CaptureError::UnknownDevice(name.to_string()))?,
        };

        let supported = device.default_input_config()?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
            bits_per_sample,
        })
    }

    /// Start recording and send [`PcmFrame`]s to `tx`.
    ///
    /// The cpal callback runs on a dedicated audio thread; each hardware
    /// buffer becomes one frame.  Send errors (receiver dropped) are ignored
    /// so the audio thread never panics.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`]
    /// if the platform rejects the stream configuration.
    pub fn start(
        &self,
        tx: mpsc::Sender<PcmFrame>,
        source_id: Option<String>,
    ) -> Result<StreamHandle, CaptureError> {
        let sample_rate = self.sample_rate;
        let channels = self.channels;
        let bits = self.bits_per_sample;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // `bits` was validated in `new`.
                let Ok(samples) = quantize(data, bits) else {
                    return;
                };
                let frame = PcmFrame {
                    sample_rate,
                    channels,
                    samples,
                    source_id: source_id.clone(),
                };
                // Ignore send errors; the receiver may have been dropped.
                let _ = tx.send(frame);
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    /// Native sample rate of the capture stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels in each frame.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// Human-readable device name, if the host reports one.
    pub fn device_name(&self) -> Option<String> {
        self.device.name().ok()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// `PcmFrame` must be `Send` so it can cross from the audio thread.
    #[test]
    fn pcm_frame_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<PcmFrame>();
    }

    #[test]
    fn quantize_16_bit_full_scale() {
        let q = quantize(&[0.0, 1.0, -1.0, 2.0], 16).unwrap();
        assert_eq!(q, PcmSamples::I16(vec![0, 32_767, -32_767, 32_767]));
    }

    #[test]
    fn quantize_8_bit_is_unsigned() {
        let q = quantize(&[0.0, 1.0, -1.0], 8).unwrap();
        assert_eq!(q, PcmSamples::U8(vec![128, 255, 1]));
    }

    #[test]
    fn quantize_24_bit_range() {
        let q = quantize(&[1.0, -1.0], 24).unwrap();
        assert_eq!(q, PcmSamples::I24(vec![8_388_607, -8_388_607]));
    }

    #[test]
    fn quantize_32_bit_range() {
        let q = quantize(&[1.0, 0.0], 32).unwrap();
        assert_eq!(q, PcmSamples::I32(vec![i32::MAX, 0]));
    }

    #[test]
    fn quantize_rejects_odd_width() {
        assert!(matches!(
            quantize(&[0.0], 12),
            Err(CaptureError::UnsupportedBits(12))
        ));
    }
}
