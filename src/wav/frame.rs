//! Inbound frame types delivered by the capture layer.
//!
//! A [`PcmFrame`] is one batch of interleaved samples.  The sample width is
//! carried by the [`PcmSamples`] variant itself, so a frame can never declare
//! 16-bit audio while holding 32-bit values.

use std::fmt;

// ---------------------------------------------------------------------------
// PcmFormat
// ---------------------------------------------------------------------------

/// Stream format latched from the first frame a writer sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PcmFormat {
    /// Sample rate in Hz (e.g. 16000, 44100, 48000).
    pub sample_rate: u32,
    /// Bits per sample (8, 16, 24 or 32).
    pub bits_per_sample: u16,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl PcmFormat {
    pub fn new(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Self {
        Self {
            sample_rate,
            bits_per_sample,
            channels,
        }
    }

    /// Bytes per interleaved sample frame (`channels × bits / 8`).
    ///
    /// Computed in `u32`; the header validation rejects formats whose value
    /// does not fit the 16-bit `BlockAlign` field.
    pub fn block_align(&self) -> u32 {
        u32::from(self.channels) * u32::from(self.bits_per_sample) / 8
    }

    /// Bytes per second (`sample_rate × channels × bits / 8`).
    ///
    /// Returned as `u64` so callers can detect overflow of the 32-bit
    /// `ByteRate` header field.
    pub fn byte_rate(&self) -> u64 {
        u64::from(self.sample_rate) * u64::from(self.block_align())
    }
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {}-bit, {} ch",
            self.sample_rate, self.bits_per_sample, self.channels
        )
    }
}

// ---------------------------------------------------------------------------
// PcmSamples
// ---------------------------------------------------------------------------

/// Interleaved linear PCM samples of one width.
///
/// | Variant | Bits | On-disk encoding |
/// |---------|------|------------------|
/// | `U8`    | 8    | unsigned, 1 byte |
/// | `I16`   | 16   | signed LE, 2 bytes |
/// | `I24`   | 24   | signed LE, low 3 bytes of each `i32` |
/// | `I32`   | 32   | signed LE, 4 bytes |
#[derive(Debug, Clone, PartialEq)]
pub enum PcmSamples {
    U8(Vec<u8>),
    I16(Vec<i16>),
    I24(Vec<i32>),
    I32(Vec<i32>),
}

impl PcmSamples {
    /// Sample width implied by the variant.
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            PcmSamples::U8(_) => 8,
            PcmSamples::I16(_) => 16,
            PcmSamples::I24(_) => 24,
            PcmSamples::I32(_) => 32,
        }
    }

    /// Number of individual sample values (all channels counted).
    pub fn len(&self) -> usize {
        match self {
            PcmSamples::U8(s) => s.len(),
            PcmSamples::I16(s) => s.len(),
            PcmSamples::I24(s) | PcmSamples::I32(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length in bytes of the encoded payload.
    pub fn byte_len(&self) -> u64 {
        self.len() as u64 * u64::from(self.bits_per_sample() / 8)
    }

    /// Encode the samples as the little-endian byte stream stored in the
    /// `data` chunk.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len() as usize);
        match self {
            PcmSamples::U8(s) => out.extend_from_slice(s),
            PcmSamples::I16(s) => {
                for v in s {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            PcmSamples::I24(s) => {
                for v in s {
                    out.extend_from_slice(&v.to_le_bytes()[..3]);
                }
            }
            PcmSamples::I32(s) => {
                for v in s {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// PcmFrame
// ---------------------------------------------------------------------------

/// One batch of interleaved samples handed to the writer in a single
/// [`ingest`](crate::wav::StreamingWavWriter::ingest) call.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmFrame {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Interleaved samples; the variant decides the bit depth.
    pub samples: PcmSamples,
    /// Optional identifier of the producer (user, track, device …).
    pub source_id: Option<String>,
}

impl PcmFrame {
    pub fn new(sample_rate: u32, channels: u16, samples: PcmSamples) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
            source_id: None,
        }
    }

    /// Attach a source identifier.
    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// The format this frame declares.
    pub fn format(&self) -> PcmFormat {
        PcmFormat::new(
            self.sample_rate,
            self.samples.bits_per_sample(),
            self.channels,
        )
    }

    /// Payload length in bytes (header excluded).
    pub fn payload_len(&self) -> u64 {
        self.samples.byte_len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
