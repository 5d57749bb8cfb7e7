//! Input level metering.
//!
//! [`LevelMeter`] turns a batch of integer PCM samples into normalised peak
//! and RMS values.  It implements [`FrameForwarder`] so it can ride along a
//! [`StreamingWavWriter`](crate::wav::StreamingWavWriter) as the side-channel
//! consumer and log the input level while recording.
//!
//! # Example
//!
//! ```rust
//! use wav_recorder::audio::Level;
//! use wav_recorder::wav::PcmSamples;
//!
//! let level = Level::measure(&PcmSamples::I16(vec![16_384, -16_384]));
//! assert!((level.peak - 0.5).abs() < 1e-3);
//! assert!((level.rms - 0.5).abs() < 1e-3);
//! ```

use crate::wav::{FrameForwarder, PcmSamples};

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Peak and RMS amplitude of a sample batch, both in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Level {
    pub peak: f32,
    pub rms: f32,
}

impl Level {
    /// Measure `samples`.  An empty batch measures as silence.
    pub fn measure(samples: &PcmSamples) -> Self {
        match samples {
            // 8-bit WAV is unsigned with 128 as the zero line.
            PcmSamples::U8(s) => {
                Self::from_normalized(s.iter().map(|&v| (f32::from(v) - 128.0) / 128.0))
            }
            PcmSamples::I16(s) => Self::from_normalized(s.iter().map(|&v| f32::from(v) / 32_768.0)),
            PcmSamples::I24(s) => Self::from_normalized(s.iter().map(|&v| v as f32 / 8_388_608.0)),
            PcmSamples::I32(s) => {
                Self::from_normalized(s.iter().map(|&v| v as f32 / 2_147_483_648.0))
            }
        }
    }

    fn from_normalized(values: impl Iterator<Item = f32>) -> Self {
        let mut peak = 0.0_f32;
        let mut sum_sq = 0.0_f64;
        let mut n = 0usize;
        for v in values {
            peak = peak.max(v.abs());
            sum_sq += f64::from(v * v);
            n += 1;
        }
        if n == 0 {
            return Self::default();
        }
        Self {
            peak: peak.min(1.0),
            rms: ((sum_sq / n as f64).sqrt() as f32).min(1.0),
        }
    }

    /// Peak level in dBFS (`-inf` for digital silence).
    pub fn peak_dbfs(&self) -> f32 {
        20.0 * self.peak.log10()
    }
}

// ---------------------------------------------------------------------------
// LevelMeter
// ---------------------------------------------------------------------------

/// Forwarder that tracks the running input level and logs it periodically.
#[derive(Debug, Clone)]
pub struct LevelMeter {
    /// Log every `report_every` batches (`0` disables logging).
    report_every: u32,
    batches: u32,
    last: Level,
    max_peak: f32,
}

impl LevelMeter {
    pub fn new(report_every: u32) -> Self {
        Self {
            report_every,
            batches: 0,
            last: Level::default(),
            max_peak: 0.0,
        }
    }

    /// Level of the most recent batch.
    pub fn last(&self) -> Level {
        self.last
    }

    /// Highest peak seen since creation.
    pub fn max_peak(&self) -> f32 {
        self.max_peak
    }

    /// Number of batches observed.
    pub fn batches(&self) -> u32 {
        self.batches
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new(50)
    }
}

impl FrameForwarder for LevelMeter {
    fn forward(&mut self, samples: &PcmSamples, source_id: Option<&str>) -> anyhow::Result<()> {
        self.last = Level::measure(samples);
        self.max_peak = self.max_peak.max(self.last.peak);
        self.batches = self.batches.wrapping_add(1);

        if self.report_every > 0 && self.batches % self.report_every == 0 {
            log::debug!(
                "input level [{}]: peak {:.1} dBFS, rms {:.3}",
                source_id.unwrap_or("-"),
                self.last.peak_dbfs(),
                self.last.rms
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_zero() {
        assert_eq!(Level::measure(&PcmSamples::I16(vec![0; 64])), Level::default());
        assert_eq!(Level::measure(&PcmSamples::U8(vec![128; 64])), Level::default());
    }

    #[test]
    fn empty_batch_is_silence() {
        assert_eq!(Level::measure(&PcmSamples::I32(Vec::new())), Level::default());
    }

    #[test]
    fn full_scale_negative_clamps_to_one() {
        let l = Level::measure(&PcmSamples::I16(vec![i16::MIN]));
        assert_eq!(l.peak, 1.0);
        assert!(l.peak_dbfs().abs() < 1e-4);
    }

    #[test]
    fn meter_tracks_max_peak() {
        let mut meter = LevelMeter::new(0);
        meter.forward(&PcmSamples::I16(vec![8_192]), None).unwrap();
        meter.forward(&PcmSamples::I16(vec![100]), Some("mic")).unwrap();

        assert_eq!(meter.batches(), 2);
        assert!((meter.max_peak() - 0.25).abs() < 1e-4);
        assert!(meter.last().peak < 0.01);
    }
}
