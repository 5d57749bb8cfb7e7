//! Canonical 44-byte RIFF/WAVE header for linear PCM.
//!
//! ```text
//! 0  "RIFF"  4  riff size   8  "WAVE"
//! 12 "fmt "  16 16          20 1 (PCM)   22 channels
//! 24 rate    28 byte rate   32 align     34 bits
//! 36 "data"  40 data size
//! ```
//!
//! The two size fields are written as `0` when streaming starts and
//! backfilled by [`StreamingWavWriter::finalize`](crate::wav::StreamingWavWriter::finalize).

use super::frame::PcmFormat;
use super::writer::WavError;

/// Total header length in bytes.
pub const HEADER_LEN: u64 = 44;

/// Offset of the RIFF `ChunkSize` field.
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// Offset of the `data` sub-chunk size field.
pub const DATA_SIZE_OFFSET: u64 = 40;

/// Bytes of the RIFF chunk that precede the payload, not counting the
/// `"RIFF"` id and the size field itself.
pub const RIFF_OVERHEAD: u64 = 36;

/// Largest payload whose sizes still fit the 32-bit header fields.
pub const MAX_DATA_LEN: u64 = u32::MAX as u64 - RIFF_OVERHEAD;

const PCM_FORMAT_TAG: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Reject formats the header cannot describe.
pub fn validate_format(format: &PcmFormat) -> Result<(), WavError> {
    let invalid = |reason: &str| -> Result<(), WavError> {
        Err(WavError::InvalidFormat {
            format: *format,
            reason: reason.to_string(),
        })
    };

    if format.sample_rate == 0 {
        return invalid("sample rate must be positive");
    }
    if format.channels == 0 {
        return invalid("channel count must be positive");
    }
    if format.bits_per_sample == 0 || format.bits_per_sample % 8 != 0 {
        return invalid("bits per sample must be a positive multiple of 8");
    }
    if format.block_align() > u32::from(u16::MAX) {
        return invalid("block align does not fit 16 bits");
    }
    if format.byte_rate() > u64::from(u32::MAX) {
        return invalid("byte rate does not fit 32 bits");
    }
    Ok(())
}

/// Build the header for `format` declaring `data_len` payload bytes.
///
/// The caller must have validated `format` and bounded `data_len` by
/// [`MAX_DATA_LEN`]; values are truncated to the field width otherwise.
pub fn build_header(format: &PcmFormat, data_len: u32) -> [u8; HEADER_LEN as usize] {
    let mut h = [0u8; HEADER_LEN as usize];

    h[0..4].copy_from_slice(b"RIFF");
    h[4..8].copy_from_slice(&riff_size(data_len).to_le_bytes());
    h[8..12].copy_from_slice(b"WAVE");

    h[12..16].copy_from_slice(b"fmt ");
    h[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    h[20..22].copy_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    h[22..24].copy_from_slice(&format.channels.to_le_bytes());
    h[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    h[28..32].copy_from_slice(&(format.byte_rate() as u32).to_le_bytes());
    h[32..34].copy_from_slice(&(format.block_align() as u16).to_le_bytes());
    h[34..36].copy_from_slice(&format.bits_per_sample.to_le_bytes());

    h[36..40].copy_from_slice(b"data");
    h[40..44].copy_from_slice(&data_len.to_le_bytes());
    h
}

/// Value of the RIFF `ChunkSize` field for `data_len` payload bytes.
pub fn riff_size(data_len: u32) -> u32 {
    data_len.saturating_add(RIFF_OVERHEAD as u32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(h: &[u8], off: usize) -> u16 {
        u16::from_le_bytes([h[off], h[off + 1]])
    }

    fn u32_at(h: &[u8], off: usize) -> u32 {
        u32::from_le_bytes([h[off], h[off + 1], h[off + 2], h[off + 3]])
    }

    #[test]
    fn stereo_48k_header_fields() {
        let h = build_header(&PcmFormat::new(48_000, 16, 2), 0);

        assert_eq!(&h[0..4], b"RIFF");
        assert_eq!(u32_at(&h, 4), 36);
        assert_eq!(&h[8..12], b"WAVE");
        assert_eq!(&h[12..16], b"fmt ");
        assert_eq!(u32_at(&h, 16), 16);
        assert_eq!(u16_at(&h, 20), 1);
        assert_eq!(u16_at(&h, 22), 2);
        assert_eq!(u32_at(&h, 24), 48_000);
        assert_eq!(u32_at(&h, 28), 192_000);
        assert_eq!(u16_at(&h, 32), 4);
        assert_eq!(u16_at(&h, 34), 16);
        assert_eq!(&h[36..40], b"data");
        assert_eq!(u32_at(&h, 40), 0);
    }

    #[test]
    fn size_fields_track_data_len() {
        let h = build_header(&PcmFormat::new(16_000, 16, 1), 200);
        assert_eq!(u32_at(&h, RIFF_SIZE_OFFSET as usize), 236);
        assert_eq!(u32_at(&h, DATA_SIZE_OFFSET as usize), 200);
    }

    #[test]
    fn riff_size_saturates() {
        assert_eq!(riff_size(u32::MAX), u32::MAX);
        assert_eq!(riff_size(MAX_DATA_LEN as u32), u32::MAX);
    }

    #[test]
    fn validate_rejects_zero_fields() {
        assert!(validate_format(&PcmFormat::new(0, 16, 1)).is_err());
        assert!(validate_format(&PcmFormat::new(16_000, 16, 0)).is_err());
        assert!(validate_format(&PcmFormat::new(16_000, 0, 1)).is_err());
        assert!(validate_format(&PcmFormat::new(16_000, 12, 1)).is_err());
    }

    #[test]
    fn validate_rejects_oversized_byte_rate() {
        let err = validate_format(&PcmFormat::new(u32::MAX, 32, 8)).unwrap_err();
        assert!(err.to_string().contains("byte rate"));
    }

    #[test]
    fn validate_accepts_common_formats() {
        for fmt in [
            PcmFormat::new(8_000, 8, 1),
            PcmFormat::new(16_000, 16, 1),
            PcmFormat::new(48_000, 24, 2),
            PcmFormat::new(96_000, 32, 6),
        ] {
            assert!(validate_format(&fmt).is_ok(), "{fmt} should be valid");
        }
    }
}
