//! Streaming WAV writer.
//!
//! [`StreamingWavWriter`] owns one output file from construction until
//! [`finalize`](StreamingWavWriter::finalize).  The first ingested frame
//! latches the stream format and writes a 44-byte header whose two size
//! fields are `0`; every frame's payload is appended in call order; finalize
//! seeks back and fills the sizes in.
//!
//! Between the first ingest and finalize the file is a well-formed WAV that
//! declares an empty `data` chunk.  Dropping the writer finalizes it.
//!
//! # Example
//!
//! ```rust,no_run
//! use wav_recorder::wav::{PcmFrame, PcmSamples, StreamingWavWriter};
//!
//! let mut writer = StreamingWavWriter::create("take-1.wav").unwrap();
//! writer
//!     .ingest(&PcmFrame::new(16_000, 1, PcmSamples::I16(vec![0; 160])))
//!     .unwrap();
//! writer.finalize().unwrap();
//! ```

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::forward::{forward_isolated, FrameForwarder};
use super::frame::{PcmFormat, PcmFrame, PcmSamples};
use super::header::{
    build_header, riff_size, validate_format, DATA_SIZE_OFFSET, HEADER_LEN, MAX_DATA_LEN,
    RIFF_SIZE_OFFSET,
};
use super::observer::{LogObserver, RecorderObserver};
use super::sink::WavSink;

// ---------------------------------------------------------------------------
// WavError
// ---------------------------------------------------------------------------

/// Errors surfaced by [`StreamingWavWriter`].
#[derive(Debug, Error)]
pub enum WavError {
    /// Opening, writing, seeking, flushing or syncing the file failed.
    #[error("WAV file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// `ingest` was called after `finalize`.
    #[error("WAV writer already finalized")]
    Finalized,

    /// The first frame declares a format the WAV header cannot describe.
    #[error("invalid PCM format ({format}): {reason}")]
    InvalidFormat { format: PcmFormat, reason: String },

    /// A later frame does not match the format latched from the first one.
    #[error("frame format ({got}) does not match stream format ({expected})")]
    FormatMismatch { expected: PcmFormat, got: PcmFormat },

    /// Appending the frame would overflow the 32-bit WAV size fields.
    #[error(
        "frame of {payload} bytes would exceed the 4 GiB WAV limit \
         ({bytes_written} bytes already written)"
    )]
    SizeLimit { bytes_written: u64, payload: u64 },
}

// ---------------------------------------------------------------------------
// SharedWavWriter
// ---------------------------------------------------------------------------

/// Writer shared by several producers.
///
/// Hold the lock for the whole `ingest` / `finalize` call; the mutex is the
/// only thing ordering concurrent frames.
pub type SharedWavWriter = Arc<Mutex<StreamingWavWriter>>;

// ---------------------------------------------------------------------------
// WavWriterBuilder
// ---------------------------------------------------------------------------

/// Configures a [`StreamingWavWriter`] before the file is opened.
pub struct WavWriterBuilder {
    path: PathBuf,
    forwarder: Option<Box<dyn FrameForwarder>>,
    observer: Box<dyn RecorderObserver>,
}

impl WavWriterBuilder {
    /// Mirror every ingested batch of samples to `forwarder`.
    pub fn forwarder(mut self, forwarder: impl FrameForwarder + 'static) -> Self {
        self.forwarder = Some(Box::new(forwarder));
        self
    }

    /// Closure form of [`forwarder`](Self::forwarder).
    pub fn forward_with<F>(self, f: F) -> Self
    where
        F: FnMut(&PcmSamples, Option<&str>) -> anyhow::Result<()> + Send + 'static,
    {
        self.forwarder(f)
    }

    /// Replace the default [`LogObserver`].
    pub fn observer(mut self, observer: impl RecorderObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Open (create or truncate) the destination file.
    ///
    /// # Errors
    ///
    /// [`WavError::Io`] when the file cannot be opened for writing.
    pub fn create(self) -> Result<StreamingWavWriter, WavError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        Ok(self.with_sink(Box::new(file)))
    }

    pub(crate) fn with_sink(self, sink: Box<dyn WavSink>) -> StreamingWavWriter {
        StreamingWavWriter {
            path: self.path,
            file: Some(BufWriter::new(sink)),
            format: None,
            bytes_written: 0,
            resync: false,
            finalized: false,
            forwarder: self.forwarder,
            observer: self.observer,
        }
    }
}

// ---------------------------------------------------------------------------
// StreamingWavWriter
// ---------------------------------------------------------------------------

/// Incremental PCM → WAV serializer for one output file.
///
/// The header is only written once the first frame arrives, so a writer that
/// never sees audio leaves a zero-byte file behind.
pub struct StreamingWavWriter {
    path: PathBuf,
    /// `None` once finalized; the handle is released exactly once.
    file: Option<BufWriter<Box<dyn WavSink>>>,
    /// Latched from the first frame; `Some` iff the header has been written.
    format: Option<PcmFormat>,
    /// Payload bytes appended so far (header excluded).
    bytes_written: u64,
    /// A payload write failed part-way; the next one must start at
    /// `HEADER_LEN + bytes_written`, not at the current file position.
    resync: bool,
    finalized: bool,
    forwarder: Option<Box<dyn FrameForwarder>>,
    observer: Box<dyn RecorderObserver>,
}

impl std::fmt::Debug for StreamingWavWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingWavWriter")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("bytes_written", &self.bytes_written)
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

impl StreamingWavWriter {
    /// Open `path` with no forwarder and the default [`LogObserver`].
    pub fn create(path: impl AsRef<Path>) -> Result<Self, WavError> {
        Self::builder(path).create()
    }

    /// Start configuring a writer for `path`.
    pub fn builder(path: impl AsRef<Path>) -> WavWriterBuilder {
        WavWriterBuilder {
            path: path.as_ref().to_path_buf(),
            forwarder: None,
            observer: Box::new(LogObserver::default()),
        }
    }

    /// Wrap the writer for use from several threads.
    pub fn into_shared(self) -> SharedWavWriter {
        Arc::new(Mutex::new(self))
    }

    // -----------------------------------------------------------------------
    // ingest
    // -----------------------------------------------------------------------

    /// Append one frame.
    ///
    /// The first frame writes the header and fixes the stream format.  Later
    /// frames must declare the same format.  Zero-length frames are accepted.
    /// The forwarder (if any) runs after the payload is queued; its failures
    /// are reported to the observer and never returned here.
    ///
    /// # Errors
    ///
    /// - [`WavError::Finalized`] after [`finalize`](Self::finalize).
    /// - [`WavError::InvalidFormat`] when the first frame's format is unusable.
    /// - [`WavError::FormatMismatch`] when a later frame changes format.
    /// - [`WavError::SizeLimit`] when the file would pass 4 GiB.
    /// - [`WavError::Io`] when writing fails.  The frame counts as not
    ///   written; any partial bytes it left are overwritten by the next
    ///   successful ingest or cut off by finalize.
    pub fn ingest(&mut self, frame: &PcmFrame) -> Result<(), WavError> {
        if self.finalized {
            return Err(WavError::Finalized);
        }

        let frame_format = frame.format();
        let needs_header = match self.format {
            Some(expected) if expected != frame_format => {
                return Err(WavError::FormatMismatch {
                    expected,
                    got: frame_format,
                });
            }
            Some(_) => false,
            None => {
                validate_format(&frame_format)?;
                true
            }
        };

        let payload = frame.payload_len();
        if self.bytes_written + payload > MAX_DATA_LEN {
            return Err(WavError::SizeLimit {
                bytes_written: self.bytes_written,
                payload,
            });
        }

        let file = self.file.as_mut().ok_or(WavError::Finalized)?;

        if needs_header {
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&build_header(&frame_format, 0))?;
            self.format = Some(frame_format);
            self.observer.header_written(&self.path, &frame_format);
        } else if self.resync {
            file.seek(SeekFrom::Start(HEADER_LEN + self.bytes_written))?;
            self.resync = false;
        }

        if payload > 0 {
            if let Err(e) = file.write_all(&frame.samples.to_le_bytes()) {
                self.resync = true;
                return Err(e.into());
            }
            self.bytes_written += payload;
        }

        if let Some(forwarder) = self.forwarder.as_deref_mut() {
            if let Err(e) =
                forward_isolated(forwarder, &frame.samples, frame.source_id.as_deref())
            {
                self.observer.forward_failed(&self.path, &e);
            }
        }

        Ok(())
    }

    /// Push buffered payload to the OS so other readers see it.
    ///
    /// Declared sizes stay `0` until [`finalize`](Self::finalize).
    pub fn flush(&mut self) -> Result<(), WavError> {
        match self.file.as_mut() {
            Some(file) => Ok(file.flush()?),
            None => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // finalize
    // -----------------------------------------------------------------------

    /// Backfill the header sizes, sync and release the file.
    ///
    /// Calling it again is a no-op.  When no frame was ever ingested the
    /// file is left empty.  If buffered payload cannot be flushed, the header
    /// is still rewritten to declare only what reached the file, the handle
    /// is released, and the flush error is returned.
    pub fn finalize(&mut self) -> Result<(), WavError> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;

        let Some(writer) = self.file.take() else {
            return Ok(());
        };

        let result = match self.format {
            None => close_empty(writer),
            Some(format) => self.backfill(writer, &format),
        };

        match &result {
            Ok(()) => self
                .observer
                .finalized(&self.path, self.format.as_ref(), self.bytes_written),
            Err(e) => self.observer.finalize_failed(&self.path, e),
        }
        result
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stream format, once the first frame has been ingested.
    pub fn format(&self) -> Option<PcmFormat> {
        self.format
    }

    /// `true` once the header has been written.
    pub fn header_written(&self) -> bool {
        self.format.is_some()
    }

    /// Payload bytes ingested so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// `true` once [`finalize`](Self::finalize) has run, successfully or not.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Recorded duration in seconds (`0.0` before the first frame).
    pub fn duration_secs(&self) -> f64 {
        match self.format {
            Some(format) if format.byte_rate() > 0 => {
                self.bytes_written as f64 / format.byte_rate() as f64
            }
            _ => 0.0,
        }
    }
}

impl Drop for StreamingWavWriter {
    fn drop(&mut self) {
        // Errors are already reported to the observer.
        let _ = self.finalize();
    }
}

// ---------------------------------------------------------------------------
// Finalize helpers
// ---------------------------------------------------------------------------

/// Release a writer that never received a frame, leaving a zero-byte file.
fn close_empty(writer: BufWriter<Box<dyn WavSink>>) -> Result<(), WavError> {
    let (sink, _) = writer.into_parts();
    sink.set_len(0)?;
    Ok(())
}

impl StreamingWavWriter {
    fn backfill(
        &self,
        mut writer: BufWriter<Box<dyn WavSink>>,
        format: &PcmFormat,
    ) -> Result<(), WavError> {
        let flushed = writer.flush();
        let (mut sink, _) = writer.into_parts();

        if let Err(flush_err) = flushed {
            let on_disk = sink.file_len().unwrap_or(0);
            let align = u64::from(format.block_align()).max(1);
            let reached = on_disk.saturating_sub(HEADER_LEN) / align * align;
            let data_len = self.bytes_written.min(reached);
            if let Err(e) = rewrite_header(sink.as_mut(), format, data_len) {
                self.observer.finalize_failed(&self.path, &WavError::Io(e));
            }
            return Err(flush_err.into());
        }

        write_sizes(sink.as_mut(), self.bytes_written)?;
        Ok(())
    }
}

/// Seek to the two size fields and overwrite them, then trim and sync.
fn write_sizes(sink: &mut dyn WavSink, data_len: u64) -> io::Result<()> {
    // Bounded by MAX_DATA_LEN in `ingest`.
    let data_len32 = data_len as u32;

    sink.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))?;
    sink.write_all(&riff_size(data_len32).to_le_bytes())?;
    sink.seek(SeekFrom::Start(DATA_SIZE_OFFSET))?;
    sink.write_all(&data_len32.to_le_bytes())?;

    sink.set_len(HEADER_LEN + data_len)?;
    sink.sync_all()
}

fn rewrite_header(sink: &mut dyn WavSink, format: &PcmFormat, data_len: u64) -> io::Result<()> {
    sink.seek(SeekFrom::Start(0))?;
    sink.write_all(&build_header(format, data_len as u32))?;
    sink.set_len(HEADER_LEN + data_len)?;
    sink.sync_all()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
