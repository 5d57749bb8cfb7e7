//! Observability hooks for the writer.
//!
//! The writer never calls the `log` macros directly; it reports lifecycle
//! events to an injected [`RecorderObserver`].  [`LogObserver`] is the
//! default and forwards everything to the `log` facade.

use std::path::Path;

use super::frame::PcmFormat;
use super::writer::WavError;

/// Receives writer lifecycle events.  Every method defaults to a no-op.
pub trait RecorderObserver: Send {
    /// The placeholder header has been written for `format`.
    fn header_written(&self, _path: &Path, _format: &PcmFormat) {}

    /// A forwarder returned an error or panicked; the write itself succeeded.
    fn forward_failed(&self, _path: &Path, _error: &anyhow::Error) {}

    /// The file was finalized with `bytes_written` payload bytes.
    ///
    /// `format` is `None` when nothing was ever ingested.
    fn finalized(&self, _path: &Path, _format: Option<&PcmFormat>, _bytes_written: u64) {}

    /// Finalization failed; the file handle has been released regardless.
    fn finalize_failed(&self, _path: &Path, _error: &WavError) {}
}

/// Observer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl RecorderObserver for NullObserver {}

/// Default observer: writes events through the `log` crate.
#[derive(Debug, Clone)]
pub struct LogObserver {
    target: &'static str,
}

impl LogObserver {
    pub const DEFAULT_TARGET: &'static str = "wav_recorder::writer";

    /// Log under a custom target (used to tell several recordings apart).
    pub fn with_target(target: &'static str) -> Self {
        Self { target }
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::with_target(Self::DEFAULT_TARGET)
    }
}

impl RecorderObserver for LogObserver {
    fn header_written(&self, path: &Path, format: &PcmFormat) {
        log::debug!(target: self.target, "{}: header written ({format})", path.display());
    }

    fn forward_failed(&self, path: &Path, error: &anyhow::Error) {
        log::warn!(target: self.target, "{}: frame forwarding failed: {error:#}", path.display());
    }

    fn finalized(&self, path: &Path, format: Option<&PcmFormat>, bytes_written: u64) {
        match format {
            Some(format) => log::info!(
                target: self.target,
                "{}: finalized {bytes_written} payload bytes ({format})",
                path.display()
            ),
            None => log::info!(
                target: self.target,
                "{}: finalized with no audio, file left empty",
                path.display()
            ),
        }
    }

    fn finalize_failed(&self, path: &Path, error: &WavError) {
        log::error!(target: self.target, "{}: finalize failed: {error}", path.display());
    }
}
