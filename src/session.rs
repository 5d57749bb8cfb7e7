//! Background recording session.
//!
//! [`RecordingSession`] moves a [`StreamingWavWriter`] onto a dedicated
//! thread and feeds it [`PcmFrame`]s over a `std::sync::mpsc` channel, so the
//! audio callback never touches the disk.
//!
//! ```text
//! cpal callback ──PcmFrame──▶ mpsc ──▶ "wav-writer" thread ──▶ writer.ingest
//!                                            │
//! RecordingSession::finish ──stop flag──────▶ drain queue → finalize → summary
//! ```
//!
//! `finish` is a barrier: every frame queued before it was called is written
//! before the header is backfilled.  Frames arrive in channel order, which
//! is also the write order.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::wav::{PcmFormat, PcmFrame, StreamingWavWriter, WavError};

/// How often the idle writer thread checks the stop flag.
const STOP_POLL: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// RecordingSummary
// ---------------------------------------------------------------------------

/// Outcome of a finished recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    pub path: PathBuf,
    /// `None` when no frame was ever received (the file is empty).
    pub format: Option<PcmFormat>,
    /// Payload bytes in the `data` chunk.
    pub bytes_written: u64,
    /// Number of frames ingested.
    pub frames: u64,
    pub duration_secs: f64,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

struct WorkerOutcome {
    writer: StreamingWavWriter,
    frames: u64,
    error: Option<WavError>,
}

fn run_worker(
    mut writer: StreamingWavWriter,
    rx: mpsc::Receiver<PcmFrame>,
    stop: Arc<AtomicBool>,
) -> WorkerOutcome {
    let mut frames = 0u64;
    let mut ingest = |writer: &mut StreamingWavWriter, frame: PcmFrame| -> Result<(), WavError> {
        writer.ingest(&frame)?;
        frames += 1;
        Ok(())
    };

    let error = loop {
        if stop.load(Ordering::Acquire) {
            // Drain everything already queued, then stop.
            let drained: Result<(), WavError> =
                rx.try_iter().try_for_each(|frame| ingest(&mut writer, frame));
            break drained.err();
        }

        match rx.recv_timeout(STOP_POLL) {
            Ok(frame) => {
                if let Err(e) = ingest(&mut writer, frame) {
                    break Some(e);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break None,
        }
    };

    if let Some(e) = &error {
        log::error!(
            "session: ingest into {} failed, no further frames accepted: {e}",
            writer.path().display()
        );
    }

    WorkerOutcome {
        writer,
        frames,
        error,
    }
}

// ---------------------------------------------------------------------------
// RecordingSession
// ---------------------------------------------------------------------------

/// A writer running on its own thread.
///
/// Dropping the session without [`finish`](Self::finish) still drains and
/// finalizes; errors are then only logged.
pub struct RecordingSession {
    path: PathBuf,
    tx: Option<mpsc::Sender<PcmFrame>>,
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<WorkerOutcome>>,
}

impl RecordingSession {
    /// Spawn the writer thread.
    pub fn start(writer: StreamingWavWriter) -> Result<Self> {
        let path = writer.path().to_path_buf();
        let (tx, rx) = mpsc::channel::<PcmFrame>();
        let stop = Arc::new(AtomicBool::new(false));

        let worker_stop = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name("wav-writer".into())
            .spawn(move || run_worker(writer, rx, worker_stop))
            .context("failed to spawn wav-writer thread")?;

        log::info!("session: recording to {}", path.display());

        Ok(Self {
            path,
            tx: Some(tx),
            stop,
            worker: Some(worker),
        })
    }

    /// Open `path` and start a session with the default writer settings.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let writer = StreamingWavWriter::create(path)
            .with_context(|| format!("opening {}", path.display()))?;
        Self::start(writer)
    }

    /// A sender for producers such as [`AudioCapture::start`](crate::audio::AudioCapture::start).
    ///
    /// Returns `None` once the session has been finished.
    pub fn sender(&self) -> Option<mpsc::Sender<PcmFrame>> {
        self.tx.clone()
    }

    /// Queue one frame.
    ///
    /// Fails when the writer thread has stopped after an ingest error.
    pub fn send(&self, frame: PcmFrame) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| anyhow!("recording session already finished"))?;
        tx.send(frame)
            .map_err(|_| anyhow!("writer thread for {} has stopped", self.path.display()))
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain queued frames, finalize the file and report what was written.
    ///
    /// # Errors
    ///
    /// The first ingest error (the file is still finalized with every frame
    /// written before it), a finalize error, or a panicked writer thread.
    pub fn finish(mut self) -> Result<RecordingSummary> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<RecordingSummary> {
        let worker = self
            .worker
            .take()
            .ok_or_else(|| anyhow!("recording session already finished"))?;

        self.tx = None;
        self.stop.store(true, Ordering::Release);

        let WorkerOutcome {
            mut writer,
            frames,
            error,
        } = worker
            .join()
            .map_err(|_| anyhow!("wav-writer thread panicked"))?;

        let finalized = writer
            .finalize()
            .with_context(|| format!("finalizing {}", self.path.display()));

        if let Some(e) = error {
            if let Err(fin) = finalized {
                log::error!("session: {fin:#}");
            }
            return Err(anyhow::Error::new(e)
                .context(format!("recording to {} failed", self.path.display())));
        }
        finalized?;

        Ok(RecordingSummary {
            path: self.path.clone(),
            format: writer.format(),
            bytes_written: writer.bytes_written(),
            frames,
            duration_secs: writer.duration_secs(),
        })
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.shutdown() {
                log::error!("session: {e:#}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
