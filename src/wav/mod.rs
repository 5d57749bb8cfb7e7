//! Streaming WAV container writer.
//!
//! # Layout
//!
//! ```text
//! PcmFrame ──▶ StreamingWavWriter::ingest ──▶ [header once] + payload ──▶ file
//!                        │
//!                        ├─▶ FrameForwarder (best-effort mirror)
//!                        └─▶ RecorderObserver (lifecycle events)
//!
//! StreamingWavWriter::finalize ──▶ flush → backfill sizes @4, @40 → sync → close
//! ```

pub mod forward;
pub mod frame;
pub mod header;
pub mod observer;
mod sink;
pub mod writer;

pub use forward::FrameForwarder;
pub use frame::{PcmFormat, PcmFrame, PcmSamples};
pub use header::{HEADER_LEN, MAX_DATA_LEN};
pub use observer::{LogObserver, NullObserver, RecorderObserver};
pub use writer::{SharedWavWriter, StreamingWavWriter, WavError, WavWriterBuilder};
