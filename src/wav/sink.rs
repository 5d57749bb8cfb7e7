//! Byte destination behind [`StreamingWavWriter`](crate::wav::StreamingWavWriter).
//!
//! Besides `Write + Seek`, finalize needs to trim, sync and measure the
//! destination, which plain `std::io` traits do not cover.

use std::fs::File;
use std::io::{self, Seek, Write};

pub(crate) trait WavSink: Write + Seek + Send {
    /// Truncate or extend the destination to exactly `len` bytes.
    fn set_len(&self, len: u64) -> io::Result<()>;

    /// Flush data and metadata to stable storage.
    fn sync_all(&self) -> io::Result<()>;

    /// Current length of the destination in bytes.
    fn file_len(&self) -> io::Result<u64>;
}

impl WavSink for File {
    fn set_len(&self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn sync_all(&self) -> io::Result<()> {
        File::sync_all(self)
    }

    fn file_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}
