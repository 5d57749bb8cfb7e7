//! Side-channel forwarding of ingested samples.
//!
//! A [`FrameForwarder`] receives every batch of samples right after it has
//! been queued for the file.  Forwarding is best-effort: the writer contains
//! both returned errors and panics (see [`forward_isolated`]) so a misbehaving
//! consumer can never corrupt the recording.

use std::panic::{self, AssertUnwindSafe};

use super::frame::PcmSamples;

/// Consumer of raw samples mirrored from a [`StreamingWavWriter`](crate::wav::StreamingWavWriter).
pub trait FrameForwarder: Send {
    /// Receive one batch of samples and the frame's source identifier.
    fn forward(&mut self, samples: &PcmSamples, source_id: Option<&str>) -> anyhow::Result<()>;
}

// Compile-time assertion: Box<dyn FrameForwarder> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn FrameForwarder>) {}
};

impl<F> FrameForwarder for F
where
    F: FnMut(&PcmSamples, Option<&str>) -> anyhow::Result<()> + Send,
{
    fn forward(&mut self, samples: &PcmSamples, source_id: Option<&str>) -> anyhow::Result<()> {
        self(samples, source_id)
    }
}

/// Call `forwarder`, turning a panic into an ordinary error.
pub(crate) fn forward_isolated(
    forwarder: &mut dyn FrameForwarder,
    samples: &PcmSamples,
    source_id: Option<&str>,
) -> anyhow::Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(|| forwarder.forward(samples, source_id))) {
        Ok(result) => result,
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".into());
            Err(anyhow::anyhow!("forwarder panicked: {msg}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_is_a_forwarder() {
        let mut seen = 0usize;
        {
            let mut f = |s: &PcmSamples, _id: Option<&str>| -> anyhow::Result<()> {
                seen += s.len();
                Ok(())
            };
            forward_isolated(&mut f, &PcmSamples::I16(vec![1, 2, 3]), None).unwrap();
        }
        assert_eq!(seen, 3);
    }

    #[test]
    fn panic_becomes_error() {
        let mut f = |_: &PcmSamples, _: Option<&str>| -> anyhow::Result<()> {
            panic!("consumer exploded");
        };
        let err = forward_isolated(&mut f, &PcmSamples::U8(vec![]), Some("x")).unwrap_err();
        assert!(err.to_string().contains("consumer exploded"));
    }
}
