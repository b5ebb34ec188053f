//! Capture backends that need no audio hardware.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tourist_safety_voice_models::RecordedAudio;

use crate::capture::{AudioCapture, CaptureError, CaptureStream};
use crate::wav;

/// Bins per frame for an analyser with a 64-point FFT.
pub const DEFAULT_BIN_COUNT: usize = 32;

/// Deterministic generated spectrum.
///
/// Magnitudes fall off towards high frequencies with a ripple that moves
/// every frame, which is enough to animate a waveform display. Finalized
/// recordings are a quiet tone of the recorded length.
#[derive(Debug, Clone)]
pub struct SyntheticCapture {
    bin_count: usize,
    open_streams: Arc<AtomicUsize>,
}

impl Default for SyntheticCapture {
    fn default() -> Self {
        Self::new(DEFAULT_BIN_COUNT)
    }
}

impl SyntheticCapture {
    /// Creates a backend producing `bin_count` bins per frame.
    #[must_use]
    pub fn new(bin_count: usize) -> Self {
        Self {
            bin_count,
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of streams currently holding the device.
    #[must_use]
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

impl AudioCapture for SyntheticCapture {
    fn open(&self) -> Result<Box<dyn CaptureStream>, CaptureError> {
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        log::debug!("Synthetic capture opened ({} bins)", self.bin_count);

        Ok(Box::new(SyntheticStream {
            bin_count: self.bin_count,
            frame: 0,
            open_streams: Arc::clone(&self.open_streams),
        }))
    }
}

struct SyntheticStream {
    bin_count: usize,
    frame: usize,
    open_streams: Arc<AtomicUsize>,
}

impl CaptureStream for SyntheticStream {
    fn frequency_bin_count(&self) -> usize {
        self.bin_count
    }

    fn read_frequency_data(&mut self, buf: &mut [u8]) {
        let bins = self.bin_count.max(1);
        for (k, slot) in buf.iter_mut().take(self.bin_count).enumerate() {
            let falloff = 255 * (bins - k) / bins;
            let ripple = (self.frame * 7 + k * 13) % 48;
            *slot = u8::try_from(falloff.saturating_sub(ripple)).unwrap_or(u8::MAX);
        }
        self.frame = self.frame.wrapping_add(1);
    }

    fn finish(self: Box<Self>, duration_secs: u32) -> RecordedAudio {
        let samples = wav::SAMPLE_RATE.saturating_mul(duration_secs);
        let samples = usize::try_from(samples).unwrap_or_default();

        let pcm: Vec<u8> = (0..samples)
            .map(|i| {
                let phase = i % 32;
                let triangle = if phase < 16 { phase } else { 32 - phase };
                120 + u8::try_from(triangle).unwrap_or(0)
            })
            .collect();

        RecordedAudio::wav(wav::encode_pcm8_mono(&pcm), duration_secs)
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.open_streams.fetch_sub(1, Ordering::SeqCst);
        log::debug!("Synthetic capture released");
    }
}

/// A backend where capture is never available.
#[derive(Debug, Clone)]
pub struct UnavailableCapture {
    reason: CaptureError,
}

impl UnavailableCapture {
    /// Every open fails with [`CaptureError::PermissionDenied`].
    #[must_use]
    pub const fn permission_denied() -> Self {
        Self {
            reason: CaptureError::PermissionDenied,
        }
    }

    /// Every open fails with [`CaptureError::NoDevice`].
    #[must_use]
    pub const fn no_device() -> Self {
        Self {
            reason: CaptureError::NoDevice,
        }
    }
}

impl AudioCapture for UnavailableCapture {
    fn open(&self) -> Result<Box<dyn CaptureStream>, CaptureError> {
        Err(self.reason.clone())
    }
}
