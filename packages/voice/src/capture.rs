//! Audio capture capability.
//!
//! The recorder never talks to a microphone directly. It asks an
//! [`AudioCapture`] for a [`CaptureStream`], reads frequency-domain frames
//! from it while recording, and finalizes it into a [`RecordedAudio`] when
//! the recording stops. Backends are swapped per platform without touching
//! the recorder.

use tourist_safety_voice_models::RecordedAudio;

/// Why a recording could not start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The runtime refused microphone access.
    #[error("capture unavailable: microphone permission denied")]
    PermissionDenied,

    /// There is no capture device.
    #[error("capture unavailable: no capture device")]
    NoDevice,

    /// A recording is already in progress.
    #[error("a recording is already in progress")]
    AlreadyRecording,

    /// The requested budget is zero seconds.
    #[error("recording duration must be greater than zero")]
    InvalidDuration,
}

impl CaptureError {
    /// Whether the error means capture is unavailable on this device, as
    /// opposed to a misuse of the recorder.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::NoDevice)
    }
}

/// Source of capture streams.
pub trait AudioCapture: Send + Sync {
    /// Acquires the capture device.
    ///
    /// # Errors
    ///
    /// * [`CaptureError::PermissionDenied`] if access was refused
    /// * [`CaptureError::NoDevice`] if there is nothing to capture from
    fn open(&self) -> Result<Box<dyn CaptureStream>, CaptureError>;
}

/// An open capture stream.
///
/// Dropping a stream without calling [`CaptureStream::finish`] releases the
/// device and discards the audio.
pub trait CaptureStream: Send {
    /// Number of frequency bins per frame.
    fn frequency_bin_count(&self) -> usize;

    /// Copies the current frame of byte-scaled frequency magnitudes into
    /// `buf`. Only the first `min(buf.len(), frequency_bin_count())`
    /// entries are written.
    fn read_frequency_data(&mut self, buf: &mut [u8]);

    /// Stops capturing, releases the device and encodes what was captured.
    fn finish(self: Box<Self>, duration_secs: u32) -> RecordedAudio;
}
