//! Recording state without timers.
//!
//! [`CaptureSession`] holds everything one recording needs: the open stream,
//! the elapsed clock, the waveform and, once stopped, the finalized audio.
//! The [`VoiceRecorder`](crate::VoiceRecorder) drives it from its timers.

use tourist_safety_voice_models::{RecordedAudio, RecorderPhase, RecorderSnapshot};

use crate::capture::{CaptureError, CaptureStream};
use crate::waveform::amplitude_bars;

/// Result of one elapsed-time tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still under budget.
    Continue,
    /// Elapsed time just reached the budget; the recording must stop.
    BudgetReached,
    /// Nothing is recording.
    Idle,
}

/// One recorder's capture state.
pub struct CaptureSession {
    max_duration_secs: u32,
    bar_count: usize,
    elapsed_secs: u32,
    waveform: Vec<f32>,
    buffer: Vec<u8>,
    stream: Option<Box<dyn CaptureStream>>,
    recorded: Option<RecordedAudio>,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("phase", &self.phase())
            .field("elapsed_secs", &self.elapsed_secs)
            .field("max_duration_secs", &self.max_duration_secs)
            .field("recorded", &self.recorded)
            .finish_non_exhaustive()
    }
}

impl CaptureSession {
    /// Creates a ready session.
    #[must_use]
    pub fn new(max_duration_secs: u32, bar_count: usize) -> Self {
        Self {
            max_duration_secs,
            bar_count,
            elapsed_secs: 0,
            waveform: vec![0.0; bar_count],
            buffer: Vec::new(),
            stream: None,
            recorded: None,
        }
    }

    /// Lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> RecorderPhase {
        if self.stream.is_some() {
            RecorderPhase::Recording
        } else if self.recorded.is_some() {
            RecorderPhase::Complete
        } else {
            RecorderPhase::Ready
        }
    }

    /// Whether a stream is open.
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Recording budget in seconds.
    #[must_use]
    pub const fn max_duration_secs(&self) -> u32 {
        self.max_duration_secs
    }

    /// Whole seconds recorded.
    #[must_use]
    pub const fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// The finalized recording, if any.
    #[must_use]
    pub const fn recorded(&self) -> Option<&RecordedAudio> {
        self.recorded.as_ref()
    }

    /// Checks whether a recording of `max_duration_secs` may begin.
    ///
    /// # Errors
    ///
    /// * [`CaptureError::AlreadyRecording`] if a stream is open
    /// * [`CaptureError::InvalidDuration`] if `max_duration_secs` is zero
    pub const fn check_can_begin(&self, max_duration_secs: u32) -> Result<(), CaptureError> {
        if self.is_recording() {
            return Err(CaptureError::AlreadyRecording);
        }
        if max_duration_secs == 0 {
            return Err(CaptureError::InvalidDuration);
        }
        Ok(())
    }

    /// Starts recording into `stream`, replacing any earlier recording.
    ///
    /// # Errors
    ///
    /// * See [`Self::check_can_begin`]. On error `stream` is dropped.
    pub fn begin(
        &mut self,
        stream: Box<dyn CaptureStream>,
        max_duration_secs: u32,
    ) -> Result<(), CaptureError> {
        self.check_can_begin(max_duration_secs)?;

        self.reset();
        self.max_duration_secs = max_duration_secs;
        self.buffer = vec![0; stream.frequency_bin_count()];
        self.stream = Some(stream);
        Ok(())
    }

    /// Advances the elapsed clock by one second.
    ///
    /// The increment and the budget check happen together, so elapsed time
    /// never exceeds the budget.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_recording() {
            return TickOutcome::Idle;
        }
        if self.elapsed_secs < self.max_duration_secs {
            self.elapsed_secs += 1;
        }
        if self.elapsed_secs >= self.max_duration_secs {
            TickOutcome::BudgetReached
        } else {
            TickOutcome::Continue
        }
    }

    /// Reads one frame from the stream into the waveform. Returns `false`
    /// when nothing is recording.
    pub fn sample(&mut self) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };
        stream.read_frequency_data(&mut self.buffer);
        self.waveform = amplitude_bars(&self.buffer, self.bar_count);
        true
    }

    /// Finalizes the open stream, if any.
    ///
    /// Returns the recording and whether this call produced it. Calling it
    /// again returns the same recording with `false`.
    pub fn finish(&mut self) -> (Option<RecordedAudio>, bool) {
        let Some(stream) = self.stream.take() else {
            return (self.recorded.clone(), false);
        };

        let audio = stream.finish(self.elapsed_secs);
        log::info!(
            "Recording {} finalized ({}s, {} bytes)",
            audio.id,
            audio.duration_secs,
            audio.size_bytes()
        );
        self.recorded = Some(audio.clone());
        (Some(audio), true)
    }

    /// Drops any open stream and clears the recording, elapsed time and
    /// waveform. The budget is kept.
    pub fn reset(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("Discarding live recording");
        }
        self.recorded = None;
        self.elapsed_secs = 0;
        self.waveform = vec![0.0; self.bar_count];
        self.buffer.clear();
    }

    /// Point-in-time view.
    #[must_use]
    pub fn snapshot(&self) -> RecorderSnapshot {
        RecorderSnapshot {
            phase: self.phase(),
            elapsed_secs: self.elapsed_secs,
            max_duration_secs: self.max_duration_secs,
            waveform: self.waveform.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::capture::AudioCapture as _;
    use crate::synthetic::SyntheticCapture;

    use super::*;

    fn recording(max: u32) -> (CaptureSession, SyntheticCapture) {
        let capture = SyntheticCapture::default();
        let mut session = CaptureSession::new(30, 20);
        session.begin(capture.open().unwrap(), max).unwrap();
        (session, capture)
    }

    #[test]
    fn elapsed_never_exceeds_budget() {
        let (mut session, _) = recording(3);
        assert_eq!(session.tick(), TickOutcome::Continue);
        assert_eq!(session.tick(), TickOutcome::Continue);
        assert_eq!(session.tick(), TickOutcome::BudgetReached);
        assert_eq!(session.elapsed_secs(), 3);
        assert_eq!(session.tick(), TickOutcome::BudgetReached);
        assert_eq!(session.elapsed_secs(), 3);
    }

    #[test]
    fn finish_is_idempotent() {
        let (mut session, capture) = recording(10);
        session.tick();

        let (first, produced) = session.finish();
        assert!(produced);
        let (second, produced_again) = session.finish();
        assert!(!produced_again);
        assert_eq!(first, second);
        assert_eq!(first.map(|a| a.duration_secs), Some(1));
        assert_eq!(session.phase(), RecorderPhase::Complete);
        assert_eq!(capture.open_streams(), 0);
    }

    #[test]
    fn begin_rejects_double_start_and_zero_budget() {
        let (mut session, capture) = recording(10);
        let extra = capture.open().unwrap();
        assert_eq!(
            session.begin(extra, 10),
            Err(CaptureError::AlreadyRecording)
        );
        assert_eq!(capture.open_streams(), 1);

        let mut idle = CaptureSession::new(30, 20);
        assert_eq!(
            idle.begin(capture.open().unwrap(), 0),
            Err(CaptureError::InvalidDuration)
        );
        assert_eq!(idle.phase(), RecorderPhase::Ready);
    }

    #[test]
    fn sample_fills_the_waveform() {
        let (mut session, _) = recording(10);
        assert!(session.sample());
        let waveform = session.snapshot().waveform;
        assert_eq!(waveform.len(), 20);
        assert!(waveform.iter().all(|bar| (0.0..=1.0).contains(bar)));
        assert!(waveform.iter().any(|bar| *bar > 0.0));

        session.finish();
        assert!(!session.sample());
    }

    #[test]
    fn reset_keeps_budget_and_releases_stream() {
        let (mut session, capture) = recording(12);
        session.tick();
        session.sample();
        session.reset();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, RecorderPhase::Ready);
        assert_eq!(snapshot.elapsed_secs, 0);
        assert_eq!(snapshot.max_duration_secs, 12);
        assert!(snapshot.waveform.iter().all(|bar| bar.abs() < f32::EPSILON));
        assert!(session.recorded().is_none());
        assert_eq!(capture.open_streams(), 0);
    }
}
