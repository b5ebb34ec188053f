//! Timer-driven voice recorder.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tourist_safety_timer::{TickControl, TickHandle, spawn_interval};
use tourist_safety_voice_models::{
    ConfigError, RecordedAudio, RecorderConfig, RecorderPhase, RecorderSnapshot,
};

use crate::capture::{AudioCapture, CaptureError};
use crate::session::{CaptureSession, TickOutcome};

/// Elapsed-time tick period.
const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// Called once per finalized recording, after the recorder's lock is
/// released.
pub type CompletionCallback = Arc<dyn Fn(&RecordedAudio) + Send + Sync>;

struct RecorderState {
    session: CaptureSession,
    clock: Option<TickHandle>,
    sampler: Option<TickHandle>,
}

impl RecorderState {
    fn halt_loops(&mut self) {
        for mut handle in [self.clock.take(), self.sampler.take()]
            .into_iter()
            .flatten()
        {
            handle.cancel();
        }
    }

    /// Halts both loops and finalizes the stream.
    fn stop(&mut self) -> (Option<RecordedAudio>, bool) {
        self.halt_loops();
        self.session.finish()
    }
}

struct Inner {
    state: Mutex<RecorderState>,
    capture: Arc<dyn AudioCapture>,
    config: RecorderConfig,
    on_complete: Mutex<Vec<CompletionCallback>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    fn notify(&self, audio: &RecordedAudio) {
        let callbacks = lock(&self.on_complete).clone();
        for callback in &callbacks {
            callback(audio);
        }
    }

    fn start_clock(weak: Weak<Self>) -> TickHandle {
        spawn_interval("voice.clock", CLOCK_PERIOD, move || {
            let Some(inner) = weak.upgrade() else {
                return TickControl::Stop;
            };

            let finished = {
                let mut state = lock(&inner.state);
                match state.session.tick() {
                    TickOutcome::Continue => return TickControl::Continue,
                    TickOutcome::Idle => return TickControl::Stop,
                    TickOutcome::BudgetReached => {
                        log::info!(
                            "Recording reached its {}s budget",
                            state.session.max_duration_secs()
                        );
                        state.stop()
                    }
                }
            };

            if let (Some(audio), true) = finished {
                inner.notify(&audio);
            }
            TickControl::Stop
        })
    }

    fn start_sampler(weak: Weak<Self>, period: Duration) -> TickHandle {
        spawn_interval("voice.sampler", period, move || {
            let Some(inner) = weak.upgrade() else {
                return TickControl::Stop;
            };
            if lock(&inner.state).session.sample() {
                TickControl::Continue
            } else {
                TickControl::Stop
            }
        })
    }
}

/// Bounded-duration recorder with a live waveform.
///
/// While recording, two loops run: a one-second clock that stops the
/// recording when the budget is reached, and a per-frame sampler that
/// refreshes the waveform. Both are halted by [`Self::stop`],
/// [`Self::discard_and_reset`] and by dropping the last clone of the
/// recorder. The capture stream is released on all of those paths.
///
/// Clones share the same recorder.
#[derive(Clone)]
pub struct VoiceRecorder {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for VoiceRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceRecorder")
            .field("config", &self.inner.config)
            .field("session", &lock(&self.inner.state).session)
            .finish_non_exhaustive()
    }
}

impl VoiceRecorder {
    /// Creates a ready recorder.
    ///
    /// # Errors
    ///
    /// * If `config` fails [`RecorderConfig::validate`]
    pub fn new(capture: Arc<dyn AudioCapture>, config: RecorderConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(RecorderState {
                    session: CaptureSession::new(config.max_duration_secs, config.bar_count),
                    clock: None,
                    sampler: None,
                }),
                capture,
                config,
                on_complete: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Registers a callback for finalized recordings.
    pub fn on_complete(&self, callback: impl Fn(&RecordedAudio) + Send + Sync + 'static) {
        lock(&self.inner.on_complete).push(Arc::new(callback));
    }

    /// Recorder configuration.
    #[must_use]
    pub fn config(&self) -> RecorderConfig {
        self.inner.config
    }

    /// Starts recording for at most `max_duration_secs` seconds.
    ///
    /// Starting from a completed recording replaces it.
    ///
    /// # Errors
    ///
    /// * [`CaptureError::AlreadyRecording`] if a recording is in progress
    /// * [`CaptureError::InvalidDuration`] if `max_duration_secs` is zero
    /// * [`CaptureError::PermissionDenied`] or [`CaptureError::NoDevice`]
    ///   if the capture device cannot be acquired
    ///
    /// On error the recorder is left as it was.
    ///
    /// # Panics
    ///
    /// * If called outside a tokio runtime
    pub fn start(&self, max_duration_secs: u32) -> Result<RecorderSnapshot, CaptureError> {
        let mut state = lock(&self.inner.state);
        state.session.check_can_begin(max_duration_secs)?;

        let stream = self.inner.capture.open().inspect_err(|e| {
            log::warn!("Could not start recording: {e}");
        })?;
        state.session.begin(stream, max_duration_secs)?;

        let weak = Arc::downgrade(&self.inner);
        state.clock = Some(Inner::start_clock(weak.clone()));
        state.sampler = Some(Inner::start_sampler(
            weak,
            Duration::from_millis(self.inner.config.sample_period_ms),
        ));

        log::info!("Recording started ({max_duration_secs}s budget)");
        Ok(state.session.snapshot())
    }

    /// Starts recording with the configured budget.
    ///
    /// # Errors
    ///
    /// * See [`Self::start`]
    pub fn start_default(&self) -> Result<RecorderSnapshot, CaptureError> {
        self.start(self.inner.config.max_duration_secs)
    }

    /// Stops recording and returns the finalized audio.
    ///
    /// Idempotent: later calls return the same recording, and the
    /// completion callbacks run only for the call that finalized it.
    /// Returns `None` if nothing was recorded.
    pub fn stop(&self) -> Option<RecordedAudio> {
        let (audio, finalized) = lock(&self.inner.state).stop();
        if finalized {
            if let Some(audio) = &audio {
                log::info!("Recording stopped after {}s", audio.duration_secs);
                self.inner.notify(audio);
            }
        }
        audio
    }

    /// Abandons any live recording and clears the finalized one, elapsed
    /// time and waveform. The budget is kept.
    pub fn discard_and_reset(&self) {
        let mut state = lock(&self.inner.state);
        state.halt_loops();
        state.session.reset();
        log::debug!("Recorder reset");
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> RecorderSnapshot {
        lock(&self.inner.state).session.snapshot()
    }

    /// Lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> RecorderPhase {
        lock(&self.inner.state).session.phase()
    }

    /// The finalized recording, if any.
    #[must_use]
    pub fn recording(&self) -> Option<RecordedAudio> {
        lock(&self.inner.state).session.recorded().cloned()
    }
}
