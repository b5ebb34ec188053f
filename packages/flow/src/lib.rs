#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Panic button with automatic voice capture.
//!
//! [`EmergencyFlow`] starts a voice note for responders as soon as a
//! session dispatches. The note runs to the recorder's budget unless it is
//! stopped ([`EmergencyFlow::stop_voice_note`]) or abandoned
//! ([`EmergencyFlow::cancel_voice_note`], or dropping the flow). A session
//! cancelled before dispatch never records. Capture failures are logged and
//! remembered; they never hold up the countdown or the dispatch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tourist_safety_emergency::PanicButton;
use tourist_safety_emergency::models::{EmergencyConfig, EmergencyPhase};
use tourist_safety_voice::models::{RecordedAudio, RecorderConfig};
use tourist_safety_voice::{AudioCapture, CaptureError, VoiceRecorder};

/// Invalid flow configuration.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Panic-button timing is invalid.
    #[error(transparent)]
    Emergency(#[from] tourist_safety_emergency::models::ConfigError),
    /// Recorder settings are invalid.
    #[error(transparent)]
    Recorder(#[from] tourist_safety_voice::models::ConfigError),
}

/// Flow configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Record a voice note once a session dispatches. Default on.
    pub auto_record: bool,
    /// Panic-button timing.
    pub emergency: EmergencyConfig,
    /// Recorder settings.
    pub recorder: RecorderConfig,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            auto_record: true,
            emergency: EmergencyConfig::default(),
            recorder: RecorderConfig::default(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A panic button and a voice recorder wired together.
#[derive(Debug)]
pub struct EmergencyFlow {
    button: PanicButton,
    recorder: VoiceRecorder,
    last_recording: Arc<Mutex<Option<RecordedAudio>>>,
    capture_error: Arc<Mutex<Option<CaptureError>>>,
}

impl EmergencyFlow {
    /// Builds the flow.
    ///
    /// # Errors
    ///
    /// * [`FlowError::Emergency`] if the panic-button timing is invalid
    /// * [`FlowError::Recorder`] if the recorder settings are invalid
    pub fn new(
        config: FlowConfig,
        capture: Arc<dyn AudioCapture>,
        on_dispatch: impl Fn() + Send + Sync + 'static,
    ) -> Result<Self, FlowError> {
        let recorder = VoiceRecorder::new(capture, config.recorder)?;
        let button = PanicButton::new(config.emergency, on_dispatch)?;

        let last_recording = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&last_recording);
        recorder.on_complete(move |audio| {
            *lock(&sink) = Some(audio.clone());
        });

        let capture_error = Arc::new(Mutex::new(None));
        if config.auto_record {
            let recorder = recorder.clone();
            let errors = Arc::clone(&capture_error);
            button.on_transition(move |transition| {
                if transition.to != EmergencyPhase::Dispatched {
                    return;
                }
                match recorder.start_default() {
                    Ok(_) => {
                        log::info!("Session {}: recording voice note", transition.session);
                        *lock(&errors) = None;
                    }
                    Err(CaptureError::AlreadyRecording) => {
                        log::debug!(
                            "Session {}: voice note from an earlier session still recording",
                            transition.session
                        );
                    }
                    Err(e) => {
                        log::warn!(
                            "Session {}: recording unavailable, continuing without it: {e}",
                            transition.session
                        );
                        *lock(&errors) = Some(e);
                    }
                }
            });
        }

        Ok(Self {
            button,
            recorder,
            last_recording,
            capture_error,
        })
    }

    /// The panic button.
    #[must_use]
    pub const fn button(&self) -> &PanicButton {
        &self.button
    }

    /// The voice recorder.
    #[must_use]
    pub const fn recorder(&self) -> &VoiceRecorder {
        &self.recorder
    }

    /// Stops the voice note early and returns it. Idempotent; returns the
    /// last note if none is recording.
    pub fn stop_voice_note(&self) -> Option<RecordedAudio> {
        self.recorder.stop()
    }

    /// Abandons the voice note in progress. Nothing is delivered for it and
    /// the microphone is released.
    pub fn cancel_voice_note(&self) {
        self.recorder.discard_and_reset();
    }

    /// Most recent finalized recording.
    #[must_use]
    pub fn last_recording(&self) -> Option<RecordedAudio> {
        lock(&self.last_recording).clone()
    }

    /// Why the most recent automatic recording failed to start, if it did.
    #[must_use]
    pub fn last_capture_error(&self) -> Option<CaptureError> {
        lock(&self.capture_error).clone()
    }
}

impl Drop for EmergencyFlow {
    fn drop(&mut self) {
        self.recorder.discard_and_reset();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use tourist_safety_voice::models::RecorderPhase;
    use tourist_safety_voice::{SyntheticCapture, UnavailableCapture};

    use super::*;

    fn flow(
        config: FlowConfig,
        capture: Arc<dyn AudioCapture>,
    ) -> (EmergencyFlow, Arc<AtomicU32>) {
        let dispatched = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&dispatched);
        let flow = EmergencyFlow::new(config, capture, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        (flow, dispatched)
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn records_after_dispatch_until_the_budget() {
        let (flow, dispatched) = flow(
            FlowConfig::default(),
            Arc::new(SyntheticCapture::default()),
        );

        flow.button().press();
        advance(2010).await;
        assert_eq!(
            flow.button().snapshot().phase,
            EmergencyPhase::Confirming
        );
        assert_eq!(flow.recorder().phase(), RecorderPhase::Ready);

        advance(5000).await;
        assert_eq!(dispatched.load(Ordering::SeqCst), 1);
        assert_eq!(flow.recorder().phase(), RecorderPhase::Recording);

        advance(29_000).await;
        assert_eq!(flow.recorder().phase(), RecorderPhase::Recording);
        assert!(flow.last_recording().is_none());

        advance(1000).await;
        assert_eq!(flow.recorder().phase(), RecorderPhase::Complete);
        let recording = flow.last_recording().unwrap();
        assert_eq!(recording.duration_secs, 30);
        assert_eq!(recording.duration_secs, flow.recorder().config().max_duration_secs);
        assert_eq!(flow.recorder().recording(), Some(recording));
        assert!(flow.last_capture_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn direct_open_dispatch_records_full_note() {
        let (flow, dispatched) = flow(
            FlowConfig::default(),
            Arc::new(SyntheticCapture::default()),
        );

        flow.button().open_direct();
        advance(5010).await;
        assert_eq!(dispatched.load(Ordering::SeqCst), 1);

        advance(30_000).await;
        assert_eq!(flow.last_recording().map(|a| a.duration_secs), Some(30));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_voice_note_ends_it_early() {
        let capture = SyntheticCapture::default();
        let (flow, _) = flow(FlowConfig::default(), Arc::new(capture.clone()));

        flow.button().open_direct();
        flow.button().confirm_now();
        advance(4500).await;

        let note = flow.stop_voice_note().unwrap();
        assert_eq!(note.duration_secs, 4);
        assert_eq!(flow.last_recording(), Some(note.clone()));
        assert_eq!(flow.stop_voice_note(), Some(note));
        assert_eq!(capture.open_streams(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_session_never_records() {
        let capture = SyntheticCapture::default();
        let (flow, dispatched) = flow(FlowConfig::default(), Arc::new(capture.clone()));

        flow.button().open_direct();
        advance(2500).await;
        flow.button().cancel();

        advance(30_000).await;
        assert_eq!(dispatched.load(Ordering::SeqCst), 0);
        assert_eq!(flow.recorder().phase(), RecorderPhase::Ready);
        assert_eq!(capture.open_streams(), 0);
        assert!(flow.last_recording().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_voice_note_discards_it() {
        let capture = SyntheticCapture::default();
        let (flow, _) = flow(FlowConfig::default(), Arc::new(capture.clone()));

        flow.button().open_direct();
        flow.button().confirm_now();
        advance(3000).await;
        flow.cancel_voice_note();

        assert_eq!(flow.recorder().phase(), RecorderPhase::Ready);
        assert_eq!(capture.open_streams(), 0);

        advance(60_000).await;
        assert!(flow.last_recording().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn later_dispatch_keeps_the_running_note() {
        let (flow, dispatched) = flow(
            FlowConfig::default(),
            Arc::new(SyntheticCapture::default()),
        );

        flow.button().open_direct();
        flow.button().confirm_now();
        advance(10_500).await;

        flow.button().open_direct();
        flow.button().confirm_now();
        assert_eq!(dispatched.load(Ordering::SeqCst), 2);
        assert!(flow.last_capture_error().is_none());
        assert_eq!(flow.recorder().snapshot().elapsed_secs, 10);

        advance(20_000).await;
        assert_eq!(flow.last_recording().map(|a| a.duration_secs), Some(30));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_flow_releases_the_microphone() {
        let capture = SyntheticCapture::default();
        let (flow, _) = flow(FlowConfig::default(), Arc::new(capture.clone()));

        flow.button().open_direct();
        flow.button().confirm_now();
        advance(1000).await;
        assert_eq!(capture.open_streams(), 1);

        drop(flow);
        assert_eq!(capture.open_streams(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn denied_capture_still_dispatches() {
        let (flow, dispatched) = flow(
            FlowConfig::default(),
            Arc::new(UnavailableCapture::permission_denied()),
        );

        flow.button().press();
        advance(7010).await;

        assert_eq!(
            flow.button().snapshot().phase,
            EmergencyPhase::Dispatched
        );
        assert_eq!(dispatched.load(Ordering::SeqCst), 1);
        assert_eq!(
            flow.last_capture_error(),
            Some(CaptureError::PermissionDenied)
        );
        assert!(flow.last_recording().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_record_can_be_disabled() {
        let config: FlowConfig = toml::from_str("auto_record = false").unwrap();
        let (flow, dispatched) = flow(config, Arc::new(SyntheticCapture::default()));

        flow.button().open_direct();
        advance(6000).await;

        assert_eq!(dispatched.load(Ordering::SeqCst), 1);
        assert_eq!(flow.recorder().phase(), RecorderPhase::Ready);
        assert!(flow.last_recording().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = FlowConfig {
            recorder: RecorderConfig {
                bar_count: 0,
                ..RecorderConfig::default()
            },
            ..FlowConfig::default()
        };
        let result = EmergencyFlow::new(config, Arc::new(SyntheticCapture::default()), || {});
        assert!(matches!(result, Err(FlowError::Recorder(_))));
    }
}
