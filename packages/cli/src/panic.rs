//! Panic-button simulation.
//!
//! Presses the button, releases it after `hold_ms`, and follows the
//! session through the countdown with progress bars until it dispatches or
//! returns to idle. After a dispatch the voice note for responders is
//! followed to its budget, or until `note_secs`.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Sleep;
use tourist_safety_cli_utils::{MultiProgress, countdown_bar, hold_bar};
use tourist_safety_emergency::models::EmergencyPhase;
use tourist_safety_flow::EmergencyFlow;
use tourist_safety_voice::models::RecorderPhase;
use tourist_safety_voice::{AudioCapture, SyntheticCapture, UnavailableCapture};

use crate::config::AppConfig;
use crate::record;

/// How the simulated user behaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicOptions {
    /// How long to keep the control pressed. Defaults to the configured
    /// hold duration.
    pub hold_ms: Option<u64>,
    /// Cancel this many seconds after the confirmation opens.
    pub cancel_after: Option<u64>,
    /// Skip the countdown with "Call Help Now".
    pub now: bool,
    /// Simulate a device that refuses microphone access.
    pub deny_mic: bool,
    /// Stop the voice note after this many seconds.
    pub note_secs: Option<u64>,
}

async fn wait(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Runs one simulated panic session.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub async fn run(
    multi: &MultiProgress,
    config: &AppConfig,
    options: PanicOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let capture: Arc<dyn AudioCapture> = if options.deny_mic {
        Arc::new(UnavailableCapture::permission_denied())
    } else {
        Arc::new(SyntheticCapture::default())
    };

    let flow = EmergencyFlow::new(config.flow(), capture, || {
        log::info!("Responders notified");
    })?;
    let button = flow.button();
    let timing = button.config();
    let hold_ms = options.hold_ms.unwrap_or(timing.hold_duration_ms);

    let mut snapshots = button.subscribe();
    let holding = hold_bar(multi, timing.hold_duration_ms);
    let mut countdown = None;

    let mut release = Some(Box::pin(tokio::time::sleep(Duration::from_millis(hold_ms))));
    let mut cancel = None;
    let mut released = false;

    button.press();

    loop {
        tokio::select! {
            () = wait(&mut release) => {
                release = None;
                released = true;
                log::debug!("Releasing after {hold_ms}ms");
                button.release();
            }
            () = wait(&mut cancel) => {
                cancel = None;
                log::info!("Cancelling");
                button.cancel();
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *snapshots.borrow_and_update();
                holding.set_position(snapshot.hold_elapsed_ms);

                match snapshot.phase {
                    EmergencyPhase::Confirming => {
                        let bar = countdown.get_or_insert_with(|| {
                            holding.finish_with_message("Armed");
                            if options.now {
                                log::info!("Calling for help now");
                            } else if let Some(secs) = options.cancel_after {
                                cancel = Some(Box::pin(tokio::time::sleep(Duration::from_secs(secs))));
                            }
                            countdown_bar(multi, timing.countdown_secs)
                        });
                        bar.set_position(u64::from(
                            timing.countdown_secs - snapshot.countdown_remaining,
                        ));
                        if options.now {
                            button.confirm_now();
                        }
                    }
                    EmergencyPhase::Dispatched => break,
                    EmergencyPhase::Idle if released || countdown.is_some() => break,
                    EmergencyPhase::Idle | EmergencyPhase::Holding | EmergencyPhase::Cancelled => {}
                }
            }
        }
    }

    holding.finish_and_clear();
    if let Some(bar) = countdown {
        bar.finish_and_clear();
    }

    let snapshot = button.snapshot();
    println!("Session {} ended: {}", snapshot.session, snapshot.phase);
    println!("Dispatches: {}", button.dispatch_count());

    let recorder = flow.recorder();
    if recorder.phase() == RecorderPhase::Recording {
        println!("Recording a message for responders...");
        record::follow(
            multi,
            recorder,
            recorder.config().max_duration_secs,
            options.note_secs,
        )
        .await;
    }

    if let Some(recording) = flow.last_recording() {
        println!(
            "Voice note: {} ({}s, {} bytes, {})",
            recording.id,
            recording.duration_secs,
            recording.size_bytes(),
            recording.mime_type
        );
    } else if let Some(e) = flow.last_capture_error() {
        println!("Voice note: unavailable ({e})");
    }

    Ok(())
}
