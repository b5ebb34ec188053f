//! Voice-note recording with a live waveform.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tourist_safety_cli_utils::{MultiProgress, recording_bar, waveform_text};
use tourist_safety_voice::models::{RecordedAudio, RecorderPhase};
use tourist_safety_voice::{AudioCapture, SyntheticCapture, UnavailableCapture, VoiceRecorder};

use crate::config::AppConfig;

/// Redraw period for the recording bar.
const REDRAW: Duration = Duration::from_millis(100);

/// Recording options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordOptions {
    /// Budget in seconds. Defaults to the configured budget.
    pub seconds: Option<u32>,
    /// Stop early after this many seconds.
    pub stop_after: Option<u64>,
    /// Simulate a device that refuses microphone access.
    pub deny: bool,
    /// Print the recording handle as JSON.
    pub json: bool,
}

/// Records one voice note.
///
/// An unavailable microphone is reported and is not an error.
///
/// # Errors
///
/// Returns an error if the configuration or requested budget is invalid,
/// or if JSON serialization fails.
pub async fn run(
    multi: &MultiProgress,
    config: &AppConfig,
    options: RecordOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let capture: Arc<dyn AudioCapture> = if options.deny {
        Arc::new(UnavailableCapture::permission_denied())
    } else {
        Arc::new(SyntheticCapture::default())
    };

    let recorder = VoiceRecorder::new(capture, config.recorder)?;
    let budget = options.seconds.unwrap_or(config.recorder.max_duration_secs);

    match recorder.start(budget) {
        Ok(_) => {}
        Err(e) if e.is_unavailable() => {
            println!("Voice capture unavailable: {e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let Some(audio) = follow(multi, &recorder, budget, options.stop_after).await else {
        println!("Nothing was recorded.");
        return Ok(());
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&audio)?);
    } else {
        println!(
            "Recorded {} ({}s, {} bytes, {}) at {}",
            audio.id,
            audio.duration_secs,
            audio.size_bytes(),
            audio.mime_type,
            audio.recorded_at.to_rfc3339()
        );
    }

    Ok(())
}

/// Shows a live recording bar until `recorder` stops, stopping it after
/// `stop_after` seconds if given. Returns the finalized recording.
pub async fn follow(
    multi: &MultiProgress,
    recorder: &VoiceRecorder,
    budget: u32,
    stop_after: Option<u64>,
) -> Option<RecordedAudio> {
    let bar = recording_bar(multi, budget);
    let started = Instant::now();
    let mut redraw = tokio::time::interval(REDRAW);

    loop {
        redraw.tick().await;

        let snapshot = recorder.snapshot();
        bar.set_position(u64::from(snapshot.elapsed_secs));
        bar.set_message(format!(
            "{} {}",
            snapshot.timer_text(),
            waveform_text(&snapshot.waveform)
        ));

        if snapshot.phase != RecorderPhase::Recording {
            break;
        }
        if stop_after.is_some_and(|secs| started.elapsed() >= Duration::from_secs(secs)) {
            recorder.stop();
        }
    }

    bar.finish_and_clear();
    recorder.stop()
}
