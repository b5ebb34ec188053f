#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the tourist safety tools.
//!
//! Provides `indicatif` progress bars for the panic-button hold, the
//! confirmation countdown and voice recording, plus [`init_logger`] which
//! sets up `indicatif-log-bridge` so that `log::info!` and friends are
//! suspended while progress bars redraw.
//!
//! Any binary that calls [`init_logger()`] at startup gets full progress bar
//! support for free.

use indicatif::ProgressStyle;

pub use indicatif::{MultiProgress, ProgressBar};

/// Glyphs for waveform levels, quietest first.
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

/// Bar that fills as the panic control is held, measured in milliseconds.
#[must_use]
pub fn hold_bar(multi: &MultiProgress, hold_ms: u64) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(hold_ms));
    bar.set_style(bar_style("{msg} {wide_bar:.red/dim} {pos}/{len}ms"));
    bar.set_message("Holding");
    bar
}

/// Bar that counts down the confirmation window, in seconds.
#[must_use]
pub fn countdown_bar(multi: &MultiProgress, secs: u32) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(u64::from(secs)));
    bar.set_style(bar_style("{msg} {wide_bar:.yellow/dim} {pos}/{len}s"));
    bar.set_message("Sending alert in");
    bar
}

/// Bar for a recording's elapsed time against its budget. The message slot
/// carries the live waveform.
#[must_use]
pub fn recording_bar(multi: &MultiProgress, max_secs: u32) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(u64::from(max_secs)));
    bar.set_style(bar_style(
        "● REC {msg} {wide_bar:.green/dim} {pos}/{len}s",
    ));
    bar
}

/// Renders amplitudes in `[0, 1]` as a row of block glyphs.
#[must_use]
pub fn waveform_text(bars: &[f32]) -> String {
    bars.iter()
        .map(|amplitude| {
            let clamped = amplitude.clamp(0.0, 1.0);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let level = (clamped * 7.0).round() as usize;
            LEVELS[level.min(LEVELS.len() - 1)]
        })
        .collect()
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    // Build the pretty-env-logger logger manually so we can wrap it.
    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveform_maps_extremes() {
        assert_eq!(waveform_text(&[0.0, 1.0]), "▁█");
        assert_eq!(waveform_text(&[-1.0, 2.0, f32::NAN]).chars().count(), 3);
        assert!(waveform_text(&[]).is_empty());
    }

    #[test]
    fn bars_have_requested_lengths() {
        let multi = MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden());
        assert_eq!(hold_bar(&multi, 2000).length(), Some(2000));
        assert_eq!(countdown_bar(&multi, 5).length(), Some(5));
        assert_eq!(recording_bar(&multi, 30).length(), Some(30));
    }
}
