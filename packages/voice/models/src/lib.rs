#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Voice recorder types.
//!
//! A recording is bounded by a duration budget. While it runs, the recorder
//! keeps a fixed-length amplitude array for the waveform display. Once
//! stopped, the captured audio is exposed as an opaque [`RecordedAudio`]
//! handle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// MIME type of finalized recordings.
pub const RECORDING_MIME_TYPE: &str = "audio/wav";

/// Errors raised by [`RecorderConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A value was configured as zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Name of the offending field.
        field: &'static str,
    },
}

/// Where the recorder is in its lifecycle.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecorderPhase {
    /// Nothing recorded yet, or the last recording was discarded.
    #[default]
    Ready,
    /// Capturing.
    Recording,
    /// A finalized recording is available.
    Complete,
}

impl RecorderPhase {
    /// Returns all phases.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Ready, Self::Recording, Self::Complete]
    }
}

/// Recorder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Recording budget used when the caller does not pass one. Default 30 s.
    pub max_duration_secs: u32,
    /// Waveform sampling period. Default 16 ms (one display frame).
    pub sample_period_ms: u64,
    /// Number of waveform bars. Default 20.
    pub bar_count: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 30,
            sample_period_ms: 16,
            bar_count: 20,
        }
    }
}

impl RecorderConfig {
    /// Checks that every value is non-zero.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Zero`] naming the first zero field
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_duration_secs == 0 {
            return Err(ConfigError::Zero {
                field: "max_duration_secs",
            });
        }
        if self.sample_period_ms == 0 {
            return Err(ConfigError::Zero {
                field: "sample_period_ms",
            });
        }
        if self.bar_count == 0 {
            return Err(ConfigError::Zero { field: "bar_count" });
        }
        Ok(())
    }
}

/// A finalized recording.
///
/// Clones share the same audio bytes. Two handles refer to the same
/// recording when their ids match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedAudio {
    /// Unique recording id.
    pub id: Uuid,
    /// Container format of `bytes`.
    pub mime_type: String,
    /// Encoded audio.
    #[serde(skip)]
    pub bytes: Arc<[u8]>,
    /// Recorded length in whole seconds.
    pub duration_secs: u32,
    /// When the recording was finalized.
    pub recorded_at: DateTime<Utc>,
}

impl RecordedAudio {
    /// Wraps freshly encoded WAV bytes in a new handle stamped with the
    /// current time.
    #[must_use]
    pub fn wav(bytes: impl Into<Arc<[u8]>>, duration_secs: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            mime_type: RECORDING_MIME_TYPE.to_string(),
            bytes: bytes.into(),
            duration_secs,
            recorded_at: Utc::now(),
        }
    }

    /// Size of the encoded audio.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Point-in-time view of a recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderSnapshot {
    /// Lifecycle phase.
    pub phase: RecorderPhase,
    /// Whole seconds recorded.
    pub elapsed_secs: u32,
    /// Recording budget.
    pub max_duration_secs: u32,
    /// Amplitude bars in `[0, 1]`.
    pub waveform: Vec<f32>,
}

impl RecorderSnapshot {
    /// Fraction of the budget used, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.max_duration_secs == 0 {
            return 0.0;
        }
        f64::from(self.elapsed_secs) / f64::from(self.max_duration_secs)
    }

    /// Elapsed time as `m:ss`.
    #[must_use]
    pub fn timer_text(&self) -> String {
        format_clock(self.elapsed_secs)
    }
}

/// Formats whole seconds as `m:ss`.
#[must_use]
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
