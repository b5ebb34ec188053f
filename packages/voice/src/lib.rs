#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Bounded voice capture with a live waveform summary.
//!
//! [`VoiceRecorder`] records from an [`AudioCapture`] backend for at most a
//! given number of seconds while keeping a fixed-length amplitude array up
//! to date for display. It is independent of the panic button and can be
//! composed with it.
//!
//! Backends:
//!
//! * [`SyntheticCapture`]: deterministic generated spectrum, for demos and
//!   tests
//! * [`UnavailableCapture`]: always fails, for devices without capture

pub mod capture;
pub mod recorder;
pub mod session;
pub mod synthetic;
pub mod wav;
pub mod waveform;

pub use capture::{AudioCapture, CaptureError, CaptureStream};
pub use recorder::{CompletionCallback, VoiceRecorder};
pub use session::{CaptureSession, TickOutcome};
pub use synthetic::{SyntheticCapture, UnavailableCapture};
pub use tourist_safety_voice_models as models;
pub use waveform::amplitude_bars;
