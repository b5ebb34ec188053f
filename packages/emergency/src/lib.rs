#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Panic-button hold → confirm → dispatch.
//!
//! [`EmergencyMachine`] is the deterministic state machine. [`PanicButton`]
//! drives one machine with real interval timers, publishes snapshots on a
//! `watch` channel and calls the dispatch callback exactly once per
//! dispatched session.
//!
//! ```text
//! idle ──press──▶ holding ──hold complete──▶ confirming ──countdown 0──▶ dispatched
//!   ▲               │                         │   ▲
//!   └───release─────┘                  cancel │   └── direct open (from idle/dispatched)
//!   ▲                                         ▼
//!   └──────────────────────────────────── cancelled
//! ```

pub mod button;
pub mod machine;

pub use button::{DispatchCallback, PanicButton, TransitionObserver};
pub use machine::{COUNTDOWN_TICK_MS, EmergencyMachine, HISTORY_LIMIT};
pub use tourist_safety_emergency_models as models;
