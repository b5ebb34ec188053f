#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Panic-button types.
//!
//! An emergency session moves through [`EmergencyPhase`]s in response to
//! [`Trigger`]s. Each accepted trigger yields a list of [`Effect`]s that the
//! driver must carry out (start/stop a timer, open/close the confirmation
//! surface, dispatch). Timers are identified by the [`TimerId`] the state
//! machine issued, so ticks from a timer that has already been stopped can
//! be recognised and dropped.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors raised by [`EmergencyConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A duration was configured as zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The hold tick is longer than the hold itself.
    #[error("hold_tick_ms ({tick_ms}) must not exceed hold_duration_ms ({hold_ms})")]
    TickExceedsHold {
        /// Configured tick period.
        tick_ms: u64,
        /// Configured hold duration.
        hold_ms: u64,
    },
}

/// Phase of an emergency session.
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
pub enum EmergencyPhase {
    /// Nothing in progress.
    #[default]
    Idle,
    /// The panic control is being held down.
    Holding,
    /// The confirmation surface is open and the countdown is running.
    Confirming,
    /// Responders were notified.
    Dispatched,
    /// The user cancelled during confirmation. Transient: the machine
    /// immediately returns to [`Self::Idle`].
    Cancelled,
}

impl EmergencyPhase {
    /// Returns all phases.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Idle,
            Self::Holding,
            Self::Confirming,
            Self::Dispatched,
            Self::Cancelled,
        ]
    }

    /// Whether a new session may start from this phase.
    #[must_use]
    pub const fn can_begin_session(self) -> bool {
        matches!(self, Self::Idle | Self::Dispatched)
    }
}

/// Which of the two session timers a [`TimerId`] belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimerKind {
    /// Hold-progress timer.
    Hold,
    /// Confirmation countdown timer.
    Countdown,
}

/// Identifier of a timer started by the state machine.
///
/// Identifiers are never reused within one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// An input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Trigger {
    /// The panic control was pressed.
    PressStart,
    /// The panic control was released after being held for `held_ms`.
    ///
    /// A release at or past the hold duration completes the hold, even if
    /// the final hold tick has not been delivered yet.
    Release {
        /// How long the control was held, in milliseconds.
        held_ms: u64,
    },
    /// The hold-progress timer ticked.
    HoldTick(TimerId),
    /// The countdown timer ticked (once per second).
    CountdownTick(TimerId),
    /// The user cancelled.
    Cancel,
    /// The user asked for help immediately instead of waiting.
    ConfirmNow,
    /// The confirmation surface was opened without a hold.
    DirectOpen,
}

impl Trigger {
    /// Short name for log output.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PressStart => "press_start",
            Self::Release { .. } => "release",
            Self::HoldTick(_) => "hold_tick",
            Self::CountdownTick(_) => "countdown_tick",
            Self::Cancel => "cancel",
            Self::ConfirmNow => "confirm_now",
            Self::DirectOpen => "direct_open",
        }
    }
}

/// Work the driver must carry out after a transition, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Start a repeating timer that feeds ticks carrying `id`.
    StartTimer {
        /// Identifier to put in every tick.
        id: TimerId,
        /// Timer role.
        kind: TimerKind,
        /// Tick period in milliseconds.
        period_ms: u64,
    },
    /// Stop the timer with `id`. It must not tick again.
    StopTimer {
        /// Identifier of the timer to stop.
        id: TimerId,
        /// Timer role.
        kind: TimerKind,
    },
    /// Show the confirmation surface.
    OpenConfirmation,
    /// Hide the confirmation surface.
    CloseConfirmation,
    /// Notify responders.
    Dispatch,
}

/// A recorded phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Session the change belongs to.
    pub session: u64,
    /// Phase before.
    pub from: EmergencyPhase,
    /// Phase after.
    pub to: EmergencyPhase,
    /// Trigger that caused it.
    pub trigger: Trigger,
}

/// Timing configuration for the panic button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyConfig {
    /// How long the control must be held to arm. Default 2000 ms.
    pub hold_duration_ms: u64,
    /// Hold-progress tick period. Default 50 ms.
    pub hold_tick_ms: u64,
    /// Confirmation countdown length. Default 5 s.
    pub countdown_secs: u32,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            hold_duration_ms: 2000,
            hold_tick_ms: 50,
            countdown_secs: 5,
        }
    }
}

impl EmergencyConfig {
    /// Checks that every duration is usable.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Zero`] if any value is zero
    /// * [`ConfigError::TickExceedsHold`] if the tick is longer than the hold
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.hold_duration_ms == 0 {
            return Err(ConfigError::Zero {
                field: "hold_duration_ms",
            });
        }
        if self.hold_tick_ms == 0 {
            return Err(ConfigError::Zero {
                field: "hold_tick_ms",
            });
        }
        if self.countdown_secs == 0 {
            return Err(ConfigError::Zero {
                field: "countdown_secs",
            });
        }
        if self.hold_tick_ms > self.hold_duration_ms {
            return Err(ConfigError::TickExceedsHold {
                tick_ms: self.hold_tick_ms,
                hold_ms: self.hold_duration_ms,
            });
        }
        Ok(())
    }

    /// Hold duration as a [`Duration`].
    #[must_use]
    pub const fn hold_duration(&self) -> Duration {
        Duration::from_millis(self.hold_duration_ms)
    }

    /// Countdown length as a [`Duration`].
    #[must_use]
    pub fn countdown(&self) -> Duration {
        Duration::from_secs(u64::from(self.countdown_secs))
    }
}

/// Point-in-time view of an emergency session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencySnapshot {
    /// Current phase.
    pub phase: EmergencyPhase,
    /// Hold progress in `[0, 1]`.
    pub hold_progress: f64,
    /// Milliseconds held so far.
    pub hold_elapsed_ms: u64,
    /// Whole seconds left on the countdown.
    pub countdown_remaining: u32,
    /// Session number; increments each time a session begins.
    pub session: u64,
    /// Whether the confirmation surface is open.
    pub confirmation_open: bool,
}

impl Default for EmergencySnapshot {
    fn default() -> Self {
        Self {
            phase: EmergencyPhase::Idle,
            hold_progress: 0.0,
            hold_elapsed_ms: 0,
            countdown_remaining: 0,
            session: 0,
            confirmation_open: false,
        }
    }
}
