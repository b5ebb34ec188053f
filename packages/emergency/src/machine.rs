//! The panic-button state machine.
//!
//! [`EmergencyMachine`] is pure: it owns no timers and performs no I/O. It
//! consumes [`Trigger`]s and returns the [`Effect`]s the driver must apply.

use std::collections::VecDeque;

use tourist_safety_emergency_models::{
    ConfigError, Effect, EmergencyConfig, EmergencyPhase, EmergencySnapshot, TimerId, TimerKind,
    Transition, Trigger,
};

/// Countdown tick period.
pub const COUNTDOWN_TICK_MS: u64 = 1000;

/// Most recent transitions kept by [`EmergencyMachine::history`].
pub const HISTORY_LIMIT: usize = 64;

/// Deterministic hold → confirm → dispatch state machine.
#[derive(Debug, Clone)]
pub struct EmergencyMachine {
    config: EmergencyConfig,
    phase: EmergencyPhase,
    session: u64,
    hold_elapsed_ms: u64,
    countdown_remaining: u32,
    confirmation_open: bool,
    hold_timer: Option<TimerId>,
    countdown_timer: Option<TimerId>,
    next_timer: u64,
    dispatched_session: Option<u64>,
    dispatch_count: u64,
    history: VecDeque<Transition>,
    transition_count: u64,
}

impl EmergencyMachine {
    /// Creates an idle machine.
    ///
    /// # Errors
    ///
    /// * If `config` fails [`EmergencyConfig::validate`]
    pub fn new(config: EmergencyConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            phase: EmergencyPhase::Idle,
            session: 0,
            hold_elapsed_ms: 0,
            countdown_remaining: 0,
            confirmation_open: false,
            hold_timer: None,
            countdown_timer: None,
            next_timer: 0,
            dispatched_session: None,
            dispatch_count: 0,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
            transition_count: 0,
        })
    }

    /// Timing configuration.
    #[must_use]
    pub const fn config(&self) -> &EmergencyConfig {
        &self.config
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> EmergencyPhase {
        self.phase
    }

    /// Current session number. Zero until the first session begins.
    #[must_use]
    pub const fn session(&self) -> u64 {
        self.session
    }

    /// Hold progress in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hold_progress(&self) -> f64 {
        self.hold_elapsed_ms as f64 / self.config.hold_duration_ms as f64
    }

    /// Whole seconds left on the countdown.
    #[must_use]
    pub const fn countdown_remaining(&self) -> u32 {
        self.countdown_remaining
    }

    /// Number of dispatches across all sessions.
    #[must_use]
    pub const fn dispatch_count(&self) -> u64 {
        self.dispatch_count
    }

    /// The most recent phase changes, oldest first. At most
    /// [`HISTORY_LIMIT`] are kept.
    #[must_use]
    pub const fn history(&self) -> &VecDeque<Transition> {
        &self.history
    }

    /// Number of phase changes since the machine was created, including
    /// those no longer in [`Self::history`].
    #[must_use]
    pub const fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Point-in-time view of the machine.
    #[must_use]
    pub fn snapshot(&self) -> EmergencySnapshot {
        EmergencySnapshot {
            phase: self.phase,
            hold_progress: self.hold_progress(),
            hold_elapsed_ms: self.hold_elapsed_ms,
            countdown_remaining: self.countdown_remaining,
            session: self.session,
            confirmation_open: self.confirmation_open,
        }
    }

    /// Applies `trigger` and returns the effects to carry out, in order.
    ///
    /// Triggers that are not valid in the current phase, and ticks from
    /// timers that are no longer running, are ignored and yield no effects.
    pub fn handle(&mut self, trigger: Trigger) -> Vec<Effect> {
        match (self.phase, trigger) {
            (phase, Trigger::PressStart) if phase.can_begin_session() => self.begin_hold(trigger),
            (EmergencyPhase::Holding, Trigger::HoldTick(id)) if self.hold_timer == Some(id) => {
                self.advance_hold(trigger)
            }
            (EmergencyPhase::Holding, Trigger::Release { held_ms }) => {
                self.release_hold(held_ms, trigger)
            }
            (EmergencyPhase::Holding, Trigger::Cancel) => self.abort_hold(trigger),
            (EmergencyPhase::Confirming, Trigger::CountdownTick(id))
                if self.countdown_timer == Some(id) =>
            {
                self.advance_countdown(trigger)
            }
            (EmergencyPhase::Confirming, Trigger::ConfirmNow) => self.dispatch(trigger),
            (EmergencyPhase::Confirming, Trigger::Cancel) => self.cancel_confirmation(trigger),
            (phase, Trigger::DirectOpen) if phase.can_begin_session() => {
                self.begin_session();
                self.open_confirmation(trigger)
            }
            (phase, trigger) => {
                log::debug!(
                    "Ignoring {} in phase {phase} (session {})",
                    trigger.name(),
                    self.session
                );
                Vec::new()
            }
        }
    }

    const fn issue_timer(&mut self) -> TimerId {
        self.next_timer += 1;
        TimerId(self.next_timer)
    }

    fn transition(&mut self, to: EmergencyPhase, trigger: Trigger) {
        let transition = Transition {
            session: self.session,
            from: self.phase,
            to,
            trigger,
        };
        log::debug!(
            "Session {}: {} -> {} on {}",
            self.session,
            transition.from,
            to,
            trigger.name()
        );
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(transition);
        self.transition_count += 1;
        self.phase = to;
    }

    fn begin_session(&mut self) {
        self.session += 1;
        self.hold_elapsed_ms = 0;
        self.countdown_remaining = 0;
        log::info!("Emergency session {} started", self.session);
    }

    fn begin_hold(&mut self, trigger: Trigger) -> Vec<Effect> {
        self.begin_session();
        let id = self.issue_timer();
        self.hold_timer = Some(id);
        self.transition(EmergencyPhase::Holding, trigger);

        vec![Effect::StartTimer {
            id,
            kind: TimerKind::Hold,
            period_ms: self.config.hold_tick_ms,
        }]
    }

    fn advance_hold(&mut self, trigger: Trigger) -> Vec<Effect> {
        self.hold_elapsed_ms = self
            .hold_elapsed_ms
            .saturating_add(self.config.hold_tick_ms)
            .min(self.config.hold_duration_ms);

        if self.hold_elapsed_ms < self.config.hold_duration_ms {
            return Vec::new();
        }
        self.complete_hold(trigger)
    }

    fn release_hold(&mut self, held_ms: u64, trigger: Trigger) -> Vec<Effect> {
        if held_ms.max(self.hold_elapsed_ms) >= self.config.hold_duration_ms {
            log::debug!(
                "Released after {held_ms}ms, hold of {}ms is complete",
                self.config.hold_duration_ms
            );
            return self.complete_hold(trigger);
        }
        self.abort_hold(trigger)
    }

    fn complete_hold(&mut self, trigger: Trigger) -> Vec<Effect> {
        self.hold_elapsed_ms = self.config.hold_duration_ms;
        let mut effects = self.stop_hold_timer();
        effects.extend(self.open_confirmation(trigger));
        effects
    }

    fn abort_hold(&mut self, trigger: Trigger) -> Vec<Effect> {
        let effects = self.stop_hold_timer();
        self.hold_elapsed_ms = 0;
        self.transition(EmergencyPhase::Idle, trigger);
        effects
    }

    fn open_confirmation(&mut self, trigger: Trigger) -> Vec<Effect> {
        let id = self.issue_timer();
        self.countdown_timer = Some(id);
        self.countdown_remaining = self.config.countdown_secs;
        self.confirmation_open = true;
        self.transition(EmergencyPhase::Confirming, trigger);

        vec![
            Effect::OpenConfirmation,
            Effect::StartTimer {
                id,
                kind: TimerKind::Countdown,
                period_ms: COUNTDOWN_TICK_MS,
            },
        ]
    }

    fn advance_countdown(&mut self, trigger: Trigger) -> Vec<Effect> {
        self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
        if self.countdown_remaining > 0 {
            return Vec::new();
        }
        self.dispatch(trigger)
    }

    fn dispatch(&mut self, trigger: Trigger) -> Vec<Effect> {
        let mut effects = self.close_confirmation();
        self.transition(EmergencyPhase::Dispatched, trigger);

        debug_assert_ne!(
            self.dispatched_session,
            Some(self.session),
            "session dispatched twice"
        );
        if self.dispatched_session == Some(self.session) {
            log::error!(
                "Session {} already dispatched; suppressing duplicate dispatch",
                self.session
            );
            return effects;
        }

        self.dispatched_session = Some(self.session);
        self.dispatch_count += 1;
        log::info!("Emergency session {} dispatched", self.session);
        effects.push(Effect::Dispatch);
        effects
    }

    fn cancel_confirmation(&mut self, trigger: Trigger) -> Vec<Effect> {
        let effects = self.close_confirmation();
        self.transition(EmergencyPhase::Cancelled, trigger);
        self.transition(EmergencyPhase::Idle, trigger);
        log::info!("Emergency session {} cancelled", self.session);
        effects
    }

    fn close_confirmation(&mut self) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(2);
        if let Some(id) = self.countdown_timer.take() {
            effects.push(Effect::StopTimer {
                id,
                kind: TimerKind::Countdown,
            });
        }
        effects.push(Effect::CloseConfirmation);
        self.confirmation_open = false;
        self.countdown_remaining = 0;
        self.hold_elapsed_ms = 0;
        effects
    }

    fn stop_hold_timer(&mut self) -> Vec<Effect> {
        self.hold_timer
            .take()
            .map(|id| Effect::StopTimer {
                id,
                kind: TimerKind::Hold,
            })
            .into_iter()
            .collect()
    }
}
