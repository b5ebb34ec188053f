//! Timer-driven panic button.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tourist_safety_emergency_models::{
    ConfigError, Effect, EmergencyConfig, EmergencySnapshot, TimerId, TimerKind, Transition,
    Trigger,
};
use tourist_safety_timer::{TickControl, TickHandle, spawn_interval};

use crate::machine::EmergencyMachine;

/// Called with no arguments when a session dispatches.
pub type DispatchCallback = Arc<dyn Fn() + Send + Sync>;

/// Called for every phase change, after the button's lock is released.
pub type TransitionObserver = Arc<dyn Fn(&Transition) + Send + Sync>;

struct ButtonState {
    machine: EmergencyMachine,
    hold_timer: Option<(TimerId, TickHandle)>,
    countdown_timer: Option<(TimerId, TickHandle)>,
    hold_started: Option<Instant>,
}

impl ButtonState {
    /// Milliseconds since the current hold began, or zero if none has.
    fn held_ms(&self) -> u64 {
        self.hold_started.map_or(0, |started| {
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
        })
    }

    const fn slot(&mut self, kind: TimerKind) -> &mut Option<(TimerId, TickHandle)> {
        match kind {
            TimerKind::Hold => &mut self.hold_timer,
            TimerKind::Countdown => &mut self.countdown_timer,
        }
    }

    fn stop_timer(&mut self, id: TimerId, kind: TimerKind) {
        let slot = self.slot(kind);
        match slot.take() {
            Some((running, mut handle)) if running == id => {
                log::debug!("Stopping {kind} {id}");
                handle.cancel();
            }
            Some(other) => {
                log::warn!("Asked to stop {kind} {id} but {} is running", other.0);
                *slot = Some(other);
            }
            None => log::debug!("{kind} {id} already stopped"),
        }
    }

    fn stop_all(&mut self) {
        for (_, mut handle) in [self.hold_timer.take(), self.countdown_timer.take()]
            .into_iter()
            .flatten()
        {
            handle.cancel();
        }
    }
}

struct Inner {
    state: Mutex<ButtonState>,
    snapshots: watch::Sender<EmergencySnapshot>,
    on_dispatch: DispatchCallback,
    observers: Mutex<Vec<TransitionObserver>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    fn fire(self: &Arc<Self>, trigger: Trigger) -> EmergencySnapshot {
        self.fire_with(|_| trigger)
    }

    /// Runs one trigger through the machine and applies its effects.
    ///
    /// `make_trigger` sees the state under the same lock the trigger is
    /// applied with. Snapshots are published under that lock, so the
    /// `watch` channel never goes back to an older state. Observers and the
    /// dispatch callback run after the lock is released.
    fn fire_with(
        self: &Arc<Self>,
        make_trigger: impl FnOnce(&ButtonState) -> Trigger,
    ) -> EmergencySnapshot {
        let (snapshot, transitions, dispatch) = {
            let mut state = lock(&self.state);
            let trigger = make_trigger(&state);
            let seen = state.machine.transition_count();
            let mut dispatch = false;

            for effect in state.machine.handle(trigger) {
                match effect {
                    Effect::StartTimer {
                        id,
                        kind,
                        period_ms,
                    } => {
                        let handle = self.start_timer(id, kind, period_ms);
                        if kind == TimerKind::Hold {
                            state.hold_started = Some(Instant::now());
                        }
                        if let Some((previous, _)) = state.slot(kind).replace((id, handle)) {
                            log::warn!("Replaced running {kind} {previous} with {id}");
                        }
                    }
                    Effect::StopTimer { id, kind } => state.stop_timer(id, kind),
                    Effect::OpenConfirmation => log::debug!("Confirmation opened"),
                    Effect::CloseConfirmation => log::debug!("Confirmation closed"),
                    Effect::Dispatch => dispatch = true,
                }
            }

            let snapshot = state.machine.snapshot();
            self.snapshots.send_if_modified(|current| {
                if *current == snapshot {
                    false
                } else {
                    *current = snapshot;
                    true
                }
            });

            let history = state.machine.history();
            let new = usize::try_from(state.machine.transition_count() - seen)
                .unwrap_or(usize::MAX)
                .min(history.len());
            let transitions: Vec<Transition> =
                history.iter().skip(history.len() - new).copied().collect();
            (snapshot, transitions, dispatch)
        };

        if !transitions.is_empty() {
            let observers = lock(&self.observers).clone();
            for transition in &transitions {
                for observer in &observers {
                    observer(transition);
                }
            }
        }

        if dispatch {
            (self.on_dispatch)();
        }

        snapshot
    }

    fn start_timer(self: &Arc<Self>, id: TimerId, kind: TimerKind, period_ms: u64) -> TickHandle {
        let weak: Weak<Self> = Arc::downgrade(self);
        let (name, trigger) = match kind {
            TimerKind::Hold => ("emergency.hold", Trigger::HoldTick(id)),
            TimerKind::Countdown => ("emergency.countdown", Trigger::CountdownTick(id)),
        };

        log::debug!("Starting {kind} {id} every {period_ms}ms");

        spawn_interval(name, Duration::from_millis(period_ms), move || {
            let Some(inner) = weak.upgrade() else {
                return TickControl::Stop;
            };
            inner.fire(trigger);
            TickControl::Continue
        })
    }
}

/// A panic control backed by real timers.
///
/// Holds one [`EmergencyMachine`] behind a mutex, so presses, releases and
/// timer ticks are applied strictly in arrival order. Each button owns its
/// own timers; two buttons never share timer state. Dropping the button
/// cancels every timer it started.
///
/// Methods that can start a timer must be called from within a tokio
/// runtime.
pub struct PanicButton {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PanicButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanicButton")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl PanicButton {
    /// Creates an idle button that calls `on_dispatch` once per dispatched
    /// session.
    ///
    /// # Errors
    ///
    /// * If `config` fails [`EmergencyConfig::validate`]
    pub fn new(
        config: EmergencyConfig,
        on_dispatch: impl Fn() + Send + Sync + 'static,
    ) -> Result<Self, ConfigError> {
        let machine = EmergencyMachine::new(config)?;
        let (snapshots, _) = watch::channel(machine.snapshot());

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ButtonState {
                    machine,
                    hold_timer: None,
                    countdown_timer: None,
                    hold_started: None,
                }),
                snapshots,
                on_dispatch: Arc::new(on_dispatch),
                observers: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Registers an observer for phase changes.
    pub fn on_transition(&self, observer: impl Fn(&Transition) + Send + Sync + 'static) {
        lock(&self.inner.observers).push(Arc::new(observer));
    }

    /// Press-start.
    ///
    /// # Panics
    ///
    /// * If called outside a tokio runtime and the press is accepted
    pub fn press(&self) -> EmergencySnapshot {
        self.inner.fire(Trigger::PressStart)
    }

    /// Release of the control.
    ///
    /// A release at or after the hold duration arms the button even if the
    /// last hold tick has not run yet.
    pub fn release(&self) -> EmergencySnapshot {
        self.inner.fire_with(|state| Trigger::Release {
            held_ms: state.held_ms(),
        })
    }

    /// User cancel.
    pub fn cancel(&self) -> EmergencySnapshot {
        self.inner.fire(Trigger::Cancel)
    }

    /// Dispatches immediately while confirming.
    pub fn confirm_now(&self) -> EmergencySnapshot {
        self.inner.fire(Trigger::ConfirmNow)
    }

    /// Opens the confirmation surface without a hold.
    ///
    /// # Panics
    ///
    /// * If called outside a tokio runtime and the open is accepted
    pub fn open_direct(&self) -> EmergencySnapshot {
        self.inner.fire(Trigger::DirectOpen)
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> EmergencySnapshot {
        lock(&self.inner.state).machine.snapshot()
    }

    /// Receiver that sees every published snapshot change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EmergencySnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// The most recent phase changes, oldest first. At most
    /// [`crate::machine::HISTORY_LIMIT`] are kept.
    #[must_use]
    pub fn history(&self) -> Vec<Transition> {
        lock(&self.inner.state)
            .machine
            .history()
            .iter()
            .copied()
            .collect()
    }

    /// Number of dispatches so far.
    #[must_use]
    pub fn dispatch_count(&self) -> u64 {
        lock(&self.inner.state).machine.dispatch_count()
    }

    /// Timing configuration.
    #[must_use]
    pub fn config(&self) -> EmergencyConfig {
        *lock(&self.inner.state).machine.config()
    }
}

impl Drop for PanicButton {
    fn drop(&mut self) {
        lock(&self.inner.state).stop_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tourist_safety_emergency_models::EmergencyPhase;

    use super::*;

    fn button() -> (PanicButton, Arc<AtomicU32>) {
        let dispatched = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&dispatched);
        let button = PanicButton::new(EmergencyConfig::default(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        (button, dispatched)
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn hold_then_countdown_dispatches_once() {
        let (button, dispatched) = button();

        button.press();
        assert_eq!(button.snapshot().phase, EmergencyPhase::Holding);

        advance(2010).await;
        let snapshot = button.snapshot();
        assert_eq!(snapshot.phase, EmergencyPhase::Confirming);
        assert!(snapshot.confirmation_open);
        assert_eq!(snapshot.countdown_remaining, 5);

        advance(4000).await;
        assert_eq!(button.snapshot().phase, EmergencyPhase::Confirming);
        assert_eq!(button.snapshot().countdown_remaining, 1);
        assert_eq!(dispatched.load(Ordering::SeqCst), 0);

        advance(1000).await;
        assert_eq!(button.snapshot().phase, EmergencyPhase::Dispatched);
        assert!(!button.snapshot().confirmation_open);
        assert_eq!(dispatched.load(Ordering::SeqCst), 1);

        advance(10_000).await;
        assert_eq!(dispatched.load(Ordering::SeqCst), 1);

        let phases: Vec<_> = button.history().iter().map(|t| t.to).collect();
        assert_eq!(phases, [
            EmergencyPhase::Holding,
            EmergencyPhase::Confirming,
            EmergencyPhase::Dispatched,
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn release_at_exactly_the_hold_duration_arms() {
        let (button, dispatched) = button();
        let hold = Duration::from_millis(button.config().hold_duration_ms);
        let release_at = tokio::time::sleep(hold);

        button.press();
        release_at.await;
        let snapshot = button.release();
        assert_eq!(snapshot.phase, EmergencyPhase::Confirming);
        assert_eq!(snapshot.hold_elapsed_ms, 2000);
        assert!(snapshot.confirmation_open);

        advance(5010).await;
        assert_eq!(button.snapshot().phase, EmergencyPhase::Dispatched);
        assert_eq!(dispatched.load(Ordering::SeqCst), 1);
        assert_eq!(
            button
                .history()
                .iter()
                .filter(|t| t.to == EmergencyPhase::Confirming)
                .count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn release_one_tick_before_the_hold_duration_does_not_arm() {
        let (button, dispatched) = button();
        let config = button.config();
        let release_at =
            tokio::time::sleep(Duration::from_millis(config.hold_duration_ms - config.hold_tick_ms));

        button.press();
        release_at.await;
        let snapshot = button.release();
        assert_eq!(snapshot.phase, EmergencyPhase::Idle);
        assert_eq!(snapshot.hold_elapsed_ms, 0);

        advance(10_000).await;
        assert_eq!(button.snapshot().phase, EmergencyPhase::Idle);
        assert_eq!(dispatched.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn early_release_never_dispatches() {
        let (button, dispatched) = button();

        button.press();
        advance(1010).await;
        assert!(button.snapshot().hold_progress > 0.4);

        let snapshot = button.release();
        assert_eq!(snapshot.phase, EmergencyPhase::Idle);
        assert!(snapshot.hold_progress.abs() < f64::EPSILON);

        advance(10_000).await;
        assert_eq!(button.snapshot().phase, EmergencyPhase::Idle);
        assert!(button.snapshot().hold_progress.abs() < f64::EPSILON);
        assert_eq!(dispatched.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_countdown_prevents_dispatch() {
        let (button, dispatched) = button();

        button.press();
        advance(2010).await;
        advance(3000).await;
        assert_eq!(button.snapshot().phase, EmergencyPhase::Confirming);

        let snapshot = button.cancel();
        assert_eq!(snapshot.phase, EmergencyPhase::Idle);
        assert!(!snapshot.confirmation_open);

        advance(30_000).await;
        assert_eq!(dispatched.load(Ordering::SeqCst), 0);
        assert!(
            button
                .history()
                .iter()
                .any(|t| t.to == EmergencyPhase::Cancelled)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_now_stops_the_countdown() {
        let (button, dispatched) = button();

        button.open_direct();
        assert_eq!(button.snapshot().phase, EmergencyPhase::Confirming);

        button.confirm_now();
        assert_eq!(dispatched.load(Ordering::SeqCst), 1);

        advance(10_000).await;
        assert_eq!(dispatched.load(Ordering::SeqCst), 1);
        assert_eq!(button.snapshot().phase, EmergencyPhase::Dispatched);
    }

    #[tokio::test(start_paused = true)]
    async fn new_press_after_dispatch_is_a_new_session() {
        let (button, dispatched) = button();

        button.open_direct();
        button.confirm_now();
        let first = button.snapshot().session;

        button.press();
        assert_eq!(button.snapshot().session, first + 1);
        advance(2010).await;
        advance(5000).await;
        assert_eq!(dispatched.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn two_buttons_do_not_share_timers() {
        let (a, a_dispatched) = button();
        let (b, b_dispatched) = button();

        a.press();
        advance(1000).await;
        b.press();
        advance(1010).await;

        assert_eq!(a.snapshot().phase, EmergencyPhase::Confirming);
        assert_eq!(b.snapshot().phase, EmergencyPhase::Holding);

        b.release();
        advance(5000).await;
        assert_eq!(a_dispatched.load(Ordering::SeqCst), 1);
        assert_eq!(b_dispatched.load(Ordering::SeqCst), 0);
        assert_eq!(b.snapshot().phase, EmergencyPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_button_cancels_timers() {
        let (button, dispatched) = button();

        button.press();
        advance(2010).await;
        drop(button);

        advance(30_000).await;
        assert_eq!(dispatched.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshots_are_published() {
        let (button, _) = button();
        let mut rx = button.subscribe();

        button.press();
        let snapshot = *rx
            .wait_for(|s| s.phase == EmergencyPhase::Confirming)
            .await
            .unwrap();
        assert_eq!(snapshot.countdown_remaining, 5);
        assert!((snapshot.hold_progress - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn published_snapshot_matches_state_under_contention() {
        let (button, _) = button();
        let button = Arc::new(button);
        let rx = button.subscribe();

        let tasks: Vec<_> = (0..4)
            .map(|worker| {
                let button = Arc::clone(&button);
                tokio::spawn(async move {
                    for _ in 0..200 {
                        if worker % 2 == 0 {
                            button.open_direct();
                        } else {
                            button.cancel();
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(*rx.borrow(), button.snapshot());
        button.cancel();
        assert_eq!(*rx.borrow(), button.snapshot());
    }

    #[tokio::test(start_paused = true)]
    async fn observers_see_transitions_in_order() {
        let (button, _) = button();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        button.on_transition(move |transition| {
            sink.lock().unwrap().push(transition.to);
        });

        button.open_direct();
        button.cancel();

        assert_eq!(*seen.lock().unwrap(), [
            EmergencyPhase::Confirming,
            EmergencyPhase::Cancelled,
            EmergencyPhase::Idle,
        ]);
    }
}
