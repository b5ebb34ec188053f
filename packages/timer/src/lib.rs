#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cancellable scheduled ticks.
//!
//! Every repeating timer in the workspace (hold progress, countdown,
//! recording clock, waveform sampler) is started through
//! [`spawn_interval`], which returns a [`TickHandle`] guard. The guard owns
//! the timer: cancelling or dropping it stops the underlying task, so a
//! timer can never outlive the state that started it.
//!
//! Ticks are delivered on a tokio task. On a current-thread runtime this is
//! the cooperative, single-threaded event loop the state machines expect.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Shortest period a timer may run at.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// What a tick callback wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    /// Keep ticking.
    Continue,
    /// Stop this timer.
    Stop,
}

/// Owning guard for a running timer.
///
/// Dropping the guard cancels the timer.
#[derive(Debug)]
pub struct TickHandle {
    name: &'static str,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TickHandle {
    /// Stops the timer. Safe to call more than once.
    ///
    /// Once this returns, the tick callback will not start again. It is
    /// safe to call from inside the timer's own callback.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            log::trace!("Cancelling timer {}", self.name);
            self.token.cancel();
            task.abort();
        }
    }

    /// Whether [`Self::cancel`] has been called or the guard was created
    /// from a cancelled token.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the timer task has exited (stopped itself or was cancelled).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Starts a timer that calls `on_tick` every `period`.
///
/// The first tick fires one full period after the call, not immediately.
/// Missed ticks are delivered in a burst so that tick counts track elapsed
/// time. Periods shorter than 1 ms are raised to 1 ms.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn spawn_interval<F>(name: &'static str, period: Duration, mut on_tick: F) -> TickHandle
where
    F: FnMut() -> TickControl + Send + 'static,
{
    let period = period.max(MIN_PERIOD);
    let token = CancellationToken::new();
    let cancelled = token.clone();

    log::trace!("Starting timer {name} every {period:?}");

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                biased;
                () = cancelled.cancelled() => break,
                _ = interval.tick() => {
                    if cancelled.is_cancelled() {
                        break;
                    }
                    if on_tick() == TickControl::Stop {
                        log::trace!("Timer {name} stopped itself");
                        break;
                    }
                }
            }
        }
    });

    TickHandle {
        name,
        token,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn counter() -> (Arc<AtomicU32>, impl FnMut() -> TickControl + Send + 'static) {
        let count = Arc::new(AtomicU32::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        })
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (count, on_tick) = counter();
        let _handle = spawn_interval("test", Duration::from_millis(100), on_tick);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0, "first tick must not be immediate");

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_ticks() {
        let (count, on_tick) = counter();
        let handle = spawn_interval("test", Duration::from_millis(100), on_tick);

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let (count, on_tick) = counter();
        let mut handle = spawn_interval("test", Duration::from_millis(100), on_tick);

        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn callback_can_stop_its_timer() {
        let count = Arc::new(AtomicU32::new(0));
        let inner = Arc::clone(&count);
        let handle = spawn_interval("test", Duration::from_millis(10), move || {
            if inner.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                TickControl::Stop
            } else {
                TickControl::Continue
            }
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(handle.is_finished());
        assert!(!handle.is_cancelled());
    }
}
