//! Idle watchdog: one resettable timer per authenticated session.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Sessions expire after 30 minutes without user activity.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// User activity that keeps a session alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySignal {
    PointerMove,
    KeyPress,
    Click,
}

/// Owns the timer task. Dropping the watchdog stops listening and cancels
/// the timer, so a torn-down watchdog can never expire a later session.
pub struct IdleWatchdog {
    activity: mpsc::UnboundedSender<Instant>,
    expired: oneshot::Receiver<()>,
    fired: bool,
    task: JoinHandle<()>,
}

impl IdleWatchdog {
    /// Arm the timer now. Must be called from within a tokio runtime.
    pub fn start(timeout: Duration) -> Self {
        let (activity, mut activity_rx) = mpsc::unbounded_channel::<Instant>();
        let (expired_tx, expired) = oneshot::channel();
        let armed_at = Instant::now();

        let task = tokio::spawn(async move {
            let timer = tokio::time::sleep_until(armed_at + timeout);
            tokio::pin!(timer);

            loop {
                tokio::select! {
                    biased;
                    at = activity_rx.recv() => match at {
                        // Activity recorded after the deadline came too late.
                        Some(at) if at >= timer.deadline() => break,
                        Some(at) => timer.as_mut().reset(at + timeout),
                        None => return,
                    },
                    () = &mut timer => break,
                }
            }

            debug!(timeout_secs = timeout.as_secs(), "Idle timeout elapsed");
            let _ = expired_tx.send(());
        });

        Self {
            activity,
            expired,
            fired: false,
            task,
        }
    }

    /// Reset the timer. The timestamp is taken here, not when the timer
    /// task gets around to processing it.
    pub fn record(&self, signal: ActivitySignal) {
        trace!(?signal, "Activity");
        let _ = self.activity.send(Instant::now());
    }

    /// Whether the timer has elapsed. Stays true once observed.
    pub fn has_expired(&mut self) -> bool {
        if !self.fired && self.expired.try_recv().is_ok() {
            self.fired = true;
        }
        self.fired
    }
}

impl Drop for IdleWatchdog {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance(d: Duration) {
        tokio::time::advance(d).await;
        settle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_without_activity() {
        let mut dog = IdleWatchdog::start(IDLE_TIMEOUT);
        advance(29 * MINUTE).await;
        assert!(!dog.has_expired());
        advance(MINUTE).await;
        assert!(dog.has_expired());
        assert!(dog.has_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_resets_timer() {
        let mut dog = IdleWatchdog::start(IDLE_TIMEOUT);
        dog.record(ActivitySignal::PointerMove);
        settle().await;

        advance(10 * MINUTE).await;
        dog.record(ActivitySignal::KeyPress);
        settle().await;

        advance(25 * MINUTE).await;
        assert!(!dog.has_expired(), "reset at t=10 should hold until t=40");

        advance(6 * MINUTE).await;
        assert!(dog.has_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_signal_kind_resets() {
        let mut dog = IdleWatchdog::start(Duration::from_secs(60));
        for signal in [ActivitySignal::PointerMove, ActivitySignal::KeyPress, ActivitySignal::Click] {
            advance(Duration::from_secs(50)).await;
            dog.record(signal);
            settle().await;
        }
        assert!(!dog.has_expired());
        advance(Duration::from_secs(61)).await;
        assert!(dog.has_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_activity_does_not_revive() {
        let mut dog = IdleWatchdog::start(Duration::from_secs(60));
        // Activity stamped after the deadline.
        tokio::time::advance(Duration::from_secs(61)).await;
        dog.record(ActivitySignal::Click);
        settle().await;
        assert!(dog.has_expired());
    }
}
