use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tutor_core::model::AttemptId;

/// One elapsed timer period for a specific attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub attempt: AttemptId,
}

/// Background interval feeding `Tick`s to the quiz controller.
///
/// The task stops when the handle is dropped or cancelled, or when the
/// receiver goes away.
#[derive(Debug)]
pub struct Countdown {
    attempt: AttemptId,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Wall-clock length of one countdown second.
    pub const PERIOD: Duration = Duration::from_secs(1);

    /// Spawn the ticking task on the current tokio runtime.
    #[must_use]
    pub fn spawn(attempt: AttemptId, period: Duration) -> (Self, mpsc::Receiver<Tick>) {
        let period = period.max(Duration::from_millis(1));
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(Tick { attempt }).await.is_err() {
                    break;
                }
            }
        });
        (Self { attempt, handle }, rx)
    }

    #[must_use]
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Stop ticking.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_carry_the_attempt() {
        let attempt = AttemptId::random();
        let (_countdown, mut rx) = Countdown::spawn(attempt, Countdown::PERIOD);

        let started = Instant::now();
        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(Tick { attempt }));
        }
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_closes_the_channel() {
        let (countdown, mut rx) = Countdown::spawn(AttemptId::random(), Countdown::PERIOD);
        assert!(rx.recv().await.is_some());

        countdown.cancel();
        assert_eq!(rx.recv().await, None);
    }
}
