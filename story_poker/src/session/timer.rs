//! Local timer capabilities.
//!
//! Timers post a [`TimerEvent`] into the owning session's inbox. They are
//! sovereign over their own session only: nothing outside it can cancel them.
//! A cancelled timer may still have a message in flight, so handlers must
//! re-check state when the event arrives.

use super::messages::{SessionMessage, TimerEvent};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Duration, Instant, interval_at, sleep},
};

/// One-shot timer
#[derive(Debug, Default)]
pub struct Countdown {
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)start; a running countdown is cancelled first
    pub fn start(&mut self, delay: Duration, inbox: mpsc::Sender<SessionMessage>, event: TimerEvent) {
        self.cancel();
        self.task = Some(tokio::spawn(async move {
            sleep(delay).await;
            let _ = inbox.send(SessionMessage::Timer(event)).await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Periodic timer; the first tick fires one period after start
#[derive(Debug, Default)]
pub struct Ticker {
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, period: Duration, inbox: mpsc::Sender<SessionMessage>, event: TimerEvent) {
        self.cancel();
        self.task = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;
                if inbox.send(SessionMessage::Timer(event)).await.is_err() {
                    break;
                }
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect_timer(message: Option<SessionMessage>) -> TimerEvent {
        match message {
            Some(SessionMessage::Timer(event)) => event,
            other => panic!("expected timer message, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_fires_once() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut countdown = Countdown::new();
        countdown.start(Duration::from_secs(5), tx, TimerEvent::RevealElapsed);
        assert!(countdown.is_running());

        let started = Instant::now();
        assert_eq!(expect_timer(rx.recv().await), TimerEvent::RevealElapsed);
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_countdown_is_silent() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut countdown = Countdown::new();
        countdown.start(Duration::from_secs(5), tx, TimerEvent::RaffleCountdownElapsed);
        countdown.cancel();
        assert!(!countdown.is_running());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_repeats() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut ticker = Ticker::new();
        ticker.start(Duration::from_secs(1), tx, TimerEvent::BreakTick);

        let started = Instant::now();
        for _ in 0..3 {
            assert_eq!(expect_timer(rx.recv().await), TimerEvent::BreakTick);
        }
        assert!(started.elapsed() >= Duration::from_secs(3));

        drop(ticker);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
