use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::channel::SchedulerEvent;

/// Periodic refresh timer running in its own thread.
///
/// The first tick fires one full `interval` after start. Dropping the handle
/// or calling [`Ticker::stop`] ends the thread; no tick is sent afterwards.
pub struct Ticker {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start(interval: Duration, tx: Sender<SchedulerEvent>) -> Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("ticker".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        log::debug!("tick");
                        if tx.send(SchedulerEvent::Tick).is_err() {
                            break;
                        }
                    }
                    // Explicit stop, or the handle was dropped
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .context("failed to spawn ticker thread")?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Stop the timer and wait for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn fires_repeatedly_at_interval() {
        let (tx, rx) = mpsc::channel();
        let started = Instant::now();
        let ticker = Ticker::start(Duration::from_millis(30), tx).unwrap();

        for _ in 0..3 {
            let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
            assert_eq!(event, SchedulerEvent::Tick);
        }
        assert!(started.elapsed() >= Duration::from_millis(90));
        ticker.stop();
    }

    #[test]
    fn no_ticks_after_stop() {
        let (tx, rx) = mpsc::channel();
        let ticker = Ticker::start(Duration::from_millis(20), tx).unwrap();
        ticker.stop();

        // Drain anything sent before the stop landed
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn first_tick_waits_a_full_interval() {
        let (tx, rx) = mpsc::channel();
        let _ticker = Ticker::start(Duration::from_secs(60), tx).unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
