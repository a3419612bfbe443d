//! Decides *when* a status check runs.
//!
//! Three sources feed one queue: input edits (`Change`), the periodic ticker
//! (`Tick`) and shutdown (`Terminate`). The rules live in [`Debounce`], a plain
//! value driven by `(event, now)` pairs; [`spawn`] runs it on a thread and turns
//! channel receives and timeouts into those inputs.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::channel::{Notification, SchedulerEvent};
use crate::target::Target;

/// Quiet period after the last edit before a check is issued.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);
/// Forced refresh interval when nothing is being typed.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Receives the scheduler's decisions. Implementations must return quickly;
/// the actual check runs elsewhere and is never awaited.
pub trait RefreshSpawner: Send + Sync {
    fn spawn_refresh(&self, identifier: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Nothing pending; ticks are honoured.
    Quiescent,
    /// An edit was seen; a check fires at `deadline` unless another edit
    /// pushes it back. Ticks are ignored.
    Debouncing { deadline: Instant },
    Terminated,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Quiescent => "quiescent",
            State::Debouncing { .. } => "debouncing",
            State::Terminated => "terminated",
        }
    }
}

/// What the loop should do after feeding the machine one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Wait,
    Spawn,
    Exit,
}

#[derive(Debug)]
pub struct Debounce {
    state: State,
    window: Duration,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self {
            state: State::Quiescent,
            window,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// When the pending check is due, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            State::Debouncing { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn on_event(&mut self, event: SchedulerEvent, now: Instant) -> Step {
        match (self.state, event) {
            (State::Terminated, _) => Step::Exit,
            (_, SchedulerEvent::Notify(Notification::Terminate)) => {
                self.state = State::Terminated;
                Step::Exit
            }
            // Entering or staying in Debouncing: the window restarts either way
            (_, SchedulerEvent::Notify(Notification::Change)) => {
                self.state = State::Debouncing {
                    deadline: now + self.window,
                };
                Step::Wait
            }
            (State::Quiescent, SchedulerEvent::Tick) => Step::Spawn,
            (State::Debouncing { .. }, SchedulerEvent::Tick) => Step::Wait,
        }
    }

    /// Called when the receive timed out with no event.
    pub fn on_timeout(&mut self, now: Instant) -> Step {
        match self.state {
            State::Debouncing { deadline } if now >= deadline => {
                self.state = State::Quiescent;
                Step::Spawn
            }
            _ => Step::Wait,
        }
    }
}

/// Start the scheduler thread.
///
/// Spawns the startup refresh right away, then follows [`Debounce`] until a
/// `Terminate` arrives or every sender is gone.
pub fn spawn(
    rx: Receiver<SchedulerEvent>,
    window: Duration,
    target: Target,
    spawner: Arc<dyn RefreshSpawner>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("scheduler".into())
        .spawn(move || run(rx, Debounce::new(window), &target, spawner.as_ref()))
        .context("failed to spawn scheduler thread")
}

fn run(
    rx: Receiver<SchedulerEvent>,
    mut machine: Debounce,
    target: &Target,
    spawner: &dyn RefreshSpawner,
) {
    log::info!("scheduler started, initial refresh");
    spawner.spawn_refresh(target.snapshot());

    loop {
        let received = match machine.deadline() {
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
        };

        let before = machine.state();
        let now = Instant::now();
        let step = match received {
            Ok(event) => machine.on_event(event, now),
            Err(RecvTimeoutError::Timeout) => machine.on_timeout(now),
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("scheduler queue closed without terminate, stopping");
                machine.on_event(SchedulerEvent::Notify(Notification::Terminate), now)
            }
        };
        if before.name() != machine.state().name() {
            log::debug!("scheduler {} -> {}", before.name(), machine.state().name());
        }

        match step {
            Step::Spawn => {
                let identifier = target.snapshot();
                log::info!("scheduling refresh for {identifier:?}");
                spawner.spawn_refresh(identifier);
            }
            Step::Exit => break,
            Step::Wait => {}
        }
    }

    log::info!("scheduler stopped");
}
