use std::sync::mpsc::{self, Receiver, Sender};

/// What a producer tells the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// The player input was edited.
    Change,
    /// Shutdown was requested. Always the last notification sent.
    Terminate,
}

/// Everything the scheduler loop consumes, in receipt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    Notify(Notification),
    /// The periodic ticker fired.
    Tick,
}

/// Producer half handed to the input-edit and shutdown handlers.
///
/// Sending never blocks; a send after the scheduler is gone is dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Sender<SchedulerEvent>,
}

impl Notifier {
    pub fn emit_change(&self) {
        let _ = self.tx.send(SchedulerEvent::Notify(Notification::Change));
    }

    pub fn emit_terminate(&self) {
        let _ = self.tx.send(SchedulerEvent::Notify(Notification::Terminate));
    }
}

/// Build the scheduler's event queue.
///
/// Returns the notifier for UI handlers, a raw sender for the ticker, and the
/// receiver the scheduler loop owns.
pub fn open() -> (Notifier, Sender<SchedulerEvent>, Receiver<SchedulerEvent>) {
    let (tx, rx) = mpsc::channel();
    (Notifier { tx: tx.clone() }, tx, rx)
}
