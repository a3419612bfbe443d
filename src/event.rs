use crossterm::event::KeyEvent;

use crate::refresh::StatusUpdate;

/// All events funnelled through the UI thread's mpsc channel.
pub enum AppEvent {
    /// A keypress from the keyboard-reading thread.
    Key(KeyEvent),
    /// Bracketed paste into the player input.
    Paste(String),
    /// The terminal was resized; only triggers a re-render.
    Resize,
    /// A background check reported progress or a result.
    Status(StatusUpdate),
}
