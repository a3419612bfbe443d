use std::time::Instant;

use crate::refresh::{StatusReport, StatusUpdate};

/// How the status line is coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Pending,
    Banned,
    Unbanned,
    Warning,
}

/// UI state, owned and mutated only by the main thread.
pub struct App {
    /// Whether the app should exit on the next loop iteration.
    pub should_quit: bool,
    /// Player id or name being watched.
    pub input: String,
    /// Text of the status line.
    pub status: String,
    pub tone: Tone,
    /// Whether an unban opens the pop-up.
    pub popup_on_unban: bool,
    pub popup_visible: bool,
    /// Newest check generation whose report is on screen.
    pub shown_generation: u64,
    /// When the last report was applied.
    pub last_report: Option<Instant>,
}

impl App {
    pub fn new(input: &str, popup_on_unban: bool) -> Self {
        Self {
            should_quit: false,
            input: strip_line_breaks(input),
            status: String::from("Waiting for first refresh..."),
            tone: Tone::Pending,
            popup_on_unban,
            popup_visible: false,
            shown_generation: 0,
            last_report: None,
        }
    }

    /// Append a typed character. Returns whether the input changed.
    pub fn push_char(&mut self, c: char) -> bool {
        if c == '\r' || c == '\n' {
            return false;
        }
        self.input.push(c);
        true
    }

    /// Insert pasted text with line breaks removed, so a multi-line paste
    /// can't break the single-line layout.
    pub fn insert_str(&mut self, text: &str) -> bool {
        let clean = strip_line_breaks(text);
        if clean.is_empty() {
            return false;
        }
        self.input.push_str(&clean);
        true
    }

    pub fn backspace(&mut self) -> bool {
        self.input.pop().is_some()
    }

    pub fn clear_input(&mut self) -> bool {
        if self.input.is_empty() {
            return false;
        }
        self.input.clear();
        true
    }

    pub fn toggle_popup(&mut self) {
        self.popup_on_unban = !self.popup_on_unban;
    }

    pub fn dismiss_popup(&mut self) {
        self.popup_visible = false;
    }

    /// Show a check's report unless a later check already reported.
    ///
    /// Returns false when the update was stale and dropped.
    pub fn apply(&mut self, update: StatusUpdate) -> bool {
        if update.generation < self.shown_generation {
            return false;
        }
        self.shown_generation = update.generation;
        self.last_report = Some(Instant::now());

        match update.report {
            StatusReport::Checking => {
                self.status = String::from("Checking...");
                self.tone = Tone::Pending;
            }
            StatusReport::StillBanned { player } => {
                self.status = format!("Player {} is still banned!", self.display_name(&player));
                self.tone = Tone::Banned;
            }
            StatusReport::Unbanned { player, username } => {
                log::info!("{player:?} is visible again as {username:?}");
                self.status = format!("Player {} is unbanned!", self.display_name(&username));
                self.tone = Tone::Unbanned;
                if self.popup_on_unban {
                    self.popup_visible = true;
                }
            }
            StatusReport::Failed(message) => {
                self.status = message;
                self.tone = Tone::Warning;
            }
        }
        true
    }

    /// Name to show for a result, with the current input appended when it
    /// differs (an id resolved to a name, or the input moved on).
    fn display_name(&self, name: &str) -> String {
        if name == self.input {
            name.to_string()
        } else {
            format!("{name} ({})", self.input)
        }
    }
}

fn strip_line_breaks(text: &str) -> String {
    text.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}
