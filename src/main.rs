mod app;
mod channel;
mod credentials;
mod event;
mod logging;
mod osu;
mod refresh;
mod scheduler;
mod target;
mod ticker;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use crossterm::{
    event::{
        self as ct_event, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;
use crate::channel::Notifier;
use crate::event::AppEvent;
use crate::osu::OsuFetcher;
use crate::refresh::{ChannelSink, RefreshExecutor, RetryPolicy};
use crate::scheduler::RefreshSpawner;
use crate::target::Target;
use crate::ticker::Ticker;

#[derive(Parser)]
#[command(name = "unban-watch", about = "osu! unban checker TUI")]
struct Cli {
    /// Player id or name to watch
    #[arg(default_value = "948713")]
    player: String,

    /// File holding your osu! API key
    #[arg(long, default_value = "apikey.txt")]
    api_key_file: PathBuf,

    /// User lookup endpoint
    #[arg(long, default_value = osu::DEFAULT_API_URL)]
    api_url: String,

    /// Quiet period after typing before a check runs, in milliseconds
    #[arg(long, default_value_t = scheduler::DEBOUNCE_WINDOW.as_millis() as u64)]
    debounce_ms: u64,

    /// Interval between background checks, in seconds
    #[arg(long, default_value_t = scheduler::REFRESH_INTERVAL.as_secs())]
    refresh_secs: u64,

    /// Fetch attempts per check before giving up
    #[arg(long, default_value_t = RetryPolicy::default().max_attempts)]
    max_attempts: u32,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Start with the unban pop-up disabled
    #[arg(long)]
    no_popup: bool,

    /// Where to write the log
    #[arg(long, default_value = "unban-watch.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn validate(&self) -> Result<()> {
        if self.debounce_ms == 0 {
            bail!("--debounce-ms must be greater than zero");
        }
        if self.refresh_secs == 0 {
            bail!("--refresh-secs must be greater than zero");
        }
        if self.max_attempts == 0 {
            bail!("--max-attempts must be at least 1");
        }
        if self.timeout_secs == 0 {
            bail!("--timeout-secs must be greater than zero");
        }
        Ok(())
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            ..RetryPolicy::default()
        }
    }
}

/// The pieces the UI thread talks to while it runs.
struct Handles<'a> {
    notifier: &'a Notifier,
    target: &'a Target,
    checker: &'a dyn RefreshSpawner,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.validate()?;
    logging::initialize(&cli.log_file, cli.verbose);

    let mut app = App::new(&cli.player, !cli.no_popup);
    let target = Target::new(app.input.as_str());
    let (tx, rx) = mpsc::channel::<AppEvent>();

    // ── Background machinery ────────────────────────────────────
    let fetcher = OsuFetcher::new(&cli.api_url, Duration::from_secs(cli.timeout_secs))?;
    let executor = Arc::new(RefreshExecutor::new(
        Arc::new(fetcher),
        cli.api_key_file.clone(),
        cli.retry_policy(),
        Arc::new(ChannelSink::new(tx.clone())),
    ));
    let (notifier, tick_tx, sched_rx) = channel::open();
    let ticker = Ticker::start(Duration::from_secs(cli.refresh_secs), tick_tx)?;
    let scheduler = scheduler::spawn(
        sched_rx,
        Duration::from_millis(cli.debounce_ms),
        target.clone(),
        executor.clone(),
    )?;

    // ── Terminal setup ──────────────────────────────────────────
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Panic hook: restore terminal before printing the panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        original_hook(info);
    }));

    // ── Run ─────────────────────────────────────────────────────
    let handles = Handles {
        notifier: &notifier,
        target: &target,
        checker: executor.as_ref(),
    };
    let result = run(&mut terminal, &mut app, tx, rx, &handles);

    // ── Terminal teardown ───────────────────────────────────────
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;

    // ── Shutdown: ticker first, then the one terminate ──────────
    ticker.stop();
    notifier.emit_terminate();
    if scheduler.join().is_err() {
        log::error!("scheduler thread panicked");
    }
    log::info!("shut down");

    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tx: mpsc::Sender<AppEvent>,
    rx: mpsc::Receiver<AppEvent>,
    handles: &Handles,
) -> Result<()> {
    // ── Keyboard + resize thread ────────────────────────────────
    thread::spawn(move || loop {
        match ct_event::read() {
            Ok(Event::Key(key)) => {
                if tx.send(AppEvent::Key(key)).is_err() {
                    break;
                }
            }
            Ok(Event::Paste(text)) => {
                if tx.send(AppEvent::Paste(text)).is_err() {
                    break;
                }
            }
            Ok(Event::Resize(_, _)) => {
                if tx.send(AppEvent::Resize).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(_) => break,
        }
    });

    // ── Main event loop ─────────────────────────────────────────
    terminal.draw(|frame| ui::draw(frame, app))?;

    while let Ok(event) = rx.recv() {
        match event {
            AppEvent::Key(key) => handle_key(app, key, handles),
            AppEvent::Paste(text) => {
                if app.insert_str(&text) {
                    input_changed(app, handles);
                }
            }
            AppEvent::Status(update) => {
                if !app.apply(update) {
                    log::debug!("dropped stale status report");
                }
            }
            AppEvent::Resize => {}
        }

        if app.should_quit {
            break;
        }

        terminal.draw(|frame| ui::draw(frame, app))?;
    }

    Ok(())
}

/// Publish the new input and let the scheduler debounce it.
fn input_changed(app: &App, handles: &Handles) {
    handles.target.set(&app.input);
    handles.notifier.emit_change();
}

fn handle_key(app: &mut App, key: KeyEvent, handles: &Handles) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    let edited = match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.should_quit = true;
            false
        }
        // Any other key, Esc included, only closes the pop-up
        _ if app.popup_visible => {
            app.dismiss_popup();
            false
        }
        (KeyCode::Esc, _) => {
            app.should_quit = true;
            false
        }
        // Check now, bypassing the debounce
        (KeyCode::Enter, _) => {
            handles.checker.spawn_refresh(handles.target.snapshot());
            false
        }
        (KeyCode::Tab, _) => {
            app.toggle_popup();
            false
        }
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => app.clear_input(),
        (KeyCode::Backspace, _) => app.backspace(),
        (KeyCode::Char(c), modifiers)
            if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            app.push_char(c)
        }
        _ => false,
    };

    if edited {
        input_changed(app, handles);
    }
}
