//! AMAS console - terminal test client for the AMAS gateway protocol.
//!
//! Without a subcommand this opens the interactive console. `send` and
//! `template` run headless for scripts and smoke tests.

mod app;
mod state;
mod ui;

// Re-use modules from lib.rs (exposed for integration tests)
use amas_console::{bridge, config, logging, models, wire};

use std::io::{self, Write};
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing::{error, info};
use tui_textarea::Input;

use app::{Action, App, AppTab, RequestField};
use config::Config;
use models::Command;
use wire::{round_trip, ReadStrategy};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gateway host
    #[arg(long, global = true, value_name = "HOST")]
    host: Option<String>,

    /// Gateway port
    #[arg(short, long, global = true, value_name = "PORT")]
    port: Option<u16>,

    /// Timeout for connect + send + receive, in seconds
    #[arg(
        short,
        long,
        global = true,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: Option<u64>,

    /// Read exactly the body length declared in the response header
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    read_full: bool,

    /// Config file (default: <config dir>/amas-console/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Send one request and print the response
    Send {
        /// Command preset whose template is sent when no body is given
        #[arg(long, value_name = "CMD", default_value = "auth")]
        command: Command,

        /// Request JSON
        #[arg(short, long, value_name = "JSON", conflicts_with = "file")]
        body: Option<String>,

        /// Read the request JSON from a file
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Print the request template for a command
    Template {
        /// auth, heartBeat or execute
        command: Command,
    },
}

impl Cli {
    /// Load config and apply flag overrides on top.
    fn resolve_config(&self) -> Result<Config> {
        let config = self.apply_overrides(Config::load(self.config.as_deref())?);
        config.validate()?;
        Ok(config)
    }

    /// Flags win over whatever the file and environment produced.
    fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if self.read_full {
            config.read_strategy = ReadStrategy::DeclaredLength;
        }
        config
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match &cli.command {
        Some(CliCommand::Template { command }) => {
            println!("{}", command.template_text());
            Ok(ExitCode::SUCCESS)
        }
        Some(CliCommand::Send {
            command,
            body,
            file,
        }) => {
            logging::init_stderr_logging()?;
            let config = cli.resolve_config()?;
            run_send(&config, *command, body.clone(), file.clone())
        }
        None => {
            let config = cli.resolve_config()?;
            run_console(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// =============================================================================
// Headless send
// =============================================================================

/// One exchange, display text to stdout.
///
/// Exit status 1 for transport failures, 2 for requests rejected before
/// sending.
fn run_send(
    config: &Config,
    command: Command,
    body: Option<String>,
    file: Option<PathBuf>,
) -> Result<ExitCode> {
    let request_text = match (body, file) {
        (Some(body), _) => body,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read request file {}", path.display()))?,
        (None, None) => command.template_text(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;

    let target = config.target();
    let options = config.exchange_options();

    match runtime.block_on(round_trip(&target, &request_text, &options)) {
        Ok(outcome) => {
            println!("{}", outcome.display_text());
            if outcome.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Err(e) => {
            println!("{}", e);
            Ok(ExitCode::from(2))
        }
    }
}

// =============================================================================
// Terminal console
// =============================================================================

/// Global flag to track if terminal is in raw mode (for panic cleanup)
static TERMINAL_RAW: AtomicBool = AtomicBool::new(false);

/// RAII guard for terminal state management.
/// Ensures terminal is restored to normal state when dropped, even on panic or early return.
struct TerminalGuard;

impl TerminalGuard {
    /// Initialize terminal for TUI mode (raw mode, alternate screen).
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        TERMINAL_RAW.store(true, Ordering::SeqCst);

        // If execute! fails, we must restore terminal state before returning error
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            TERMINAL_RAW.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        TERMINAL_RAW.store(false, Ordering::SeqCst);
    }
}

/// Install a panic hook that restores terminal state before printing panic info.
fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        if TERMINAL_RAW.load(Ordering::SeqCst) {
            // Best effort cleanup - ignore errors
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = io::stdout().flush();
        }
        default_hook(panic_info);
    }));
}

/// Target frame rate for UI rendering (60fps = ~16ms per frame)
const FRAME_DURATION: Duration = Duration::from_millis(16);

fn run_console(config: &Config) -> Result<()> {
    // Install panic hook FIRST for terminal safety
    install_panic_hook();

    logging::init_file_logging(&config.log_dir)?;
    info!(
        "Starting AMAS console v{} (target {})",
        env!("CARGO_PKG_VERSION"),
        config.target()
    );

    // Setup terminal with RAII guard - ensures cleanup on any exit path
    let terminal_guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config)?;

    let result = run_app(&mut terminal, &mut app);

    terminal.show_cursor()?;

    if let Err(e) = result {
        // Drop app first so the exchange worker is told to shut down
        drop(app);
        drop(terminal_guard);
        error!("Application error: {}", e);
        eprintln!("Error: {}", e);
        return Err(e);
    }

    info!("AMAS console exited cleanly");
    Ok(())
}

/// Main application loop.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        // Poll exchange worker (non-blocking)
        app.poll_bridge_responses();

        app.maybe_clear_error();

        // Keep the elapsed counter in the status bar moving
        if app.is_pending() {
            app.mark_dirty();
        }

        // Only redraw if state has changed (dirty-flag optimization)
        if app.take_needs_redraw() {
            terminal.draw(|f| ui::render(f, app))?;
        }

        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
                Event::Resize(_, _) => app.mark_dirty(),
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Global keys first, then the current tab's keys.
fn handle_key(app: &mut App, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::CONTROL) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.update(Action::Quit)
        }
        (KeyCode::F(1), _) => app.update(Action::TabSet(AppTab::Request)),
        (KeyCode::F(2), _) => app.update(Action::TabSet(AppTab::Response)),
        (KeyCode::F(3), _) => app.update(Action::TabSet(AppTab::History)),
        (KeyCode::Char('s'), KeyModifiers::CONTROL) | (KeyCode::F(5), _) => {
            app.update(Action::Send)
        }
        (KeyCode::Esc, _) => app.update(Action::ErrorClear),
        _ => match app.current_tab {
            AppTab::Request => handle_request_key(app, key),
            AppTab::Response => handle_response_key(app, key),
            AppTab::History => handle_history_key(app, key),
        },
    }
}

fn handle_request_key(app: &mut App, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Tab, KeyModifiers::NONE) => app.update(Action::FocusNext),
        (KeyCode::BackTab, _) => app.update(Action::FocusPrev),
        (KeyCode::Char('t'), KeyModifiers::CONTROL) => app.update(Action::TemplateReset),
        _ if app.form.focus == RequestField::Command => match key.code {
            KeyCode::Left | KeyCode::Char('h') => app.update(Action::CommandPrev),
            KeyCode::Right | KeyCode::Char('l') => app.update(Action::CommandNext),
            KeyCode::Enter => app.update(Action::FocusNext),
            _ => {}
        },
        _ => {
            app.form_input(Input::from(key));
        }
    }
}

fn handle_response_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab => app.update(Action::TabNext),
        KeyCode::BackTab => app.update(Action::TabPrev),
        KeyCode::Up | KeyCode::Char('k') => app.update(Action::ResponseScrollUp),
        KeyCode::Down | KeyCode::Char('j') => app.update(Action::ResponseScrollDown),
        KeyCode::PageUp => app.update(Action::ResponsePageUp),
        KeyCode::PageDown => app.update(Action::ResponsePageDown),
        KeyCode::Home | KeyCode::Char('g') => app.update(Action::ResponseScrollTop),
        _ => {}
    }
}

fn handle_history_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab => app.update(Action::TabNext),
        KeyCode::BackTab => app.update(Action::TabPrev),
        KeyCode::Up | KeyCode::Char('k') => app.update(Action::HistorySelectPrev),
        KeyCode::Down | KeyCode::Char('j') => app.update(Action::HistorySelectNext),
        KeyCode::Enter => app.update(Action::HistoryLoad),
        _ => {}
    }
}
