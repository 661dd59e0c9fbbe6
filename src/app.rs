//! Application state management.
//!
//! This module contains the central `App` struct that holds all console state,
//! and methods for state manipulation.

use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Local;
use tracing::{debug, info, warn};
use tui_textarea::{Input, Key};

use crate::bridge::{BridgeHandle, BridgeResponse, ExchangeJob, ExchangeService};
use crate::config::Config;
use crate::models::{Command, ExchangeRecord, History};
use crate::wire::{ExchangeOptions, ExchangeOutcome, PreparedRequest};

use crate::state::{HistoryViewState, PendingExchange, RequestFormState, ResponseViewState};

pub use crate::state::{Action, AppTab, RequestField};

/// Main application state.
pub struct App<'a> {
    /// Flag to exit the application.
    pub should_quit: bool,

    /// Currently active tab.
    pub current_tab: AppTab,

    /// Last non-fatal error message (displayed in status bar, auto-clears).
    pub last_error: Option<String>,

    /// Timestamp when last_error was set (for auto-clear after 5 seconds).
    last_error_time: Option<Instant>,

    /// Dirty flag - set when UI needs to be redrawn.
    /// Resets to false after each draw.
    needs_redraw: bool,

    // ===== Request Tab State =====
    pub form: RequestFormState<'a>,

    // ===== Response Tab State =====
    pub response: ResponseViewState,

    // ===== History Tab State =====
    pub history: History,
    pub history_view: HistoryViewState,

    // ===== Exchange Worker =====
    /// Timeout and read strategy applied to every exchange.
    pub options: ExchangeOptions,

    /// Handle to the exchange worker thread.
    ///
    /// Uses `Box<dyn ExchangeService>` for dependency injection and testing.
    bridge: Box<dyn ExchangeService>,

    /// Monotonically increasing counter for generating unique request IDs.
    next_request_id: usize,

    /// The exchange currently in flight, if any.
    pub pending: Option<PendingExchange>,
}

impl<'a> App<'a> {
    /// Extra time given to the worker past the exchange timeout before the
    /// pending exchange is abandoned.
    const PENDING_GRACE: Duration = Duration::from_secs(2);

    /// Lines moved by PageUp/PageDown.
    const PAGE_SIZE: usize = 10;

    /// Create the console and start its exchange worker.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let bridge = BridgeHandle::spawn().context("Failed to start exchange worker")?;
        Ok(Self::with_service(config, Box::new(bridge)))
    }

    /// Create the console on top of an existing exchange service.
    pub fn with_service(config: &Config, bridge: Box<dyn ExchangeService>) -> Self {
        Self {
            should_quit: false,
            current_tab: AppTab::Request,
            last_error: None,
            last_error_time: None,
            needs_redraw: true,
            form: RequestFormState::new(&config.target()),
            response: ResponseViewState::default(),
            history: History::new(config.history_limit),
            history_view: HistoryViewState::default(),
            options: config.exchange_options(),
            bridge,
            next_request_id: 0,
            pending: None,
        }
    }

    // ===== Dirty Flag (Rendering Optimization) =====

    /// Mark UI as needing redraw.
    pub fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    /// Check if redraw is needed and reset the flag.
    pub fn take_needs_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    // ===== Error Handling =====

    /// Set a non-fatal error to display in the UI.
    /// Errors auto-clear after 5 seconds.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.last_error_time = Some(Instant::now());
        self.mark_dirty();
    }

    /// Clear the current error.
    pub fn clear_error(&mut self) {
        if self.last_error.is_some() {
            self.last_error = None;
            self.last_error_time = None;
            self.mark_dirty();
        }
    }

    /// Check if error should auto-clear (after 5 seconds).
    pub fn maybe_clear_error(&mut self) {
        const ERROR_DISPLAY_DURATION: Duration = Duration::from_secs(5);

        if let Some(error_time) = self.last_error_time {
            if error_time.elapsed() > ERROR_DISPLAY_DURATION {
                self.clear_error();
            }
        }
    }

    // ===== MVU/Reducer: Centralized State Update =====

    /// Process an action and update application state.
    ///
    /// All user-initiated state mutations go through this method; raw text
    /// entry is the exception and goes through `form_input`.
    pub fn update(&mut self, action: Action) {
        match action {
            // Tab Navigation
            Action::TabNext => self.set_tab(self.current_tab.next()),
            Action::TabPrev => self.set_tab(self.current_tab.prev()),
            Action::TabSet(tab) => self.set_tab(tab),

            // Request Tab
            Action::FocusNext => self.set_focus(self.form.focus.next()),
            Action::FocusPrev => self.set_focus(self.form.focus.prev()),
            Action::CommandNext => self.select_command(self.form.command.next()),
            Action::CommandPrev => self.select_command(self.form.command.prev()),
            Action::TemplateReset => {
                self.form.apply_template();
                self.mark_dirty();
            }
            Action::Send => self.request_send(),

            // Response Tab
            Action::ResponseScrollUp => self.scroll_response_by(-1),
            Action::ResponseScrollDown => self.scroll_response_by(1),
            Action::ResponsePageUp => self.scroll_response_by(-(Self::PAGE_SIZE as isize)),
            Action::ResponsePageDown => self.scroll_response_by(Self::PAGE_SIZE as isize),
            Action::ResponseScrollTop => self.scroll_response_by(isize::MIN),

            // History Tab
            Action::HistorySelectNext => {
                self.history_view.select_next(self.history.len());
                self.mark_dirty();
            }
            Action::HistorySelectPrev => {
                self.history_view.select_prev(self.history.len());
                self.mark_dirty();
            }
            Action::HistoryLoad => self.load_selected_history(),

            // General
            Action::ErrorClear => self.clear_error(),
            Action::Quit => self.should_quit = true,
        }
    }

    // ===== Tab Navigation =====

    /// Set the current tab directly.
    pub fn set_tab(&mut self, tab: AppTab) {
        if self.current_tab != tab {
            self.current_tab = tab;
            self.mark_dirty();
        }
    }

    // ===== Request Form =====

    fn set_focus(&mut self, field: RequestField) {
        if self.form.focus != field {
            self.form.focus = field;
            self.mark_dirty();
        }
    }

    fn select_command(&mut self, command: Command) {
        self.form.select_command(command);
        debug!("Selected command preset {}", command);
        self.mark_dirty();
    }

    /// Feed a key to the focused text field.
    ///
    /// Host and Port are single-line: Enter moves focus on instead of
    /// inserting a newline. Returns whether the input was consumed.
    pub fn form_input(&mut self, input: Input) -> bool {
        if self.form.focus.is_single_line() && input.key == Key::Enter {
            self.update(Action::FocusNext);
            return true;
        }

        let consumed = match self.form.focused_input_mut() {
            Some(textarea) => textarea.input(input),
            None => false,
        };
        if consumed {
            self.mark_dirty();
        }
        consumed
    }

    // ===== Exchange (Async Worker) =====

    /// Generate a new unique request ID.
    fn next_request_id(&mut self) -> usize {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        id
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Validate the form, frame the body and hand it to the worker.
    ///
    /// Bad host/port and invalid JSON are reported without touching the
    /// network.
    pub fn request_send(&mut self) {
        if self.pending.is_some() {
            self.set_error("An exchange is already in progress");
            return;
        }

        let target = match self.form.target() {
            Ok(target) => target,
            Err(message) => {
                self.set_error(message);
                return;
            }
        };

        let request_text = self.form.body_text();
        let request = match PreparedRequest::parse(&request_text) {
            Ok(request) => request,
            Err(e) => {
                let message = e.to_string();
                debug!("Rejected request before sending: {}", message);
                self.response.show(
                    ExchangeOutcome::Failed(message.clone()),
                    target,
                    None,
                    Duration::ZERO,
                );
                self.set_error(message);
                return;
            }
        };

        let request_id = self.next_request_id();
        let pending = PendingExchange {
            request_id,
            started: Instant::now(),
            target: target.clone(),
            command: request.command.clone(),
            request_text,
            framed: request.framed.clone(),
        };
        let job = ExchangeJob {
            request_id,
            target,
            request,
            options: self.options,
        };

        match self.bridge.request_exchange(job) {
            Ok(()) => {
                info!(
                    "Queued exchange {} to {} ({})",
                    request_id,
                    pending.target,
                    pending.command.as_deref().unwrap_or("no cmd")
                );
                self.pending = Some(pending);
                self.mark_dirty();
            }
            Err(e) => self.set_error(format!("Failed to send request: {}", e)),
        }
    }

    /// Drain finished exchanges from the worker (non-blocking).
    ///
    /// Call once per frame. Also abandons a pending exchange that has
    /// outlived its timeout.
    pub fn poll_bridge_responses(&mut self) {
        let deadline = self.options.timeout + Self::PENDING_GRACE;
        if let Some(pending) = &self.pending {
            if pending.started.elapsed() > deadline {
                warn!(
                    "Exchange {} with {} still pending after {:?}, clearing pending state",
                    pending.request_id, pending.target, deadline
                );
                let message = format!(
                    "Exchange with {} timed out ({}s). The worker may be stuck.",
                    pending.target,
                    deadline.as_secs()
                );
                self.pending = None;
                self.set_error(message);
            }
        }

        while let Some(response) = self.bridge.poll_response() {
            self.handle_bridge_response(response);
        }
    }

    fn handle_bridge_response(&mut self, response: BridgeResponse) {
        let is_pending_match = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.request_id == response.request_id);

        if !is_pending_match {
            debug!(
                "Ignoring stale exchange response (request_id={})",
                response.request_id
            );
            return;
        }

        let Some(pending) = self.pending.take() else {
            return;
        };

        info!(
            "Exchange {} finished in {:?} ({})",
            response.request_id,
            response.elapsed,
            if response.outcome.is_success() { "ok" } else { "failed" }
        );

        let record = ExchangeRecord {
            timestamp: Local::now(),
            target: pending.target.clone(),
            command: pending.command.clone(),
            request_text: pending.request_text,
            framed: pending.framed,
            outcome: response.outcome.clone(),
            elapsed: response.elapsed,
        };
        self.history.push(record);
        self.history_view.table_state.select(Some(0));

        self.response.show(
            response.outcome,
            pending.target,
            pending.command,
            response.elapsed,
        );
        self.set_tab(AppTab::Response);
        self.mark_dirty();
    }

    // ===== Response Scrolling =====

    /// Move the response scroll offset, clamped to the content.
    fn scroll_response_by(&mut self, delta: isize) {
        let max_scroll = self.response.line_count().saturating_sub(1);
        let new_scroll = self
            .response
            .scroll
            .saturating_add_signed(delta)
            .min(max_scroll);
        if new_scroll != self.response.scroll {
            self.response.scroll = new_scroll;
            self.mark_dirty();
        }
    }

    // ===== History =====

    pub fn selected_record(&self) -> Option<&ExchangeRecord> {
        self.history_view
            .selected()
            .and_then(|index| self.history.get(index))
    }

    /// Put the selected record's target, request and response back on screen.
    fn load_selected_history(&mut self) {
        let Some(record) = self.selected_record().cloned() else {
            return;
        };

        self.form.set_target(&record.target);
        if let Some(command) = record.command.as_deref().and_then(|c| c.parse().ok()) {
            self.form.command = command;
        }
        self.form.set_body(&record.request_text);
        self.form.focus = RequestField::Body;

        self.response.show(
            record.outcome,
            record.target,
            record.command,
            record.elapsed,
        );
        self.set_tab(AppTab::Request);
        self.mark_dirty();
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
