//! State management module.
//!
//! This module contains the tab definitions, the MVU/Reducer action types
//! and the per-tab state structs that make up the console.

use std::time::{Duration, Instant};

use ratatui::widgets::TableState;
use tui_textarea::TextArea;

use crate::models::Command;
use crate::wire::{ExchangeOutcome, Target};

pub mod actions;

pub use actions::*;

// =============================================================================
// Tabs
// =============================================================================

/// Application tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTab {
    Request,
    Response,
    History,
}

impl AppTab {
    pub fn all() -> &'static [AppTab] {
        &[AppTab::Request, AppTab::Response, AppTab::History]
    }

    pub fn name(&self) -> &'static str {
        match self {
            AppTab::Request => "Request",
            AppTab::Response => "Response",
            AppTab::History => "History",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            AppTab::Request => AppTab::Response,
            AppTab::Response => AppTab::History,
            AppTab::History => AppTab::Request,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            AppTab::Request => AppTab::History,
            AppTab::Response => AppTab::Request,
            AppTab::History => AppTab::Response,
        }
    }
}

// =============================================================================
// Request Form State
// =============================================================================

/// Focusable fields on the Request tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestField {
    Host,
    Port,
    Command,
    Body,
}

impl RequestField {
    pub fn next(&self) -> Self {
        match self {
            RequestField::Host => RequestField::Port,
            RequestField::Port => RequestField::Command,
            RequestField::Command => RequestField::Body,
            RequestField::Body => RequestField::Host,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            RequestField::Host => RequestField::Body,
            RequestField::Port => RequestField::Host,
            RequestField::Command => RequestField::Port,
            RequestField::Body => RequestField::Command,
        }
    }

    /// Single-line fields swallow Enter instead of inserting a newline.
    pub fn is_single_line(&self) -> bool {
        matches!(self, RequestField::Host | RequestField::Port)
    }
}

/// The operator form: where to send and what.
#[derive(Debug)]
pub struct RequestFormState<'a> {
    pub host: TextArea<'a>,
    pub port: TextArea<'a>,
    pub command: Command,
    pub body: TextArea<'a>,
    pub focus: RequestField,
}

impl<'a> RequestFormState<'a> {
    /// Build the form pre-filled with a target and the `auth` template.
    pub fn new(target: &Target) -> Self {
        let mut host = TextArea::new(vec![target.host.clone()]);
        host.set_placeholder_text("Host (e.g. 127.0.0.1)");
        host.move_cursor(tui_textarea::CursorMove::End);

        let mut port = TextArea::new(vec![target.port.to_string()]);
        port.set_placeholder_text("Port");
        port.move_cursor(tui_textarea::CursorMove::End);

        let command = Command::default();
        let mut form = Self {
            host,
            port,
            command,
            body: TextArea::default(),
            focus: RequestField::Body,
        };
        form.apply_template();
        form
    }

    pub fn host_text(&self) -> String {
        self.host.lines().join("").trim().to_string()
    }

    pub fn port_text(&self) -> String {
        self.port.lines().join("").trim().to_string()
    }

    pub fn body_text(&self) -> String {
        self.body.lines().join("\n")
    }

    /// Replace the editor contents.
    pub fn set_body(&mut self, text: &str) {
        self.body = TextArea::new(text.lines().map(str::to_string).collect());
    }

    /// Refill the editor from the current command's template.
    pub fn apply_template(&mut self) {
        let text = self.command.template_text();
        self.set_body(&text);
    }

    /// Select a command and load its template.
    pub fn select_command(&mut self, command: Command) {
        self.command = command;
        self.apply_template();
    }

    pub fn set_target(&mut self, target: &Target) {
        self.host = TextArea::new(vec![target.host.clone()]);
        self.port = TextArea::new(vec![target.port.to_string()]);
    }

    /// Parse the host/port fields.
    pub fn target(&self) -> Result<Target, String> {
        let host = self.host_text();
        if host.is_empty() {
            return Err("Host is empty".to_string());
        }

        let port_text = self.port_text();
        let port = port_text
            .parse::<u16>()
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| format!("Invalid port: '{}'", port_text))?;

        Ok(Target::new(host, port))
    }

    /// Text input widget for the focused field, if it has one.
    pub fn focused_input_mut(&mut self) -> Option<&mut TextArea<'a>> {
        match self.focus {
            RequestField::Host => Some(&mut self.host),
            RequestField::Port => Some(&mut self.port),
            RequestField::Body => Some(&mut self.body),
            RequestField::Command => None,
        }
    }
}

// =============================================================================
// Response View State
// =============================================================================

/// Last response shown on the Response tab.
#[derive(Debug, Default)]
pub struct ResponseViewState {
    pub outcome: Option<ExchangeOutcome>,
    /// Cached display text of `outcome`.
    pub text: String,
    pub target: Option<Target>,
    pub command: Option<String>,
    pub elapsed: Option<Duration>,
    pub scroll: usize,
}

impl ResponseViewState {
    pub fn show(
        &mut self,
        outcome: ExchangeOutcome,
        target: Target,
        command: Option<String>,
        elapsed: Duration,
    ) {
        self.text = outcome.display_text();
        self.outcome = Some(outcome);
        self.target = Some(target);
        self.command = command;
        self.elapsed = Some(elapsed);
        self.scroll = 0;
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    pub fn note(&self) -> Option<String> {
        self.outcome.as_ref().and_then(ExchangeOutcome::note)
    }
}

// =============================================================================
// History State
// =============================================================================

/// Selection in the History tab.
#[derive(Debug, Default)]
pub struct HistoryViewState {
    pub table_state: TableState,
}

impl HistoryViewState {
    pub fn selected(&self) -> Option<usize> {
        self.table_state.selected()
    }

    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn select_prev(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }
}

// =============================================================================
// Pending Exchange
// =============================================================================

/// An exchange handed to the worker and not yet answered.
#[derive(Debug, Clone)]
pub struct PendingExchange {
    pub request_id: usize,
    pub started: Instant,
    pub target: Target,
    pub command: Option<String>,
    pub request_text: String,
    pub framed: String,
}
