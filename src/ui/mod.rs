//! UI rendering module.
//!
//! This module contains all the rendering logic for the TUI.

mod footer;
mod header;
mod history;
mod request;
mod response;

use ratatui::prelude::*;

use crate::app::{App, AppTab};

/// Main render function - called every frame.
pub fn render(frame: &mut Frame, app: &mut App) {
    // Main layout: Header, Content, Footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    header::render(frame, app, chunks[0]);

    match app.current_tab {
        AppTab::Request => request::render(frame, app, chunks[1]),
        AppTab::Response => response::render(frame, app, chunks[1]),
        AppTab::History => history::render(frame, app, chunks[1]),
    }

    footer::render(frame, app, chunks[2]);
}

/// Block title style shared by every pane.
fn title_style() -> Style {
    Style::default().fg(Color::Cyan)
}

/// Border style for a pane that may hold focus.
fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}
