//! Exchange history table.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use unicode_truncate::UnicodeTruncateStr;

use crate::app::App;
use crate::models::ExchangeRecord;

use super::title_style;

/// Width of the request preview column.
const PREVIEW_WIDTH: usize = 60;

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let header = Row::new(vec![
        Cell::from("Time").style(Style::default().fg(Color::Yellow)),
        Cell::from("Target").style(Style::default().fg(Color::Yellow)),
        Cell::from("Command").style(Style::default().fg(Color::Yellow)),
        Cell::from("Status").style(Style::default().fg(Color::Yellow)),
        Cell::from("Elapsed").style(Style::default().fg(Color::Yellow)),
        Cell::from("Request").style(Style::default().fg(Color::Yellow)),
    ])
    .height(1)
    .bottom_margin(1);

    let rows: Vec<Row> = app
        .history
        .iter()
        .map(|record| {
            Row::new(vec![
                Cell::from(record.time_display()),
                Cell::from(record.target.to_string()),
                Cell::from(record.command_display().to_string()),
                Cell::from(record.status_label())
                    .style(Style::default().fg(record.status_color())),
                Cell::from(record.elapsed_display()),
                Cell::from(request_preview(record)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10), // Time
        Constraint::Length(22), // Target
        Constraint::Length(11), // Command
        Constraint::Length(8),  // Status
        Constraint::Length(9),  // Elapsed
        Constraint::Min(20),    // Request
    ];

    let title = format!(" History ({}) ", app.history.len());

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_style(title_style()),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(table, area, &mut app.history_view.table_state);
}

/// One-line preview of the framed request, cut to the column width.
fn request_preview(record: &ExchangeRecord) -> String {
    let (preview, _) = record.framed.unicode_truncate(PREVIEW_WIDTH);
    if preview.len() < record.framed.len() {
        format!("{}…", preview)
    } else {
        preview.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ExchangeOutcome, Target};
    use chrono::Local;
    use std::time::Duration;

    fn record(framed: &str) -> ExchangeRecord {
        ExchangeRecord {
            timestamp: Local::now(),
            target: Target::default(),
            command: None,
            request_text: String::new(),
            framed: framed.to_string(),
            outcome: ExchangeOutcome::Failed("Error: x".to_string()),
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_short_preview_is_unchanged() {
        assert_eq!(request_preview(&record("(00000002){}")), "(00000002){}");
    }

    #[test]
    fn test_long_preview_is_truncated_by_width() {
        let body = "한".repeat(50);
        let preview = request_preview(&record(&format!("(00000150){}", body)));
        assert!(preview.ends_with('…'));
        // 10 header columns + 25 double-width chars
        assert_eq!(preview.chars().count(), 10 + 25 + 1);
    }
}
