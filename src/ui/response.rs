//! Response viewer.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::App;
use crate::wire::ExchangeOutcome;

use super::title_style;

/// Calculate the maximum scroll offset to prevent overscroll.
pub fn max_scroll(total_lines: usize, visible_height: usize) -> usize {
    total_lines.saturating_sub(visible_height)
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.response;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)])
        .split(area);

    // Summary
    let mut summary = vec![Line::from(vec![
        Span::styled("Target: ", Style::default().fg(Color::Yellow)),
        Span::raw(
            view.target
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string()),
        ),
        Span::raw("   "),
        Span::styled("Command: ", Style::default().fg(Color::Yellow)),
        Span::raw(view.command.clone().unwrap_or_else(|| "-".to_string())),
        Span::raw("   "),
        Span::styled("Elapsed: ", Style::default().fg(Color::Yellow)),
        Span::raw(
            view.elapsed
                .map(|d| format!("{}ms", d.as_millis()))
                .unwrap_or_else(|| "-".to_string()),
        ),
        Span::raw("   "),
        Span::styled("Header: ", Style::default().fg(Color::Yellow)),
        Span::raw(
            view.outcome
                .as_ref()
                .and_then(ExchangeOutcome::header)
                .unwrap_or("-")
                .to_string(),
        ),
    ])];

    match (&view.outcome, view.note()) {
        (_, Some(note)) => summary.push(Line::from(vec![
            Span::styled("! ", Style::default().fg(Color::Yellow)),
            Span::styled(note, Style::default().fg(Color::Yellow)),
        ])),
        (Some(ExchangeOutcome::Failed(_)), None) => summary.push(Line::styled(
            "Exchange failed",
            Style::default().fg(Color::Red),
        )),
        _ => {}
    }

    frame.render_widget(
        Paragraph::new(summary).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Exchange ")
                .title_style(title_style()),
        ),
        rows[0],
    );

    // Body, virtualized like a log view
    let body_area = rows[1];
    let visible_height = body_area.height.saturating_sub(2) as usize;
    let all_lines: Vec<&str> = view.text.lines().collect();
    let total_lines = all_lines.len();
    let clamped_scroll = view.scroll.min(max_scroll(total_lines, visible_height));

    let lines: Vec<Line> = if view.outcome.is_none() {
        vec![Line::from("No response yet. Send a request from the Request tab (F1).")]
    } else {
        let start = clamped_scroll;
        let end = (clamped_scroll + visible_height).min(total_lines);
        let color = match &view.outcome {
            Some(ExchangeOutcome::Failed(_)) => Color::Red,
            _ => Color::White,
        };

        all_lines[start..end]
            .iter()
            .enumerate()
            .map(|(i, line)| {
                Line::from(vec![
                    Span::styled(
                        format!("{:4} | ", start + i + 1),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(*line, Style::default().fg(color)),
                ])
            })
            .collect()
    };

    let title = format!(
        " Response ({}/{}) ",
        clamped_scroll + 1,
        total_lines.max(1)
    );

    let paragraph = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_style(title_style()),
    );

    frame.render_widget(paragraph, body_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_scroll() {
        assert_eq!(max_scroll(100, 20), 80);
        assert_eq!(max_scroll(5, 20), 0);
    }
}
