//! Request form: target, command preset and JSON body editor.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tui_textarea::TextArea;

use crate::app::{App, RequestField};
use crate::models::Command;
use crate::wire::{PreparedRequest, RequestError, HEADER_LEN};

use super::{border_style, title_style};

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let fields = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(20),    // Host
            Constraint::Length(10), // Port
            Constraint::Length(36), // Command
        ])
        .split(rows[0]);

    let focus = app.form.focus;
    render_input(frame, &mut app.form.host, " Host ", focus == RequestField::Host, fields[0]);
    render_input(frame, &mut app.form.port, " Port ", focus == RequestField::Port, fields[1]);
    render_command(frame, app.form.command, focus == RequestField::Command, fields[2]);

    let preview = build_frame_preview(&app.form.body_text());
    render_input_with_footer(
        frame,
        &mut app.form.body,
        " Body (JSON) ",
        focus == RequestField::Body,
        preview,
        rows[1],
    );
}

/// Render a text field inside a bordered block.
fn render_input(frame: &mut Frame, textarea: &mut TextArea, title: &str, focused: bool, area: Rect) {
    render_input_with_footer(frame, textarea, title, focused, Line::default(), area);
}

fn render_input_with_footer(
    frame: &mut Frame,
    textarea: &mut TextArea,
    title: &str,
    focused: bool,
    footer: Line<'static>,
    area: Rect,
) {
    let cursor_style = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    textarea.set_cursor_style(cursor_style);
    textarea.set_cursor_line_style(Style::default());

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .title_style(title_style())
        .border_style(border_style(focused))
        .title_bottom(footer.right_aligned());

    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(&*textarea, inner);
}

/// Render the command selector as `◀ auth | heartBeat | execute ▶`.
fn render_command(frame: &mut Frame, selected: Command, focused: bool, area: Rect) {
    let mut spans = vec![Span::styled("◀ ", Style::default().fg(Color::DarkGray))];
    for (i, command) in Command::all().iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        }
        let style = if *command == selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(command.as_str(), style));
    }
    spans.push(Span::styled(" ▶", Style::default().fg(Color::DarkGray)));

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Command ")
            .title_style(title_style())
            .border_style(border_style(focused)),
    );

    frame.render_widget(paragraph, area);
}

/// Live header preview for the body being edited.
fn build_frame_preview(body: &str) -> Line<'static> {
    match PreparedRequest::parse(body) {
        Ok(request) => Line::from(Span::styled(
            format!(" {} {} bytes ", &request.framed[..HEADER_LEN], request.body.len()),
            Style::default().fg(Color::Green),
        )),
        Err(RequestError::InvalidJson(_)) => Line::from(Span::styled(
            " invalid JSON ",
            Style::default().fg(Color::Red),
        )),
        Err(RequestError::Frame(e)) => Line::from(Span::styled(
            format!(" {} ", e),
            Style::default().fg(Color::Red),
        )),
    }
}
