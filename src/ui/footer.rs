//! Footer bar with status and keybindings.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{App, AppTab, RequestField};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let keybindings = match app.current_tab {
        AppTab::Request => {
            let mut bindings = vec![("Tab", "Field"), ("Ctrl+S", "Send"), ("Ctrl+T", "Template")];
            if app.form.focus == RequestField::Command {
                bindings.push(("←/→", "Command"));
            }
            bindings.push(("F2/F3", "Tabs"));
            bindings.push(("Ctrl+Q", "Quit"));
            bindings
        }
        AppTab::Response => {
            vec![
                ("j/k", "Scroll"),
                ("PgUp/Dn", "Page"),
                ("Home", "Top"),
                ("Tab", "Next Tab"),
                ("Ctrl+Q", "Quit"),
            ]
        }
        AppTab::History => {
            vec![
                ("j/k", "Select"),
                ("Enter", "Load"),
                ("Tab", "Next Tab"),
                ("Ctrl+Q", "Quit"),
            ]
        }
    };

    let mut spans: Vec<Span> = Vec::new();

    if let Some(error) = &app.last_error {
        spans.push(Span::styled(
            format!(" {} ", error),
            Style::default().fg(Color::White).bg(Color::Red),
        ));
        spans.push(Span::raw("  "));
    } else if let Some(pending) = &app.pending {
        spans.push(Span::styled(
            format!(
                " Sending to {}... {:.1}s ",
                pending.target,
                pending.started.elapsed().as_secs_f32()
            ),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
        spans.push(Span::raw("  "));
    }

    spans.extend(keybindings.iter().flat_map(|(key, action)| {
        vec![
            Span::styled(
                format!(" {} ", key),
                Style::default().bg(Color::DarkGray).fg(Color::White),
            ),
            Span::raw(format!(" {} ", action)),
            Span::raw(" "),
        ]
    }));

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}
