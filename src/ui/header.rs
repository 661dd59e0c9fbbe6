//! Header bar with tab navigation and the active target.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Tabs};

use crate::app::{App, AppTab};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let tab_titles: Vec<Line> = AppTab::all()
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let style = if *tab == app.current_tab {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::from(format!(" F{} {} ", i + 1, tab.name())).style(style)
        })
        .collect();

    let selected = AppTab::all()
        .iter()
        .position(|t| *t == app.current_tab)
        .unwrap_or(0);

    let target = format!(
        " {}:{} | {} | {}s ",
        app.form.host_text(),
        app.form.port_text(),
        app.options.read_strategy.as_str(),
        app.options.timeout.as_secs()
    );

    let tabs = Tabs::new(tab_titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" AMAS Console ")
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .title_top(Line::from(target).right_aligned()),
        )
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(symbols::line::VERTICAL);

    frame.render_widget(tabs, area);
}
