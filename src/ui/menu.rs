use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::key_span;
use crate::input::MenuState;
use crate::models::Mode;
use crate::ui::layout::calculate_menu_chunks;
use crate::utils::truncate_to_width;

pub fn draw_menu(f: &mut Frame, menu: &MenuState, source_label: &str) {
    let layout = calculate_menu_chunks(f.area());

    let title = Paragraph::new(format!("Vocab Drill v{}", env!("CARGO_PKG_VERSION")))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, layout.title_area);

    let items: Vec<ListItem> = Mode::ALL
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            let selected = i == menu.selected;
            let title_style = if selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            let marker = if selected { "> " } else { "  " };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(format!("{}{}. {}", marker, i + 1, mode.title()), title_style),
                ]),
                Line::from(Span::styled(
                    format!("     {}", mode.description()),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Choose an Exercise"),
    );
    f.render_widget(list, layout.list_area);

    let width = layout.status_area.width.saturating_sub(4) as usize;
    let mut level_line = vec![Span::from(format!("Level: {}", menu.level_label()))];
    if let Some(notice) = &menu.notice {
        level_line.push(Span::styled(
            format!("   {}", notice),
            Style::default().fg(Color::Yellow),
        ));
    }
    let status = Paragraph::new(vec![
        Line::from(Span::styled(
            truncate_to_width(source_label, width),
            Style::default().fg(Color::Green),
        )),
        Line::from(level_line),
    ])
    .block(Block::default().borders(Borders::ALL).title("Words"));
    f.render_widget(status, layout.status_area);

    let help_text = vec![Line::from(vec![
        key_span("↑/↓"),
        Span::from(" Navigate  "),
        key_span("1-3"),
        Span::from(" Jump  "),
        key_span("←/→"),
        Span::from(" Level  "),
        key_span("Enter"),
        Span::from(" Start  "),
        key_span("r"),
        Span::from(" Reset recent  "),
        key_span("q/Esc"),
        Span::from(" Quit"),
    ])];
    let help = Paragraph::new(help_text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, layout.help_area);
}
