mod exercise;
pub mod layout;
mod menu;

pub use exercise::draw_exercise;
pub use layout::{calculate_exercise_chunks, calculate_menu_chunks};
pub use menu::draw_menu;

use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
};

/// Styled key name for help lines.
fn key_span(key: &str) -> Span<'_> {
    Span::styled(
        key,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
}
