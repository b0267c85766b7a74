use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub struct ExerciseLayout {
    pub header_area: Rect,
    pub cue_area: Rect,
    pub answer_area: Rect,
    pub banner_area: Rect,
    pub help_area: Rect,
}

pub struct MenuLayout {
    pub title_area: Rect,
    pub list_area: Rect,
    pub status_area: Rect,
    pub help_area: Rect,
}

pub fn calculate_exercise_chunks(area: Rect) -> ExerciseLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(4),
        ])
        .split(area);

    ExerciseLayout {
        header_area: chunks[0],
        cue_area: chunks[1],
        answer_area: chunks[2],
        banner_area: chunks[3],
        help_area: chunks[4],
    }
}

pub fn calculate_menu_chunks(area: Rect) -> MenuLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(4),
            Constraint::Length(3),
        ])
        .split(area);

    MenuLayout {
        title_area: chunks[0],
        list_area: chunks[1],
        status_area: chunks[2],
        help_area: chunks[3],
    }
}

/// Splits the header into a title cell and a right-hand status cell.
pub fn split_header(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    (chunks[0], chunks[1])
}
