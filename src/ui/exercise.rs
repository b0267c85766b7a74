use super::key_span;
use crate::input::{AnswerInput, ExerciseView};
use crate::models::{
    AnswerShape, BLANK_MARKER, FailureKind, LoadFailure, Mode, Prompt, PromptKind, TurnResult,
};
use crate::session::{ExerciseSession, SessionState};
use crate::ui::layout::{calculate_exercise_chunks, split_header};
use crate::utils::{cursor_column, format_clock, scroll_offset};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn draw_exercise(f: &mut Frame, view: &ExerciseView) {
    let layout = calculate_exercise_chunks(f.area());
    let session = &view.session;

    draw_header(f, layout.header_area, session);
    draw_cue(f, layout.cue_area, session);
    draw_answer(f, layout.answer_area, view);
    draw_banner(f, layout.banner_area, view);
    draw_help(f, layout.help_area, session.mode());
}

fn draw_header(f: &mut Frame, area: Rect, session: &ExerciseSession) {
    let (title_area, status_area) = split_header(area);

    let title = match session.level() {
        Some(level) => format!("{} ({})", session.mode().title(), level),
        None => session.mode().title().to_string(),
    };
    let title = Paragraph::new(title)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, title_area);

    let stats = session.stats();
    let mut spans = vec![
        Span::styled(
            format!("✓ {}", stats.correct_count),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::from("  "),
        Span::styled(
            format!("✗ {}", stats.wrong_count),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::from("  "),
    ];
    spans.push(timer_span(session));

    let status = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, status_area);
}

fn timer_span(session: &ExerciseSession) -> Span<'static> {
    match session.mode() {
        Mode::Typing if session.countdown_enabled() => {
            let style = if session.is_low_time() {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            Span::styled(
                format!("Time {}", format_clock(session.countdown().remaining())),
                style,
            )
        }
        Mode::Typing => Span::styled("Timer off", Style::default().fg(Color::DarkGray)),
        Mode::Recognition if session.auto_advance_enabled() => {
            Span::styled("Auto: on", Style::default().fg(Color::Cyan))
        }
        Mode::Recognition => Span::styled("Auto: off", Style::default().fg(Color::DarkGray)),
        Mode::FillBlank => Span::from(""),
    }
}

fn draw_cue(f: &mut Frame, area: Rect, session: &ExerciseSession) {
    let (text, title) = match session.state() {
        SessionState::Idle => (Text::default(), "Word"),
        SessionState::Loading => (
            Text::from(Span::styled(
                "Loading the next word...",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )),
            "Word",
        ),
        SessionState::Error(failure) => (failure_text(failure), "Could Not Load"),
        SessionState::Ready | SessionState::Submitted => match session.prompt() {
            Some(prompt) => (prompt_text(prompt), "Word"),
            None => (Text::default(), "Word"),
        },
    };

    let cue = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(cue, area);
}

/// Logical failures tell the user what to do; transport failures are generic.
fn failure_text(failure: &LoadFailure) -> Text<'static> {
    let color = match failure.kind {
        FailureKind::Logical => Color::Yellow,
        FailureKind::Transport => Color::Red,
    };
    let mut text = Text::default();
    text.push_line(Line::from(Span::styled(
        failure.message.clone(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )));
    text.push_line(Line::from(""));
    text.push_line(Line::from(failure.guidance.clone()));
    text
}

fn prompt_text(prompt: &Prompt) -> Text<'_> {
    let mut text = Text::default();
    match &prompt.kind {
        PromptKind::Recognition => {
            text.push_line(Line::from(Span::styled(
                prompt.word.as_str(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            text.push_line(Line::from(""));
            text.push_line(Line::from(prompt.meaning.as_str()));
        }
        PromptKind::FillBlank { blanks, .. } => {
            text.push_line(Line::from(Span::styled(
                prompt.meaning.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            text.push_line(Line::from(""));
            text.push_line(Line::from(Span::styled(
                format!("Fill in the {} missing letter(s).", blanks.len()),
                Style::default().fg(Color::DarkGray),
            )));
        }
        PromptKind::Typing => {
            text.push_line(Line::from(Span::styled(
                prompt.meaning.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            text.push_line(Line::from(""));
            text.push_line(Line::from(Span::styled(
                "Type the word for this meaning.",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    if let Some(level) = &prompt.level {
        text.push_line(Line::from(""));
        text.push_line(Line::from(Span::styled(
            format!("Level: {}", level),
            Style::default().fg(Color::DarkGray),
        )));
    }
    text
}

fn draw_answer(f: &mut Frame, area: Rect, view: &ExerciseView) {
    let session = &view.session;
    let title = match session.mode().answer_shape() {
        AnswerShape::SingleString => "Your Answer",
        AnswerShape::CharacterPerBlank => "Fill the Blanks",
        AnswerShape::NoneRequired => "Next",
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let line = match (&view.input, session.prompt()) {
        (AnswerInput::Text { buffer, cursor }, _) => {
            let inner_width = area.width.saturating_sub(2) as usize;
            let col = cursor_column(buffer, *cursor);
            let offset = scroll_offset(col, inner_width);
            if session.accepts_input() {
                let x = area.x + 1 + (col - offset) as u16;
                f.set_cursor_position((x, area.y + 1));
            }
            if buffer.is_empty() {
                let paragraph = Paragraph::new(Span::styled(
                    "[Type the word here...]",
                    Style::default().fg(Color::DarkGray),
                ))
                .block(block);
                f.render_widget(paragraph, area);
                return;
            }
            let paragraph = Paragraph::new(buffer.as_str())
                .scroll((0, offset as u16))
                .block(block);
            f.render_widget(paragraph, area);
            return;
        }
        (AnswerInput::Blanks { boxes, focus }, Some(prompt)) => {
            blank_line(prompt, boxes, *focus, session.accepts_input(), session.result())
        }
        _ if session.mode() == Mode::Recognition && session.prompt().is_some() => {
            Line::from(Span::styled(
                "Press Enter or Tab for the next word",
                Style::default().fg(Color::DarkGray),
            ))
        }
        _ => Line::from(""),
    };

    f.render_widget(Paragraph::new(line).block(block), area);
}

/// The cue with each blank replaced by its answer box. After grading, boxes
/// are green or red per position.
fn blank_line<'a>(
    prompt: &'a Prompt,
    boxes: &'a [String],
    focus: usize,
    editing: bool,
    result: Option<&TurnResult>,
) -> Line<'a> {
    let mut spans = Vec::new();
    let mut blank_index = 0;
    for ch in prompt.cue().chars() {
        if ch != BLANK_MARKER {
            spans.push(Span::styled(
                ch.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            continue;
        }
        let value = boxes
            .get(blank_index)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .unwrap_or(" ");
        let style = match result.and_then(|r| r.position_correct.get(blank_index)) {
            Some(true) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            Some(false) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            None if editing && blank_index == focus => Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::REVERSED),
            None => Style::default().fg(Color::Yellow),
        };
        spans.push(Span::styled(format!("[{}]", value), style));
        blank_index += 1;
    }
    Line::from(spans)
}

fn draw_banner(f: &mut Frame, area: Rect, view: &ExerciseView) {
    let session = &view.session;
    let mut text = Text::default();
    let mut border = Style::default();

    if let Some(notice) = &view.notice {
        text.push_line(Line::from(Span::styled(
            format!("! {}", notice),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        border = border.fg(Color::Yellow);
    } else if let (SessionState::Submitted, Some(result)) = (session.state(), session.result()) {
        let (headline, color) = if result.is_correct {
            ("Correct!", Color::Green)
        } else if result.timed_out {
            ("Time's up!", Color::Red)
        } else {
            ("Not quite.", Color::Red)
        };
        text.push_line(Line::from(Span::styled(
            headline,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        if !result.is_correct {
            let answer_line = match &result.correct_answer {
                Some(word) => format!("The word was: {}", word),
                None => "Fetching the correct word...".to_string(),
            };
            text.push_line(Line::from(answer_line));
        }
        border = border.fg(color);
    }

    let banner = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(border));
    f.render_widget(banner, area);
}

fn draw_help(f: &mut Frame, area: Rect, mode: Mode) {
    let mut basic = Vec::new();
    if mode == Mode::Recognition {
        basic.extend([key_span("Enter/Tab"), Span::from(" Next  ")]);
    } else {
        basic.extend([
            key_span("Enter"),
            Span::from(" Submit  "),
            key_span("Tab"),
            Span::from(" Next  "),
        ]);
    }
    basic.extend([key_span("Esc"), Span::from(" Menu")]);

    let mut extra = vec![key_span("Ctrl+C"), Span::from(" Exit App")];
    match mode {
        Mode::Recognition => extra.extend([
            Span::from("  "),
            key_span("p"),
            Span::from(" Speak  "),
            key_span("Ctrl+A"),
            Span::from(" Auto-advance"),
        ]),
        Mode::Typing => extra.extend([
            Span::from("  "),
            key_span("Ctrl+T"),
            Span::from(" Countdown"),
        ]),
        Mode::FillBlank => extra.extend([
            Span::from("  "),
            key_span("←/→"),
            Span::from(" Move Between Blanks"),
        ]),
    }

    let help = Paragraph::new(vec![Line::from(basic), Line::from(extra)])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, area);
}
