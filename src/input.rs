use crate::models::{Answer, Mode, Prompt, PromptKind, ServiceResponse};
use crate::session::{ExerciseSession, SessionState, SubmitOutcome};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;

/// What the user has typed for the current prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerInput {
    /// Free text; `cursor` counts characters, not bytes.
    Text { buffer: String, cursor: usize },
    /// One single-character box per blank.
    Blanks { boxes: Vec<String>, focus: usize },
    None,
}

impl AnswerInput {
    pub fn for_prompt(prompt: Option<&Prompt>) -> Self {
        match prompt.map(|p| &p.kind) {
            Some(PromptKind::Typing) => AnswerInput::Text {
                buffer: String::new(),
                cursor: 0,
            },
            Some(PromptKind::FillBlank { blanks, .. }) => AnswerInput::Blanks {
                boxes: vec![String::new(); blanks.len()],
                focus: 0,
            },
            Some(PromptKind::Recognition) | None => AnswerInput::None,
        }
    }

    pub fn to_answer(&self) -> Answer {
        match self {
            AnswerInput::Text { buffer, .. } => Answer::Text(buffer.clone()),
            AnswerInput::Blanks { boxes, .. } => Answer::Blanks(boxes.clone()),
            AnswerInput::None => Answer::None,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        match self {
            AnswerInput::Text { buffer, cursor } => {
                let at = byte_index(buffer, *cursor);
                buffer.insert(at, c);
                *cursor += 1;
            }
            AnswerInput::Blanks { boxes, focus } => {
                if c.is_whitespace() {
                    return;
                }
                if let Some(slot) = boxes.get_mut(*focus) {
                    *slot = c.to_string();
                    if *focus + 1 < boxes.len() {
                        *focus += 1;
                    }
                }
            }
            AnswerInput::None => {}
        }
    }

    /// In blank boxes, clears the focused box, or the previous one when the
    /// focused box is already empty.
    pub fn backspace(&mut self) {
        match self {
            AnswerInput::Text { buffer, cursor } => {
                if *cursor > 0 {
                    let at = byte_index(buffer, *cursor - 1);
                    buffer.remove(at);
                    *cursor -= 1;
                }
            }
            AnswerInput::Blanks { boxes, focus } => {
                if boxes.get(*focus).is_some_and(|b| b.is_empty()) && *focus > 0 {
                    *focus -= 1;
                }
                if let Some(slot) = boxes.get_mut(*focus) {
                    slot.clear();
                }
            }
            AnswerInput::None => {}
        }
    }

    pub fn move_left(&mut self) {
        match self {
            AnswerInput::Text { cursor, .. } => *cursor = cursor.saturating_sub(1),
            AnswerInput::Blanks { focus, .. } => *focus = focus.saturating_sub(1),
            AnswerInput::None => {}
        }
    }

    pub fn move_right(&mut self) {
        match self {
            AnswerInput::Text { buffer, cursor } => {
                if *cursor < buffer.chars().count() {
                    *cursor += 1;
                }
            }
            AnswerInput::Blanks { boxes, focus } => {
                if *focus + 1 < boxes.len() {
                    *focus += 1;
                }
            }
            AnswerInput::None => {}
        }
    }
}

fn byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Result of a key press on the exercise screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseAction {
    Continue,
    BackToMenu,
    Quit,
}

/// The exercise screen: one session plus the answer being typed and the
/// inline validation notice.
#[derive(Debug)]
pub struct ExerciseView {
    pub session: ExerciseSession,
    pub input: AnswerInput,
    pub notice: Option<String>,
    input_ready: bool,
}

impl ExerciseView {
    pub fn new(session: ExerciseSession) -> Self {
        Self {
            session,
            input: AnswerInput::None,
            notice: None,
            input_ready: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.session.mode()
    }

    pub fn start(&mut self) {
        self.next_prompt();
    }

    pub fn next_prompt(&mut self) {
        self.session.load_next_prompt();
        self.sync_input();
    }

    /// Returns true when the response made a new prompt answerable.
    pub fn apply_response(&mut self, response: ServiceResponse) -> bool {
        let was_ready = self.session.accepts_input();
        self.session.process_response(response);
        self.sync_input();
        !was_ready && self.session.accepts_input()
    }

    pub fn tick(&mut self) {
        self.session.tick();
        self.sync_input();
    }

    pub fn submit(&mut self) {
        match self.session.submit_answer(self.input.to_answer()) {
            Ok(SubmitOutcome::Graded(result)) => {
                debug!("turn finished, correct: {}", result.is_correct);
                self.notice = None;
            }
            Ok(SubmitOutcome::Ignored) => {}
            Err(err) => self.notice = Some(err.to_string()),
        }
        self.sync_input();
    }

    /// Rebuilds the answer boxes whenever a new prompt becomes answerable.
    fn sync_input(&mut self) {
        let ready = self.session.accepts_input();
        if ready && !self.input_ready {
            self.input = AnswerInput::for_prompt(self.session.prompt());
            self.notice = None;
        }
        if self.session.state() == &SessionState::Loading {
            self.input = AnswerInput::None;
            self.notice = None;
        }
        self.input_ready = ready;
    }
}

fn ctrl(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
}

pub fn handle_exercise_input(view: &mut ExerciseView, key: KeyEvent) -> ExerciseAction {
    let mode = view.mode();
    match key.code {
        KeyCode::Char('c') if ctrl(&key) => return ExerciseAction::Quit,
        KeyCode::Esc => {
            view.session.teardown();
            return ExerciseAction::BackToMenu;
        }
        KeyCode::Tab => view.next_prompt(),
        KeyCode::Char('a') if ctrl(&key) => {
            let enabled = view.session.auto_advance_enabled();
            view.session.set_auto_advance(!enabled);
        }
        KeyCode::Char('t') if ctrl(&key) => {
            let enabled = view.session.countdown_enabled();
            view.session.set_countdown_enabled(!enabled);
        }
        KeyCode::Enter => match view.session.state().clone() {
            SessionState::Ready if mode != Mode::Recognition => view.submit(),
            SessionState::Ready | SessionState::Submitted | SessionState::Error(_) => {
                view.next_prompt()
            }
            SessionState::Idle | SessionState::Loading => {}
        },
        KeyCode::Char('p') if mode == Mode::Recognition => view.session.speak_current(),
        _ if !view.session.accepts_input() => {}
        KeyCode::Left => view.input.move_left(),
        KeyCode::Right => view.input.move_right(),
        KeyCode::Backspace => view.input.backspace(),
        KeyCode::Char(c) if !ctrl(&key) => {
            view.input.insert_char(c);
            view.notice = None;
        }
        _ => {}
    }
    ExerciseAction::Continue
}

/// Menu navigation over `Mode::ALL`, plus the word level used for
/// recognition. `level` indexes `levels`; `None` means every level.
#[derive(Debug, Default)]
pub struct MenuState {
    pub selected: usize,
    pub levels: Vec<String>,
    pub level: Option<usize>,
    pub notice: Option<String>,
}

impl MenuState {
    pub fn with_levels(levels: Vec<String>) -> Self {
        Self {
            levels,
            ..Self::default()
        }
    }

    pub fn selected_level(&self) -> Option<&str> {
        self.level
            .and_then(|i| self.levels.get(i))
            .map(String::as_str)
    }

    pub fn level_label(&self) -> &str {
        self.selected_level().unwrap_or("All levels")
    }

    /// Steps through "all levels" and then each level, wrapping around.
    fn cycle_level(&mut self, forward: bool) {
        let count = self.levels.len();
        if count == 0 {
            return;
        }
        self.level = match (self.level, forward) {
            (None, true) => Some(0),
            (None, false) => Some(count - 1),
            (Some(i), true) if i + 1 < count => Some(i + 1),
            (Some(0), false) => None,
            (Some(i), false) => Some(i - 1),
            (Some(_), true) => None,
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Continue,
    Start(Mode),
    ResetRecent,
    Quit,
}

pub fn handle_menu_input(menu: &mut MenuState, key: KeyEvent) -> MenuAction {
    menu.notice = None;
    match key.code {
        KeyCode::Char('c') if ctrl(&key) => MenuAction::Quit,
        KeyCode::Esc | KeyCode::Char('q') => MenuAction::Quit,
        KeyCode::Up => {
            menu.selected = menu.selected.saturating_sub(1);
            MenuAction::Continue
        }
        KeyCode::Down => {
            if menu.selected + 1 < Mode::ALL.len() {
                menu.selected += 1;
            }
            MenuAction::Continue
        }
        KeyCode::Left => {
            menu.cycle_level(false);
            MenuAction::Continue
        }
        KeyCode::Right => {
            menu.cycle_level(true);
            MenuAction::Continue
        }
        KeyCode::Char('r') => MenuAction::ResetRecent,
        KeyCode::Char(c @ '1'..='3') => {
            let index = c as usize - '1' as usize;
            menu.selected = index;
            MenuAction::Start(Mode::ALL[index])
        }
        KeyCode::Enter => match Mode::ALL.get(menu.selected) {
            Some(mode) => MenuAction::Start(*mode),
            None => MenuAction::Continue,
        },
        _ => MenuAction::Continue,
    }
}
