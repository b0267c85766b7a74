use crate::error::ServiceError;
use serde::{Deserialize, Serialize};

/// Stands in for a hidden letter in a fill-in-the-blank cue.
pub const BLANK_MARKER: char = '_';

/// The three exercise modes, in the order a word moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Recognition,
    FillBlank,
    Typing,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Recognition, Mode::FillBlank, Mode::Typing];

    pub fn title(self) -> &'static str {
        match self {
            Mode::Recognition => "Recognize Words",
            Mode::FillBlank => "Fill in the Blanks",
            Mode::Typing => "Blind Typing",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Mode::Recognition => "Read a new word and its meaning",
            Mode::FillBlank => "Complete a learned word with missing letters",
            Mode::Typing => "Type the word for a meaning, optionally against the clock",
        }
    }

    /// Stage reported to the service after a correct answer.
    /// Recognition has no grading step, the service records stage 1 when it
    /// serves the word.
    pub fn success_stage(self) -> Option<u32> {
        match self {
            Mode::Recognition => None,
            Mode::FillBlank => Some(3),
            Mode::Typing => Some(4),
        }
    }

    pub fn answer_shape(self) -> AnswerShape {
        match self {
            Mode::Recognition => AnswerShape::NoneRequired,
            Mode::FillBlank => AnswerShape::CharacterPerBlank,
            Mode::Typing => AnswerShape::SingleString,
        }
    }

    pub fn uses_countdown(self) -> bool {
        self == Mode::Typing
    }

    pub fn supports_auto_advance(self) -> bool {
        self == Mode::Recognition
    }

    /// Shown under a logical failure, tells the user what to do first.
    pub fn guidance(self) -> &'static str {
        match self {
            Mode::Recognition => "No words are available yet. Check the word list, then press Tab.",
            Mode::FillBlank => {
                "Learn some words in \"Recognize Words\" first, then come back to fill in the blanks."
            }
            Mode::Typing => {
                "Finish some \"Fill in the Blanks\" exercises first, then come back to blind typing."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerShape {
    SingleString,
    CharacterPerBlank,
    NoneRequired,
}

/// Question data for one turn. Never mutated after it is received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub word: String,
    pub meaning: String,
    pub level: Option<String>,
    pub kind: PromptKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    Recognition,
    FillBlank {
        word_with_blanks: String,
        blanks: Vec<String>,
    },
    Typing,
}

impl Prompt {
    pub fn mode(&self) -> Mode {
        match self.kind {
            PromptKind::Recognition => Mode::Recognition,
            PromptKind::FillBlank { .. } => Mode::FillBlank,
            PromptKind::Typing => Mode::Typing,
        }
    }

    /// The main line of text shown to the user.
    pub fn cue(&self) -> &str {
        match &self.kind {
            PromptKind::Recognition => &self.word,
            PromptKind::FillBlank {
                word_with_blanks, ..
            } => word_with_blanks,
            PromptKind::Typing => &self.meaning,
        }
    }

    pub fn blank_count(&self) -> usize {
        match &self.kind {
            PromptKind::FillBlank { blanks, .. } => blanks.len(),
            _ => 0,
        }
    }
}

/// A submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Blanks(Vec<String>),
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub correct_count: u32,
    pub wrong_count: u32,
}

impl SessionStats {
    pub fn record(&mut self, is_correct: bool) {
        if is_correct {
            self.correct_count += 1;
        } else {
            self.wrong_count += 1;
        }
    }

    pub fn total(&self) -> u32 {
        self.correct_count + self.wrong_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEvent {
    pub word: String,
    pub stage: u32,
}

/// Outcome of a graded turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    pub is_correct: bool,
    /// One flag per blank in fill-blank mode, empty otherwise.
    pub position_correct: Vec<bool>,
    /// Echoed on failure. `None` while a timed-out turn waits for the
    /// service to tell us the word.
    pub correct_answer: Option<String>,
    pub timed_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Logical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub kind: FailureKind,
    pub message: String,
    pub guidance: String,
}

impl LoadFailure {
    pub fn from_service_error(mode: Mode, err: &ServiceError) -> Self {
        match err {
            ServiceError::Logical(msg) => LoadFailure {
                kind: FailureKind::Logical,
                message: msg.clone(),
                guidance: mode.guidance().to_string(),
            },
            ServiceError::Transport(_) => LoadFailure {
                kind: FailureKind::Transport,
                message: "Failed to load the next word".to_string(),
                guidance: "Check the connection, then press Tab to try again.".to_string(),
            },
        }
    }
}

/// Context for asking the service for the correct word of the current turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerQuery {
    pub answer: String,
}

#[derive(Debug)]
pub enum ServiceRequest {
    FetchPrompt {
        token: u64,
        mode: Mode,
        level: Option<String>,
    },
    ReportStage(StageEvent),
    FetchAnswer { token: u64, query: AnswerQuery },
}

#[derive(Debug)]
pub enum ServiceResponse {
    Prompt {
        token: u64,
        result: Result<Prompt, ServiceError>,
    },
    StageReported {
        event: StageEvent,
        result: Result<(), ServiceError>,
    },
    Answer {
        token: u64,
        result: Result<String, ServiceError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Menu,
    Exercise,
}
