//! The exercise lifecycle shared by all three modes.
//!
//! `ExerciseSession` never awaits anything. Service calls are sent as
//! [`ServiceRequest`]s over a channel and their completions come back through
//! [`ExerciseSession::process_response`]. Prompt and answer requests carry a
//! token; a completion whose token is no longer current is dropped.

pub mod grading;
pub mod timer;

use crate::config::SessionConfig;
use crate::error::ValidationError;
use crate::models::{
    Answer, AnswerQuery, LoadFailure, Mode, Prompt, PromptKind, ServiceRequest, ServiceResponse,
    SessionStats, StageEvent, TurnResult,
};
use grading::{grade_blanks, grade_text, missing_blanks};
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use timer::{AutoAdvance, Countdown};
use tokio::sync::mpsc::UnboundedSender;

/// Side effect run when a word should be pronounced.
pub trait Speaker: Send + Sync + fmt::Debug {
    fn speak(&self, word: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
    Submitted,
    Error(LoadFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Graded(TurnResult),
    /// Not in `Ready`, or the mode has no grading step.
    Ignored,
}

#[derive(Debug)]
pub struct ExerciseSession {
    mode: Mode,
    level: Option<String>,
    state: SessionState,
    prompt: Option<Prompt>,
    result: Option<TurnResult>,
    stats: SessionStats,
    countdown: Countdown,
    countdown_enabled: bool,
    auto_advance: AutoAdvance,
    low_time_secs: u32,
    request_token: u64,
    pending_answer_token: Option<u64>,
    service_tx: UnboundedSender<ServiceRequest>,
    speaker: Option<Arc<dyn Speaker>>,
}

impl ExerciseSession {
    pub fn new(
        mode: Mode,
        config: &SessionConfig,
        service_tx: UnboundedSender<ServiceRequest>,
    ) -> Self {
        Self {
            mode,
            level: None,
            state: SessionState::Idle,
            prompt: None,
            result: None,
            stats: SessionStats::default(),
            countdown: Countdown::new(config.countdown_secs),
            countdown_enabled: false,
            auto_advance: AutoAdvance::new(config.auto_advance_secs),
            low_time_secs: config.low_time_secs,
            request_token: 0,
            pending_answer_token: None,
            service_tx,
            speaker: None,
        }
    }

    pub fn with_speaker(mut self, speaker: Arc<dyn Speaker>) -> Self {
        self.speaker = Some(speaker);
        self
    }

    /// Restricts recognition prompts to one word level.
    pub fn with_level(mut self, level: Option<String>) -> Self {
        self.level = level;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn result(&self) -> Option<&TurnResult> {
        self.result.as_ref()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn countdown_enabled(&self) -> bool {
        self.countdown_enabled
    }

    pub fn auto_advance_enabled(&self) -> bool {
        self.auto_advance.is_enabled()
    }

    pub fn accepts_input(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn is_low_time(&self) -> bool {
        self.countdown_enabled && self.countdown.remaining() <= self.low_time_secs
    }

    /// Drops the current turn and asks the service for the next prompt.
    pub fn load_next_prompt(&mut self) {
        self.countdown.reset();
        self.prompt = None;
        self.result = None;
        self.pending_answer_token = None;
        self.request_token += 1;
        self.state = SessionState::Loading;

        let token = self.request_token;
        debug!("{:?}: requesting prompt (token {})", self.mode, token);
        let request = ServiceRequest::FetchPrompt {
            token,
            mode: self.mode,
            level: self.level.clone(),
        };
        if self.service_tx.send(request).is_err() {
            warn!("{:?}: request worker is gone", self.mode);
            self.state = SessionState::Error(LoadFailure::from_service_error(
                self.mode,
                &crate::error::ServiceError::Transport("request worker stopped".to_string()),
            ));
        }
    }

    pub fn submit_answer(&mut self, answer: Answer) -> Result<SubmitOutcome, ValidationError> {
        if self.state != SessionState::Ready {
            return Ok(SubmitOutcome::Ignored);
        }
        let Some(prompt) = self.prompt.as_ref() else {
            return Ok(SubmitOutcome::Ignored);
        };

        let (is_correct, position_correct) = match (&prompt.kind, answer) {
            (PromptKind::Recognition, _) => return Ok(SubmitOutcome::Ignored),
            (PromptKind::Typing, Answer::Text(text)) => {
                if text.trim().is_empty() {
                    return Err(ValidationError::EmptyAnswer);
                }
                (grade_text(&text, &prompt.word), Vec::new())
            }
            (PromptKind::FillBlank { blanks, .. }, Answer::Blanks(values)) => {
                if values.len() != blanks.len() {
                    return Err(ValidationError::BlankCountMismatch {
                        expected: blanks.len(),
                        got: values.len(),
                    });
                }
                let missing = missing_blanks(&values);
                if !missing.is_empty() {
                    return Err(ValidationError::IncompleteBlanks { missing });
                }
                let flags = grade_blanks(&values, blanks);
                (flags.iter().all(|ok| *ok), flags)
            }
            _ => return Err(ValidationError::ShapeMismatch),
        };

        Ok(SubmitOutcome::Graded(
            self.finish_turn(is_correct, position_correct),
        ))
    }

    fn finish_turn(&mut self, is_correct: bool, position_correct: Vec<bool>) -> TurnResult {
        self.countdown.stop();
        self.stats.record(is_correct);

        let word = self
            .prompt
            .as_ref()
            .map(|p| p.word.clone())
            .unwrap_or_default();
        let result = TurnResult {
            is_correct,
            position_correct,
            correct_answer: (!is_correct).then(|| word.clone()),
            timed_out: false,
        };
        self.result = Some(result.clone());
        self.state = SessionState::Submitted;
        info!(
            "{:?}: graded {:?} as {}",
            self.mode,
            word,
            if is_correct { "correct" } else { "wrong" }
        );

        if is_correct {
            if let Some(stage) = self.mode.success_stage() {
                let event = StageEvent {
                    word: word.clone(),
                    stage,
                };
                if self.service_tx.send(ServiceRequest::ReportStage(event)).is_err() {
                    warn!("{:?}: could not queue stage report for {:?}", self.mode, word);
                }
            }
            if let Some(speaker) = &self.speaker {
                speaker.speak(&word);
            }
        }

        result
    }

    /// Forces a wrong outcome for the running countdown. Only valid while the
    /// countdown runs in `Ready`.
    pub fn time_expire(&mut self) -> Option<TurnResult> {
        if self.state != SessionState::Ready || !self.countdown.is_running() {
            return None;
        }
        self.countdown.stop();
        self.expire_turn()
    }

    fn expire_turn(&mut self) -> Option<TurnResult> {
        if self.state != SessionState::Ready {
            return None;
        }
        self.stats.record(false);
        let result = TurnResult {
            is_correct: false,
            position_correct: Vec::new(),
            correct_answer: None,
            timed_out: true,
        };
        self.result = Some(result.clone());
        self.state = SessionState::Submitted;
        info!("{:?}: time is up", self.mode);

        let token = self.request_token;
        self.pending_answer_token = Some(token);
        let request = ServiceRequest::FetchAnswer {
            token,
            query: AnswerQuery {
                answer: String::new(),
            },
        };
        if self.service_tx.send(request).is_err() {
            warn!("{:?}: could not ask for the correct answer", self.mode);
            self.fill_correct_answer(None);
        }
        Some(result)
    }

    fn fill_correct_answer(&mut self, word: Option<String>) {
        self.pending_answer_token = None;
        let fallback = self.prompt.as_ref().map(|p| p.word.clone());
        if let Some(result) = self.result.as_mut() {
            result.correct_answer = word.or(fallback);
        }
    }

    pub fn process_response(&mut self, response: ServiceResponse) {
        match response {
            ServiceResponse::Prompt { token, result } => {
                if token != self.request_token || self.state != SessionState::Loading {
                    debug!(
                        "{:?}: dropping stale prompt response (token {}, current {})",
                        self.mode, token, self.request_token
                    );
                    return;
                }
                match result {
                    Ok(prompt) if prompt.mode() == self.mode => {
                        debug!("{:?}: prompt ready (token {})", self.mode, token);
                        self.prompt = Some(prompt);
                        self.state = SessionState::Ready;
                        if self.mode.uses_countdown() && self.countdown_enabled {
                            self.countdown.start();
                        }
                    }
                    Ok(prompt) => {
                        warn!(
                            "{:?}: service answered with a {:?} prompt",
                            self.mode,
                            prompt.mode()
                        );
                        self.state = SessionState::Error(LoadFailure::from_service_error(
                            self.mode,
                            &crate::error::ServiceError::Transport(
                                "unexpected prompt kind".to_string(),
                            ),
                        ));
                    }
                    Err(err) => {
                        warn!("{:?}: prompt request failed: {}", self.mode, err);
                        self.state =
                            SessionState::Error(LoadFailure::from_service_error(self.mode, &err));
                    }
                }
            }
            ServiceResponse::StageReported { event, result } => match result {
                Ok(()) => debug!("stage {} recorded for {:?}", event.stage, event.word),
                Err(err) => warn!(
                    "failed to record stage {} for {:?}: {}",
                    event.stage, event.word, err
                ),
            },
            ServiceResponse::Answer { token, result } => {
                if self.pending_answer_token != Some(token) {
                    debug!("{:?}: dropping stale answer response", self.mode);
                    return;
                }
                match result {
                    Ok(word) => self.fill_correct_answer(Some(word)),
                    Err(err) => {
                        warn!("{:?}: could not fetch the correct answer: {}", self.mode, err);
                        self.fill_correct_answer(None);
                    }
                }
            }
        }
    }

    /// Advances both timers by one second.
    pub fn tick(&mut self) {
        if self.countdown.tick() {
            self.expire_turn();
        }
        if self.auto_advance.tick() {
            self.load_next_prompt();
        }
    }

    pub fn set_auto_advance(&mut self, enabled: bool) {
        if !self.mode.supports_auto_advance() {
            return;
        }
        if enabled {
            self.auto_advance.enable();
        } else {
            self.auto_advance.disable();
        }
    }

    pub fn set_countdown_enabled(&mut self, enabled: bool) {
        if !self.mode.uses_countdown() {
            return;
        }
        self.countdown_enabled = enabled;
        if enabled {
            if self.state == SessionState::Ready && !self.countdown.is_running() {
                self.countdown.start();
            }
        } else {
            self.countdown.stop();
        }
    }

    pub fn speak_current(&self) {
        if let (Some(speaker), Some(prompt)) = (&self.speaker, &self.prompt) {
            speaker.speak(&prompt.word);
        }
    }

    /// Stops every timer and invalidates in-flight requests.
    pub fn teardown(&mut self) {
        self.countdown.reset();
        self.auto_advance.disable();
        self.request_token += 1;
        self.pending_answer_token = None;
        self.state = SessionState::Idle;
    }
}

impl Drop for ExerciseSession {
    fn drop(&mut self) {
        self.teardown();
        debug!("{:?}: session closed", self.mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::models::FailureKind;
    use std::sync::Mutex;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    #[derive(Debug, Default)]
    struct RecordingSpeaker {
        spoken: Mutex<Vec<String>>,
    }

    impl Speaker for RecordingSpeaker {
        fn speak(&self, word: &str) {
            self.spoken.lock().unwrap().push(word.to_string());
        }
    }

    fn new_session(mode: Mode) -> (ExerciseSession, UnboundedReceiver<ServiceRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ExerciseSession::new(mode, &SessionConfig::default(), tx), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServiceRequest>) -> Vec<ServiceRequest> {
        let mut requests = Vec::new();
        while let Ok(request) = rx.try_recv() {
            requests.push(request);
        }
        requests
    }

    fn typing_prompt(word: &str) -> Prompt {
        Prompt {
            word: word.to_string(),
            meaning: format!("meaning of {}", word),
            level: None,
            kind: PromptKind::Typing,
        }
    }

    fn blank_prompt(word: &str, with_blanks: &str, blanks: &[&str]) -> Prompt {
        Prompt {
            word: word.to_string(),
            meaning: "猫".to_string(),
            level: None,
            kind: PromptKind::FillBlank {
                word_with_blanks: with_blanks.to_string(),
                blanks: blanks.iter().map(|b| b.to_string()).collect(),
            },
        }
    }

    fn recognition_prompt(word: &str) -> Prompt {
        Prompt {
            word: word.to_string(),
            meaning: "词".to_string(),
            level: Some("CET4".to_string()),
            kind: PromptKind::Recognition,
        }
    }

    /// Loads `prompt` into the session and clears the request queue.
    fn ready_with(
        session: &mut ExerciseSession,
        rx: &mut UnboundedReceiver<ServiceRequest>,
        prompt: Prompt,
    ) {
        session.load_next_prompt();
        let token = match drain(rx).as_slice() {
            [ServiceRequest::FetchPrompt { token, .. }] => *token,
            other => panic!("expected one prompt request, got {:?}", other),
        };
        session.process_response(ServiceResponse::Prompt {
            token,
            result: Ok(prompt),
        });
        assert_eq!(session.state(), &SessionState::Ready);
    }

    fn text(value: &str) -> Answer {
        Answer::Text(value.to_string())
    }

    fn blanks(values: &[&str]) -> Answer {
        Answer::Blanks(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_new_session_starts_idle_with_zero_counters() {
        let (session, _rx) = new_session(Mode::Typing);
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.stats(), SessionStats::default());
        assert!(session.prompt().is_none());
        assert!(!session.accepts_input());
    }

    #[test]
    fn test_load_next_prompt_sends_request() {
        let (mut session, mut rx) = new_session(Mode::FillBlank);
        session.load_next_prompt();

        assert_eq!(session.state(), &SessionState::Loading);
        let requests = drain(&mut rx);
        assert!(matches!(
            requests.as_slice(),
            [ServiceRequest::FetchPrompt {
                token: 1,
                mode: Mode::FillBlank,
                level: None,
            }]
        ));
    }

    #[test]
    fn test_typing_correct_answer_reports_stage() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        ready_with(&mut session, &mut rx, typing_prompt("hello"));

        let outcome = session.submit_answer(text("Hello ")).unwrap();
        let SubmitOutcome::Graded(result) = outcome else {
            panic!("expected a graded turn");
        };
        assert!(result.is_correct);
        assert!(result.correct_answer.is_none());
        assert_eq!(session.state(), &SessionState::Submitted);
        assert_eq!(session.stats().correct_count, 1);
        assert_eq!(session.stats().wrong_count, 0);

        let requests = drain(&mut rx);
        match requests.as_slice() {
            [ServiceRequest::ReportStage(event)] => {
                assert_eq!(event.word, "hello");
                assert_eq!(event.stage, 4);
            }
            other => panic!("expected a stage report, got {:?}", other),
        }
    }

    #[test]
    fn test_typing_wrong_answer_echoes_word() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        ready_with(&mut session, &mut rx, typing_prompt("hello"));

        let outcome = session.submit_answer(text("helo")).unwrap();
        let SubmitOutcome::Graded(result) = outcome else {
            panic!("expected a graded turn");
        };
        assert!(!result.is_correct);
        assert_eq!(result.correct_answer.as_deref(), Some("hello"));
        assert_eq!(session.stats().wrong_count, 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_typing_empty_answer_is_validation_failure() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        ready_with(&mut session, &mut rx, typing_prompt("hello"));

        assert_eq!(
            session.submit_answer(text("   ")),
            Err(ValidationError::EmptyAnswer)
        );
        assert_eq!(session.state(), &SessionState::Ready);
        assert_eq!(session.stats().total(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_fill_blank_case_insensitive() {
        let (mut session, mut rx) = new_session(Mode::FillBlank);
        ready_with(&mut session, &mut rx, blank_prompt("cat", "_a_", &["c", "t"]));

        let outcome = session.submit_answer(blanks(&["C", "T"])).unwrap();
        let SubmitOutcome::Graded(result) = outcome else {
            panic!("expected a graded turn");
        };
        assert!(result.is_correct);
        assert_eq!(result.position_correct, vec![true, true]);

        match drain(&mut rx).as_slice() {
            [ServiceRequest::ReportStage(event)] => assert_eq!(event.stage, 3),
            other => panic!("expected a stage report, got {:?}", other),
        }
    }

    #[test]
    fn test_fill_blank_flags_wrong_position() {
        let (mut session, mut rx) = new_session(Mode::FillBlank);
        ready_with(&mut session, &mut rx, blank_prompt("cat", "_a_", &["c", "t"]));

        let outcome = session.submit_answer(blanks(&["c", "x"])).unwrap();
        let SubmitOutcome::Graded(result) = outcome else {
            panic!("expected a graded turn");
        };
        assert!(!result.is_correct);
        assert_eq!(result.position_correct, vec![true, false]);
        assert_eq!(result.correct_answer.as_deref(), Some("cat"));
        assert_eq!(session.stats().wrong_count, 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_fill_blank_incomplete_is_rejected() {
        let (mut session, mut rx) = new_session(Mode::FillBlank);
        ready_with(&mut session, &mut rx, blank_prompt("cat", "_a_", &["c", "t"]));

        assert_eq!(
            session.submit_answer(blanks(&["c", " "])),
            Err(ValidationError::IncompleteBlanks { missing: vec![1] })
        );
        assert_eq!(
            session.submit_answer(blanks(&["c"])),
            Err(ValidationError::BlankCountMismatch {
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            session.submit_answer(text("cat")),
            Err(ValidationError::ShapeMismatch)
        );
        assert_eq!(session.state(), &SessionState::Ready);
        assert_eq!(session.stats().total(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_submit_outside_ready_is_ignored() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        assert_eq!(
            session.submit_answer(text("hello")),
            Ok(SubmitOutcome::Ignored)
        );

        session.load_next_prompt();
        assert_eq!(
            session.submit_answer(text("hello")),
            Ok(SubmitOutcome::Ignored)
        );
        drain(&mut rx);
        assert_eq!(session.stats().total(), 0);
    }

    #[test]
    fn test_only_one_counter_moves_per_turn() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        ready_with(&mut session, &mut rx, typing_prompt("hello"));

        session.submit_answer(text("hello")).unwrap();
        assert_eq!(
            session.submit_answer(text("wrong")),
            Ok(SubmitOutcome::Ignored)
        );
        assert_eq!(session.stats().correct_count, 1);
        assert_eq!(session.stats().wrong_count, 0);
    }

    #[test]
    fn test_recognition_has_no_grading() {
        let (mut session, mut rx) = new_session(Mode::Recognition);
        ready_with(&mut session, &mut rx, recognition_prompt("apple"));

        assert_eq!(session.submit_answer(Answer::None), Ok(SubmitOutcome::Ignored));
        assert_eq!(session.state(), &SessionState::Ready);
        assert_eq!(session.stats().total(), 0);
    }

    #[test]
    fn test_stale_prompt_response_is_ignored() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        session.load_next_prompt();
        session.load_next_prompt();
        assert_eq!(drain(&mut rx).len(), 2);

        session.process_response(ServiceResponse::Prompt {
            token: 2,
            result: Ok(typing_prompt("newer")),
        });
        session.process_response(ServiceResponse::Prompt {
            token: 1,
            result: Ok(typing_prompt("older")),
        });
        assert_eq!(session.prompt().map(|p| p.word.as_str()), Some("newer"));
    }

    #[test]
    fn test_stale_prompt_arriving_first_is_ignored() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        session.load_next_prompt();
        session.load_next_prompt();
        drain(&mut rx);

        session.process_response(ServiceResponse::Prompt {
            token: 1,
            result: Ok(typing_prompt("older")),
        });
        assert_eq!(session.state(), &SessionState::Loading);
        assert!(session.prompt().is_none());

        session.process_response(ServiceResponse::Prompt {
            token: 2,
            result: Ok(typing_prompt("newer")),
        });
        assert_eq!(session.prompt().map(|p| p.word.as_str()), Some("newer"));
    }

    #[test]
    fn test_logical_and_transport_failures_differ() {
        let (mut session, mut rx) = new_session(Mode::FillBlank);
        session.load_next_prompt();
        drain(&mut rx);
        session.process_response(ServiceResponse::Prompt {
            token: 1,
            result: Err(ServiceError::Logical("no learned words".to_string())),
        });
        let SessionState::Error(logical) = session.state().clone() else {
            panic!("expected an error state");
        };
        assert_eq!(logical.kind, FailureKind::Logical);
        assert_eq!(logical.message, "no learned words");

        session.load_next_prompt();
        drain(&mut rx);
        session.process_response(ServiceResponse::Prompt {
            token: 2,
            result: Err(ServiceError::Transport("connection refused".to_string())),
        });
        let SessionState::Error(transport) = session.state().clone() else {
            panic!("expected an error state");
        };
        assert_eq!(transport.kind, FailureKind::Transport);
        assert_ne!(transport.message, logical.message);
    }

    #[test]
    fn test_recovers_from_error_with_next_prompt() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        session.load_next_prompt();
        drain(&mut rx);
        session.process_response(ServiceResponse::Prompt {
            token: 1,
            result: Err(ServiceError::Transport("timeout".to_string())),
        });
        assert!(matches!(session.state(), SessionState::Error(_)));

        ready_with(&mut session, &mut rx, typing_prompt("hello"));
        assert!(session.accepts_input());
    }

    #[test]
    fn test_countdown_expires_exactly_once() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        session.set_countdown_enabled(true);
        ready_with(&mut session, &mut rx, typing_prompt("hello"));
        assert!(session.countdown().is_running());

        for _ in 0..29 {
            session.tick();
        }
        assert_eq!(session.state(), &SessionState::Ready);
        assert_eq!(session.countdown().remaining(), 1);

        session.tick();
        assert_eq!(session.state(), &SessionState::Submitted);
        assert_eq!(session.stats().wrong_count, 1);
        assert!(session.result().unwrap().timed_out);
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServiceRequest::FetchAnswer { token: 1, .. }]
        ));

        for _ in 0..60 {
            session.tick();
        }
        assert_eq!(session.stats().wrong_count, 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_countdown_resets_on_next_prompt() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        session.set_countdown_enabled(true);
        ready_with(&mut session, &mut rx, typing_prompt("hello"));
        for _ in 0..30 {
            session.tick();
        }
        drain(&mut rx);

        session.load_next_prompt();
        assert!(!session.countdown().is_running());
        assert_eq!(session.countdown().remaining(), 30);
        drain(&mut rx);
        session.process_response(ServiceResponse::Prompt {
            token: 2,
            result: Ok(typing_prompt("world")),
        });
        assert!(session.countdown().is_running());
        assert_eq!(session.countdown().remaining(), 30);
    }

    #[test]
    fn test_submit_cancels_countdown() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        session.set_countdown_enabled(true);
        ready_with(&mut session, &mut rx, typing_prompt("hello"));
        session.tick();
        session.submit_answer(text("hello")).unwrap();
        assert!(!session.countdown().is_running());

        for _ in 0..100 {
            session.tick();
        }
        assert_eq!(session.stats().correct_count, 1);
        assert_eq!(session.stats().wrong_count, 0);
        assert_eq!(session.time_expire(), None);
    }

    #[test]
    fn test_time_expire_requires_running_countdown() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        ready_with(&mut session, &mut rx, typing_prompt("hello"));
        assert_eq!(session.time_expire(), None);

        session.set_countdown_enabled(true);
        let result = session.time_expire().unwrap();
        assert!(!result.is_correct);
        assert!(result.timed_out);
        assert_eq!(session.stats().wrong_count, 1);
    }

    #[test]
    fn test_authoritative_answer_fills_result() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        session.set_countdown_enabled(true);
        ready_with(&mut session, &mut rx, typing_prompt("hello"));
        session.time_expire();
        drain(&mut rx);
        assert!(session.result().unwrap().correct_answer.is_none());

        session.process_response(ServiceResponse::Answer {
            token: 1,
            result: Ok("hello".to_string()),
        });
        assert_eq!(
            session.result().unwrap().correct_answer.as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_authoritative_answer_failure_falls_back() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        session.set_countdown_enabled(true);
        ready_with(&mut session, &mut rx, typing_prompt("hello"));
        session.time_expire();
        drain(&mut rx);

        session.process_response(ServiceResponse::Answer {
            token: 1,
            result: Err(ServiceError::Transport("offline".to_string())),
        });
        assert_eq!(
            session.result().unwrap().correct_answer.as_deref(),
            Some("hello")
        );
        assert_eq!(session.stats().wrong_count, 1);
    }

    #[test]
    fn test_stale_answer_is_ignored_after_next_prompt() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        session.set_countdown_enabled(true);
        ready_with(&mut session, &mut rx, typing_prompt("hello"));
        session.time_expire();
        drain(&mut rx);

        ready_with(&mut session, &mut rx, typing_prompt("world"));
        session.process_response(ServiceResponse::Answer {
            token: 1,
            result: Ok("hello".to_string()),
        });
        assert!(session.result().is_none());
        assert_eq!(session.state(), &SessionState::Ready);
    }

    #[test]
    fn test_auto_advance_double_enable_does_not_double_rate() {
        let (mut session, mut rx) = new_session(Mode::Recognition);
        ready_with(&mut session, &mut rx, recognition_prompt("apple"));

        session.set_auto_advance(true);
        session.set_auto_advance(true);
        for _ in 0..10 {
            session.tick();
        }
        let fetches = drain(&mut rx)
            .into_iter()
            .filter(|r| matches!(r, ServiceRequest::FetchPrompt { .. }))
            .count();
        assert_eq!(fetches, 2);
    }

    #[test]
    fn test_auto_advance_disable_stops_fetching() {
        let (mut session, mut rx) = new_session(Mode::Recognition);
        session.set_auto_advance(true);
        for _ in 0..4 {
            session.tick();
        }
        session.set_auto_advance(false);
        for _ in 0..30 {
            session.tick();
        }
        assert!(drain(&mut rx).is_empty());
        assert!(!session.auto_advance_enabled());
    }

    #[test]
    fn test_timers_only_in_their_modes() {
        let (mut typing, _rx) = new_session(Mode::Typing);
        typing.set_auto_advance(true);
        assert!(!typing.auto_advance_enabled());

        let (mut recognition, _rx2) = new_session(Mode::Recognition);
        recognition.set_countdown_enabled(true);
        assert!(!recognition.countdown_enabled());
    }

    #[test]
    fn test_low_time_warning() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        session.set_countdown_enabled(true);
        ready_with(&mut session, &mut rx, typing_prompt("hello"));
        assert!(!session.is_low_time());
        for _ in 0..20 {
            session.tick();
        }
        assert_eq!(session.countdown().remaining(), 10);
        assert!(session.is_low_time());
    }

    #[test]
    fn test_teardown_stops_timers_and_invalidates_requests() {
        let (mut session, mut rx) = new_session(Mode::Recognition);
        session.set_auto_advance(true);
        session.load_next_prompt();
        drain(&mut rx);

        session.teardown();
        session.process_response(ServiceResponse::Prompt {
            token: 1,
            result: Ok(recognition_prompt("apple")),
        });
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.prompt().is_none());

        for _ in 0..20 {
            session.tick();
        }
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_speaker_called_on_success_and_on_demand() {
        let speaker = Arc::new(RecordingSpeaker::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ExerciseSession::new(Mode::Typing, &SessionConfig::default(), tx)
            .with_speaker(speaker.clone());

        ready_with(&mut session, &mut rx, typing_prompt("hello"));
        session.speak_current();
        session.submit_answer(text("hello")).unwrap();

        let spoken = speaker.spoken.lock().unwrap().clone();
        assert_eq!(spoken, vec!["hello".to_string(), "hello".to_string()]);
    }

    #[test]
    fn test_wrong_prompt_kind_is_transport_failure() {
        let (mut session, mut rx) = new_session(Mode::Typing);
        session.load_next_prompt();
        drain(&mut rx);
        session.process_response(ServiceResponse::Prompt {
            token: 1,
            result: Ok(recognition_prompt("apple")),
        });
        assert!(matches!(
            session.state(),
            SessionState::Error(LoadFailure {
                kind: FailureKind::Transport,
                ..
            })
        ));
    }
}
