use crate::error::ServiceError;
use crate::models::{AnswerQuery, Mode, Prompt, PromptKind, StageEvent};
use crate::service::WordService;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

/// Scripted word service for tests. Each `fetch_prompt` call takes the next
/// scripted result and waits for its delay first, so later requests can
/// finish before earlier ones.
#[derive(Debug, Default)]
pub struct MockWordService {
    prompts: Mutex<VecDeque<(Duration, Result<Prompt, ServiceError>)>>,
    stage_result: Mutex<Option<ServiceError>>,
    answer: Mutex<Option<Result<String, ServiceError>>>,
    pub stage_events: Mutex<Vec<StageEvent>>,
    pub prompt_calls: Mutex<Vec<(Mode, Option<String>)>>,
}

impl MockWordService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_prompt(&self, delay: Duration, result: Result<Prompt, ServiceError>) {
        self.prompts.lock().unwrap().push_back((delay, result));
    }

    pub fn fail_stage_reports(&self, err: ServiceError) {
        *self.stage_result.lock().unwrap() = Some(err);
    }

    pub fn set_answer(&self, result: Result<String, ServiceError>) {
        *self.answer.lock().unwrap() = Some(result);
    }

    pub fn typing(word: &str) -> Prompt {
        Prompt {
            word: word.to_string(),
            meaning: format!("meaning of {}", word),
            level: None,
            kind: PromptKind::Typing,
        }
    }
}

#[async_trait]
impl WordService for MockWordService {
    async fn fetch_prompt(&self, mode: Mode, level: Option<&str>) -> Result<Prompt, ServiceError> {
        let next = {
            self.prompt_calls
                .lock()
                .unwrap()
                .push((mode, level.map(str::to_string)));
            self.prompts.lock().unwrap().pop_front()
        };
        let Some((delay, result)) = next else {
            return Err(ServiceError::Transport("no scripted prompt".to_string()));
        };
        sleep(delay).await;
        result
    }

    async fn report_stage_advance(&self, event: &StageEvent) -> Result<(), ServiceError> {
        self.stage_events.lock().unwrap().push(event.clone());
        match self.stage_result.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn fetch_authoritative_answer(
        &self,
        _query: &AnswerQuery,
    ) -> Result<String, ServiceError> {
        self.answer
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ServiceError::Transport("no scripted answer".to_string())))
    }

    async fn levels(&self) -> Result<Vec<String>, ServiceError> {
        Ok(vec!["CET4".to_string(), "CET6".to_string()])
    }

    async fn reset_recent_words(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
