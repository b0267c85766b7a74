use crate::error::ServiceError;
use crate::models::{AnswerQuery, BLANK_MARKER, Mode, Prompt, PromptKind, StageEvent};
use crate::service::WordService;
use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub const RECOGNITION_PATH: &str = "/api/random-word";
pub const FILL_BLANK_PATH: &str = "/api/word-with-blanks";
pub const TYPING_PATH: &str = "/api/typing-word";
pub const STAGE_PATH: &str = "/api/update-word-stage";
pub const CHECK_ANSWER_PATH: &str = "/api/check-typing";
pub const LEVELS_PATH: &str = "/api/levels";
pub const RESET_RECENT_PATH: &str = "/api/reset-words";

/// JSON client for the word-data service. One attempt per request.
#[derive(Debug, Clone)]
pub struct HttpWordService {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PromptBody {
    word: Option<String>,
    meaning: Option<String>,
    level: Option<String>,
    word_with_blanks: Option<String>,
    blanks: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct CheckAnswerBody {
    correct_word: String,
}

#[derive(Debug, Deserialize)]
struct LevelsBody {
    levels: Vec<String>,
}

impl HttpWordService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        // The answer check relies on the server-side session, so cookies must persist.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read(response: reqwest::Response) -> Result<(StatusCode, String), ServiceError> {
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

pub fn prompt_path(mode: Mode) -> &'static str {
    match mode {
        Mode::Recognition => RECOGNITION_PATH,
        Mode::FillBlank => FILL_BLANK_PATH,
        Mode::Typing => TYPING_PATH,
    }
}

/// Splits a response into logical refusals, transport failures and payloads.
///
/// A 2xx or 4xx JSON body carrying `success: false` or an `error` field is a
/// logical failure. Server errors, other statuses and bodies that are not JSON
/// are transport failures.
pub fn classify<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ServiceError> {
    if !(status.is_success() || status.is_client_error()) {
        return Err(ServiceError::Transport(format!("server returned {}", status)));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ServiceError::Transport(format!("invalid response body: {}", e)))?;

    let refused = value.get("success").and_then(Value::as_bool) == Some(false)
        || value.get("error").is_some_and(|e| !e.is_null());
    if refused {
        let reason = value
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| value.get("error").and_then(Value::as_str))
            .unwrap_or("the service refused the request");
        return Err(ServiceError::Logical(reason.to_string()));
    }

    if !status.is_success() {
        return Err(ServiceError::Transport(format!("server returned {}", status)));
    }

    serde_json::from_value(value)
        .map_err(|e| ServiceError::Transport(format!("unexpected response shape: {}", e)))
}

fn into_prompt(mode: Mode, body: PromptBody) -> Result<Prompt, ServiceError> {
    let word = body
        .word
        .filter(|w| !w.trim().is_empty())
        .ok_or_else(|| ServiceError::Transport("response has no word".to_string()))?;
    let meaning = body.meaning.unwrap_or_default();

    let kind = match mode {
        Mode::Recognition => PromptKind::Recognition,
        Mode::Typing => PromptKind::Typing,
        Mode::FillBlank => {
            let (Some(word_with_blanks), Some(blanks)) = (body.word_with_blanks, body.blanks)
            else {
                return Err(ServiceError::Transport(
                    "fill-in-the-blank response has no blanks".to_string(),
                ));
            };
            let markers = word_with_blanks
                .chars()
                .filter(|c| *c == BLANK_MARKER)
                .count();
            if blanks.is_empty() || markers != blanks.len() {
                return Err(ServiceError::Transport(format!(
                    "{} blank markers but {} answers",
                    markers,
                    blanks.len()
                )));
            }
            PromptKind::FillBlank {
                word_with_blanks,
                blanks,
            }
        }
    };

    Ok(Prompt {
        word,
        meaning,
        level: body.level,
        kind,
    })
}

#[async_trait]
impl WordService for HttpWordService {
    async fn fetch_prompt(&self, mode: Mode, level: Option<&str>) -> Result<Prompt, ServiceError> {
        let url = self.url(prompt_path(mode));
        debug!("GET {} (level {:?})", url, level);
        let mut request = self.client.get(&url);
        if mode == Mode::Recognition
            && let Some(level) = level
        {
            request = request.query(&[("level", level)]);
        }
        let response = request.send().await?;
        let (status, body) = Self::read(response).await?;
        let body: PromptBody = classify(status, &body)?;
        into_prompt(mode, body)
    }

    async fn report_stage_advance(&self, event: &StageEvent) -> Result<(), ServiceError> {
        let url = self.url(STAGE_PATH);
        debug!("POST {} {:?}", url, event);
        let response = self.client.post(&url).json(event).send().await?;
        let (status, body) = Self::read(response).await?;
        classify::<Value>(status, &body).map(|_| ())
    }

    async fn fetch_authoritative_answer(
        &self,
        query: &AnswerQuery,
    ) -> Result<String, ServiceError> {
        let url = self.url(CHECK_ANSWER_PATH);
        debug!("POST {}", url);
        let response = self.client.post(&url).json(query).send().await?;
        let (status, body) = Self::read(response).await?;
        let body: CheckAnswerBody = classify(status, &body)?;
        Ok(body.correct_word)
    }

    async fn levels(&self) -> Result<Vec<String>, ServiceError> {
        let url = self.url(LEVELS_PATH);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        let (status, body) = Self::read(response).await?;
        let body: LevelsBody = classify(status, &body)?;
        Ok(body.levels)
    }

    async fn reset_recent_words(&self) -> Result<(), ServiceError> {
        let url = self.url(RESET_RECENT_PATH);
        debug!("POST {}", url);
        let response = self.client.post(&url).send().await?;
        let (status, body) = Self::read(response).await?;
        classify::<Value>(status, &body).map(|_| ())
    }
}
