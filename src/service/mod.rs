pub mod http;
pub mod local;
#[cfg(test)]
pub mod mock;

use crate::error::ServiceError;
use crate::models::{AnswerQuery, Mode, Prompt, StageEvent};
use async_trait::async_trait;

pub use http::HttpWordService;
pub use local::LocalWordService;

/// The word-data and progress service the exercises talk to.
///
/// Word selection and stage bookkeeping happen behind this trait; callers only
/// see requests and their outcomes.
#[async_trait]
pub trait WordService: Send + Sync {
    /// `level` narrows recognition words to one level. The other modes draw
    /// from the learning record and ignore it.
    async fn fetch_prompt(&self, mode: Mode, level: Option<&str>) -> Result<Prompt, ServiceError>;

    /// Best-effort. Callers log failures and move on.
    async fn report_stage_advance(&self, event: &StageEvent) -> Result<(), ServiceError>;

    /// Correct word of the current typing turn, resolved by the service.
    async fn fetch_authoritative_answer(&self, query: &AnswerQuery)
    -> Result<String, ServiceError>;

    /// Word levels available for recognition, in display order.
    async fn levels(&self) -> Result<Vec<String>, ServiceError>;

    /// Forgets which words were shown recently, so any word may come up next.
    async fn reset_recent_words(&self) -> Result<(), ServiceError>;
}
