use crate::models::{ServiceRequest, ServiceResponse};
use crate::service::WordService;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Runs service requests in the background, one task per request, and sends
/// each completion back tagged with its request token. Requests may finish
/// out of order; the session decides which completions still matter.
pub fn spawn_service_worker(
    service: Arc<dyn WordService>,
    mut requests: UnboundedReceiver<ServiceRequest>,
    responses: UnboundedSender<ServiceResponse>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            let service = Arc::clone(&service);
            let responses = responses.clone();
            tokio::spawn(async move {
                let response = run_request(service.as_ref(), request).await;
                if responses.send(response).is_err() {
                    debug!("response dropped, event loop has exited");
                }
            });
        }
        debug!("request channel closed, worker exiting");
    })
}

async fn run_request(service: &dyn WordService, request: ServiceRequest) -> ServiceResponse {
    match request {
        ServiceRequest::FetchPrompt { token, mode, level } => {
            debug!("fetching {:?} prompt (token {}, level {:?})", mode, token, level);
            ServiceResponse::Prompt {
                token,
                result: service.fetch_prompt(mode, level.as_deref()).await,
            }
        }
        ServiceRequest::ReportStage(event) => {
            let result = service.report_stage_advance(&event).await;
            if let Err(ref err) = result {
                warn!("stage report for {:?} failed: {}", event.word, err);
            }
            ServiceResponse::StageReported { event, result }
        }
        ServiceRequest::FetchAnswer { token, query } => ServiceResponse::Answer {
            token,
            result: service.fetch_authoritative_answer(&query).await,
        },
    }
}
