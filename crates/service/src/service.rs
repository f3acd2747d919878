use std::time::Duration;

use futures::future::BoxFuture;
use snafu::Snafu;

use crate::payload::{ChatRequest, ChatResponse, RandomVideo};

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_URL)
    }
}

/// Future returned by service calls. Futures own everything they need so callers can
/// park them across suspension points without borrowing the service.
pub type ServiceFuture<T> = BoxFuture<'static, ServiceResult<T>>;
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ServiceError {
    #[snafu(display("answering service base URL is empty"))]
    MissingBaseUrl { stage: &'static str },
    #[snafu(display("answering service base URL '{base_url}' is invalid: {details}"))]
    InvalidBaseUrl {
        stage: &'static str,
        base_url: String,
        details: String,
    },
    #[snafu(display("failed to build HTTP client on `{stage}`: {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("request to {url} failed on `{stage}`: {source}"))]
    SendRequest {
        stage: &'static str,
        url: String,
        source: reqwest::Error,
    },
    #[snafu(display("failed to read response body on `{stage}`: {source}"))]
    ReadBody {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("answering service returned status {status}: {body}"))]
    UnexpectedStatus {
        stage: &'static str,
        status: u16,
        body: String,
    },
    #[snafu(display("failed to decode response payload on `{stage}`: {source}"))]
    DecodePayload {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("answering service did not respond within {after:?}"))]
    TimedOut {
        stage: &'static str,
        after: Duration,
    },
}

/// Remote answering service consumed by the chat session.
pub trait AnswerService: Send + Sync {
    fn name(&self) -> &str;
    /// Sends one user query and resolves with the video plus reply payload.
    fn chat(&self, request: ChatRequest) -> ServiceFuture<ChatResponse>;
    fn random_video(&self) -> ServiceFuture<RandomVideo>;
    /// Returns the service banner text.
    fn health(&self) -> ServiceFuture<String>;
}
