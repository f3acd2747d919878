use std::sync::Arc;

mod http_adapter;
mod payload;
mod service;

pub use http_adapter::{HTTP_SERVICE_NAME, HttpAnswerService};
pub use payload::{ChatRequest, ChatResponse, HealthBanner, RandomVideo};
pub use service::{
    AnswerService, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SERVICE_URL, ServiceConfig, ServiceError,
    ServiceFuture, ServiceResult,
};

pub fn create_service(config: ServiceConfig) -> ServiceResult<Arc<dyn AnswerService>> {
    Ok(Arc::new(HttpAnswerService::new(config)?))
}
