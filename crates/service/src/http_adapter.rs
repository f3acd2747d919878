use futures::FutureExt;
use reqwest::{Client, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::{ResultExt, ensure};

use super::payload::{ChatRequest, ChatResponse, HealthBanner, RandomVideo};
use super::service::{
    AnswerService, BuildClientSnafu, DecodePayloadSnafu, InvalidBaseUrlSnafu,
    MissingBaseUrlSnafu, ReadBodySnafu, SendRequestSnafu, ServiceConfig, ServiceFuture,
    ServiceResult, UnexpectedStatusSnafu,
};

pub const HTTP_SERVICE_NAME: &str = "http";

const CHAT_PATH: &str = "chat";
const RANDOM_VIDEO_PATH: &str = "random-video";

/// JSON-over-HTTP client for the answering service.
#[derive(Clone)]
pub struct HttpAnswerService {
    client: Client,
    base_url: Url,
}

impl HttpAnswerService {
    pub fn new(config: ServiceConfig) -> ServiceResult<Self> {
        ensure!(
            !config.base_url.is_empty(),
            MissingBaseUrlSnafu {
                stage: "http-service-new",
            }
        );

        let base_url = Self::parse_base_url(&config.base_url)?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context(BuildClientSnafu {
                stage: "build-http-client",
            })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn parse_base_url(raw: &str) -> ServiceResult<Url> {
        // `Url::join` drops the last path segment unless it ends with a slash.
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };

        Url::parse(&normalized).map_err(|source| {
            InvalidBaseUrlSnafu {
                stage: "parse-base-url",
                base_url: raw.to_string(),
                details: source.to_string(),
            }
            .build()
        })
    }

    fn endpoint(&self, path: &str) -> ServiceResult<Url> {
        self.base_url.join(path).map_err(|source| {
            InvalidBaseUrlSnafu {
                stage: "join-endpoint",
                base_url: self.base_url.to_string(),
                details: source.to_string(),
            }
            .build()
        })
    }

    async fn get_json<T>(client: Client, url: Url) -> ServiceResult<T>
    where
        T: DeserializeOwned,
    {
        let response = client
            .get(url.clone())
            .send()
            .await
            .context(SendRequestSnafu {
                stage: "send-get-request",
                url: url.to_string(),
            })?;

        Self::decode_response(response).await
    }

    async fn post_json<B, T>(client: Client, url: Url, body: B) -> ServiceResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let response = client
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .context(SendRequestSnafu {
                stage: "send-post-request",
                url: url.to_string(),
            })?;

        Self::decode_response(response).await
    }

    async fn decode_response<T>(response: reqwest::Response) -> ServiceResult<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let body = response.text().await.context(ReadBodySnafu {
            stage: "read-response-body",
        })?;

        if !status.is_success() {
            return UnexpectedStatusSnafu {
                stage: "response-http-status",
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        serde_json::from_str(&body).context(DecodePayloadSnafu {
            stage: "decode-response-body",
        })
    }
}

impl AnswerService for HttpAnswerService {
    fn name(&self) -> &str {
        HTTP_SERVICE_NAME
    }

    fn chat(&self, request: ChatRequest) -> ServiceFuture<ChatResponse> {
        let client = self.client.clone();
        let url = self.endpoint(CHAT_PATH);

        async move {
            let url = url?;
            tracing::debug!(%url, query_len = request.message.len(), "sending chat request");
            Self::post_json(client, url, request).await
        }
        .boxed()
    }

    fn random_video(&self) -> ServiceFuture<RandomVideo> {
        let client = self.client.clone();
        let url = self.endpoint(RANDOM_VIDEO_PATH);

        async move { Self::get_json(client, url?).await }.boxed()
    }

    fn health(&self) -> ServiceFuture<String> {
        let client = self.client.clone();
        let url = self.base_url.clone();

        async move {
            let banner: HealthBanner = Self::get_json(client, url).await?;
            Ok(banner.message)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceError;

    #[test]
    fn rejects_empty_base_url() {
        let result = HttpAnswerService::new(ServiceConfig::new("   "));

        assert!(matches!(result, Err(ServiceError::MissingBaseUrl { .. })));
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let result = HttpAnswerService::new(ServiceConfig::new("not a url"));

        assert!(matches!(result, Err(ServiceError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn joins_endpoints_under_base_path() {
        let service = HttpAnswerService::new(ServiceConfig::new("http://localhost:8000/api"))
            .expect("valid config");

        let url = service.endpoint(CHAT_PATH).expect("joinable path");

        assert_eq!(url.as_str(), "http://localhost:8000/api/chat");
    }
}
