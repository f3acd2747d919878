use serde::{Deserialize, Serialize};

/// Body of one `POST /chat` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Answer payload returned by the chat endpoint.
///
/// The video fields are required; a response without them is treated as malformed.
/// `reply` and `reply_steps` are both optional so older service builds that only send
/// a single reply still decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub video_id: String,
    pub video_title: String,
    pub video_views: u64,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub reply_steps: Option<Vec<String>>,
}

impl ChatResponse {
    /// Step texts with blank entries dropped, in service order.
    pub fn step_texts(&self) -> Vec<String> {
        self.reply_steps
            .iter()
            .flatten()
            .filter(|step| !step.trim().is_empty())
            .cloned()
            .collect()
    }

    /// Single reply text, if the service sent a non-blank one.
    pub fn reply_text(&self) -> Option<&str> {
        self.reply
            .as_deref()
            .filter(|reply| !reply.trim().is_empty())
    }
}

/// Payload of `GET /random-video`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomVideo {
    pub video_id: String,
    pub title: String,
    pub views: u64,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// Payload of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthBanner {
    pub message: String,
}
