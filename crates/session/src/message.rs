/// Text appended before the first step of a multi-step answer.
pub const REVEAL_INTRO_TEXT: &str = "Let me break this down step by step:";
/// Reply used when a successful response carries neither a reply nor steps.
pub const FALLBACK_REPLY_TEXT: &str = "I found a relevant video for you!";
/// Reply appended when the answering service call fails for any reason.
pub const APOLOGY_TEXT: &str = "Sorry, there was an error processing your message.";

/// Stable identifier for one timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Creates a typed message identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Who produced a message, plus the step position for step entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    User,
    Bot,
    /// One entry of a progressive reveal. `index` is 1-based within its group.
    Step { index: usize, is_final: bool },
}

/// Immutable timeline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub kind: MessageKind,
    pub text: String,
}

impl Message {
    pub fn new(id: MessageId, kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            text: text.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.kind == MessageKind::User
    }

    pub fn step_index(&self) -> Option<usize> {
        match self.kind {
            MessageKind::Step { index, .. } => Some(index),
            MessageKind::User | MessageKind::Bot => None,
        }
    }

    pub fn is_final_step(&self) -> bool {
        matches!(self.kind, MessageKind::Step { is_final: true, .. })
    }
}

/// The video currently shown next to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    pub video_id: String,
    pub title: String,
    pub view_count: u64,
    /// Canonical link reported by the service, when it sent one.
    pub url: Option<String>,
}

impl VideoReference {
    pub fn new(video_id: impl Into<String>, title: impl Into<String>, view_count: u64) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            view_count,
            url: None,
        }
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url.filter(|url| !url.trim().is_empty());
        self
    }

    /// Video shown before the first answer arrives.
    pub fn placeholder() -> Self {
        Self::new(
            "dQw4w9WgXcQ",
            "Rick Astley - Never Gonna Give You Up",
            1_000_000_000,
        )
    }

    pub fn watch_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", self.video_id))
    }

    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.video_id)
    }
}

impl Default for VideoReference {
    fn default() -> Self {
        Self::placeholder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_accessors_only_apply_to_steps() {
        let user = Message::new(MessageId::new(1), MessageKind::User, "hi");
        let last = Message::new(
            MessageId::new(2),
            MessageKind::Step {
                index: 3,
                is_final: true,
            },
            "Result: 4.",
        );

        assert!(user.is_user());
        assert_eq!(user.step_index(), None);
        assert!(!user.is_final_step());
        assert_eq!(last.step_index(), Some(3));
        assert!(last.is_final_step());
    }

    #[test]
    fn watch_url_prefers_service_link() {
        let derived = VideoReference::new("abc123", "Basics", 42);
        let linked = derived
            .clone()
            .with_url(Some("https://youtu.be/abc123".to_string()));
        let blank = derived.clone().with_url(Some(" ".to_string()));

        assert_eq!(derived.watch_url(), "https://www.youtube.com/watch?v=abc123");
        assert_eq!(derived.embed_url(), "https://www.youtube.com/embed/abc123");
        assert_eq!(linked.watch_url(), "https://youtu.be/abc123");
        assert_eq!(blank.url, None);
    }
}
