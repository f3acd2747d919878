use crate::message::{Message, MessageId, MessageKind, VideoReference};

/// Receives every timeline append, after the message is stored.
pub trait TimelineObserver: Send {
    fn message_appended(&mut self, message: &Message);
}

/// Owned append-only timeline plus the live video reference.
///
/// Every mutation goes through [`SessionState::append_message`] or
/// [`SessionState::set_video`]; nothing hands out mutable access to stored entries.
pub struct SessionState {
    timeline: Vec<Message>,
    video: VideoReference,
    video_revision: u64,
    next_message_id: u64,
    observers: Vec<Box<dyn TimelineObserver>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::with_video(VideoReference::placeholder())
    }

    pub fn with_video(video: VideoReference) -> Self {
        Self {
            timeline: Vec::new(),
            video,
            video_revision: 0,
            next_message_id: 1,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn TimelineObserver>) {
        self.observers.push(observer);
    }

    /// Appends one message at the end of the timeline and notifies observers.
    pub fn append_message(&mut self, kind: MessageKind, text: impl Into<String>) -> MessageId {
        let id = MessageId::new(self.next_message_id);
        self.next_message_id = self.next_message_id.saturating_add(1);

        let message = Message::new(id, kind, text);
        tracing::trace!(message_id = id.0, kind = ?message.kind, "timeline append");
        self.timeline.push(message);

        if let Some(message) = self.timeline.last() {
            for observer in &mut self.observers {
                observer.message_appended(message);
            }
        }

        id
    }

    /// Replaces the live video in one step.
    pub fn set_video(&mut self, video: VideoReference) {
        self.video = video;
        self.video_revision = self.video_revision.saturating_add(1);
    }

    pub fn current_video(&self) -> &VideoReference {
        &self.video
    }

    /// Number of replacements since the session started; zero means the placeholder is live.
    pub fn video_revision(&self) -> u64 {
        self.video_revision
    }

    pub fn timeline(&self) -> &[Message] {
        &self.timeline
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
