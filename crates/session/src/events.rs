/// Intents the presentation layer dispatches to a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIntent {
    /// The user asked to send the given input text.
    Submit { content: String },
}

impl SessionIntent {
    pub fn submit(content: impl Into<String>) -> Self {
        Self::Submit {
            content: content.into(),
        }
    }
}
