/// Emitted when the user submits the input box content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub content: String,
}

impl Submit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Emitted when the video panel asks to open the current video externally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenVideo {
    pub url: String,
}
