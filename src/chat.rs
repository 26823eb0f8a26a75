use chrono::{DateTime, Utc};

/// Sender identity attached to each inbound message.
#[derive(Debug, Clone)]
pub struct Sender {
    pub name: String,
    pub is_bot: bool,
}

/// Inline image payload, already downloaded from the platform.
#[derive(Clone)]
pub struct ImageAttachment {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("bytes", &format!("<{} bytes>", self.bytes.len()))
            .field("mime", &self.mime)
            .finish()
    }
}

/// A message received from the monitored group. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: i32,
    /// Photo captions count as text.
    pub text: Option<String>,
    pub sender: Sender,
    pub is_reply_to_agent: bool,
    pub image: Option<ImageAttachment>,
    pub timestamp: DateTime<Utc>,
}

impl IncomingMessage {
    /// Text for scoring and rendering; empty when the message carries none.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// The message a context entry replied to, when known.
#[derive(Debug, Clone)]
pub struct RepliedTo {
    pub sender_name: String,
    pub text: String,
}

/// One historical group message, as fed to the persona prompt.
#[derive(Debug, Clone)]
pub struct ContextEntry {
    pub sender_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub replied_to: Option<RepliedTo>,
}
