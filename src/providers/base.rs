use anyhow::Result;
use async_trait::async_trait;

use crate::chat::ImageAttachment;

/// One completion call: a system instruction plus a single user turn,
/// optionally carrying an inline image.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user_text: String,
    pub image: Option<ImageAttachment>,
    /// Overrides the provider's configured model when set.
    pub model: Option<String>,
}

impl CompletionRequest {
    pub fn text(system: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user_text: user_text.into(),
            image: None,
            model: None,
        }
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the generated text, trimmed. Single attempt; every failure is
    /// an error: missing credential, transport, non-2xx status, missing or
    /// empty content.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    fn model(&self) -> &str;
}
