use std::sync::Arc;

use tracing::{debug, error, info};

use crate::chat::{ContextEntry, IncomingMessage};
use crate::config::PersonaConfig;
use crate::providers::{CompletionProvider, CompletionRequest};

mod prompt;
pub(crate) use prompt::MEDIA_PLACEHOLDER;
pub use prompt::PromptTask;

/// Fallback personality line for the prompt context block.
pub const DEFAULT_PERSONALITY: &str =
    "un signore italiano di 65+ anni, gentile e curioso, spesso confuso dalla tecnologia";
pub const DEFAULT_STYLE: &str = "casual";

/// Turns conversation context into persona-consistent generated text.
///
/// Never propagates generation failures: every error is logged and collapses
/// to `None`, so the conversation pipeline stays silent on failure.
pub struct PersonaResponder {
    provider: Arc<dyn CompletionProvider>,
    group_name: String,
    personality: String,
    style: String,
}

impl PersonaResponder {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        group_name: impl Into<String>,
        persona: &PersonaConfig,
    ) -> Self {
        Self {
            provider,
            group_name: group_name.into(),
            personality: persona
                .personality
                .clone()
                .unwrap_or_else(|| DEFAULT_PERSONALITY.to_string()),
            style: persona
                .style
                .clone()
                .unwrap_or_else(|| DEFAULT_STYLE.to_string()),
        }
    }

    /// Reply to a group message. `history` must be oldest→newest.
    pub async fn respond(
        &self,
        message: &IncomingMessage,
        history: &[ContextEntry],
    ) -> Option<String> {
        self.generate(PromptTask::Reply { message, history }).await
    }

    /// Startup greeting built from recent history alone.
    pub async fn greet(&self, history: &[ContextEntry]) -> Option<String> {
        self.generate(PromptTask::Greeting { history }).await
    }

    async fn generate(&self, task: PromptTask<'_>) -> Option<String> {
        let system = prompt::system_instruction(&task);
        let user = prompt::render(&task, &self.group_name, &self.personality, &self.style);
        debug!("Generated prompt ({} chars)", user.chars().count());

        let mut request = CompletionRequest::text(system, user);
        if let PromptTask::Reply { message, .. } = &task
            && let Some(image) = &message.image
        {
            info!("Processing message with image");
            request = request.with_image(image.clone());
        }

        match self.provider.complete(request).await {
            Ok(text) => {
                info!("Completion response length: {} chars", text.chars().count());
                Some(text)
            }
            Err(err) => {
                error!("Completion request failed: {err:#}");
                None
            }
        }
    }
}
