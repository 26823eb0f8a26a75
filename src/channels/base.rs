use anyhow::Result;
use async_trait::async_trait;

use crate::chat::ContextEntry;

/// A group conversation the agent lives in.
///
/// The orchestrator only ever talks to this trait, so tests and future
/// platforms can swap in their own implementations.
#[async_trait]
pub trait GroupChannel: Send + Sync {
    /// Human-readable group name, used in prompts.
    fn name(&self) -> &str;

    /// The platform-level way users mention the agent (e.g. `@nonno_bot`),
    /// when the platform has one.
    fn agent_handle(&self) -> Option<String>;

    /// Up to `limit` recent messages, newest first.
    async fn history(&self, limit: usize) -> Result<Vec<ContextEntry>>;

    /// Send `text` to the group, optionally as a reply to a message.
    async fn send(&self, text: &str, reply_to: Option<i32>) -> Result<()>;

    /// Signal that the agent is typing. The indicator expires on its own, so
    /// callers refresh it periodically while composing.
    async fn set_typing(&self) -> Result<()>;

    /// Withdraw the typing indicator. No-op on platforms where it simply
    /// expires.
    async fn clear_typing(&self) -> Result<()>;
}
