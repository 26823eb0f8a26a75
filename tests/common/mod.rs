// Shared test helpers; not every test binary uses every item.
#![allow(unused)]

use async_trait::async_trait;
use chrono::Utc;
use nonnobot::channels::GroupChannel;
use nonnobot::chat::{ContextEntry, ImageAttachment, IncomingMessage, Sender};
use nonnobot::config::Config;
use nonnobot::providers::{CompletionProvider, CompletionRequest};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub text: String,
    pub reply_to: Option<i32>,
}

/// In-memory stand-in for the Telegram channel. History is stored newest
/// first, the way the live channel serves it.
pub struct RecordingChannel {
    group_name: String,
    handle: Option<String>,
    history: Mutex<Vec<ContextEntry>>,
    sent: Mutex<Vec<SentMessage>>,
    typing_pings: AtomicUsize,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::with_history(Vec::new())
    }

    pub fn with_history(entries: Vec<ContextEntry>) -> Self {
        Self {
            group_name: "Famiglia".to_string(),
            handle: Some("@nonno_bot".to_string()),
            history: Mutex::new(entries),
            sent: Mutex::new(Vec::new()),
            typing_pings: AtomicUsize::new(0),
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn typing_pings(&self) -> usize {
        self.typing_pings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GroupChannel for RecordingChannel {
    fn name(&self) -> &str {
        &self.group_name
    }

    fn agent_handle(&self) -> Option<String> {
        self.handle.clone()
    }

    async fn history(&self, limit: usize) -> anyhow::Result<Vec<ContextEntry>> {
        Ok(self.history.lock().unwrap().iter().take(limit).cloned().collect())
    }

    async fn send(&self, text: &str, reply_to: Option<i32>) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(SentMessage {
            text: text.to_string(),
            reply_to,
        });
        Ok(())
    }

    async fn set_typing(&self) -> anyhow::Result<()> {
        self.typing_pings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear_typing(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Provider that serves queued replies and records every request it saw.
pub struct QueuedProvider {
    responses: Mutex<VecDeque<String>>,
    pub calls: Arc<Mutex<Vec<CompletionRequest>>>,
    pub default_response: String,
}

impl QueuedProvider {
    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            responses: Mutex::new(replies.iter().map(|s| (*s).to_string()).collect()),
            calls: Arc::new(Mutex::new(Vec::new())),
            default_response: "va bene".to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for QueuedProvider {
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.default_response.clone()))
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

pub struct FailingProvider;

#[async_trait]
impl CompletionProvider for FailingProvider {
    async fn complete(&self, _request: CompletionRequest) -> anyhow::Result<String> {
        anyhow::bail!("mock provider failure")
    }

    fn model(&self) -> &str {
        "failing-model"
    }
}

// --- Message builders ---

fn message(id: i32, text: Option<&str>, direct: bool, is_bot: bool) -> IncomingMessage {
    IncomingMessage {
        id,
        text: text.map(str::to_string),
        sender: Sender {
            name: "Mario".to_string(),
            is_bot,
        },
        is_reply_to_agent: direct,
        image: None,
        timestamp: Utc::now(),
    }
}

/// A reply to one of the agent's own messages.
pub fn direct_message(id: i32, text: &str) -> IncomingMessage {
    message(id, Some(text), true, false)
}

/// Ordinary group chatter, not addressed to the agent.
pub fn group_message(id: i32, text: &str) -> IncomingMessage {
    message(id, Some(text), false, false)
}

pub fn bot_message(id: i32, text: &str) -> IncomingMessage {
    message(id, Some(text), false, true)
}

pub fn photo_message(id: i32, caption: Option<&str>) -> IncomingMessage {
    let mut msg = message(id, caption, false, false);
    msg.image = Some(ImageAttachment {
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        mime: "image/jpeg".to_string(),
    });
    msg
}

pub fn entry(sender: &str, text: &str) -> ContextEntry {
    ContextEntry {
        sender_name: sender.to_string(),
        text: text.to_string(),
        timestamp: Utc::now(),
        replied_to: None,
    }
}

/// Baseline config with zero thinking delay so paused-clock tests stay
/// deterministic. Overrides win over the baseline.
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let base = [
        ("TELEGRAM_BOT_TOKEN", "123456:test"),
        ("TELEGRAM_GROUP_ID", "-100123"),
        ("OPENROUTER_API_KEY", "sk-or-test"),
        ("RESPONSE_DELAY_MIN", "0"),
        ("RESPONSE_DELAY_MAX", "0"),
    ];
    Config::from_lookup(|key| {
        overrides
            .iter()
            .chain(base.iter())
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
    })
    .expect("test config should be valid")
}
