use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    ChatAction, FileId, Message as TgMessage, MessageId, ReplyParameters, Update, UserId,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::channels::base::GroupChannel;
use crate::chat::{ContextEntry, ImageAttachment, IncomingMessage, RepliedTo, Sender};
use crate::config::TelegramConfig;
use crate::errors::NonnoError;
use crate::persona::MEDIA_PLACEHOLDER;

/// Telegram supplies photos as JPEG regardless of the upload format.
const PHOTO_MIME: &str = "image/jpeg";
const PHOTO_PLACEHOLDER: &str = "[Foto]";

/// The Bot API cannot read past messages, so context is accumulated from the
/// updates seen since startup. Own sends are recorded too.
const HISTORY_CAP: usize = 100;

pub struct TelegramChannel {
    bot: Bot,
    chat_id: ChatId,
    group_name: String,
    agent_name: String,
    agent_username: String,
    log: Arc<Mutex<VecDeque<ContextEntry>>>,
}

impl TelegramChannel {
    /// Authenticates the bot, resolves the group title and starts the update
    /// dispatcher. Messages from the configured group arrive on the returned
    /// receiver.
    pub async fn connect(
        config: &TelegramConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<IncomingMessage>)> {
        let bot = Bot::new(&config.bot_token);
        let me = bot
            .get_me()
            .await
            .context("Failed to authenticate with the Telegram API")?;
        info!("Connected to Telegram as @{}", me.username());

        let chat_id = ChatId(config.group_id);
        let group_name = match bot.get_chat(chat_id).await {
            Ok(chat) => chat
                .title()
                .map_or_else(|| "Gruppo".to_string(), str::to_string),
            Err(err) => {
                warn!("Could not resolve the group title: {err:#}");
                "Gruppo".to_string()
            }
        };
        info!("Monitoring group '{group_name}' ({chat_id})");

        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Self {
            bot,
            chat_id,
            group_name,
            agent_name: me.first_name.clone(),
            agent_username: me.username().to_string(),
            log: Arc::new(Mutex::new(VecDeque::new())),
        };
        channel.spawn_dispatcher(tx, me.id);
        Ok((channel, rx))
    }

    fn spawn_dispatcher(&self, tx: mpsc::UnboundedSender<IncomingMessage>, agent_id: UserId) {
        let bot = self.bot.clone();
        let chat_id = self.chat_id;
        let log = Arc::clone(&self.log);

        let handler = Update::filter_message().endpoint(move |msg: TgMessage| {
            let bot = bot.clone();
            let tx = tx.clone();
            let log = Arc::clone(&log);
            async move {
                if msg.chat.id != chat_id {
                    return Ok::<(), anyhow::Error>(());
                }
                record_message(&log, &msg);
                let incoming = into_incoming(&bot, &msg, agent_id).await;
                if tx.send(incoming).is_err() {
                    debug!("Message receiver dropped; discarding update");
                }
                Ok(())
            }
        });

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler).build();
        tokio::spawn(async move {
            dispatcher.dispatch().await;
        });
    }

    fn record_own_message(&self, text: &str) {
        push_entry(
            &self.log,
            ContextEntry {
                sender_name: self.agent_name.clone(),
                text: text.to_string(),
                timestamp: Utc::now(),
                replied_to: None,
            },
        );
    }
}

#[async_trait]
impl GroupChannel for TelegramChannel {
    fn name(&self) -> &str {
        &self.group_name
    }

    fn agent_handle(&self) -> Option<String> {
        Some(format!("@{}", self.agent_username))
    }

    async fn history(&self, limit: usize) -> Result<Vec<ContextEntry>> {
        let log = self
            .log
            .lock()
            .map_err(|_| NonnoError::Channel("history buffer lock poisoned".to_string()))?;
        Ok(log.iter().rev().take(limit).cloned().collect())
    }

    async fn send(&self, text: &str, reply_to: Option<i32>) -> Result<()> {
        let mut request = self.bot.send_message(self.chat_id, text);
        if let Some(message_id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(message_id)));
        }
        request.await.context("Failed to send message")?;
        self.record_own_message(text);
        Ok(())
    }

    async fn set_typing(&self) -> Result<()> {
        self.bot
            .send_chat_action(self.chat_id, ChatAction::Typing)
            .await
            .context("Failed to send typing action")?;
        Ok(())
    }

    async fn clear_typing(&self) -> Result<()> {
        // The Telegram indicator expires a few seconds after the last action;
        // there is no explicit stop call.
        Ok(())
    }
}

async fn into_incoming(bot: &Bot, msg: &TgMessage, agent_id: UserId) -> IncomingMessage {
    let image = match largest_photo(msg) {
        Some(file_id) => match download_photo(bot, file_id).await {
            Ok(image) => Some(image),
            Err(err) => {
                warn!("Failed to download photo: {err:#}");
                None
            }
        },
        None => None,
    };

    let is_reply_to_agent = msg
        .reply_to_message()
        .and_then(|replied| replied.from.as_ref())
        .is_some_and(|user| user.id == agent_id);

    IncomingMessage {
        id: msg.id.0,
        text: msg.text().or_else(|| msg.caption()).map(str::to_string),
        sender: sender_of(msg),
        is_reply_to_agent,
        image,
        timestamp: msg.date,
    }
}

fn sender_of(msg: &TgMessage) -> Sender {
    if let Some(user) = &msg.from {
        let name = if user.first_name.is_empty() {
            user.username
                .clone()
                .unwrap_or_else(|| format!("User {}", user.id.0))
        } else {
            user.first_name.clone()
        };
        return Sender {
            name,
            is_bot: user.is_bot,
        };
    }
    // Channel posts and anonymous admins carry a sender chat instead.
    if let Some(chat) = &msg.sender_chat {
        return Sender {
            name: chat.title().unwrap_or("Canale").to_string(),
            is_bot: false,
        };
    }
    Sender {
        name: "Unknown".to_string(),
        is_bot: false,
    }
}

fn largest_photo(msg: &TgMessage) -> Option<FileId> {
    // Sizes are ordered smallest to largest.
    msg.photo()
        .and_then(|sizes| sizes.last())
        .map(|photo| photo.file.id.clone())
}

async fn download_photo(bot: &Bot, file_id: FileId) -> Result<ImageAttachment> {
    let file = bot
        .get_file(file_id)
        .await
        .context("Failed to look up the photo on Telegram")?;
    let mut bytes = Vec::new();
    bot.download_file(&file.path, &mut bytes)
        .await
        .context("Failed to download the photo")?;
    Ok(ImageAttachment {
        bytes,
        mime: PHOTO_MIME.to_string(),
    })
}

/// Prompt-facing stand-in for a message, media included.
fn entry_text(msg: &TgMessage) -> String {
    if let Some(text) = msg.text() {
        return text.to_string();
    }
    if let Some(caption) = msg.caption() {
        return caption.to_string();
    }
    if msg.photo().is_some() {
        return PHOTO_PLACEHOLDER.to_string();
    }
    MEDIA_PLACEHOLDER.to_string()
}

fn record_message(log: &Mutex<VecDeque<ContextEntry>>, msg: &TgMessage) {
    let replied_to = msg.reply_to_message().map(|replied| RepliedTo {
        sender_name: sender_of(replied).name,
        text: entry_text(replied),
    });
    push_entry(
        log,
        ContextEntry {
            sender_name: sender_of(msg).name,
            text: entry_text(msg),
            timestamp: msg.date,
            replied_to,
        },
    );
}

fn push_entry(log: &Mutex<VecDeque<ContextEntry>>, entry: ContextEntry) {
    if let Ok(mut log) = log.lock() {
        log.push_back(entry);
        while log.len() > HISTORY_CAP {
            log.pop_front();
        }
    }
}
