use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, Me, MessageId, ReplyParameters};
use teloxide::update_listeners::Polling;
use tracing::{debug, info, warn};

use crate::config::TelegramConfig;
use crate::platform::{IncomingMessage, MessageKind, Replier};
use crate::relay::RelayHandler;

/// Stay below Telegram's 4096 char limit per message
const MAX_MESSAGE_LEN: usize = 4000;

/// Split long messages for Telegram's 4096 char limit
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// Replies by quoting the original Telegram message
pub struct TelegramReplier {
    bot: Bot,
}

impl TelegramReplier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Replier for TelegramReplier {
    async fn reply(&self, original: &IncomingMessage, text: &str) -> Result<()> {
        let chat_id = ChatId(original.chat_id);
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.bot
                .send_message(chat_id, chunk)
                .reply_parameters(
                    ReplyParameters::new(MessageId(original.message_id))
                        .allow_sending_without_reply(),
                )
                .await
                .with_context(|| format!("Failed to send reply to chat {}", original.chat_id))?;
        }
        Ok(())
    }

    async fn typing(&self, original: &IncomingMessage) {
        self.bot
            .send_chat_action(ChatId(original.chat_id), ChatAction::Typing)
            .await
            .ok();
    }
}

/// Run the Telegram long-polling loop until the process is stopped
pub async fn run(config: &TelegramConfig, relay: Arc<RelayHandler>) -> Result<()> {
    let mut bot = Bot::new(&config.bot_token);
    if let Some(api_url) = &config.api_url {
        let url = reqwest::Url::parse(api_url)
            .with_context(|| format!("Invalid Telegram API URL: {api_url}"))?;
        info!("Using Telegram Bot API at {}", url);
        bot = bot.set_api_url(url);
    }

    info!("Starting Telegram platform...");

    let handler = Update::filter_message().endpoint(handle_message);

    // Updates queued while the bot was offline are skipped
    let listener = Polling::builder(bot.clone())
        .drop_pending_updates()
        .build();

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![relay])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("telegram polling"),
        )
        .await;

    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    me: Me,
    relay: Arc<RelayHandler>,
) -> Result<()> {
    let Some(text) = msg.text() else {
        debug!("Ignoring non-text message {} in chat {}", msg.id.0, msg.chat.id.0);
        return Ok(());
    };

    let incoming = IncomingMessage {
        sender_id: msg.from.as_ref().map(|user| user.id.0).unwrap_or_default(),
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        text: text.to_string(),
        kind: MessageKind::classify(text, Some(me.username())),
    };

    relay.handle(&TelegramReplier::new(bot), &incoming).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_is_single_chunk() {
        assert_eq!(split_message("hello", 10), vec!["hello"]);
    }

    #[test]
    fn test_split_prefers_newline_then_space() {
        let chunks = split_message("aaaa\nbbbb cccc", 8);
        assert_eq!(chunks, vec!["aaaa\n", "bbbb ", "cccc"]);
        assert_eq!(chunks.concat(), "aaaa\nbbbb cccc");
    }

    #[test]
    fn test_split_respects_char_boundaries() {
        // Each Cyrillic letter is two bytes
        let text = "жжжжжжжжжж";
        let chunks = split_message(text, 5);
        assert!(chunks.iter().all(|c| c.len() <= 5));
        assert_eq!(chunks.concat(), text);
    }
}
