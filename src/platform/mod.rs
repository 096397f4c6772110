pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// How an incoming message should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Start,
    Help,
    Text,
}

impl MessageKind {
    /// Classify message text. `/start` and `/help` may carry arguments and an
    /// `@bot_username` suffix; any other text, unknown commands included, is
    /// plain text for the model.
    pub fn classify(text: &str, bot_username: Option<&str>) -> Self {
        let Some(first) = text.split_whitespace().next() else {
            return Self::Text;
        };
        let Some(command) = first.strip_prefix('/') else {
            return Self::Text;
        };

        let name = match command.split_once('@') {
            Some((name, mention)) => match bot_username {
                Some(username) if mention.eq_ignore_ascii_case(username) => name,
                Some(_) => return Self::Text,
                None => name,
            },
            None => command,
        };

        if name.eq_ignore_ascii_case("start") {
            Self::Start
        } else if name.eq_ignore_ascii_case("help") {
            Self::Help
        } else {
            Self::Text
        }
    }
}

/// A text message received from the chat platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub sender_id: u64,
    pub chat_id: i64,
    /// Platform message id, used to quote the original in replies
    pub message_id: i32,
    pub text: String,
    pub kind: MessageKind,
}

/// Sends replies back into the conversation a message came from.
#[async_trait]
pub trait Replier: Send + Sync {
    async fn reply(&self, original: &IncomingMessage, text: &str) -> Result<()>;

    /// Best-effort "typing" indicator.
    async fn typing(&self, _original: &IncomingMessage) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_commands() {
        assert_eq!(MessageKind::classify("/start", None), MessageKind::Start);
        assert_eq!(MessageKind::classify("/help", None), MessageKind::Help);
        assert_eq!(MessageKind::classify("/HELP", None), MessageKind::Help);
        assert_eq!(MessageKind::classify("  /start now", None), MessageKind::Start);
    }

    #[test]
    fn test_classify_plain_text() {
        assert_eq!(MessageKind::classify("Hello", None), MessageKind::Text);
        assert_eq!(MessageKind::classify("", None), MessageKind::Text);
        assert_eq!(MessageKind::classify("/clear", None), MessageKind::Text);
        assert_eq!(MessageKind::classify("what does /start do?", None), MessageKind::Text);
        assert_eq!(MessageKind::classify("/starting", None), MessageKind::Text);
    }

    #[test]
    fn test_classify_bot_mention() {
        let bot = Some("relay_bot");
        assert_eq!(MessageKind::classify("/start@relay_bot", bot), MessageKind::Start);
        assert_eq!(MessageKind::classify("/help@Relay_Bot", bot), MessageKind::Help);
        assert_eq!(MessageKind::classify("/start@other_bot", bot), MessageKind::Text);
        assert_eq!(MessageKind::classify("/start@other_bot", None), MessageKind::Start);
    }
}
