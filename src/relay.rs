use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::llm::{CompletionError, CompletionResult, Completer};
use crate::platform::{IncomingMessage, MessageKind, Replier};

pub const GREETING: &str = "Привет! Я Telegram-бот, который общается с помощью LLM через OpenRouter. \
     Отправь мне сообщение, и я постараюсь ответить.";
pub const HELP: &str = "Просто отправь мне любое текстовое сообщение, и я передам его LLM. \
     Я отвечу тебе результатом.";
pub const THINKING: &str = "Думаю над ответом...";

/// Forwards plain text to the model and answers the built-in commands.
pub struct RelayHandler {
    completer: Arc<dyn Completer>,
}

impl RelayHandler {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }

    pub async fn handle(&self, replier: &dyn Replier, msg: &IncomingMessage) -> Result<()> {
        match msg.kind {
            MessageKind::Start => {
                info!("/start from user {}", msg.sender_id);
                replier.reply(msg, GREETING).await
            }
            MessageKind::Help => {
                info!("/help from user {}", msg.sender_id);
                replier.reply(msg, HELP).await
            }
            MessageKind::Text => self.relay(replier, msg).await,
        }
    }

    async fn relay(&self, replier: &dyn Replier, msg: &IncomingMessage) -> Result<()> {
        info!(
            "Text message from user {} ({} chars)",
            msg.sender_id,
            msg.text.chars().count()
        );

        replier.reply(msg, THINKING).await?;
        replier.typing(msg).await;

        let result = self.completer.complete(&msg.text).await;
        replier.reply(msg, &reply_text(result)).await
    }
}

/// User-facing text for a completion outcome
pub fn reply_text(result: CompletionResult) -> String {
    match result {
        Ok(text) => text,
        Err(CompletionError::Http { status, body }) => format!(
            "Произошла ошибка при обращении к LLM: {}. Пожалуйста, попробуйте еще раз позже. Детали: {}",
            status.as_u16(),
            body
        ),
        Err(CompletionError::Network(_)) => "Произошла ошибка сети при обращении к LLM. \
             Пожалуйста, проверьте подключение и повторите попытку."
            .to_string(),
        Err(CompletionError::MalformedResponse(_)) => {
            "Не удалось получить осмысленный ответ от LLM.".to_string()
        }
        Err(CompletionError::Unknown(_)) => {
            "Произошла непредвиденная ошибка при получении ответа от LLM.".to_string()
        }
    }
}
