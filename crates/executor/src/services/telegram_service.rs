use common::config::TelegramSettings;
use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::{error, info};

pub struct TelegramService {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramService {
    pub fn new(settings: &TelegramSettings) -> Self {
        Self {
            bot: Bot::new(settings.bot_token.clone()),
            chat_id: ChatId(settings.chat_id),
        }
    }

    pub async fn start(self, mut rx: mpsc::Receiver<String>) {
        info!("Starting Telegram Notification Service");

        while let Some(msg) = rx.recv().await {
            // Send message and log error if it fails, but don't crash
            if let Err(e) = self.bot.send_message(self.chat_id, msg).await {
                error!("Failed to send Telegram message: {}", e);
            }
        }

        info!("Telegram notification channel closed. Stopping service.");
    }
}
