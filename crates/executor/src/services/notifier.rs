use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Chat notifications are best effort: implementations log their own failures
/// and never fail the signal that produced the message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Used when no chat credentials are configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) {
        info!("Notification: {}", message);
    }
}

/// Hands messages to the background [`TelegramService`](super::telegram_service::TelegramService)
/// so a slow chat API never holds up a request.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<String>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, message: &str) {
        if let Err(e) = self.tx.try_send(message.to_string()) {
            warn!("Dropping notification, queue unavailable: {}", e);
        }
    }
}
