use std::sync::Arc;

use dotenvy::dotenv;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use common::config::Settings;
use common::logger;
use exchange::BinanceClient;

use crate::router::AppState;
use crate::services::execution_service::ExecutionService;
use crate::services::notifier::{ChannelNotifier, LogNotifier, Notifier};
use crate::services::public_ip::log_public_ip;
use crate::services::telegram_service::TelegramService;

mod router;
mod services;
#[cfg(test)]
mod test_support;

const NOTIFICATION_QUEUE: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("System starting up...");

    let settings = Settings::from_env()?;
    info!(
        "Trading {} on {} with {} USDT per signal at {}x",
        settings.binance.market,
        settings.binance.base_url,
        settings.trading.order_usdt,
        settings.trading.leverage
    );

    let notifier: Arc<dyn Notifier> = match &settings.telegram {
        Some(telegram) => {
            let (notify_tx, notify_rx) = mpsc::channel::<String>(NOTIFICATION_QUEUE);
            tokio::spawn(TelegramService::new(telegram).start(notify_rx));
            Arc::new(ChannelNotifier::new(notify_tx))
        }
        None => {
            warn!("TELEGRAM_BOT_TOKEN/TELEGRAM_CHAT_ID not set, notifications go to the log only");
            Arc::new(LogNotifier)
        }
    };

    log_public_ip().await;

    let client = BinanceClient::new(&settings.binance)?;
    let execution = ExecutionService::new(
        Arc::new(client),
        notifier.clone(),
        settings.trading.clone(),
    );
    let app = router::router(AppState::new(execution, notifier));

    let addr = settings.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Relay listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Relay stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
