pub mod execution_service;
pub mod notifier;
pub mod public_ip;
pub mod stats_service;
pub mod telegram_service;
