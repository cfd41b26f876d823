use std::sync::Mutex;

use async_trait::async_trait;
use common::models::{OrderAck, Position, Side, SymbolFilters};
use exchange::{ExchangeApi, ExchangeError};
use mockall::mock;
use rust_decimal::Decimal;

use crate::services::notifier::Notifier;

mock! {
    pub Exchange {}

    #[async_trait]
    impl ExchangeApi for Exchange {
        async fn symbol_filters(&self, symbol: &str) -> Result<SymbolFilters, ExchangeError>;
        async fn position(&self, symbol: &str) -> Result<Option<Position>, ExchangeError>;
        async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError>;
        async fn mark_price(&self, symbol: &str) -> Result<Decimal, ExchangeError>;
        async fn place_market_order(
            &self,
            symbol: &str,
            side: Side,
            quantity: Decimal,
            reduce_only: bool,
        ) -> Result<OrderAck, ExchangeError>;
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

pub fn ack(order_id: u64, symbol: &str, executed_qty: Decimal) -> OrderAck {
    OrderAck {
        order_id,
        symbol: symbol.to_string(),
        status: "FILLED".to_string(),
        executed_qty,
    }
}
