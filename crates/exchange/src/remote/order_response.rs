use common::models::OrderAck;
use serde::Deserialize;

use crate::error::ExchangeError;
use crate::traits::{RemoteResponse, parse_decimal};

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    #[serde(rename(deserialize = "orderId"))]
    pub order_id: u64,
    pub symbol: String,
    pub status: String,
    #[serde(rename(deserialize = "executedQty"))]
    pub executed_qty: String,
}

impl RemoteResponse<OrderAck> for OrderResponse {
    fn to_model(&self) -> Result<OrderAck, ExchangeError> {
        Ok(OrderAck {
            order_id: self.order_id,
            symbol: self.symbol.clone(),
            status: self.status.clone(),
            executed_qty: parse_decimal("executedQty", &self.executed_qty)?,
        })
    }
}
