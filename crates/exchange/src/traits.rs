use std::str::FromStr;

use async_trait::async_trait;
use common::models::{OrderAck, Position, Side, SymbolFilters};
use rust_decimal::Decimal;

use crate::error::ExchangeError;

/// Wire DTOs carry numbers as strings; this turns them into domain models.
pub trait RemoteResponse<T> {
    fn to_model(&self) -> Result<T, ExchangeError>;
}

pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, ExchangeError> {
    Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .map_err(|_| ExchangeError::Decode(format!("{} is not a decimal: '{}'", field, raw)))
}

/// The exchange operations a signal needs. Spot implementations report no
/// positions and treat leverage as a no-op.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    async fn symbol_filters(&self, symbol: &str) -> Result<SymbolFilters, ExchangeError>;

    /// `None` when the account has no entry for the symbol.
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
