use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ExchangeError;
use crate::traits::{RemoteResponse, parse_decimal};

/// `/fapi/v1/premiumIndex?symbol=`
#[derive(Deserialize, Debug)]
pub struct PremiumIndexResponse {
    pub symbol: String,
    #[serde(rename(deserialize = "markPrice"))]
    pub mark_price: String,
}

impl RemoteResponse<Decimal> for PremiumIndexResponse {
    fn to_model(&self) -> Result<Decimal, ExchangeError> {
        parse_decimal("markPrice", &self.mark_price)
    }
}

/// `/api/v3/ticker/price?symbol=`, the spot stand-in for a mark price.
#[derive(Deserialize, Debug)]
pub struct TickerPriceResponse {
    pub symbol: String,
    pub price: String,
}

impl RemoteResponse<Decimal> for TickerPriceResponse {
    fn to_model(&self) -> Result<Decimal, ExchangeError> {
        parse_decimal("price", &self.price)
    }
}
