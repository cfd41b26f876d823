use rust_decimal::Decimal;
use thiserror::Error;

/// Binance error code for a symbol the venue does not list.
const INVALID_SYMBOL: i64 = -1121;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate limited by exchange (HTTP {status})")]
    RateLimited { status: u16 },
    #[error("exchange rejected request (HTTP {status}, code {code}): {msg}")]
    Api { status: u16, code: i64, msg: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("symbol {0} is not listed")]
    UnknownSymbol(String),
    #[error("symbol {symbol} has no {filter} filter")]
    MissingFilter {
        symbol: String,
        filter: &'static str,
    },
    #[error("invalid price {0}")]
    InvalidPrice(Decimal),
    #[error("{notional} USDT at {price} is out of range for an order quantity")]
    QuantityOverflow { notional: Decimal, price: Decimal },
    #[error("{notional} USDT at {price} rounds below the minimum quantity (step {step}, min {min_qty})")]
    QuantityTooSmall {
        notional: Decimal,
        price: Decimal,
        step: Decimal,
        min_qty: Decimal,
    },
}

impl ExchangeError {
    /// Transport failures and rate limiting may succeed when sent again; everything
    /// else needs a different request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::RateLimited { .. } => true,
            _ => false,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Turns Binance's "Invalid symbol." rejection into `UnknownSymbol` for `symbol`.
    pub(crate) fn for_symbol(self, symbol: &str) -> Self {
        match self {
            Self::Api {
                code: INVALID_SYMBOL,
                ..
            } => Self::UnknownSymbol(symbol.to_string()),
            other => other,
        }
    }
}
