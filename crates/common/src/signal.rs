//! Turns inbound alert payloads into [`TradeSignal`]s.
//!
//! Three body shapes are accepted:
//!
//! * structured JSON: `{"side": "buy", "symbol": "BTCUSDT", "price": 65000.5}`
//! * JSON with a free-text field: `{"message": "🟢 BUY - BTCUSDTPERP a 65000.5"}`
//! * the free text itself, posted as `text/plain`
//!
//! Free-text alerts carry a `BUY -` or `SELL -` marker followed by the symbol,
//! an optional connector word (`a`, `at`, `@`) and the trigger price.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{Side, TradeSignal};

const CONNECTORS: &[&str] = &["a", "at", "@"];
const KNOWN_SUFFIXES: &[&str] = &[".P", "PERP"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("empty alert message")]
    EmptyMessage,
    #[error("alert body is not valid UTF-8")]
    NotUtf8,
    #[error("malformed JSON payload: {0}")]
    Malformed(String),
    #[error("no 'BUY -' or 'SELL -' marker in message: {0}")]
    MissingSide(String),
    #[error("unknown side '{0}'")]
    UnknownSide(String),
    #[error("invalid symbol '{0}'")]
    InvalidSymbol(String),
    #[error("invalid price '{0}'")]
    InvalidPrice(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WebhookPayload {
    Structured {
        side: String,
        symbol: String,
        price: Value,
    },
    Text {
        message: String,
    },
}

pub fn parse_payload(body: &[u8]) -> Result<TradeSignal, SignalError> {
    let text = std::str::from_utf8(body).map_err(|_| SignalError::NotUtf8)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(SignalError::EmptyMessage);
    }

    if !text.starts_with('{') {
        return parse_message(text);
    }

    let payload: WebhookPayload =
        serde_json::from_str(text).map_err(|e| SignalError::Malformed(e.to_string()))?;

    match payload {
        WebhookPayload::Structured {
            side,
            symbol,
            price,
        } => {
            let side = Side::from_str(&side).map_err(|e| SignalError::UnknownSide(e.0))?;
            let symbol = normalize_symbol(&symbol)?;
            let price = match price {
                Value::Number(n) => parse_price(&n.to_string())?,
                Value::String(s) => parse_price(&s)?,
                other => return Err(SignalError::InvalidPrice(other.to_string())),
            };
            Ok(TradeSignal {
                side,
                symbol,
                price,
            })
        }
        WebhookPayload::Text { message } => parse_message(&message),
    }
}

pub fn parse_message(message: &str) -> Result<TradeSignal, SignalError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(SignalError::EmptyMessage);
    }

    let (side, rest) =
        split_at_marker(message).ok_or_else(|| SignalError::MissingSide(message.to_string()))?;

    let mut tokens = rest.split_whitespace();
    let raw_symbol = tokens
        .next()
        .ok_or_else(|| SignalError::InvalidSymbol(String::new()))?;
    let symbol = normalize_symbol(raw_symbol)?;

    let price_token = match tokens.next() {
        Some(token) if CONNECTORS.contains(&token.to_lowercase().as_str()) => tokens.next(),
        other => other,
    }
    .ok_or_else(|| SignalError::InvalidPrice(String::new()))?;

    Ok(TradeSignal {
        side,
        symbol,
        price: parse_price(price_token)?,
    })
}

/// Upper-cases and strips exchange prefixes (`BINANCE:`) and contract suffixes
/// (`.P`, `PERP`) so the alert ticker matches the exchange symbol.
pub fn normalize_symbol(raw: &str) -> Result<String, SignalError> {
    let upper = raw.trim().to_ascii_uppercase();
    let mut symbol = upper.rsplit(':').next().unwrap_or_default();

    for suffix in KNOWN_SUFFIXES {
        if let Some(stripped) = symbol.strip_suffix(suffix) {
            symbol = stripped;
        }
    }

    if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SignalError::InvalidSymbol(raw.to_string()));
    }
    Ok(symbol.to_string())
}

fn parse_price(raw: &str) -> Result<Decimal, SignalError> {
    let cleaned = raw
        .trim()
        .trim_start_matches('$')
        .trim_end_matches(|c: char| !c.is_ascii_digit());

    let price = Decimal::from_str(cleaned)
        .or_else(|_| Decimal::from_scientific(cleaned))
        .map_err(|_| SignalError::InvalidPrice(raw.to_string()))?;

    if price <= Decimal::ZERO {
        return Err(SignalError::InvalidPrice(raw.to_string()));
    }
    Ok(price)
}

/// Finds the earliest `BUY -` / `SELL -` marker and returns the text after it.
fn split_at_marker(message: &str) -> Option<(Side, &str)> {
    [Side::Buy, Side::Sell]
        .into_iter()
        .filter_map(|side| {
            message
                .match_indices(side.as_str())
                .find_map(|(idx, word)| {
                    let rest = message[idx + word.len()..].trim_start().strip_prefix('-')?;
                    Some((idx, side, rest))
                })
        })
        .min_by_key(|(idx, _, _)| *idx)
        .map(|(_, side, rest)| (side, rest))
}
