use std::env;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Which Binance product the relay trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    /// USDⓈ-margined perpetual futures (`/fapi/`).
    UsdmFutures,
    Spot,
}

impl Market {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::UsdmFutures => "https://fapi.binance.com",
            Self::Spot => "https://api.binance.com",
        }
    }

    /// Spot accounts hold balances, not positions, and have no leverage.
    pub fn has_positions(self) -> bool {
        matches!(self, Self::UsdmFutures)
    }
}

impl FromStr for Market {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "futures" | "usdm" | "fapi" => Ok(Self::UsdmFutures),
            "spot" => Ok(Self::Spot),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsdmFutures => f.write_str("futures"),
            Self::Spot => f.write_str("spot"),
        }
    }
}

#[derive(Clone)]
pub struct BinanceSettings {
    pub api_key: String,
    pub api_secret: String,
    pub market: Market,
    pub base_url: String,
    pub recv_window: u64,
}

// Keys stay out of logs.
impl fmt::Debug for BinanceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceSettings")
            .field("market", &self.market)
            .field("base_url", &self.base_url)
            .field("recv_window", &self.recv_window)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: i64,
}

impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct TradingSettings {
    /// USDT notional spent per signal.
    pub order_usdt: Decimal,
    pub leverage: u32,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub port: u16,
    pub binance: BinanceSettings,
    /// `None` when the Telegram pair is not configured; notifications are then only logged.
    pub telegram: Option<TelegramSettings>,
    pub trading: TradingSettings,
}

impl Settings {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let or_default = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let market_raw = or_default("BINANCE_MARKET", "futures");
        let market = market_raw.parse::<Market>().map_err(|_| ConfigError::Invalid {
            key: "BINANCE_MARKET",
            value: market_raw.clone(),
        })?;

        let binance = BinanceSettings {
            api_key: required("BINANCE_API_KEY")?,
            api_secret: required("BINANCE_API_SECRET")?,
            market,
            base_url: or_default("BINANCE_BASE_URL", market.default_base_url())
                .trim_end_matches('/')
                .to_string(),
            recv_window: parse_value(
                "BINANCE_RECV_WINDOW",
                or_default("BINANCE_RECV_WINDOW", "5000"),
            )?,
        };

        let telegram = match (lookup("TELEGRAM_BOT_TOKEN"), lookup("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) if !bot_token.is_empty() && !chat_id.is_empty() => {
                Some(TelegramSettings {
                    bot_token,
                    chat_id: parse_value("TELEGRAM_CHAT_ID", chat_id)?,
                })
            }
            _ => None,
        };

        let order_usdt: Decimal = parse_value("ORDER_USDT", or_default("ORDER_USDT", "200"))?;
        if order_usdt <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                key: "ORDER_USDT",
                value: order_usdt.to_string(),
            });
        }

        let leverage: u32 = parse_value("LEVERAGE", or_default("LEVERAGE", "3"))?;
        if leverage == 0 {
            return Err(ConfigError::Invalid {
                key: "LEVERAGE",
                value: leverage.to_string(),
            });
        }

        Ok(Self {
            bind_addr: or_default("BIND_ADDR", "0.0.0.0"),
            port: parse_value("PORT", or_default("PORT", "8080"))?,
            binance,
            telegram,
            trading: TradingSettings {
                order_usdt,
                leverage,
            },
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { key, value })
}
