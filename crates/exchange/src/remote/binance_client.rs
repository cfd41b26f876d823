use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use common::config::{BinanceSettings, Market};
use common::models::{OrderAck, Position, Side, SymbolFilters};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::{debug, error, info, warn};

use crate::error::ExchangeError;
use crate::remote::endpoints::Endpoint;
use crate::remote::error_response::ApiErrorResponse;
use crate::remote::exchange_info_response::ExchangeInfoResponse;
use crate::remote::markprice_response::{PremiumIndexResponse, TickerPriceResponse};
use crate::remote::order_response::OrderResponse;
use crate::remote::position_response::{PositionRiskResponse, select_position};
use crate::traits::{ExchangeApi, RemoteResponse};

type HmacSha256 = Hmac<Sha256>;

const USER_AGENT: &str = "signal_relay/0.1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Hex-encoded HMAC-SHA256 of `query` under `secret`, as Binance expects in `signature`.
pub fn sign_query(secret: &str, query: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn canonical_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    market: Market,
    base_url: String,
    api_key: String,
    secret_key: String,
    recv_window: u64,
}

impl BinanceClient {
    pub fn new(settings: &BinanceSettings) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            market: settings.market,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            secret_key: settings.api_secret.clone(),
            recv_window: settings.recv_window,
        })
    }

    pub fn market(&self) -> Market {
        self.market
    }

    fn sign(&self, query: &str) -> String {
        sign_query(&self.secret_key, query)
    }

    /// Appends `recvWindow`, `timestamp` and the signature to `params`.
    fn signed_query(&self, params: &[(&str, String)], timestamp: u64) -> String {
        let mut all = params.to_vec();
        all.push(("recvWindow", self.recv_window.to_string()));
        all.push(("timestamp", timestamp.to_string()));

        let query = canonical_query(&all);
        let signature = self.sign(&query);
        format!("{}&signature={}", query, signature)
    }

    fn path(&self, endpoint: Endpoint) -> Result<&'static str, ExchangeError> {
        endpoint.path(self.market).ok_or_else(|| {
            ExchangeError::Decode(format!("{:?} is not available on {}", endpoint, self.market))
        })
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        let query = self.signed_query(params, now_millis());
        let url = format!("{}{}?{}", self.base_url, self.path(endpoint)?, query);

        let resp = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await?;

        Self::read_response(endpoint, resp).await
    }

    async fn send_public<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        let url = format!("{}{}", self.base_url, self.path(endpoint)?);

        let resp = self.client.get(&url).query(params).send().await?;

        Self::read_response(endpoint, resp).await
    }

    async fn read_response<T: DeserializeOwned>(
        endpoint: Endpoint,
        resp: Response,
    ) -> Result<T, ExchangeError> {
        if let Some(used_weight) = resp
            .headers()
            .get("x-mbx-used-weight-1m")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok())
        {
            if used_weight > 1000 {
                warn!("High API weight usage: {}", used_weight);
            } else {
                debug!("Used weights: {}/1200", used_weight);
            }
        }

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err = ApiErrorResponse::classify(status.as_u16(), &body);
            error!("Binance {:?} failed: {}", endpoint, err);
            return Err(err);
        }

        serde_json::from_str::<T>(&body)
            .map_err(|e| ExchangeError::Decode(format!("{:?}: {} in {}", endpoint, e, body)))
    }
}

#[async_trait]
impl ExchangeApi for BinanceClient {
    async fn symbol_filters(&self, symbol: &str) -> Result<SymbolFilters, ExchangeError> {
        let info: ExchangeInfoResponse = self
            .send_public(Endpoint::ExchangeInfo, &[("symbol", symbol.to_string())])
            .await
            .map_err(|e| e.for_symbol(symbol))?;
        info.filters_for(symbol)
    }

    async fn position(&self, symbol: &str) -> Result<Option<Position>, ExchangeError> {
        if !self.market.has_positions() {
            return Ok(None);
        }

        let rows: Vec<PositionRiskResponse> = self
            .send_signed(
                Method::GET,
                Endpoint::PositionRisk,
                &[("symbol", symbol.to_string())],
            )
            .await?;
        select_position(&rows, symbol)
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError> {
        if !self.market.has_positions() {
            return Ok(());
        }

        let _: serde_json::Value = self
            .send_signed(
                Method::POST,
                Endpoint::Leverage,
                &[
                    ("symbol", symbol.to_string()),
                    ("leverage", leverage.to_string()),
                ],
            )
            .await?;
        info!("Leverage for {} set to {}x", symbol, leverage);
        Ok(())
    }

    async fn mark_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        let params = [("symbol", symbol.to_string())];
        match self.market {
            Market::UsdmFutures => self
                .send_public::<PremiumIndexResponse>(Endpoint::MarkPrice, &params)
                .await?
                .to_model(),
            Market::Spot => self
                .send_public::<TickerPriceResponse>(Endpoint::MarkPrice, &params)
                .await?
                .to_model(),
        }
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        reduce_only: bool,
    ) -> Result<OrderAck, ExchangeError> {
        let mut params = vec![
            ("symbol", symbol.to_uppercase()),
            ("side", side.to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", quantity.normalize().to_string()),
        ];
        if reduce_only && self.market.has_positions() {
            params.push(("reduceOnly", "true".to_string()));
        }

        info!("Placing Order: {} {} {}", side, quantity, symbol);

        let order: OrderResponse = self
            .send_signed(Method::POST, Endpoint::Order, &params)
            .await?;
        order.to_model()
    }
}
