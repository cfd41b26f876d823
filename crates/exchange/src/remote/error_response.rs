use serde::Deserialize;

use crate::error::ExchangeError;

/// Body Binance returns alongside a non-2xx status, e.g. `{"code":-2019,"msg":"Margin is insufficient."}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub msg: String,
}

impl ApiErrorResponse {
    /// Maps a failed response to an error. 429 and 418 (IP auto-ban) are rate limits.
    pub fn classify(status: u16, body: &str) -> ExchangeError {
        if status == 429 || status == 418 {
            return ExchangeError::RateLimited { status };
        }

        match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(api) => ExchangeError::Api {
                status,
                code: api.code,
                msg: api.msg,
            },
            Err(_) => ExchangeError::Api {
                status,
                code: 0,
                msg: body.trim().to_string(),
            },
        }
    }
}
