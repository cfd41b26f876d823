use common::models::SymbolFilters;
use serde::Deserialize;

use crate::error::ExchangeError;
use crate::traits::parse_decimal;

const LOT_SIZE: &str = "LOT_SIZE";

#[derive(Debug, Deserialize)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
}

#[derive(Debug, Deserialize)]
pub struct FilterEntry {
    #[serde(rename(deserialize = "filterType"))]
    pub filter_type: String,
    #[serde(rename(deserialize = "stepSize"))]
    pub step_size: Option<String>,
    #[serde(rename(deserialize = "minQty"))]
    pub min_qty: Option<String>,
}

impl ExchangeInfoResponse {
    pub fn filters_for(&self, symbol: &str) -> Result<SymbolFilters, ExchangeError> {
        let info = self
            .symbols
            .iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| ExchangeError::UnknownSymbol(symbol.to_string()))?;

        let missing = || ExchangeError::MissingFilter {
            symbol: symbol.to_string(),
            filter: LOT_SIZE,
        };

        let lot = info
            .filters
            .iter()
            .find(|f| f.filter_type == LOT_SIZE)
            .ok_or_else(missing)?;

        let step_size = lot.step_size.as_deref().ok_or_else(missing)?;
        let min_qty = lot.min_qty.as_deref().unwrap_or("0");

        Ok(SymbolFilters {
            step_size: parse_decimal("stepSize", step_size)?.normalize(),
            min_qty: parse_decimal("minQty", min_qty)?.normalize(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const RAW: &str = r#"{
        "timezone": "UTC",
        "symbols": [
            {
                "symbol": "BTCUSDT",
                "status": "TRADING",
                "filters": [
                    {"filterType":"PRICE_FILTER","minPrice":"556.80","maxPrice":"4529764","tickSize":"0.10"},
                    {"filterType":"LOT_SIZE","maxQty":"1000","minQty":"0.001","stepSize":"0.001"},
                    {"filterType":"MARKET_LOT_SIZE","maxQty":"120","minQty":"0.001","stepSize":"0.001"}
                ]
            },
            {
                "symbol": "ETHBTC",
                "filters": [
                    {"filterType":"LOT_SIZE","minQty":"0.00010000","maxQty":"100000.00000000","stepSize":"0.00010000"}
                ]
            },
            {"symbol": "NOLOT", "filters": [{"filterType":"PRICE_FILTER","tickSize":"0.01"}]}
        ]
    }"#;

    fn info() -> ExchangeInfoResponse {
        serde_json::from_str(RAW).unwrap()
    }

    #[test]
    fn reads_lot_size() {
        let f = info().filters_for("BTCUSDT").unwrap();
        assert_eq!(f.step_size, dec!(0.001));
        assert_eq!(f.min_qty, dec!(0.001));
    }

    #[test]
    fn spot_padding_is_normalized() {
        let f = info().filters_for("ETHBTC").unwrap();
        assert_eq!(f.step_size.to_string(), "0.0001");
    }

    #[test]
    fn unknown_symbol_and_missing_filter() {
        assert!(matches!(
            info().filters_for("FOOUSDT"),
            Err(ExchangeError::UnknownSymbol(_))
        ));
        assert!(matches!(
            info().filters_for("NOLOT"),
            Err(ExchangeError::MissingFilter { .. })
        ));
    }
}
