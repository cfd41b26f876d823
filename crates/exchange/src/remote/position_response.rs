use common::models::Position;
use serde::Deserialize;

use crate::error::ExchangeError;
use crate::traits::{RemoteResponse, parse_decimal};

/// One entry of `/fapi/v2/positionRisk`.
#[derive(Debug, Deserialize)]
pub struct PositionRiskResponse {
    pub symbol: String,
    #[serde(rename(deserialize = "positionAmt"))]
    pub position_amt: String,
    #[serde(rename(deserialize = "entryPrice"))]
    pub entry_price: String,
}

impl RemoteResponse<Position> for PositionRiskResponse {
    fn to_model(&self) -> Result<Position, ExchangeError> {
        Ok(Position {
            symbol: self.symbol.clone(),
            amount: parse_decimal("positionAmt", &self.position_amt)?,
            entry_price: parse_decimal("entryPrice", &self.entry_price)?,
        })
    }
}

/// Picks the entry for `symbol`. Hedge-mode accounts return one row per side;
/// their net amount is summed and the entry price of the largest leg is kept.
pub fn select_position(
    rows: &[PositionRiskResponse],
    symbol: &str,
) -> Result<Option<Position>, ExchangeError> {
    let mut selected: Option<Position> = None;

    for row in rows.iter().filter(|r| r.symbol == symbol) {
        let leg = row.to_model()?;
        selected = Some(match selected {
            None => leg,
            Some(mut acc) => {
                if leg.amount.abs() > acc.amount.abs() {
                    acc.entry_price = leg.entry_price;
                }
                acc.amount += leg.amount;
                acc
            }
        });
    }

    Ok(selected)
}
