use common::config::Market;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ExchangeInfo,
    Order,
    PositionRisk,
    Leverage,
    MarkPrice,
}

impl Endpoint {
    /// REST path for this endpoint, or `None` when the market has no equivalent.
    pub fn path(self, market: Market) -> Option<&'static str> {
        match (market, self) {
            (Market::UsdmFutures, Self::ExchangeInfo) => Some("/fapi/v1/exchangeInfo"),
            (Market::UsdmFutures, Self::Order) => Some("/fapi/v1/order"),
            (Market::UsdmFutures, Self::PositionRisk) => Some("/fapi/v2/positionRisk"),
            (Market::UsdmFutures, Self::Leverage) => Some("/fapi/v1/leverage"),
            (Market::UsdmFutures, Self::MarkPrice) => Some("/fapi/v1/premiumIndex"),
            (Market::Spot, Self::ExchangeInfo) => Some("/api/v3/exchangeInfo"),
            (Market::Spot, Self::Order) => Some("/api/v3/order"),
            (Market::Spot, Self::MarkPrice) => Some("/api/v3/ticker/price"),
            (Market::Spot, Self::PositionRisk | Self::Leverage) => None,
        }
    }
}
