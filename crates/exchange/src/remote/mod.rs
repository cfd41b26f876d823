pub mod binance_client;
pub mod endpoints;
pub mod error_response;
pub mod exchange_info_response;
pub mod markprice_response;
pub mod order_response;
pub mod position_response;

pub use binance_client::{BinanceClient, sign_query};
pub use endpoints::Endpoint;
pub use error_response::ApiErrorResponse;
pub use exchange_info_response::ExchangeInfoResponse;
pub use markprice_response::{PremiumIndexResponse, TickerPriceResponse};
pub use order_response::OrderResponse;
pub use position_response::PositionRiskResponse;
