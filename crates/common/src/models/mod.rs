pub mod filters;
pub mod order;
pub mod position;
pub mod signal;

pub use filters::SymbolFilters;
pub use order::OrderAck;
pub use position::Position;
pub use signal::{Side, TradeSignal, UnknownSide};
