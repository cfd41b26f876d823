use rust_decimal::Decimal;

/// Quantity constraints published by the exchange for one symbol (LOT_SIZE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolFilters {
    pub step_size: Decimal,
    pub min_qty: Decimal,
}

impl SymbolFilters {
    /// Used when exchangeInfo cannot be read.
    pub fn fallback() -> Self {
        Self {
            step_size: Decimal::new(1, 2),
            min_qty: Decimal::ZERO,
        }
    }
}
