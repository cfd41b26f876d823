use rust_decimal::Decimal;

use super::Side;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub symbol: String,
    /// Signed size: positive is long, negative is short.
    pub amount: Decimal,
    pub entry_price: Decimal,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.amount.is_zero()
    }

    /// True when a signal on `side` would trade against this position.
    pub fn is_opposite_to(&self, side: Side) -> bool {
        if self.is_flat() {
            return false;
        }
        match side {
            Side::Buy => self.amount.is_sign_negative(),
            Side::Sell => self.amount.is_sign_positive(),
        }
    }

    /// Estimated PnL of closing the whole position at `exit_price`.
    pub fn pnl_at(&self, exit_price: Decimal) -> Decimal {
        (exit_price - self.entry_price) * self.amount
    }
}
