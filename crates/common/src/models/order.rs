use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub order_id: u64,
    pub symbol: String,
    pub status: String,
    pub executed_qty: Decimal,
}
