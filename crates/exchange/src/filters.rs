use common::models::SymbolFilters;
use rust_decimal::Decimal;

use crate::error::ExchangeError;

/// Floors `value` to a whole multiple of `step`. A non-positive step leaves the value as is.
/// `None` when the intermediate ratio does not fit in a `Decimal`.
pub fn round_to_step(value: Decimal, step: Decimal) -> Option<Decimal> {
    if step <= Decimal::ZERO {
        return Some(value);
    }
    let lots = value.checked_div(step)?.floor();
    Some(lots.checked_mul(step)?.normalize())
}

/// Quantity bought by spending `notional` quote currency at `price`, floored to the lot step.
pub fn order_quantity(
    notional: Decimal,
    price: Decimal,
    filters: &SymbolFilters,
) -> Result<Decimal, ExchangeError> {
    if price <= Decimal::ZERO {
        return Err(ExchangeError::InvalidPrice(price));
    }

    let quantity = notional
        .checked_div(price)
        .and_then(|raw| round_to_step(raw, filters.step_size))
        .ok_or(ExchangeError::QuantityOverflow { notional, price })?;
    if quantity <= Decimal::ZERO || quantity < filters.min_qty {
        return Err(ExchangeError::QuantityTooSmall {
            notional,
            price,
            step: filters.step_size,
            min_qty: filters.min_qty,
        });
    }
    Ok(quantity)
}
