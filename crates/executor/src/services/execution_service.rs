use std::sync::Arc;

use common::config::TradingSettings;
use common::models::{OrderAck, Position, Side, SymbolFilters, TradeSignal};
use exchange::filters::order_quantity;
use exchange::{ExchangeApi, ExchangeError};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use crate::services::notifier::Notifier;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error("failed to close {amount} {symbol} before reversing: {source}")]
    CloseFailed {
        symbol: String,
        amount: Decimal,
        #[source]
        source: ExchangeError,
    },
    #[error("invalid market price {price} for {symbol}")]
    InvalidMarkPrice { symbol: String, price: Decimal },
}

impl ExecutionError {
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::Exchange(e) | Self::CloseFailed { source: e, .. } => e.is_rate_limit(),
            Self::InvalidMarkPrice { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedPosition {
    pub position: Position,
    pub order: OrderAck,
    pub exit_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub signal: TradeSignal,
    pub quantity: Decimal,
    pub mark_price: Decimal,
    pub order: OrderAck,
    pub closed: Option<ClosedPosition>,
}

/// Runs one signal against the exchange: size it, flatten an opposing
/// position, set leverage, then open at market.
pub struct ExecutionService {
    exchange: Arc<dyn ExchangeApi>,
    notifier: Arc<dyn Notifier>,
    trading: TradingSettings,
}

impl ExecutionService {
    pub fn new(
        exchange: Arc<dyn ExchangeApi>,
        notifier: Arc<dyn Notifier>,
        trading: TradingSettings,
    ) -> Self {
        Self {
            exchange,
            notifier,
            trading,
        }
    }

    pub async fn execute(&self, signal: &TradeSignal) -> Result<Execution, ExecutionError> {
        info!("RECEIVED SIGNAL: {:?} - Executing...", signal);

        let filters = self.filters(&signal.symbol).await?;
        let quantity = order_quantity(self.trading.order_usdt, signal.price, &filters)?;

        let closed = self.close_opposite(signal).await?;

        if let Err(e) = self
            .exchange
            .set_leverage(&signal.symbol, self.trading.leverage)
            .await
        {
            warn!("Could not set leverage for {}: {}", signal.symbol, e);
        }

        let mark_price = self.exchange.mark_price(&signal.symbol).await?;
        if mark_price <= Decimal::ZERO {
            return Err(ExecutionError::InvalidMarkPrice {
                symbol: signal.symbol.clone(),
                price: mark_price,
            });
        }

        let order = self
            .exchange
            .place_market_order(&signal.symbol, signal.side, quantity, false)
            .await?;
        info!(
            "ORDER EXECUTED: ID={}, Status={}",
            order.order_id, order.status
        );

        self.notifier
            .notify(&format!(
                "🚀 New trade executed:\n- Side: {}\n- Symbol: {}\n- Approx. price: ${}\n- Quantity: {}\n- Order ID: {}",
                signal.side,
                signal.symbol,
                mark_price.round_dp(2),
                quantity,
                order.order_id
            ))
            .await;

        Ok(Execution {
            signal: signal.clone(),
            quantity,
            mark_price,
            order,
            closed,
        })
    }

    /// Published LOT_SIZE for the symbol. An unlisted symbol is fatal; any other
    /// lookup failure falls back to a 0.01 step.
    async fn filters(&self, symbol: &str) -> Result<SymbolFilters, ExecutionError> {
        match self.exchange.symbol_filters(symbol).await {
            Ok(filters) => Ok(filters),
            Err(e @ ExchangeError::UnknownSymbol(_)) => Err(e.into()),
            Err(e) => {
                let fallback = SymbolFilters::fallback();
                warn!(
                    "Symbol filters for {} unavailable ({}), using step {}",
                    symbol, e, fallback.step_size
                );
                Ok(fallback)
            }
        }
    }

    async fn close_opposite(
        &self,
        signal: &TradeSignal,
    ) -> Result<Option<ClosedPosition>, ExecutionError> {
        let Some(position) = self.exchange.position(&signal.symbol).await? else {
            return Ok(None);
        };
        if !position.is_opposite_to(signal.side) {
            return Ok(None);
        }

        let side = Side::closing(position.amount);
        let quantity = position.amount.abs();
        info!(
            "Closing opposite position on {}: {} {}",
            signal.symbol, side, quantity
        );

        let order = self
            .exchange
            .place_market_order(&signal.symbol, side, quantity, true)
            .await
            .map_err(|source| ExecutionError::CloseFailed {
                symbol: signal.symbol.clone(),
                amount: position.amount,
                source,
            })?;

        self.notifier
            .notify(&format!(
                "🔄 Previous position closed:\n- {} {}\n- Quantity: {}",
                side, signal.symbol, quantity
            ))
            .await;

        let exit_price = match self.exchange.mark_price(&signal.symbol).await {
            Ok(price) => {
                self.notifier.notify(&pnl_message(&position, price)).await;
                Some(price)
            }
            Err(e) => {
                warn!("Could not price closed position on {}: {}", signal.symbol, e);
                None
            }
        };

        Ok(Some(ClosedPosition {
            position,
            order,
            exit_price,
        }))
    }
}

fn pnl_message(position: &Position, exit_price: Decimal) -> String {
    let pnl = position.pnl_at(exit_price).round_dp(2);
    let line = if pnl >= Decimal::ZERO {
        format!("✅ PnL: +{} USDT", pnl)
    } else {
        format!("❌ PnL: -{} USDT", pnl.abs())
    };
    format!(
        "📊 Results:\n- Entry: ${}\n- Exit: ${}\n{}",
        position.entry_price,
        exit_price.round_dp(2),
        line
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockExchange, RecordingNotifier, ack};
    use mockall::Sequence;
    use rust_decimal_macros::dec;

    fn trading() -> TradingSettings {
        TradingSettings {
            order_usdt: dec!(200),
            leverage: 3,
        }
    }

    fn signal(side: Side) -> TradeSignal {
        TradeSignal {
            side,
            symbol: "BTCUSDT".to_string(),
            price: dec!(65000),
        }
    }

    fn btc_filters() -> SymbolFilters {
        SymbolFilters {
            step_size: dec!(0.001),
            min_qty: dec!(0.001),
        }
    }

    fn service(exchange: MockExchange, notifier: Arc<RecordingNotifier>) -> ExecutionService {
        ExecutionService::new(Arc::new(exchange), notifier, trading())
    }

    #[tokio::test]
    async fn opens_position_when_flat() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_symbol_filters()
            .returning(|_| Ok(btc_filters()));
        exchange.expect_position().returning(|_| Ok(None));
        exchange
            .expect_set_leverage()
            .withf(|symbol, leverage| symbol == "BTCUSDT" && *leverage == 3)
            .times(1)
            .returning(|_, _| Ok(()));
        exchange
            .expect_mark_price()
            .returning(|_| Ok(dec!(65012.456)));
        exchange
            .expect_place_market_order()
            .withf(|symbol, side, qty, reduce_only| {
                symbol == "BTCUSDT" && *side == Side::Buy && *qty == dec!(0.003) && !reduce_only
            })
            .times(1)
            .returning(|symbol, _, qty, _| Ok(ack(42, symbol, qty)));

        let notifier = Arc::new(RecordingNotifier::default());
        let execution = service(exchange, notifier.clone())
            .execute(&signal(Side::Buy))
            .await
            .unwrap();

        assert_eq!(execution.quantity, dec!(0.003));
        assert_eq!(execution.order.order_id, 42);
        assert!(execution.closed.is_none());

        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Side: BUY"));
        assert!(messages[0].contains("Approx. price: $65012.46"));
        assert!(messages[0].contains("Order ID: 42"));
    }

    #[tokio::test]
    async fn closes_opposite_position_before_opening() {
        let mut seq = Sequence::new();
        let mut exchange = MockExchange::new();
        exchange
            .expect_symbol_filters()
            .returning(|_| Ok(btc_filters()));
        exchange.expect_position().returning(|symbol| {
            Ok(Some(Position {
                symbol: symbol.to_string(),
                amount: dec!(0.010),
                entry_price: dec!(60000),
            }))
        });
        exchange
            .expect_place_market_order()
            .withf(|_, side, qty, reduce_only| {
                *side == Side::Sell && *qty == dec!(0.01) && *reduce_only
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|symbol, _, qty, _| Ok(ack(1, symbol, qty)));
        exchange.expect_set_leverage().returning(|_, _| Ok(()));
        exchange.expect_mark_price().returning(|_| Ok(dec!(65000)));
        exchange
            .expect_place_market_order()
            .withf(|_, side, qty, reduce_only| {
                *side == Side::Sell && *qty == dec!(0.003) && !reduce_only
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|symbol, _, qty, _| Ok(ack(2, symbol, qty)));

        let notifier = Arc::new(RecordingNotifier::default());
        let execution = service(exchange, notifier.clone())
            .execute(&signal(Side::Sell))
            .await
            .unwrap();

        let closed = execution.closed.expect("opposite position closed");
        assert_eq!(closed.order.order_id, 1);
        assert_eq!(closed.exit_price, Some(dec!(65000)));
        assert_eq!(execution.order.order_id, 2);

        let messages = notifier.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].contains("Previous position closed"));
        assert!(messages[1].ends_with("✅ PnL: +50.00 USDT"));
        assert!(messages[2].contains("New trade executed"));
    }

    #[tokio::test]
    async fn same_side_position_is_left_alone() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_symbol_filters()
            .returning(|_| Ok(btc_filters()));
        exchange.expect_position().returning(|symbol| {
            Ok(Some(Position {
                symbol: symbol.to_string(),
                amount: dec!(0.5),
                entry_price: dec!(60000),
            }))
        });
        exchange.expect_set_leverage().returning(|_, _| Ok(()));
        exchange.expect_mark_price().returning(|_| Ok(dec!(65000)));
        exchange
            .expect_place_market_order()
            .times(1)
            .returning(|symbol, _, qty, _| Ok(ack(7, symbol, qty)));

        let notifier = Arc::new(RecordingNotifier::default());
        let execution = service(exchange, notifier)
            .execute(&signal(Side::Buy))
            .await
            .unwrap();
        assert!(execution.closed.is_none());
    }

    #[tokio::test]
    async fn failed_close_aborts_without_opening() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_symbol_filters()
            .returning(|_| Ok(btc_filters()));
        exchange.expect_position().returning(|symbol| {
            Ok(Some(Position {
                symbol: symbol.to_string(),
                amount: dec!(-0.02),
                entry_price: dec!(66000),
            }))
        });
        exchange
            .expect_place_market_order()
            .times(1)
            .returning(|_, _, _, _| {
                Err(ExchangeError::Api {
                    status: 400,
                    code: -2022,
                    msg: "ReduceOnly Order is rejected.".to_string(),
                })
            });
        exchange.expect_set_leverage().never();
        exchange.expect_mark_price().never();

        let notifier = Arc::new(RecordingNotifier::default());
        let err = service(exchange, notifier.clone())
            .execute(&signal(Side::Buy))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::CloseFailed { .. }));
        assert!(!err.is_rate_limit());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn leverage_failure_is_not_fatal() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_symbol_filters()
            .returning(|_| Ok(btc_filters()));
        exchange.expect_position().returning(|_| Ok(None));
        exchange.expect_set_leverage().returning(|_, _| {
            Err(ExchangeError::Api {
                status: 400,
                code: -4028,
                msg: "Leverage 3 is not valid".to_string(),
            })
        });
        exchange.expect_mark_price().returning(|_| Ok(dec!(65000)));
        exchange
            .expect_place_market_order()
            .times(1)
            .returning(|symbol, _, qty, _| Ok(ack(9, symbol, qty)));

        let notifier = Arc::new(RecordingNotifier::default());
        assert!(
            service(exchange, notifier)
                .execute(&signal(Side::Buy))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn zero_mark_price_stops_before_ordering() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_symbol_filters()
            .returning(|_| Ok(btc_filters()));
        exchange.expect_position().returning(|_| Ok(None));
        exchange.expect_set_leverage().returning(|_, _| Ok(()));
        exchange.expect_mark_price().returning(|_| Ok(Decimal::ZERO));
        exchange.expect_place_market_order().never();

        let notifier = Arc::new(RecordingNotifier::default());
        let err = service(exchange, notifier)
            .execute(&signal(Side::Buy))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidMarkPrice { .. }));
    }

    #[tokio::test]
    async fn filter_lookup_failure_falls_back_to_default_step() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_symbol_filters()
            .returning(|_| Err(ExchangeError::Decode("timeout".to_string())));
        exchange.expect_position().returning(|_| Ok(None));
        exchange.expect_set_leverage().returning(|_, _| Ok(()));
        exchange.expect_mark_price().returning(|_| Ok(dec!(150)));
        exchange
            .expect_place_market_order()
            .withf(|_, _, qty, _| *qty == dec!(1.33))
            .times(1)
            .returning(|symbol, _, qty, _| Ok(ack(3, symbol, qty)));

        let notifier = Arc::new(RecordingNotifier::default());
        let sol = TradeSignal {
            side: Side::Buy,
            symbol: "SOLUSDT".to_string(),
            price: dec!(150),
        };
        let execution = service(exchange, notifier).execute(&sol).await.unwrap();
        assert_eq!(execution.quantity, dec!(1.33));
    }

    #[tokio::test]
    async fn unknown_symbol_and_tiny_notional_never_reach_the_order_endpoint() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_symbol_filters()
            .returning(|symbol| Err(ExchangeError::UnknownSymbol(symbol.to_string())));
        exchange.expect_place_market_order().never();

        let notifier = Arc::new(RecordingNotifier::default());
        let err = service(exchange, notifier.clone())
            .execute(&signal(Side::Buy))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Exchange(ExchangeError::UnknownSymbol(_))
        ));

        let mut exchange = MockExchange::new();
        exchange.expect_symbol_filters().returning(|_| {
            Ok(SymbolFilters {
                step_size: dec!(0.001),
                min_qty: dec!(0.01),
            })
        });
        exchange.expect_place_market_order().never();

        let err = service(exchange, notifier)
            .execute(&signal(Side::Buy))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Exchange(ExchangeError::QuantityTooSmall { .. })
        ));
    }

    #[test]
    fn pnl_message_formats_losses_without_double_sign() {
        let short = Position {
            symbol: "BTCUSDT".to_string(),
            amount: dec!(-0.01),
            entry_price: dec!(60000),
        };
        let message = pnl_message(&short, dec!(61000));
        assert!(message.contains("❌ PnL: -10"));
        assert!(!message.contains("--"));
    }
}
