use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use common::signal::{SignalError, parse_payload};
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::services::execution_service::{ExecutionError, ExecutionService};
use crate::services::notifier::Notifier;
use crate::services::stats_service::{Outcome, SignalStats, StatsSnapshot};

#[derive(Clone)]
pub struct AppState {
    /// Held for a whole signal so close-then-open sequences never interleave.
    execution: Arc<Mutex<ExecutionService>>,
    notifier: Arc<dyn Notifier>,
    stats: Arc<Mutex<SignalStats>>,
}

impl AppState {
    pub fn new(execution: ExecutionService, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            execution: Arc::new(Mutex::new(execution)),
            notifier,
            stats: Arc::new(Mutex::new(SignalStats::new(Utc::now()))),
        }
    }

    async fn record(&self, outcome: Outcome) {
        self.stats.lock().await.record(outcome, Utc::now());
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handle_signal))
        .route("/webhook", post(handle_signal))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Error)]
enum RelayError {
    #[error("invalid signal: {0}")]
    Signal(SignalError),
    #[error(transparent)]
    Execution(ExecutionError),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            Self::Signal(e) => (StatusCode::BAD_REQUEST, format!("Invalid signal: {}", e)),
            Self::Execution(e) if e.is_rate_limit() => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Exchange rate limit reached, try again later".to_string(),
            ),
            Self::Execution(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            ),
        }
        .into_response()
    }
}

async fn handle_signal(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), RelayError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("signal", %request_id);

    async move {
        info!("Body received: {}", String::from_utf8_lossy(&body));
        state.record(Outcome::Received).await;

        let result = match parse_payload(&body) {
            Ok(signal) => {
                let execution = state.execution.lock().await;
                execution
                    .execute(&signal)
                    .await
                    .map_err(RelayError::Execution)
            }
            Err(e) => Err(RelayError::Signal(e)),
        };

        match result {
            Ok(execution) => {
                if let Some(closed) = &execution.closed {
                    info!(
                        "Reversed {} {} from {} via order {} (exit {:?})",
                        closed.position.amount,
                        closed.position.symbol,
                        closed.position.entry_price,
                        closed.order.order_id,
                        closed.exit_price
                    );
                }
                info!(
                    "Signal processed: {} {} qty {} near {} order {}",
                    execution.signal.side,
                    execution.signal.symbol,
                    execution.quantity,
                    execution.mark_price,
                    execution.order.order_id
                );
                state.record(Outcome::Executed).await;
                Ok((StatusCode::OK, "Signal processed"))
            }
            Err(err) => {
                error!("Error: {}", err);
                let outcome = match err {
                    RelayError::Signal(_) => Outcome::Rejected,
                    RelayError::Execution(_) => Outcome::Failed,
                };
                state.record(outcome).await;
                state
                    .notifier
                    .notify(&format!("❌ Error processing signal: {}", err))
                    .await;
                Err(err)
            }
        }
    }
    .instrument(span)
    .await
}

async fn health() -> &'static str {
    "ok"
}

async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.lock().await.snapshot(Utc::now()))
}
