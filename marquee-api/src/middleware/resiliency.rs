use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use crate::error::SeatingErrorKind;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,   // Reservation service healthy
    Open,     // Failing fast
    HalfOpen, // Probing
}

/// Trips after `failure_threshold` consecutive upstream failures so a dead
/// reservation service is reported at once instead of after every retry.
pub struct CircuitBreaker {
    pub name: String,
    pub state: RwLock<CircuitState>,
    pub failure_count: AtomicUsize,
    pub failure_threshold: usize,
    pub reset_timeout: Duration,
    pub last_failure: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(name: &str, threshold: usize, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicUsize::new(0),
            failure_threshold: threshold.max(1),
            reset_timeout: timeout,
            last_failure: RwLock::new(None),
        }
    }

    pub async fn current(&self) -> CircuitState {
        *self.state.read().await
    }

    pub async fn check(&self) -> bool {
        let state = *self.state.read().await;
        match state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let last_fail = *self.last_failure.read().await;
                match last_fail {
                    Some(instant) if instant.elapsed() >= self.reset_timeout => {
                        *self.state.write().await = CircuitState::HalfOpen;
                        tracing::info!("Circuit Breaker [{}] moving to Half-Open", self.name);
                        true
                    }
                    _ => false,
                }
            }
        }
    }

    pub async fn record_success(&self) {
        let mut state = self.state.write().await;
        if *state == CircuitState::HalfOpen {
            tracing::info!("Circuit Breaker [{}] recovered to Closed", self.name);
        }
        *state = CircuitState::Closed;
        self.failure_count.store(0, Ordering::SeqCst);
    }

    pub async fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;

        if count >= self.failure_threshold || *state == CircuitState::HalfOpen {
            *state = CircuitState::Open;
            *self.last_failure.write().await = Some(Instant::now());
            tracing::error!("Circuit Breaker [{}] TRIPPED to Open. Failures: {}", self.name, count);
        }
    }
}

/// Only these routes reach the reservation service.
fn calls_reservation_service(method: &Method, path: &str) -> bool {
    if method != Method::POST {
        return false;
    }
    path == "/v1/screens" || path.ends_with("/refresh") || path.ends_with("/commit")
}

pub async fn circuit_breaker_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> impl IntoResponse {
    if !calls_reservation_service(req.method(), req.uri().path()) {
        return next.run(req).await;
    }

    let cb = &state.reservation_cb;
    if !cb.check().await {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": format!("Circuit Breaker [{}] is OPEN", cb.name),
                "kind": "fetch_error",
                "disposition": "banner",
                "retryable": true,
            })),
        )
            .into_response();
    }

    let response = next.run(req).await;

    // 502/503 are how upstream failures surface (see `error.rs`)
    match response.status() {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => cb.record_failure().await,
        status if status.is_success() => cb.record_success().await,
        _ => match response.extensions().get::<SeatingErrorKind>() {
            // The service answered; the rejection is about the seats
            Some(SeatingErrorKind(kind)) if *kind != "cancelled" => cb.record_success().await,
            // Unknown screen, bad input or a closed screen: upstream was never asked
            _ => {}
        },
    }

    response
}
