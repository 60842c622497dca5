use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use marquee_api::middleware::{CircuitBreaker, CircuitState};
use marquee_api::sweeper::start_screen_sweeper;
use marquee_api::{app, AppState};
use marquee_core::{InMemorySeatService, PriceTier, RetryPolicy, ScreenConfig, SeatStatus, ShowtimeId};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

async fn setup(max_seats: usize) -> (Router, Arc<InMemorySeatService>) {
    let service = Arc::new(InMemorySeatService::new());
    service
        .add_grid(ShowtimeId::new("st-1"), &["A", "B"], 4, PriceTier::Standard)
        .await;

    let config = ScreenConfig {
        max_seats,
        retry: RetryPolicy::none(),
        ..ScreenConfig::default()
    };
    let state = AppState::new(service.clone(), config);
    (app(state), service)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn open(app: &Router) -> String {
    let (status, body) = send(app, "POST", "/v1/screens", Some(json!({"showtime_id": "st-1"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["screen_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_open_screen_returns_seat_map() {
    let (app, _) = setup(8).await;

    let (status, body) = send(&app, "POST", "/v1/screens", Some(json!({"showtime_id": "st-1"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["state"], "EMPTY");
    assert_eq!(body["available"], 8);
    assert_eq!(body["seats"].as_array().unwrap().len(), 8);
    assert_eq!(body["seats"][0]["seatId"], "A1");

    let screen_id = body["screen_id"].as_str().unwrap();
    let (status, body) = send(&app, "GET", &format!("/v1/screens/{}", screen_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["showtime_id"], "st-1");
}

#[tokio::test]
async fn test_unknown_showtime_redirects() {
    let (app, _) = setup(8).await;

    let (status, body) = send(&app, "POST", "/v1/screens", Some(json!({"showtime_id": "does-not-exist"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
    assert_eq!(body["disposition"], "redirect");
}

#[tokio::test]
async fn test_toggle_and_limits() {
    let (app, _) = setup(2).await;
    let screen_id = open(&app).await;
    let toggle = |seat: &str| format!("/v1/screens/{}/seats/{}/toggle", screen_id, seat);

    let (status, body) = send(&app, "POST", &toggle("A1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected"], true);
    assert_eq!(body["state"], "PARTIAL");

    let (_, body) = send(&app, "POST", &toggle("b2"), None).await;
    assert_eq!(body["selection"], json!(["A1", "B2"]));
    assert_eq!(body["state"], "FULL");

    let (status, body) = send(&app, "POST", &toggle("A3"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "selection_limit_exceeded");

    // Deselecting at the limit is always allowed
    let (_, body) = send(&app, "POST", &toggle("A1"), None).await;
    assert_eq!(body["selected"], false);
    assert_eq!(body["selection"], json!(["B2"]));

    let (status, body) = send(&app, "POST", &toggle("Z9"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "unknown_seat");

    let (status, _) = send(&app, "POST", &toggle("A0"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_toggle_booked_seat_is_rejected() {
    let (app, service) = setup(8).await;
    service
        .set_status(&ShowtimeId::new("st-1"), &"A2".parse().unwrap(), SeatStatus::Booked)
        .await
        .unwrap();
    let screen_id = open(&app).await;

    let (status, body) = send(&app, "POST", &format!("/v1/screens/{}/seats/A2/toggle", screen_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "seat_unavailable");
    assert_eq!(body["disposition"], "inline");
}

#[tokio::test]
async fn test_commit_with_stale_seat_then_release() {
    let (app, service) = setup(8).await;
    let screen_id = open(&app).await;

    for seat in ["A1", "A2"] {
        let (status, _) = send(&app, "POST", &format!("/v1/screens/{}/seats/{}/toggle", screen_id, seat), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    // Someone else books A2 in the meantime
    service
        .set_status(&ShowtimeId::new("st-1"), &"A2".parse().unwrap(), SeatStatus::Booked)
        .await
        .unwrap();

    let commit_uri = format!("/v1/screens/{}/commit", screen_id);
    let (status, body) = send(&app, "POST", &commit_uri, Some(json!({"user_id": "user-7"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "stale_selection");
    assert_eq!(body["seats"], json!(["A2"]));

    // Selection is untouched until the user releases the stale seat
    let (_, body) = send(&app, "GET", &format!("/v1/screens/{}", screen_id), None).await;
    assert_eq!(body["selection"], json!(["A1", "A2"]));

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/screens/{}/release", screen_id),
        Some(json!({"seat_ids": ["A2"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selection"], json!(["A1"]));

    let (status, body) = send(&app, "POST", &commit_uri, Some(json!({"user_id": "user-7"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["reference"].as_str().unwrap().starts_with("RSV-"));
    assert_eq!(body["seat_ids"], json!(["A1"]));

    let (_, body) = send(&app, "GET", &format!("/v1/screens/{}", screen_id), None).await;
    assert_eq!(body["state"], "EMPTY");
    assert_eq!(body["available"], 6);
}

#[tokio::test]
async fn test_commit_empty_selection() {
    let (app, _) = setup(8).await;
    let screen_id = open(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/screens/{}/commit", screen_id),
        Some(json!({"user_id": "user-7"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "empty_selection");
}

#[tokio::test]
async fn test_refresh_reports_changes() {
    let (app, service) = setup(8).await;
    let screen_id = open(&app).await;
    send(&app, "POST", &format!("/v1/screens/{}/seats/B1/toggle", screen_id), None).await;

    service
        .set_status(&ShowtimeId::new("st-1"), &"B1".parse().unwrap(), SeatStatus::Held)
        .await
        .unwrap();

    let (status, body) = send(&app, "POST", &format!("/v1/screens/{}/refresh", screen_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invalidated"], json!(["B1"]));
    assert_eq!(body["changes"][0]["seat"], "B1");
    assert_eq!(body["changes"][0]["to"], "HELD");
    assert_eq!(body["screen"]["selection"], json!(["B1"]));
}

#[tokio::test]
async fn test_leave_screen() {
    let (app, _) = setup(8).await;
    let screen_id = open(&app).await;
    let uri = format!("/v1/screens/{}", screen_id);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_events_stream_is_sse() {
    let (app, _) = setup(8).await;
    let screen_id = open(&app).await;

    let request = Request::builder()
        .uri(format!("/v1/screens/{}/events", screen_id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
}

#[tokio::test]
async fn test_circuit_opens_after_repeated_upstream_failures() {
    let (app, service) = setup(8).await;
    service.fail_next_fetches(100);

    for _ in 0..5 {
        let (status, body) = send(&app, "POST", "/v1/screens", Some(json!({"showtime_id": "st-1"}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["retryable"], true);
    }
    assert_eq!(service.fetch_count(), 5);

    let (status, body) = send(&app, "POST", "/v1/screens", Some(json!({"showtime_id": "st-1"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("OPEN"));
    assert_eq!(service.fetch_count(), 5);

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reservation_service"], "Open");
}

#[tokio::test]
async fn test_local_misses_do_not_close_a_half_open_breaker() {
    let service = Arc::new(InMemorySeatService::new());
    service
        .add_grid(ShowtimeId::new("st-1"), &["A"], 4, PriceTier::Standard)
        .await;
    let mut state = AppState::new(service, ScreenConfig::default());
    state.reservation_cb = Arc::new(CircuitBreaker::new("reservation-service", 1, Duration::from_millis(10)));
    let app = app(state.clone());

    state.reservation_cb.record_failure().await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Unknown screen: answered locally, the reservation service is never asked
    let (status, _) = send(&app, "POST", &format!("/v1/screens/{}/refresh", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(state.reservation_cb.current().await, CircuitState::HalfOpen);

    let (status, _) = send(&app, "POST", "/v1/screens", Some(json!({"showtime_id": "st-1"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(state.reservation_cb.current().await, CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_screens_are_evicted() {
    let service = Arc::new(InMemorySeatService::new());
    service
        .add_grid(ShowtimeId::new("st-1"), &["A", "B"], 4, PriceTier::Standard)
        .await;
    let config = ScreenConfig {
        refresh_interval: Some(Duration::from_secs(20)),
        idle_timeout: Some(Duration::from_secs(60)),
        retry: RetryPolicy::none(),
        ..ScreenConfig::default()
    };
    let state = AppState::new(service.clone(), config);
    let _sweeper = start_screen_sweeper(state.clone(), Duration::from_secs(60));
    let app = app(state.clone());

    for _ in 0..50 {
        open(&app).await;
    }
    let active = open(&app).await;
    assert_eq!(state.open_screens().await, 51);

    // Only the active screen keeps being used
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_secs(30)).await;
        let (status, _) = send(&app, "GET", &format!("/v1/screens/{}", active), None).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(state.open_screens().await, 1);

    let fetches = service.fetch_count();
    tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
    assert_eq!(state.open_screens().await, 0);
    // At most one refresh per screen after the point where every abandoned one was gone
    assert!(service.fetch_count() <= fetches + 3);

    let (status, _) = send(&app, "GET", &format!("/v1/screens/{}", active), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
