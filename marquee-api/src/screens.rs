use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures_util::{Stream, StreamExt};
use marquee_core::{
    ReservationReceipt, ScreenSnapshot, Seat, SeatSelectionScreen, SeatStatus, SeatStatusChange,
    SelectionState, Toggle,
};
use marquee_shared::{SeatId, ShowtimeId, UserId};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;
use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OpenScreenRequest {
    pub showtime_id: ShowtimeId,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseSeatsRequest {
    pub seat_ids: Vec<SeatId>,
}

#[derive(Debug, Deserialize)]
pub struct CommitScreenRequest {
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
pub struct ScreenResponse {
    pub screen_id: Uuid,
    pub showtime_id: ShowtimeId,
    pub state: SelectionState,
    pub limit: usize,
    pub selection: Vec<SeatId>,
    pub available: usize,
    pub fetched_at: DateTime<Utc>,
    pub seats: Vec<Seat>,
}

impl ScreenResponse {
    fn from_snapshot(screen_id: Uuid, snapshot: ScreenSnapshot) -> Self {
        Self {
            screen_id,
            showtime_id: snapshot.showtime_id,
            state: snapshot.state,
            limit: snapshot.limit,
            selection: snapshot.selection.into_iter().collect(),
            available: snapshot.seat_map.count(SeatStatus::Available),
            fetched_at: snapshot.seat_map.fetched_at(),
            seats: snapshot.seat_map.seats().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub screen_id: Uuid,
    pub selection: Vec<SeatId>,
    pub state: SelectionState,
    /// Set for toggles: whether the seat is now selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub screen: ScreenResponse,
    pub changes: Vec<SeatStatusChange>,
    pub invalidated: Vec<SeatId>,
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/screens", post(open_screen))
        .route("/v1/screens/{screen_id}", get(get_screen).delete(leave_screen))
        .route("/v1/screens/{screen_id}/seats/{seat_id}/toggle", post(toggle_seat))
        .route("/v1/screens/{screen_id}/refresh", post(refresh_screen))
        .route("/v1/screens/{screen_id}/release", post(release_seats))
        .route("/v1/screens/{screen_id}/commit", post(commit_screen))
        .route("/v1/screens/{screen_id}/events", get(screen_events))
}

/// POST /v1/screens
/// Load the seat map of a showtime and open an empty selection
async fn open_screen(
    State(state): State<AppState>,
    Json(req): Json<OpenScreenRequest>,
) -> Result<(StatusCode, Json<ScreenResponse>), AppError> {
    let screen = SeatSelectionScreen::open(
        Arc::clone(&state.service),
        req.showtime_id,
        state.screen_config.clone(),
    )
    .await?;

    let (screen_id, screen) = state.insert_screen(screen).await;
    tracing::info!("Screen {} opened for showtime {}", screen_id, screen.showtime_id());

    let snapshot = screen.snapshot().await;
    Ok((StatusCode::CREATED, Json(ScreenResponse::from_snapshot(screen_id, snapshot))))
}

/// GET /v1/screens/{screen_id}
/// Cached seat map and current selection, no upstream call
async fn get_screen(
    State(state): State<AppState>,
    Path(screen_id): Path<Uuid>,
) -> Result<Json<ScreenResponse>, AppError> {
    let screen = state.screen(screen_id).await?;
    let snapshot = screen.snapshot().await;
    Ok(Json(ScreenResponse::from_snapshot(screen_id, snapshot)))
}

/// POST /v1/screens/{screen_id}/seats/{seat_id}/toggle
async fn toggle_seat(
    State(state): State<AppState>,
    Path((screen_id, seat_id)): Path<(Uuid, String)>,
) -> Result<Json<SelectionResponse>, AppError> {
    let seat_id: SeatId = seat_id
        .parse()
        .map_err(|e| AppError::ValidationError(format!("{}", e)))?;

    let screen = state.screen(screen_id).await?;
    let toggle = screen.toggle(&seat_id).await?;
    let snapshot = screen.snapshot().await;

    Ok(Json(SelectionResponse {
        screen_id,
        selection: snapshot.selection.into_iter().collect(),
        state: snapshot.state,
        selected: Some(toggle == Toggle::Selected),
    }))
}

/// POST /v1/screens/{screen_id}/refresh
async fn refresh_screen(
    State(state): State<AppState>,
    Path(screen_id): Path<Uuid>,
) -> Result<Json<RefreshResponse>, AppError> {
    let screen = state.screen(screen_id).await?;
    let report = screen.refresh().await?;
    let snapshot = screen.snapshot().await;

    Ok(Json(RefreshResponse {
        screen: ScreenResponse::from_snapshot(screen_id, snapshot),
        changes: report.changes,
        invalidated: report.invalidated,
    }))
}

/// POST /v1/screens/{screen_id}/release
/// Deselect seats named by a stale-selection error
async fn release_seats(
    State(state): State<AppState>,
    Path(screen_id): Path<Uuid>,
    Json(req): Json<ReleaseSeatsRequest>,
) -> Result<Json<SelectionResponse>, AppError> {
    let screen = state.screen(screen_id).await?;
    let selection = screen.release(&req.seat_ids).await?;
    let current_state = screen.state().await;

    Ok(Json(SelectionResponse {
        screen_id,
        selection: selection.into_iter().collect(),
        state: current_state,
        selected: None,
    }))
}

/// POST /v1/screens/{screen_id}/commit
async fn commit_screen(
    State(state): State<AppState>,
    Path(screen_id): Path<Uuid>,
    Json(req): Json<CommitScreenRequest>,
) -> Result<Json<ReservationReceipt>, AppError> {
    let screen = state.screen(screen_id).await?;
    let receipt = screen.commit(req.user_id).await?;
    Ok(Json(receipt))
}

/// DELETE /v1/screens/{screen_id}
/// User navigated away: cancel fetches and discard the selection
async fn leave_screen(
    State(state): State<AppState>,
    Path(screen_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let screen = state
        .remove_screen(screen_id)
        .await
        .ok_or_else(|| AppError::NotFoundError(format!("Screen {} not found", screen_id)))?;

    screen.leave().await;
    tracing::info!("Screen {} closed", screen_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/screens/{screen_id}/events
/// Server-sent screen events; the stream ends when the screen is closed
async fn screen_events(
    State(state): State<AppState>,
    Path(screen_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let screen = state.screen(screen_id).await?;
    let rx = screen.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => Event::default()
                .event(event.name())
                .json_data(&event)
                .ok()
                .map(Ok::<_, Infallible>),
            // Lagged subscribers skip ahead
            Err(_) => None,
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
