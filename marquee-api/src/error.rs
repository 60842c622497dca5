use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marquee_core::{ErrorDisposition, SeatingError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    Anyhow(anyhow::Error),
}

/// Attached to responses rendered from a `SeatingError`, so middleware can
/// tell a seat-selection outcome apart from a local routing or validation reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatingErrorKind(pub &'static str);

fn seating_status(err: &SeatingError) -> StatusCode {
    match err {
        SeatingError::Fetch(_) => StatusCode::SERVICE_UNAVAILABLE,
        SeatingError::Decode(_) => StatusCode::BAD_GATEWAY,
        SeatingError::NotFound(_) | SeatingError::UnknownSeat(_) => StatusCode::NOT_FOUND,
        SeatingError::SeatUnavailable { .. } | SeatingError::StaleSelection { .. } => StatusCode::CONFLICT,
        SeatingError::SelectionLimitExceeded { .. } | SeatingError::EmptySelection => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SeatingError::Cancelled => StatusCode::GONE,
        SeatingError::ShowtimeMismatch { .. } | SeatingError::DuplicateSeat(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn seating_response(err: &SeatingError) -> Response {
    let status = seating_status(err);
    if err.disposition() == ErrorDisposition::Internal {
        tracing::error!("Seat selection inconsistency: {}", err);
    } else {
        tracing::debug!("Seat selection rejected ({}): {}", status, err);
    }

    let mut body = json!({
        "error": err.to_string(),
        "kind": err.kind(),
        "disposition": err.disposition(),
        "retryable": err.is_retryable(),
    });
    if let SeatingError::StaleSelection { seats } = err {
        body["seats"] = json!(seats);
    }

    let mut response = (status, Json(body)).into_response();
    response.extensions_mut().insert(SeatingErrorKind(err.kind()));
    response
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Anyhow(err) => {
                if let Some(seating) = err.downcast_ref::<SeatingError>() {
                    return seating_response(seating);
                }
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
