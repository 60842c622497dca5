pub mod commit;
pub mod events;
pub mod memory;
pub mod retry;
pub mod screen;
pub mod seat;
pub mod seat_map;
pub mod selection;
pub mod service;

pub use commit::{CommitRequest, ReservationReceipt, ReservationReference};
pub use events::ScreenEvent;
pub use memory::InMemorySeatService;
pub use retry::RetryPolicy;
pub use screen::{RefreshReport, ScreenConfig, ScreenSnapshot, SeatSelectionScreen};
pub use seat::{PriceTier, Seat, SeatStatus, SeatStatusChange};
pub use seat_map::SeatMap;
pub use selection::{SelectionSession, SelectionState, Toggle};
pub use service::SeatService;

pub use marquee_shared::{Masked, SeatId, ShowtimeId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatingError {
    #[error("Seat service request failed: {0}")]
    Fetch(String),

    #[error("Malformed seat service response: {0}")]
    Decode(String),

    #[error("Showtime not found: {0}")]
    NotFound(ShowtimeId),

    #[error("Unknown seat: {0}")]
    UnknownSeat(SeatId),

    #[error("Seat {seat} is not available ({status})")]
    SeatUnavailable { seat: SeatId, status: SeatStatus },

    #[error("Selection limit reached: at most {limit} seats per booking")]
    SelectionLimitExceeded { limit: usize },

    #[error("Seats no longer available: {}", join_seats(.seats))]
    StaleSelection { seats: Vec<SeatId> },

    #[error("No seats selected")]
    EmptySelection,

    #[error("Seat map belongs to showtime {actual}, expected {expected}")]
    ShowtimeMismatch {
        expected: ShowtimeId,
        actual: ShowtimeId,
    },

    #[error("Duplicate seat in seat map: {0}")]
    DuplicateSeat(SeatId),

    #[error("Seat selection screen was closed")]
    Cancelled,
}

pub type SeatingResult<T> = Result<T, SeatingError>;

/// How a failure is surfaced to the person in front of the seat grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorDisposition {
    /// Transient; dismissible banner, the fetch is retried with backoff.
    Banner,
    /// The screen cannot continue; send the user back to the movie list.
    Redirect,
    /// User-correctable, shown next to the seat grid.
    Inline,
    /// Seats must be re-selected before commit may proceed.
    Reselect,
    /// The user already left the screen.
    Silent,
    Internal,
}

impl SeatingError {
    /// Only transport-level failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SeatingError::Fetch(_))
    }

    /// Stable machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            SeatingError::Fetch(_) => "fetch_error",
            SeatingError::Decode(_) => "decode_error",
            SeatingError::NotFound(_) => "not_found",
            SeatingError::UnknownSeat(_) => "unknown_seat",
            SeatingError::SeatUnavailable { .. } => "seat_unavailable",
            SeatingError::SelectionLimitExceeded { .. } => "selection_limit_exceeded",
            SeatingError::StaleSelection { .. } => "stale_selection",
            SeatingError::EmptySelection => "empty_selection",
            SeatingError::ShowtimeMismatch { .. } => "showtime_mismatch",
            SeatingError::DuplicateSeat(_) => "duplicate_seat",
            SeatingError::Cancelled => "cancelled",
        }
    }

    pub fn disposition(&self) -> ErrorDisposition {
        match self {
            SeatingError::Fetch(_) | SeatingError::Decode(_) => ErrorDisposition::Banner,
            SeatingError::NotFound(_) => ErrorDisposition::Redirect,
            SeatingError::UnknownSeat(_)
            | SeatingError::SeatUnavailable { .. }
            | SeatingError::SelectionLimitExceeded { .. }
            | SeatingError::EmptySelection => ErrorDisposition::Inline,
            SeatingError::StaleSelection { .. } => ErrorDisposition::Reselect,
            SeatingError::Cancelled => ErrorDisposition::Silent,
            SeatingError::ShowtimeMismatch { .. } | SeatingError::DuplicateSeat(_) => {
                ErrorDisposition::Internal
            }
        }
    }
}

fn join_seats(seats: &[SeatId]) -> String {
    seats
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}
