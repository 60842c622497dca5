use crate::commit::ReservationReference;
use crate::seat::SeatStatusChange;
use crate::selection::SelectionState;
use chrono::{DateTime, Utc};
use marquee_shared::{SeatId, ShowtimeId};
use serde::Serialize;

/// Notification for the presentation layer after a screen mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScreenEvent {
    SeatToggled {
        showtime_id: ShowtimeId,
        seat: SeatId,
        selected: bool,
        state: SelectionState,
    },
    SeatMapRefreshed {
        showtime_id: ShowtimeId,
        changes: Vec<SeatStatusChange>,
        fetched_at: DateTime<Utc>,
    },
    /// Selected seats taken by someone else; the user must re-select.
    SelectionInvalidated {
        showtime_id: ShowtimeId,
        seats: Vec<SeatId>,
    },
    SelectionReleased {
        showtime_id: ShowtimeId,
        seats: Vec<SeatId>,
    },
    Committed {
        showtime_id: ShowtimeId,
        reference: ReservationReference,
        seats: Vec<SeatId>,
    },
    Cleared {
        showtime_id: ShowtimeId,
    },
}

impl ScreenEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ScreenEvent::SeatToggled { .. } => "seat_toggled",
            ScreenEvent::SeatMapRefreshed { .. } => "seat_map_refreshed",
            ScreenEvent::SelectionInvalidated { .. } => "selection_invalidated",
            ScreenEvent::SelectionReleased { .. } => "selection_released",
            ScreenEvent::Committed { .. } => "committed",
            ScreenEvent::Cleared { .. } => "cleared",
        }
    }

    pub fn showtime_id(&self) -> &ShowtimeId {
        match self {
            ScreenEvent::SeatToggled { showtime_id, .. }
            | ScreenEvent::SeatMapRefreshed { showtime_id, .. }
            | ScreenEvent::SelectionInvalidated { showtime_id, .. }
            | ScreenEvent::SelectionReleased { showtime_id, .. }
            | ScreenEvent::Committed { showtime_id, .. }
            | ScreenEvent::Cleared { showtime_id } => showtime_id,
        }
    }
}
