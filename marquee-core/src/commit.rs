use chrono::{DateTime, Utc};
use marquee_shared::{Masked, SeatId, ShowtimeId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload for the booking endpoint: `{showtimeId, seatIds[], userId}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub showtime_id: ShowtimeId,
    pub seat_ids: Vec<SeatId>,
    pub user_id: Masked<UserId>,
}

/// Reference the reservation service issues for a finalized booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationReference(String);

impl ReservationReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReservationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationReceipt {
    pub reference: ReservationReference,
    pub showtime_id: ShowtimeId,
    pub seat_ids: Vec<SeatId>,
    pub committed_at: DateTime<Utc>,
}
