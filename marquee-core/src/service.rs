use crate::commit::{CommitRequest, ReservationReference};
use crate::seat::Seat;
use crate::SeatingResult;
use async_trait::async_trait;
use marquee_shared::ShowtimeId;

/// The external reservation service: source of seat statuses and the
/// authoritative booking endpoint.
#[async_trait]
pub trait SeatService: Send + Sync {
    /// Ordered seat list of a showtime.
    ///
    /// Fails with `NotFound` when the showtime does not exist and `Fetch` on
    /// transport or service failure.
    async fn fetch_seats(&self, showtime_id: &ShowtimeId) -> SeatingResult<Vec<Seat>>;

    /// Finalize a selection into a booking.
    ///
    /// A seat taken concurrently by someone else fails with `StaleSelection`
    /// naming the seats; nothing is booked in that case.
    async fn commit_reservation(&self, request: &CommitRequest) -> SeatingResult<ReservationReference>;
}
