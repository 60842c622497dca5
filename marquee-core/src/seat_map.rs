use crate::seat::{PriceTier, Seat, SeatStatus, SeatStatusChange};
use crate::service::SeatService;
use crate::{SeatingError, SeatingResult};
use chrono::{DateTime, Utc};
use marquee_shared::{SeatId, ShowtimeId};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Snapshot of every seat of one showtime, in the order the reservation
/// service lists them. Treated as a best-effort cache: another user may hold
/// or book a seat at any time after `fetched_at`.
#[derive(Debug, Clone)]
pub struct SeatMap {
    showtime_id: ShowtimeId,
    seats: Vec<Seat>,
    index: HashMap<SeatId, usize>,
    fetched_at: DateTime<Utc>,
}

impl SeatMap {
    /// Build a map from an ordered seat list. Seat identifiers must be unique.
    pub fn from_seats(showtime_id: ShowtimeId, seats: Vec<Seat>) -> SeatingResult<Self> {
        let mut index = HashMap::with_capacity(seats.len());
        for (position, seat) in seats.iter().enumerate() {
            if index.insert(seat.id().clone(), position).is_some() {
                return Err(SeatingError::DuplicateSeat(seat.id().clone()));
            }
        }

        Ok(Self {
            showtime_id,
            seats,
            index,
            fetched_at: Utc::now(),
        })
    }

    /// Fetch the current seat statuses of a showtime.
    pub async fn load<S>(service: &S, showtime_id: &ShowtimeId) -> SeatingResult<Self>
    where
        S: SeatService + ?Sized,
    {
        let seats = service.fetch_seats(showtime_id).await?;
        let map = Self::from_seats(showtime_id.clone(), seats)?;
        info!(
            "Seat map loaded for showtime {}: {} seats, {} available",
            showtime_id,
            map.len(),
            map.count(SeatStatus::Available)
        );
        Ok(map)
    }

    pub fn showtime_id(&self) -> &ShowtimeId {
        &self.showtime_id
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, seat_id: &SeatId) -> Option<&Seat> {
        self.index.get(seat_id).map(|&position| &self.seats[position])
    }

    pub fn seat_status(&self, seat_id: &SeatId) -> SeatingResult<SeatStatus> {
        self.seat(seat_id)
            .map(Seat::status)
            .ok_or_else(|| SeatingError::UnknownSeat(seat_id.clone()))
    }

    /// Overwrite the status of an existing seat. Returns the change, if any.
    pub fn apply_status_update(
        &mut self,
        seat_id: &SeatId,
        status: SeatStatus,
    ) -> SeatingResult<Option<SeatStatusChange>> {
        let position = *self
            .index
            .get(seat_id)
            .ok_or_else(|| SeatingError::UnknownSeat(seat_id.clone()))?;

        let seat = &mut self.seats[position];
        let previous = seat.status();
        if previous == status {
            return Ok(None);
        }

        seat.set_status(status);
        Ok(Some(SeatStatusChange {
            seat: seat_id.clone(),
            from: previous,
            to: status,
        }))
    }

    /// Apply every status from a newer snapshot of the same showtime.
    ///
    /// The seat layout must be identical; otherwise nothing is applied and the
    /// first seat missing on either side is reported as unknown.
    pub fn merge_snapshot(&mut self, latest: &SeatMap) -> SeatingResult<Vec<SeatStatusChange>> {
        if latest.showtime_id != self.showtime_id {
            return Err(SeatingError::ShowtimeMismatch {
                expected: self.showtime_id.clone(),
                actual: latest.showtime_id.clone(),
            });
        }

        if let Some(seat) = latest.seats.iter().find(|s| !self.index.contains_key(s.id())) {
            return Err(SeatingError::UnknownSeat(seat.id().clone()));
        }
        if let Some(seat) = self.seats.iter().find(|s| !latest.index.contains_key(s.id())) {
            return Err(SeatingError::UnknownSeat(seat.id().clone()));
        }

        let mut changes = Vec::new();
        for seat in &latest.seats {
            if let Some(change) = self.apply_status_update(seat.id(), seat.status())? {
                changes.push(change);
            }
        }
        self.fetched_at = latest.fetched_at;

        Ok(changes)
    }

    pub fn count(&self, status: SeatStatus) -> usize {
        self.seats.iter().filter(|s| s.status() == status).count()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Number of the given seats per price tier; unknown seats are skipped.
    pub fn tier_breakdown<'a, I>(&self, seat_ids: I) -> BTreeMap<PriceTier, usize>
    where
        I: IntoIterator<Item = &'a SeatId>,
    {
        let mut breakdown = BTreeMap::new();
        for seat in seat_ids.into_iter().filter_map(|id| self.seat(id)) {
            *breakdown.entry(seat.price_tier()).or_insert(0) += 1;
        }
        breakdown
    }
}
