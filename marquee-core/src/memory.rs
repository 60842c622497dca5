use crate::commit::{CommitRequest, ReservationReference};
use crate::seat::{PriceTier, Seat, SeatStatus};
use crate::service::SeatService;
use crate::{SeatingError, SeatingResult};
use async_trait::async_trait;
use marquee_shared::{SeatId, ShowtimeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// In-memory reservation service (local development and tests).
///
/// Resolves conflicts the way the real booking endpoint does: a commit
/// succeeds only if every requested seat is still AVAILABLE, and then books
/// all of them at once.
pub struct InMemorySeatService {
    showtimes: RwLock<HashMap<ShowtimeId, Vec<Seat>>>,
    pending_failures: AtomicU32,
    fetch_calls: AtomicU32,
    fetch_delay_ms: AtomicU64,
    commit_delay_ms: AtomicU64,
}

impl InMemorySeatService {
    pub fn new() -> Self {
        Self {
            showtimes: RwLock::new(HashMap::new()),
            pending_failures: AtomicU32::new(0),
            fetch_calls: AtomicU32::new(0),
            fetch_delay_ms: AtomicU64::new(0),
            commit_delay_ms: AtomicU64::new(0),
        }
    }

    pub async fn add_showtime(&self, showtime_id: ShowtimeId, seats: Vec<Seat>) {
        self.showtimes.write().await.insert(showtime_id, seats);
    }

    /// Add a showtime whose seats are `rows` x `1..=columns`, all AVAILABLE.
    pub async fn add_grid(&self, showtime_id: ShowtimeId, rows: &[&str], columns: u16, tier: PriceTier) {
        let seats = rows
            .iter()
            .flat_map(|row| (1..=columns).filter_map(move |c| SeatId::new(row, c).ok()))
            .map(|id| Seat::new(id, SeatStatus::Available, tier))
            .collect();
        self.add_showtime(showtime_id, seats).await;
    }

    /// Change a seat as another user's hold or booking would.
    pub async fn set_status(&self, showtime_id: &ShowtimeId, seat_id: &SeatId, status: SeatStatus) -> SeatingResult<()> {
        let mut showtimes = self.showtimes.write().await;
        let seats = showtimes
            .get_mut(showtime_id)
            .ok_or_else(|| SeatingError::NotFound(showtime_id.clone()))?;
        let seat = seats
            .iter_mut()
            .find(|s| s.id() == seat_id)
            .ok_or_else(|| SeatingError::UnknownSeat(seat_id.clone()))?;
        seat.set_status(status);
        Ok(())
    }

    /// Make the next `count` fetches fail with a transient error.
    pub fn fail_next_fetches(&self, count: u32) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        self.fetch_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_commit_delay(&self, delay: Duration) {
        self.commit_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

impl Default for InMemorySeatService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SeatService for InMemorySeatService {
    async fn fetch_seats(&self, showtime_id: &ShowtimeId) -> SeatingResult<Vec<Seat>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(SeatingError::Fetch("seat service unavailable".to_string()));
        }

        self.showtimes
            .read()
            .await
            .get(showtime_id)
            .cloned()
            .ok_or_else(|| SeatingError::NotFound(showtime_id.clone()))
    }

    async fn commit_reservation(&self, request: &CommitRequest) -> SeatingResult<ReservationReference> {
        let delay = self.commit_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let mut showtimes = self.showtimes.write().await;
        let seats = showtimes
            .get_mut(&request.showtime_id)
            .ok_or_else(|| SeatingError::NotFound(request.showtime_id.clone()))?;

        let taken: Vec<SeatId> = request
            .seat_ids
            .iter()
            .filter(|id| !seats.iter().any(|s| s.id() == *id && s.is_available()))
            .cloned()
            .collect();
        if !taken.is_empty() {
            return Err(SeatingError::StaleSelection { seats: taken });
        }

        for seat in seats.iter_mut().filter(|s| request.seat_ids.contains(s.id())) {
            seat.set_status(SeatStatus::Booked);
        }

        let reference = ReservationReference::new(format!("RSV-{}", Uuid::new_v4().simple()));
        info!(
            "Reserved {} seats for showtime {} (user {}): {}",
            request.seat_ids.len(),
            request.showtime_id,
            request.user_id,
            reference
        );
        Ok(reference)
    }
}
