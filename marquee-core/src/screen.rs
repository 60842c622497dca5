use crate::commit::{CommitRequest, ReservationReceipt};
use crate::events::ScreenEvent;
use crate::retry::{retry_fetch, RetryPolicy};
use crate::seat::{SeatStatus, SeatStatusChange};
use crate::seat_map::SeatMap;
use crate::selection::{SelectionSession, SelectionState, Toggle};
use crate::service::SeatService;
use crate::{SeatingError, SeatingResult};
use chrono::Utc;
use marquee_shared::{SeatId, ShowtimeId, UserId};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ScreenConfig {
    pub max_seats: usize,
    /// Background refresh period; `None` refreshes only on demand and before commit.
    pub refresh_interval: Option<Duration>,
    pub retry: RetryPolicy,
    pub event_capacity: usize,
    /// Close the screen once nobody has used it for this long. The background
    /// refresh stops at that point and registries may evict the screen.
    pub idle_timeout: Option<Duration>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            max_seats: 8,
            refresh_interval: None,
            retry: RetryPolicy::default(),
            event_capacity: 64,
            idle_timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub seat_map: Arc<SeatMap>,
    pub changes: Vec<SeatStatusChange>,
    /// Selected seats that are no longer AVAILABLE. They stay selected until released.
    pub invalidated: Vec<SeatId>,
}

#[derive(Debug, Clone)]
pub struct ScreenSnapshot {
    pub showtime_id: ShowtimeId,
    pub seat_map: Arc<SeatMap>,
    pub selection: BTreeSet<SeatId>,
    pub state: SelectionState,
    pub limit: usize,
}

/// Controller for one open seat-selection screen.
///
/// Owns the current seat map and the selection session. Network I/O never
/// happens while the session lock is held, so toggles stay responsive while a
/// fetch is in flight. Leaving (or dropping) the screen cancels in-flight
/// fetches and the background refresh; nothing is sent to the backend.
pub struct SeatSelectionScreen<S: ?Sized> {
    shared: Arc<Shared<S>>,
    cancel: CancellationToken,
}

struct Shared<S: ?Sized> {
    service: Arc<S>,
    showtime_id: ShowtimeId,
    session: Mutex<SelectionSession>,
    events: broadcast::Sender<ScreenEvent>,
    retry: RetryPolicy,
    idle_timeout: Option<Duration>,
    opened_at: Instant,
    // Millis after `opened_at`
    last_active_ms: AtomicU64,
}

impl<S> SeatSelectionScreen<S>
where
    S: SeatService + ?Sized + 'static,
{
    /// Load the seat map for `showtime_id` and start an empty selection.
    pub async fn open(service: Arc<S>, showtime_id: ShowtimeId, config: ScreenConfig) -> SeatingResult<Self> {
        let cancel = CancellationToken::new();

        let seat_map = {
            let svc = service.as_ref();
            let id = &showtime_id;
            retry_fetch(&config.retry, &cancel, "seat map load", move || SeatMap::load(svc, id)).await?
        };

        let session = SelectionSession::new(Arc::new(seat_map), config.max_seats);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        let screen = Self {
            shared: Arc::new(Shared {
                service,
                showtime_id,
                session: Mutex::new(session),
                events,
                retry: config.retry,
                idle_timeout: config.idle_timeout.filter(|t| !t.is_zero()),
                opened_at: Instant::now(),
                last_active_ms: AtomicU64::new(0),
            }),
            cancel,
        };

        if let Some(period) = config.refresh_interval.filter(|p| !p.is_zero()) {
            screen.spawn_auto_refresh(period);
        }

        info!("Seat selection opened for showtime {}", screen.shared.showtime_id);
        Ok(screen)
    }

    pub fn showtime_id(&self) -> &ShowtimeId {
        &self.shared.showtime_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScreenEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_open(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Time since the user last did anything on this screen. A live event
    /// subscriber counts as activity.
    pub fn idle_for(&self) -> Duration {
        self.shared.idle_for()
    }

    /// Whether the screen was left or has sat idle past its timeout.
    pub fn is_expired(&self) -> bool {
        !self.is_open() || self.shared.idle_expired()
    }

    pub async fn seat_map(&self) -> Arc<SeatMap> {
        Arc::clone(self.shared.session.lock().await.seat_map())
    }

    pub async fn selection(&self) -> BTreeSet<SeatId> {
        self.shared.session.lock().await.current_selection()
    }

    pub async fn state(&self) -> SelectionState {
        self.shared.session.lock().await.state()
    }

    pub async fn snapshot(&self) -> ScreenSnapshot {
        self.shared.touch();
        let session = self.shared.session.lock().await;
        ScreenSnapshot {
            showtime_id: self.shared.showtime_id.clone(),
            seat_map: Arc::clone(session.seat_map()),
            selection: session.current_selection(),
            state: session.state(),
            limit: session.limit(),
        }
    }

    /// Select or deselect a seat against the current (cached) seat map.
    pub async fn toggle(&self, seat_id: &SeatId) -> SeatingResult<Toggle> {
        self.ensure_open()?;
        self.shared.touch();

        let (toggle, state) = {
            let mut session = self.shared.session.lock().await;
            let toggle = session.toggle(seat_id)?;
            (toggle, session.state())
        };

        debug!("Seat {} {:?} for showtime {}", seat_id, toggle, self.shared.showtime_id);
        self.shared.notify(ScreenEvent::SeatToggled {
            showtime_id: self.shared.showtime_id.clone(),
            seat: seat_id.clone(),
            selected: toggle == Toggle::Selected,
            state,
        });
        Ok(toggle)
    }

    /// Deselect the named seats, typically after `StaleSelection`.
    pub async fn release(&self, seat_ids: &[SeatId]) -> SeatingResult<BTreeSet<SeatId>> {
        self.ensure_open()?;
        self.shared.touch();

        let selection = {
            let mut session = self.shared.session.lock().await;
            session.release(seat_ids);
            session.current_selection()
        };

        self.shared.notify(ScreenEvent::SelectionReleased {
            showtime_id: self.shared.showtime_id.clone(),
            seats: seat_ids.to_vec(),
        });
        Ok(selection)
    }

    /// Re-fetch the seat map and replace the cached one.
    pub async fn refresh(&self) -> SeatingResult<RefreshReport> {
        self.ensure_open()?;
        self.shared.touch();
        self.shared.refresh(&self.cancel).await
    }

    /// Validate the selection against a fresh seat map and submit it.
    ///
    /// Never retried: a conflict comes back as `StaleSelection` naming the
    /// seats, which are marked HELD locally and left selected for the user to
    /// release. Seats toggled while the request is in flight are kept.
    pub async fn commit(&self, user_id: UserId) -> SeatingResult<ReservationReceipt> {
        self.ensure_open()?;
        self.shared.touch();

        let report = self.shared.refresh(&self.cancel).await?;
        let request = {
            let session = self.shared.session.lock().await;
            session.prepare_commit(&report.seat_map, user_id)?
        };

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SeatingError::Cancelled),
            result = self.shared.service.commit_reservation(&request) => result,
        };

        match result {
            Ok(reference) => {
                self.shared.mark_seats(&request, SeatStatus::Booked).await?;
                self.shared.session.lock().await.release(&request.seat_ids);

                info!(
                    "Reservation {} committed for showtime {}: {} seats, user {}",
                    reference,
                    request.showtime_id,
                    request.seat_ids.len(),
                    request.user_id
                );
                self.shared.notify(ScreenEvent::Committed {
                    showtime_id: request.showtime_id.clone(),
                    reference: reference.clone(),
                    seats: request.seat_ids.clone(),
                });

                Ok(ReservationReceipt {
                    reference,
                    showtime_id: request.showtime_id,
                    seat_ids: request.seat_ids,
                    committed_at: Utc::now(),
                })
            }
            Err(SeatingError::StaleSelection { seats }) => {
                // A conflict that names nothing still has to name something to release
                let seats = if seats.is_empty() {
                    request.seat_ids.clone()
                } else {
                    seats
                };
                warn!(
                    "Reservation conflict for showtime {}: {} seats taken",
                    request.showtime_id,
                    seats.len()
                );
                let conflict = CommitRequest {
                    seat_ids: seats.clone(),
                    ..request
                };
                self.shared.mark_seats(&conflict, SeatStatus::Held).await?;
                self.shared.notify(ScreenEvent::SelectionInvalidated {
                    showtime_id: self.shared.showtime_id.clone(),
                    seats: seats.clone(),
                });
                Err(SeatingError::StaleSelection { seats })
            }
            Err(err) => Err(err),
        }
    }

    /// Navigate away: stop every fetch and drop the selection.
    pub async fn leave(&self) {
        if self.shared.close(&self.cancel).await {
            info!("Seat selection left for showtime {}", self.shared.showtime_id);
        }
    }

    fn ensure_open(&self) -> SeatingResult<()> {
        if self.cancel.is_cancelled() {
            return Err(SeatingError::Cancelled);
        }
        Ok(())
    }

    fn spawn_auto_refresh(&self, period: Duration) {
        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the map was just loaded.
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if shared.idle_expired() {
                            if shared.close(&cancel).await {
                                info!(
                                    "Seat selection for showtime {} closed after {:?} idle",
                                    shared.showtime_id,
                                    shared.idle_for()
                                );
                            }
                            break;
                        }
                        match shared.refresh(&cancel).await {
                            Ok(_) => {}
                            Err(SeatingError::Cancelled) => break,
                            Err(err) => warn!(
                                "Background refresh failed for showtime {}: {}",
                                shared.showtime_id, err
                            ),
                        }
                    }
                }
            }
            debug!("Background refresh stopped for showtime {}", shared.showtime_id);
        });
    }
}

impl<S> Shared<S>
where
    S: SeatService + ?Sized,
{
    fn notify(&self, event: ScreenEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn touch(&self) {
        let elapsed = self.opened_at.elapsed().as_millis() as u64;
        self.last_active_ms.fetch_max(elapsed, Ordering::Relaxed);
    }

    fn idle_for(&self) -> Duration {
        if self.events.receiver_count() > 0 {
            return Duration::ZERO;
        }
        let last_active = Duration::from_millis(self.last_active_ms.load(Ordering::Relaxed));
        self.opened_at.elapsed().saturating_sub(last_active)
    }

    fn idle_expired(&self) -> bool {
        match self.idle_timeout {
            Some(timeout) => self.idle_for() >= timeout,
            None => false,
        }
    }

    /// Cancel everything and drop the selection. False if already closed.
    async fn close(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        cancel.cancel();
        self.session.lock().await.clear();
        self.notify(ScreenEvent::Cleared {
            showtime_id: self.showtime_id.clone(),
        });
        true
    }

    async fn refresh(&self, cancel: &CancellationToken) -> SeatingResult<RefreshReport> {
        let latest = {
            let svc = self.service.as_ref();
            let id = &self.showtime_id;
            retry_fetch(&self.retry, cancel, "seat map refresh", move || SeatMap::load(svc, id)).await?
        };

        let (seat_map, changes, invalidated) = {
            let mut session = self.session.lock().await;
            let mut merged = SeatMap::clone(session.seat_map());
            let (seat_map, changes) = match merged.merge_snapshot(&latest) {
                Ok(changes) => (merged, changes),
                Err(SeatingError::UnknownSeat(seat)) => {
                    warn!(
                        "Seat layout changed for showtime {} (seat {}); replacing seat map",
                        self.showtime_id, seat
                    );
                    (latest, Vec::new())
                }
                Err(err) => return Err(err),
            };
            let seat_map = Arc::new(seat_map);
            let invalidated = session.rebind(Arc::clone(&seat_map))?;
            (seat_map, changes, invalidated)
        };

        self.notify(ScreenEvent::SeatMapRefreshed {
            showtime_id: self.showtime_id.clone(),
            changes: changes.clone(),
            fetched_at: seat_map.fetched_at(),
        });
        if !invalidated.is_empty() {
            warn!(
                "{} selected seats became unavailable for showtime {}",
                invalidated.len(),
                self.showtime_id
            );
            self.notify(ScreenEvent::SelectionInvalidated {
                showtime_id: self.showtime_id.clone(),
                seats: invalidated.clone(),
            });
        }

        Ok(RefreshReport {
            seat_map,
            changes,
            invalidated,
        })
    }

    /// Record the outcome of a commit in the cached map.
    async fn mark_seats(&self, request: &CommitRequest, status: SeatStatus) -> SeatingResult<()> {
        let mut session = self.session.lock().await;
        let mut updated = SeatMap::clone(session.seat_map());
        for seat_id in &request.seat_ids {
            // The service may name seats this map never had.
            if let Err(SeatingError::UnknownSeat(seat)) = updated.apply_status_update(seat_id, status) {
                debug!("Ignoring status for unknown seat {}", seat);
            }
        }
        session.rebind(Arc::new(updated))?;
        Ok(())
    }
}

impl<S: ?Sized> Drop for SeatSelectionScreen<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySeatService;
    use crate::seat::PriceTier;

    fn id(label: &str) -> SeatId {
        label.parse().unwrap()
    }

    async fn service_with_row(columns: u16) -> Arc<InMemorySeatService> {
        let service = Arc::new(InMemorySeatService::new());
        service.add_grid(ShowtimeId::new("st-1"), &["A"], columns, PriceTier::Standard).await;
        service
    }

    fn config(max_seats: usize) -> ScreenConfig {
        ScreenConfig {
            max_seats,
            retry: RetryPolicy {
                initial_delay: Duration::from_millis(1),
                ..RetryPolicy::default()
            },
            ..ScreenConfig::default()
        }
    }

    #[tokio::test]
    async fn test_open_missing_showtime() {
        let service = service_with_row(4).await;
        let result = SeatSelectionScreen::open(service, ShowtimeId::new("does-not-exist"), config(4)).await;
        assert!(matches!(result, Err(SeatingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_open_retries_transient_failures() {
        let service = service_with_row(4).await;
        service.fail_next_fetches(2);

        let screen = SeatSelectionScreen::open(service.clone(), ShowtimeId::new("st-1"), config(4))
            .await
            .unwrap();
        assert_eq!(service.fetch_count(), 3);
        assert_eq!(screen.seat_map().await.len(), 4);
    }

    #[tokio::test]
    async fn test_toggle_emits_events() {
        let service = service_with_row(4).await;
        let screen = SeatSelectionScreen::open(service, ShowtimeId::new("st-1"), config(4))
            .await
            .unwrap();
        let mut events = screen.subscribe();

        assert_eq!(screen.toggle(&id("A1")).await.unwrap(), Toggle::Selected);
        match events.recv().await.unwrap() {
            ScreenEvent::SeatToggled { seat, selected, state, .. } => {
                assert_eq!(seat, id("A1"));
                assert!(selected);
                assert_eq!(state, SelectionState::Partial);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_commit_success_clears_selection() {
        let service = service_with_row(4).await;
        let screen = SeatSelectionScreen::open(service.clone(), ShowtimeId::new("st-1"), config(4))
            .await
            .unwrap();

        screen.toggle(&id("A1")).await.unwrap();
        screen.toggle(&id("A2")).await.unwrap();
        let receipt = screen.commit(UserId::new("u-1")).await.unwrap();

        assert_eq!(receipt.seat_ids, vec![id("A1"), id("A2")]);
        assert_eq!(screen.state().await, SelectionState::Empty);
        let map = screen.seat_map().await;
        assert_eq!(map.seat_status(&id("A1")).unwrap(), SeatStatus::Booked);

        let seats = service.fetch_seats(&ShowtimeId::new("st-1")).await.unwrap();
        assert_eq!(seats[1].status(), SeatStatus::Booked);
    }

    #[tokio::test]
    async fn test_commit_detects_seat_booked_since_selection() {
        let service = service_with_row(4).await;
        let showtime = ShowtimeId::new("st-1");
        let screen = SeatSelectionScreen::open(service.clone(), showtime.clone(), config(4))
            .await
            .unwrap();

        screen.toggle(&id("A1")).await.unwrap();
        screen.toggle(&id("A3")).await.unwrap();
        service.set_status(&showtime, &id("A1"), SeatStatus::Booked).await.unwrap();

        let err = screen.commit(UserId::new("u-1")).await.unwrap_err();
        assert_eq!(err, SeatingError::StaleSelection { seats: vec![id("A1")] });
        // Not silently dropped.
        assert!(screen.selection().await.contains(&id("A1")));

        let remaining = screen.release(&[id("A1")]).await.unwrap();
        let expected: BTreeSet<SeatId> = [id("A3")].into_iter().collect();
        assert_eq!(remaining, expected);
        let receipt = screen.commit(UserId::new("u-1")).await.unwrap();
        assert_eq!(receipt.seat_ids, vec![id("A3")]);
    }

    #[tokio::test]
    async fn test_refresh_reports_invalidated_seats() {
        let service = service_with_row(3).await;
        let showtime = ShowtimeId::new("st-1");
        let screen = SeatSelectionScreen::open(service.clone(), showtime.clone(), config(4))
            .await
            .unwrap();

        screen.toggle(&id("A2")).await.unwrap();
        service.set_status(&showtime, &id("A2"), SeatStatus::Held).await.unwrap();
        service.set_status(&showtime, &id("A3"), SeatStatus::Booked).await.unwrap();

        let report = screen.refresh().await.unwrap();
        assert_eq!(report.changes.len(), 2);
        assert_eq!(report.invalidated, vec![id("A2")]);
        assert!(matches!(
            screen.toggle(&id("A3")).await,
            Err(SeatingError::SeatUnavailable { .. })
        ));
        // Deselect is always permitted.
        assert_eq!(screen.toggle(&id("A2")).await.unwrap(), Toggle::Deselected);
    }

    #[tokio::test]
    async fn test_leave_cancels_inflight_fetch() {
        let service = service_with_row(3).await;
        let screen = Arc::new(
            SeatSelectionScreen::open(service.clone(), ShowtimeId::new("st-1"), config(4))
                .await
                .unwrap(),
        );
        screen.toggle(&id("A1")).await.unwrap();
        service.set_fetch_delay(Duration::from_secs(30));

        let pending = {
            let screen = Arc::clone(&screen);
            tokio::spawn(async move { screen.refresh().await })
        };
        tokio::task::yield_now().await;

        screen.leave().await;
        let result = pending.await.unwrap();
        assert_eq!(result.unwrap_err(), SeatingError::Cancelled);
        assert!(screen.selection().await.is_empty());
        assert!(matches!(screen.toggle(&id("A2")).await, Err(SeatingError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_refresh_picks_up_holds() {
        let service = service_with_row(3).await;
        let showtime = ShowtimeId::new("st-1");
        let screen = SeatSelectionScreen::open(
            service.clone(),
            showtime.clone(),
            ScreenConfig {
                refresh_interval: Some(Duration::from_secs(10)),
                ..config(4)
            },
        )
        .await
        .unwrap();
        let mut events = screen.subscribe();

        service.set_status(&showtime, &id("A3"), SeatStatus::Held).await.unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;

        match events.recv().await.unwrap() {
            ScreenEvent::SeatMapRefreshed { changes, .. } => {
                assert_eq!(changes.len(), 1);
                assert_eq!(changes[0].to, SeatStatus::Held);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(
            screen.seat_map().await.seat_status(&id("A3")).unwrap(),
            SeatStatus::Held
        );

        screen.leave().await;
        let fetches = service.fetch_count();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(service.fetch_count(), fetches);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_keeps_seats_toggled_in_flight() {
        let service = service_with_row(4).await;
        let screen = Arc::new(
            SeatSelectionScreen::open(service.clone(), ShowtimeId::new("st-1"), config(4))
                .await
                .unwrap(),
        );
        screen.toggle(&id("A1")).await.unwrap();
        service.set_commit_delay(Duration::from_secs(1));

        let pending = {
            let screen = Arc::clone(&screen);
            tokio::spawn(async move { screen.commit(UserId::new("u-1")).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        screen.toggle(&id("A3")).await.unwrap();

        let receipt = pending.await.unwrap().unwrap();
        assert_eq!(receipt.seat_ids, vec![id("A1")]);
        let expected: BTreeSet<SeatId> = [id("A3")].into_iter().collect();
        assert_eq!(screen.selection().await, expected);
    }

    /// Booking endpoint that answers every commit with a conflict naming no seats.
    struct AnonymousConflict(InMemorySeatService);

    #[async_trait::async_trait]
    impl SeatService for AnonymousConflict {
        async fn fetch_seats(&self, showtime_id: &ShowtimeId) -> SeatingResult<Vec<crate::Seat>> {
            self.0.fetch_seats(showtime_id).await
        }

        async fn commit_reservation(&self, _request: &CommitRequest) -> SeatingResult<crate::ReservationReference> {
            Err(SeatingError::StaleSelection { seats: vec![] })
        }
    }

    #[tokio::test]
    async fn test_conflict_without_seats_names_the_submitted_ones() {
        let inner = InMemorySeatService::new();
        inner.add_grid(ShowtimeId::new("st-1"), &["A"], 3, PriceTier::Standard).await;
        let service = Arc::new(AnonymousConflict(inner));
        let screen = SeatSelectionScreen::open(service, ShowtimeId::new("st-1"), config(4))
            .await
            .unwrap();

        screen.toggle(&id("A1")).await.unwrap();
        screen.toggle(&id("A2")).await.unwrap();
        let err = screen.commit(UserId::new("u-1")).await.unwrap_err();

        assert_eq!(err, SeatingError::StaleSelection { seats: vec![id("A1"), id("A2")] });
        assert_eq!(screen.seat_map().await.seat_status(&id("A1")).unwrap(), SeatStatus::Held);
        assert_eq!(screen.selection().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_screen_closes_and_stops_refreshing() {
        let service = service_with_row(3).await;
        let screen = SeatSelectionScreen::open(
            service.clone(),
            ShowtimeId::new("st-1"),
            ScreenConfig {
                refresh_interval: Some(Duration::from_secs(20)),
                idle_timeout: Some(Duration::from_secs(60)),
                ..config(4)
            },
        )
        .await
        .unwrap();
        screen.toggle(&id("A1")).await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(screen.is_open());
        assert!(!screen.is_expired());

        tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
        assert!(!screen.is_open());
        assert!(screen.is_expired());
        assert!(screen.selection().await.is_empty());
        // Initial load plus the refreshes at 20s and 40s
        assert_eq!(service.fetch_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_subscriber_keeps_screen_alive() {
        let service = service_with_row(3).await;
        let screen = SeatSelectionScreen::open(
            service,
            ShowtimeId::new("st-1"),
            ScreenConfig {
                refresh_interval: Some(Duration::from_secs(20)),
                idle_timeout: Some(Duration::from_secs(60)),
                ..config(4)
            },
        )
        .await
        .unwrap();
        let events = screen.subscribe();

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(screen.is_open());
        assert_eq!(screen.idle_for(), Duration::ZERO);

        drop(events);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!screen.is_open());
    }
}
