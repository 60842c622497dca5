use crate::commit::CommitRequest;
use crate::seat::{Seat, SeatStatus};
use crate::seat_map::SeatMap;
use crate::{SeatingError, SeatingResult};
use marquee_shared::{Masked, SeatId, ShowtimeId, UserId};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionState {
    Empty,
    Partial,
    Full,
}

/// Outcome of a successful `toggle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Selected,
    Deselected,
}

/// The user's tentative seat picks for one showtime.
///
/// Every selected seat was AVAILABLE in the bound seat map when it was picked,
/// and the selection never grows past `limit`. Toggling is purely local; the
/// selection only reaches the reservation service through `prepare_commit`.
#[derive(Debug, Clone)]
pub struct SelectionSession {
    showtime_id: ShowtimeId,
    seat_map: Arc<SeatMap>,
    selected: BTreeSet<SeatId>,
    limit: usize,
}

impl SelectionSession {
    /// Start an empty selection bound to `seat_map`. A limit of zero is raised to one.
    pub fn new(seat_map: Arc<SeatMap>, limit: usize) -> Self {
        Self {
            showtime_id: seat_map.showtime_id().clone(),
            seat_map,
            selected: BTreeSet::new(),
            limit: limit.max(1),
        }
    }

    pub fn showtime_id(&self) -> &ShowtimeId {
        &self.showtime_id
    }

    pub fn seat_map(&self) -> &Arc<SeatMap> {
        &self.seat_map
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, seat_id: &SeatId) -> bool {
        self.selected.contains(seat_id)
    }

    pub fn state(&self) -> SelectionState {
        match self.selected.len() {
            0 => SelectionState::Empty,
            n if n >= self.limit => SelectionState::Full,
            _ => SelectionState::Partial,
        }
    }

    /// Select or deselect a seat. Deselecting always succeeds.
    pub fn toggle(&mut self, seat_id: &SeatId) -> SeatingResult<Toggle> {
        if self.selected.remove(seat_id) {
            return Ok(Toggle::Deselected);
        }

        let status = self.seat_map.seat_status(seat_id)?;
        if status != SeatStatus::Available {
            return Err(SeatingError::SeatUnavailable {
                seat: seat_id.clone(),
                status,
            });
        }
        if self.selected.len() >= self.limit {
            return Err(SeatingError::SelectionLimitExceeded { limit: self.limit });
        }

        self.selected.insert(seat_id.clone());
        Ok(Toggle::Selected)
    }

    pub fn current_selection(&self) -> BTreeSet<SeatId> {
        self.selected.clone()
    }

    /// Bind a refreshed map of the same showtime.
    ///
    /// Selected seats that are no longer AVAILABLE are returned but kept in the
    /// selection: the user has to be told, and `release` removes them.
    pub fn rebind(&mut self, seat_map: Arc<SeatMap>) -> SeatingResult<Vec<SeatId>> {
        self.ensure_same_showtime(&seat_map)?;
        let unavailable = self.unavailable_in(&seat_map);
        self.seat_map = seat_map;
        Ok(unavailable)
    }

    /// Re-check every selected seat against a freshly fetched map.
    ///
    /// Returns the selected seats in seat-id order, or `StaleSelection` naming
    /// every seat that is no longer AVAILABLE (or no longer exists).
    pub fn validate_for_commit(&self, latest: &SeatMap) -> SeatingResult<Vec<Seat>> {
        self.ensure_same_showtime(latest)?;

        let stale = self.unavailable_in(latest);
        if !stale.is_empty() {
            return Err(SeatingError::StaleSelection { seats: stale });
        }

        Ok(self
            .selected
            .iter()
            .filter_map(|id| latest.seat(id).cloned())
            .collect())
    }

    /// Validate against `latest` and build the payload for the booking endpoint.
    pub fn prepare_commit(&self, latest: &SeatMap, user_id: UserId) -> SeatingResult<CommitRequest> {
        if self.selected.is_empty() {
            return Err(SeatingError::EmptySelection);
        }

        let seats = self.validate_for_commit(latest)?;
        Ok(CommitRequest {
            showtime_id: self.showtime_id.clone(),
            seat_ids: seats.iter().map(|s| s.id().clone()).collect(),
            user_id: Masked(user_id),
        })
    }

    /// Deselect exactly the named seats; returns how many were selected.
    pub fn release(&mut self, seat_ids: &[SeatId]) -> usize {
        seat_ids.iter().filter(|id| self.selected.remove(*id)).count()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    fn ensure_same_showtime(&self, seat_map: &SeatMap) -> SeatingResult<()> {
        if seat_map.showtime_id() != &self.showtime_id {
            return Err(SeatingError::ShowtimeMismatch {
                expected: self.showtime_id.clone(),
                actual: seat_map.showtime_id().clone(),
            });
        }
        Ok(())
    }

    fn unavailable_in(&self, seat_map: &SeatMap) -> Vec<SeatId> {
        self.selected
            .iter()
            .filter(|id| !seat_map.seat(id).is_some_and(Seat::is_available))
            .cloned()
            .collect()
    }
}
