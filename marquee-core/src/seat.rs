use marquee_shared::SeatId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    /// Temporarily reserved by another user pending payment.
    Held,
    Booked,
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::Held => "HELD",
            SeatStatus::Booked => "BOOKED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceTier {
    Standard,
    Premium,
    Couple,
    Accessible,
}

/// One seat of a showtime's seat map, in the shape the reservation service
/// reports it: `{"seatId": "A1", "status": "AVAILABLE", "priceTier": "STANDARD"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    #[serde(rename = "seatId")]
    id: SeatId,
    status: SeatStatus,
    price_tier: PriceTier,
}

impl Seat {
    pub fn new(id: SeatId, status: SeatStatus, price_tier: PriceTier) -> Self {
        Self { id, status, price_tier }
    }

    pub fn id(&self) -> &SeatId {
        &self.id
    }

    pub fn status(&self) -> SeatStatus {
        self.status
    }

    pub fn price_tier(&self) -> PriceTier {
        self.price_tier
    }

    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }

    // Status is the only mutable field; identity and tier are fixed.
    pub(crate) fn set_status(&mut self, status: SeatStatus) {
        self.status = status;
    }
}

/// A status transition observed when a newer snapshot is merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatStatusChange {
    pub seat: SeatId,
    pub from: SeatStatus,
    pub to: SeatStatus,
}
