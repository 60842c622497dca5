pub mod ids;
pub mod pii;

pub use ids::{SeatId, SeatIdError, ShowtimeId, UserId};
pub use pii::Masked;
