pub mod app_config;
pub mod reservation_client;

pub use app_config::Config;
pub use reservation_client::{ClientError, ReservationClient};
