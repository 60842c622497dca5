use async_trait::async_trait;
use marquee_core::{CommitRequest, ReservationReference, Seat, SeatService, SeatingError, SeatingResult};
use marquee_shared::{SeatId, ShowtimeId};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid reservation service URL {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    reservation_reference: ReservationReference,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConflictResponse {
    #[serde(default)]
    unavailable_seats: Vec<SeatId>,
}

/// HTTP client for the external reservation service.
#[derive(Clone)]
pub struct ReservationClient {
    client: Client,
    base_url: Url,
}

impl ReservationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|_| ClientError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base URLs are rejected in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> SeatingResult<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| SeatingError::Fetch(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| SeatingError::Decode(e.to_string()))
}

async fn unexpected_status(response: reqwest::Response) -> SeatingError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    SeatingError::Fetch(format!("status {}: {}", status.as_u16(), body))
}

#[async_trait]
impl SeatService for ReservationClient {
    async fn fetch_seats(&self, showtime_id: &ShowtimeId) -> SeatingResult<Vec<Seat>> {
        let url = self.endpoint(&["showtimes", showtime_id.as_str(), "seats"]);
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SeatingError::Fetch(e.to_string()))?;

        match response.status() {
            StatusCode::OK => read_json(response).await,
            StatusCode::NOT_FOUND => Err(SeatingError::NotFound(showtime_id.clone())),
            _ => Err(unexpected_status(response).await),
        }
    }

    async fn commit_reservation(&self, request: &CommitRequest) -> SeatingResult<ReservationReference> {
        let url = self.endpoint(&["showtimes", request.showtime_id.as_str(), "reservations"]);
        debug!("POST {} ({} seats, user {})", url, request.seat_ids.len(), request.user_id);

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| SeatingError::Fetch(e.to_string()))?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let body: CommitResponse = read_json(response).await?;
                Ok(body.reservation_reference)
            }
            StatusCode::CONFLICT => {
                let seats = match read_json::<ConflictResponse>(response).await {
                    Ok(body) if !body.unavailable_seats.is_empty() => body.unavailable_seats,
                    // The conflict stands even when the body does not say which seats lost
                    _ => {
                        warn!("Reservation conflict without seat list; treating all submitted seats as taken");
                        request.seat_ids.clone()
                    }
                };
                warn!(
                    "Reservation service rejected {} seats for showtime {}",
                    seats.len(),
                    request.showtime_id
                );
                Err(SeatingError::StaleSelection { seats })
            }
            StatusCode::NOT_FOUND => Err(SeatingError::NotFound(request.showtime_id.clone())),
            _ => Err(unexpected_status(response).await),
        }
    }
}
