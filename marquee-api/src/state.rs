use crate::error::AppError;
use crate::middleware::CircuitBreaker;
use marquee_core::{ScreenConfig, SeatSelectionScreen, SeatService};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type Screen = SeatSelectionScreen<dyn SeatService>;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn SeatService>,
    pub screens: Arc<RwLock<HashMap<Uuid, Arc<Screen>>>>,
    pub screen_config: ScreenConfig,
    pub reservation_cb: Arc<CircuitBreaker>,
}

impl AppState {
    pub fn new(service: Arc<dyn SeatService>, screen_config: ScreenConfig) -> Self {
        Self {
            service,
            screens: Arc::new(RwLock::new(HashMap::new())),
            screen_config,
            reservation_cb: Arc::new(CircuitBreaker::new("reservation-service", 5, Duration::from_secs(30))),
        }
    }

    pub async fn insert_screen(&self, screen: Screen) -> (Uuid, Arc<Screen>) {
        let screen_id = Uuid::new_v4();
        let screen = Arc::new(screen);
        self.screens.write().await.insert(screen_id, Arc::clone(&screen));
        (screen_id, screen)
    }

    pub async fn screen(&self, screen_id: Uuid) -> Result<Arc<Screen>, AppError> {
        self.screens
            .read()
            .await
            .get(&screen_id)
            .cloned()
            .ok_or_else(|| AppError::NotFoundError(format!("Screen {} not found", screen_id)))
    }

    pub async fn remove_screen(&self, screen_id: Uuid) -> Option<Arc<Screen>> {
        self.screens.write().await.remove(&screen_id)
    }

    /// Close and drop every screen that was left or sat idle past its timeout.
    pub async fn evict_expired_screens(&self) -> usize {
        let expired: HashMap<Uuid, Arc<Screen>> = {
            let mut screens = self.screens.write().await;
            let (expired, live): (HashMap<_, _>, HashMap<_, _>) = std::mem::take(&mut *screens)
                .into_iter()
                .partition(|(_, screen)| screen.is_expired());
            *screens = live;
            expired
        };

        for (screen_id, screen) in &expired {
            screen.leave().await;
            tracing::info!("Screen {} evicted after {:?} idle", screen_id, screen.idle_for());
        }
        expired.len()
    }

    pub async fn open_screens(&self) -> usize {
        self.screens.read().await.len()
    }
}
