use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::models::panel::PanelCatalog;
use crate::models::session::{IrradianceOrigin, IrradianceReading, SessionContext};
use crate::services::irradiance_predictor::IrradiancePredictor;
use crate::services::weather_service::WeatherClient;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub predictor: Arc<IrradiancePredictor>,
    pub weather: WeatherClient,
    pub catalog: Arc<PanelCatalog>,
    /// Map of session id to its prediction context
    pub sessions: Arc<RwLock<HashMap<Uuid, SessionContext>>>,
}

// Every write leaves the map consistent, so a poisoned lock is recovered.

impl AppState {
    pub fn new(config: Config, predictor: IrradiancePredictor, weather: WeatherClient) -> Self {
        let catalog = PanelCatalog::new(config.panels.clone());
        Self {
            config: Arc::new(config),
            predictor: Arc::new(predictor),
            weather,
            catalog: Arc::new(catalog),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a new session, first dropping sessions idle past the TTL.
    pub fn create_session(&self) -> Uuid {
        let ttl = i64::try_from(self.config.server.session_ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds);
        if let Some(cutoff) = ttl.and_then(|ttl| Utc::now().checked_sub_signed(ttl)) {
            let evicted = self.evict_idle_since(cutoff);
            if evicted > 0 {
                debug!(evicted, "Evicted idle sessions");
            }
        }

        let id = Uuid::new_v4();
        let mut map = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(id, SessionContext::new());
        id
    }

    /// Removes every session last active before `cutoff`. Returns how many went.
    pub fn evict_idle_since(&self, cutoff: DateTime<Utc>) -> usize {
        let mut map = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = map.len();
        map.retain(|_, ctx| ctx.last_active >= cutoff);
        before - map.len()
    }

    pub fn remove_session(&self, id: &Uuid) -> bool {
        let mut map = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(id).is_some()
    }

    pub fn get_session(&self, id: &Uuid) -> Option<SessionContext> {
        let mut map = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        map.get_mut(id).map(|ctx| {
            ctx.touch();
            ctx.clone()
        })
    }

    /// Stores `ghi_w_m2` as the session's last irradiance. Returns `None` for
    /// unknown sessions.
    pub fn record_irradiance(
        &self,
        id: &Uuid,
        ghi_w_m2: f64,
        origin: IrradianceOrigin,
    ) -> Option<IrradianceReading> {
        let mut map = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        map.get_mut(id).map(|ctx| ctx.record(ghi_w_m2, origin))
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
