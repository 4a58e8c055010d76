use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::FeaturePath;
use crate::models::features::FeatureRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IrradianceOrigin {
    Predicted,
    Override,
}

/// Irradiance value held by a session for the sizing step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IrradianceReading {
    pub ghi_w_m2: f64,
    pub origin: IrradianceOrigin,
    pub updated_at: DateTime<Utc>,
}

/// Per-browser context passed between the prediction and sizing steps.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionContext {
    pub last_irradiance: Option<IrradianceReading>,
    /// Last time the session was read or written. Idle sessions are evicted.
    pub last_active: DateTime<Utc>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self { last_irradiance: None, last_active: Utc::now() }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn record(&mut self, ghi_w_m2: f64, origin: IrradianceOrigin) -> IrradianceReading {
        let reading = IrradianceReading { ghi_w_m2, origin, updated_at: Utc::now() };
        self.last_irradiance = Some(reading);
        self.last_active = reading.updated_at;
        reading
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub context: SessionContext,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IrradianceOverride {
    pub ghi_w_m2: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PredictionResponse {
    pub ghi_w_m2: f64,
    pub features: FeatureRecord,
    pub feature_path: FeaturePath,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModelStatus {
    pub available: bool,
    pub feature_path: FeaturePath,
    pub n_neighbors: Option<usize>,
    pub n_samples: Option<usize>,
    pub error: Option<String>,
}
