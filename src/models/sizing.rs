use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::panel::PanelSpec;
use crate::models::session::IrradianceOrigin;

/// Panel count and instantaneous output for one irradiance level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SizingResult {
    /// Output of one panel at the given irradiance after derating (W)
    pub power_per_panel_w: f64,
    pub panels_needed: u64,
    pub total_area_m2: f64,
    /// panels_needed × power_per_panel (W)
    pub system_power_w: f64,
    /// panels_needed × nameplate power (W)
    pub rated_capacity_w: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EnergyProjection {
    pub peak_sun_hours: f64,
    pub energy_per_panel_kwh_year: f64,
    pub total_energy_kwh_year: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Payback {
    Years { years: f64 },
    /// Annual savings are zero or negative.
    NotComputable,
}

impl fmt::Display for Payback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payback::Years { years } => write!(f, "{years:.1} years"),
            Payback::NotComputable => write!(f, "not computable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinancialProjection {
    pub electricity_rate: f64,
    pub system_cost: f64,
    pub annual_savings: f64,
    pub payback: Payback,
}

// ─── REST request / response types ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SizingRequest {
    /// Irradiance (W/m²). Inside a session, omit to use the last prediction.
    #[serde(default)]
    pub ghi: Option<f64>,
    /// Catalog brand, or "Custom"
    pub panel: String,
    /// Values for the Custom panel
    #[serde(default)]
    pub custom_panel: Option<PanelSpec>,
    pub derate: f64,
    pub required_power_w: f64,
    #[serde(default)]
    pub peak_sun_hours: Option<f64>,
    /// Currency per kWh
    #[serde(default)]
    pub electricity_rate: Option<f64>,
    #[serde(default)]
    pub system_cost: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SizingReport {
    pub ghi_w_m2: f64,
    /// Where the irradiance came from when sized inside a session
    pub ghi_origin: Option<IrradianceOrigin>,
    pub panel: PanelSpec,
    pub derate: f64,
    pub required_power_w: f64,
    pub sizing: SizingResult,
    pub energy: Option<EnergyProjection>,
    pub financial: Option<FinancialProjection>,
}
