use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::SizingError;

/// Brand reserved for the user-editable panel.
pub const CUSTOM_BRAND: &str = "Custom";

/// Photovoltaic panel datasheet values used by the sizing calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PanelSpec {
    pub brand: String,
    /// Module efficiency (%), 0–100
    pub efficiency_percent: f64,
    /// Module area (m²)
    pub area_m2: f64,
    /// Nameplate power at STC (W)
    pub rated_power_w: f64,
}

impl PanelSpec {
    pub fn new(brand: &str, efficiency_percent: f64, area_m2: f64, rated_power_w: f64) -> Self {
        Self { brand: brand.to_string(), efficiency_percent, area_m2, rated_power_w }
    }

    pub fn is_custom(&self) -> bool {
        self.brand == CUSTOM_BRAND
    }

    pub fn validate(&self) -> Result<(), SizingError> {
        if !self.efficiency_percent.is_finite()
            || self.efficiency_percent <= 0.0
            || self.efficiency_percent > 100.0
        {
            return Err(SizingError::RejectedInput("panel efficiency must be in (0, 100]"));
        }
        if !self.area_m2.is_finite() || self.area_m2 <= 0.0 {
            return Err(SizingError::RejectedInput("panel area must be positive"));
        }
        if !self.rated_power_w.is_finite() || self.rated_power_w <= 0.0 {
            return Err(SizingError::RejectedInput("panel rated power must be positive"));
        }
        Ok(())
    }
}

/// Built-in catalog, used when the config file does not list panels.
pub fn default_catalog() -> Vec<PanelSpec> {
    vec![
        PanelSpec::new("SunPower Maxeon 3", 22.6, 1.63, 400.0),
        PanelSpec::new("LG NeON R", 21.7, 1.73, 380.0),
        PanelSpec::new("Canadian Solar HiKu6", 21.0, 1.95, 410.0),
        PanelSpec::new("Trina Vertex S", 21.1, 1.76, 400.0),
        PanelSpec::new("Generic Polycrystalline", 16.0, 1.64, 270.0),
        custom_template(),
    ]
}

/// Starting values shown for the Custom panel.
pub fn custom_template() -> PanelSpec {
    PanelSpec::new(CUSTOM_BRAND, 18.0, 1.7, 300.0)
}

/// Named panel catalog with a guaranteed Custom entry.
#[derive(Debug, Clone)]
pub struct PanelCatalog {
    panels: Vec<PanelSpec>,
}

impl PanelCatalog {
    pub fn new(mut panels: Vec<PanelSpec>) -> Self {
        if !panels.iter().any(PanelSpec::is_custom) {
            panels.push(custom_template());
        }
        Self { panels }
    }

    pub fn all(&self) -> &[PanelSpec] {
        &self.panels
    }

    pub fn get(&self, brand: &str) -> Option<&PanelSpec> {
        self.panels.iter().find(|p| p.brand == brand)
    }

    /// Picks the spec for a calculation. `Custom` takes the user's values
    /// when given, otherwise its template.
    pub fn select(&self, brand: &str, custom: Option<&PanelSpec>) -> Result<PanelSpec, SizingError> {
        let spec = if brand == CUSTOM_BRAND {
            match custom {
                Some(c) => PanelSpec { brand: CUSTOM_BRAND.to_string(), ..c.clone() },
                None => self.get(CUSTOM_BRAND).cloned().unwrap_or_else(custom_template),
            }
        } else {
            self.get(brand)
                .cloned()
                .ok_or(SizingError::RejectedInput("unknown panel brand"))?
        };
        spec.validate()?;
        Ok(spec)
    }
}
