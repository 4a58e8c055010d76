use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::panel::{default_catalog, PanelSpec};

fn default_port() -> u16 { 8080 }
fn default_static_dir() -> String { "static".to_string() }
fn default_session_ttl_secs() -> u64 { 3600 }
fn default_model_path() -> String { "artifacts/knn.json".to_string() }
fn default_scaler_path() -> String { "artifacts/scaler.json".to_string() }
fn default_geocoding_url() -> String { "https://api.openweathermap.org/geo/1.0/direct".to_string() }
fn default_weather_url() -> String { "https://api.openweathermap.org/data/2.5/weather".to_string() }
fn default_timeout_secs() -> u64 { 10 }

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub sizing: SizingDefaults,
    #[serde(default = "default_catalog")]
    pub panels: Vec<PanelSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            weather: WeatherConfig::default(),
            fallback: FallbackConfig::default(),
            sizing: SizingDefaults::default(),
            panels: default_catalog(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Sessions idle for longer than this are dropped when a new one starts.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

/// Which data path feeds the feature vector to the regressor.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeaturePath {
    /// Run the scaler transform before predicting.
    #[default]
    Scaled,
    /// Feed raw feature values straight to the regressor.
    Raw,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_scaler_path")]
    pub scaler_path: String,
    #[serde(default)]
    pub feature_path: FeaturePath,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            scaler_path: default_scaler_path(),
            feature_path: FeaturePath::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key. Without one every lookup falls back to defaults.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            geocoding_url: default_geocoding_url(),
            weather_url: default_weather_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Static location and conditions substituted when a lookup fails.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FallbackConfig {
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub pressure_hpa: f64,
    pub wind_speed_m_s: f64,
    pub surface_albedo: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            location_name: "New Delhi".to_string(),
            latitude: 28.6139,
            longitude: 77.2090,
            temperature_c: 29.6,
            humidity_percent: 46.0,
            pressure_hpa: 986.0,
            wind_speed_m_s: 2.9,
            surface_albedo: 0.15,
        }
    }
}

/// Prefilled values for the sizing form.
#[derive(Debug, Deserialize, Serialize, Clone, ToSchema)]
#[serde(default)]
pub struct SizingDefaults {
    pub derate: f64,
    pub peak_sun_hours: f64,
    pub required_power_w: f64,
}

impl Default for SizingDefaults {
    fn default() -> Self {
        Self { derate: 0.77, peak_sun_hours: 5.0, required_power_w: 800.0 }
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config = serde_json::from_str(content)?;
        Ok(config)
    }
}
