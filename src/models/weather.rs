use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::FallbackConfig;

const KELVIN_OFFSET: f64 = 273.15;

// ─── Domain types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current surface conditions at a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub pressure_hpa: f64,
    pub wind_speed_m_s: f64,
}

impl WeatherSnapshot {
    pub fn defaults(fallback: &FallbackConfig) -> Self {
        Self {
            temperature_c: fallback.temperature_c,
            humidity_percent: fallback.humidity_percent,
            pressure_hpa: fallback.pressure_hpa,
            wind_speed_m_s: fallback.wind_speed_m_s,
        }
    }

    /// Builds a snapshot from the upstream payload. Each missing field falls
    /// back to its own default.
    pub fn from_wire(resp: &CurrentWeatherResponse, fallback: &FallbackConfig) -> Self {
        let main = resp.main.as_ref();
        Self {
            temperature_c: main
                .and_then(|m| m.temp)
                .map(kelvin_to_celsius)
                .unwrap_or(fallback.temperature_c),
            humidity_percent: main.and_then(|m| m.humidity).unwrap_or(fallback.humidity_percent),
            pressure_hpa: main.and_then(|m| m.pressure).unwrap_or(fallback.pressure_hpa),
            wind_speed_m_s: resp
                .wind
                .as_ref()
                .and_then(|w| w.speed)
                .unwrap_or(fallback.wind_speed_m_s),
        }
    }

    pub fn dew_point_c(&self) -> f64 {
        approximate_dew_point(self.temperature_c, self.humidity_percent)
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Rule-of-thumb dew point: T - (100 - RH) / 5.
/// Not the Magnus formula.
pub fn approximate_dew_point(temperature_c: f64, humidity_percent: f64) -> f64 {
    temperature_c - ((100.0 - humidity_percent) / 5.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WeatherSource {
    Live,
    Defaults,
}

/// Values used to prefill the prediction form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormDefaults {
    pub hour: u8,
    pub temperature_c: f64,
    pub dew_point_c: f64,
    pub relative_humidity_percent: f64,
    pub surface_albedo: f64,
    pub pressure_hpa: f64,
    pub wind_speed_m_s: f64,
}

/// Result of a city lookup as shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WeatherLookup {
    pub city: String,
    pub coordinates: Coordinates,
    pub snapshot: WeatherSnapshot,
    pub dew_point_c: f64,
    pub source: WeatherSource,
    /// Informational message when defaults were substituted.
    pub notice: Option<String>,
    pub form_defaults: FormDefaults,
    pub timestamp: DateTime<Utc>,
}

// ─── OpenWeatherMap wire types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GeocodingEntry {
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub main: Option<MainBlock>,
    pub wind: Option<WindBlock>,
}

#[derive(Debug, Deserialize)]
pub struct MainBlock {
    /// Kelvin
    pub temp: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct WindBlock {
    pub speed: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_dew_point_from_defaults() {
        let snapshot = WeatherSnapshot::defaults(&FallbackConfig::default());
        assert_abs_diff_eq!(snapshot.dew_point_c(), 18.8, epsilon = 1e-9);
    }

    #[test]
    fn test_from_wire_converts_kelvin() {
        let resp: CurrentWeatherResponse = serde_json::from_str(
            r#"{
                "weather": [{ "id": 800, "main": "Clear" }],
                "main": { "temp": 300.15, "feels_like": 301.0, "pressure": 1012, "humidity": 60 },
                "wind": { "speed": 4.1, "deg": 250 },
                "name": "Jaipur"
            }"#,
        )
        .unwrap();
        let snapshot = WeatherSnapshot::from_wire(&resp, &FallbackConfig::default());
        assert_abs_diff_eq!(snapshot.temperature_c, 27.0, epsilon = 1e-9);
        assert_eq!(snapshot.humidity_percent, 60.0);
        assert_eq!(snapshot.pressure_hpa, 1012.0);
        assert_eq!(snapshot.wind_speed_m_s, 4.1);
    }

    #[test]
    fn test_from_wire_falls_back_per_field() {
        let resp: CurrentWeatherResponse =
            serde_json::from_str(r#"{ "main": { "temp": 283.15 } }"#).unwrap();
        let snapshot = WeatherSnapshot::from_wire(&resp, &FallbackConfig::default());
        assert_abs_diff_eq!(snapshot.temperature_c, 10.0, epsilon = 1e-9);
        assert_eq!(snapshot.humidity_percent, 46.0);
        assert_eq!(snapshot.pressure_hpa, 986.0);
        assert_eq!(snapshot.wind_speed_m_s, 2.9);
    }
}
