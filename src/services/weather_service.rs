use std::time::Duration;

use chrono::{Local, Timelike, Utc};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{FallbackConfig, WeatherConfig};
use crate::error::WeatherError;
use crate::models::weather::{
    Coordinates, CurrentWeatherResponse, FormDefaults, GeocodingEntry, WeatherLookup, WeatherSnapshot,
    WeatherSource,
};

/// OpenWeatherMap-compatible geocoding and current-conditions client.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    config: WeatherConfig,
    fallback: FallbackConfig,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig, fallback: FallbackConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config, fallback })
    }

    fn api_key(&self) -> Result<&str, WeatherError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| WeatherError::WeatherUnavailable("no weather API key configured".to_string()))
    }

    /// First geocoding match for a free-text city name.
    pub async fn resolve(&self, city: &str) -> Result<Coordinates, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::LocationNotFound("empty city name".to_string()));
        }
        let key = self.api_key()?;

        let resp = self
            .client
            .get(&self.config.geocoding_url)
            .query(&[("q", city), ("limit", "1"), ("appid", key)])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(WeatherError::LocationNotFound(format!("{city} (status {})", resp.status())));
        }

        let entries: Vec<GeocodingEntry> = resp.json().await?;
        let first = entries
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::LocationNotFound(city.to_string()))?;
        debug!(city, matched = first.name.as_deref().unwrap_or("?"), lat = first.lat, lon = first.lon, "Geocoded");
        Ok(Coordinates { latitude: first.lat, longitude: first.lon })
    }

    /// Current conditions at `coords`.
    pub async fn fetch_conditions(&self, coords: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        let key = self.api_key()?;
        let resp = self
            .client
            .get(&self.config.weather_url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("appid", key.to_string()),
            ])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(WeatherError::WeatherUnavailable(format!("status {status}")));
        }
        let body: CurrentWeatherResponse = resp.json().await?;
        Ok(WeatherSnapshot::from_wire(&body, &self.fallback))
    }

    /// Resolves `city` and fetches its weather. Any failure substitutes the
    /// default location and conditions.
    pub async fn lookup(&self, city: &str) -> WeatherLookup {
        let live = match self.resolve(city).await {
            Ok(coords) => self.fetch_conditions(coords).await.map(|snapshot| (coords, snapshot)),
            Err(e) => Err(e),
        };

        match live {
            Ok((coordinates, snapshot)) => {
                info!(city, temperature_c = snapshot.temperature_c, "Weather fetched");
                self.build_lookup(city, coordinates, snapshot, WeatherSource::Live, None)
            }
            Err(e) => {
                warn!(city, error = %e, "Weather lookup failed, using defaults");
                let notice = format!(
                    "{e}. Showing default conditions for {}.",
                    self.fallback.location_name
                );
                self.defaults_lookup(city, notice)
            }
        }
    }

    fn defaults_lookup(&self, city: &str, notice: String) -> WeatherLookup {
        let coordinates = Coordinates {
            latitude: self.fallback.latitude,
            longitude: self.fallback.longitude,
        };
        let snapshot = WeatherSnapshot::defaults(&self.fallback);
        self.build_lookup(city, coordinates, snapshot, WeatherSource::Defaults, Some(notice))
    }

    fn build_lookup(
        &self,
        city: &str,
        coordinates: Coordinates,
        snapshot: WeatherSnapshot,
        source: WeatherSource,
        notice: Option<String>,
    ) -> WeatherLookup {
        let dew_point_c = snapshot.dew_point_c();
        WeatherLookup {
            city: city.trim().to_string(),
            coordinates,
            snapshot,
            dew_point_c,
            source,
            notice,
            form_defaults: FormDefaults {
                hour: Local::now().hour() as u8,
                temperature_c: snapshot.temperature_c,
                dew_point_c,
                relative_humidity_percent: snapshot.humidity_percent,
                surface_albedo: self.fallback.surface_albedo,
                pressure_hpa: snapshot.pressure_hpa,
                wind_speed_m_s: snapshot.wind_speed_m_s,
            },
            timestamp: Utc::now(),
        }
    }
}
