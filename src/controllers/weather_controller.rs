use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::SizingDefaults;
use crate::models::panel::PanelSpec;
use crate::models::weather::WeatherLookup;
use crate::shared_state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeatherQuery {
    /// Free-text city name
    pub city: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PanelCatalogResponse {
    pub panels: Vec<PanelSpec>,
    pub defaults: SizingDefaults,
}

/// GET /api/weather
/// Current conditions for a city
///
/// Resolves the city and fetches its current weather. When either step fails
/// the static default location and conditions are returned with a notice.
#[utoipa::path(
    get,
    path = "/api/weather",
    params(WeatherQuery),
    responses(
        (status = 200, description = "Live or default conditions with prefilled form values", body = WeatherLookup)
    )
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Json<WeatherLookup> {
    Json(state.weather.lookup(&query.city).await)
}

/// GET /api/panels
/// Panel catalog
///
/// Lists the selectable panels, including the editable Custom entry, and the
/// default sizing parameters.
#[utoipa::path(
    get,
    path = "/api/panels",
    responses(
        (status = 200, description = "Panel catalog", body = PanelCatalogResponse)
    )
)]
pub async fn list_panels(State(state): State<AppState>) -> Json<PanelCatalogResponse> {
    Json(PanelCatalogResponse {
        panels: state.catalog.all().to_vec(),
        defaults: state.config.sizing.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::weather::WeatherSource;
    use crate::shared_state::test_support;

    #[tokio::test]
    async fn test_weather_without_key_falls_back() {
        let state = test_support::state();
        let Json(lookup) = get_weather(State(state), Query(WeatherQuery { city: "Atlantis".into() })).await;
        assert_eq!(lookup.source, WeatherSource::Defaults);
        assert_eq!(lookup.form_defaults.relative_humidity_percent, 46.0);
        assert_eq!(lookup.form_defaults.surface_albedo, 0.15);
    }

    #[tokio::test]
    async fn test_list_panels() {
        let Json(resp) = list_panels(State(test_support::state())).await;
        assert!(resp.panels.iter().any(|p| p.brand == "Custom"));
        assert_eq!(resp.defaults.derate, 0.77);
    }
}
