use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::features::FeatureRecord;
use crate::models::session::{IrradianceOrigin, ModelStatus, PredictionResponse};
use crate::shared_state::AppState;

fn run_prediction(state: &AppState, features: FeatureRecord) -> Result<PredictionResponse, ApiError> {
    let ghi_w_m2 = state.predictor.predict(&features).inspect_err(|e| {
        warn!(error = %e, "Prediction failed");
    })?;
    info!(hour = features.hour, ghi_w_m2, "Predicted irradiance");
    Ok(PredictionResponse {
        ghi_w_m2,
        features,
        feature_path: state.predictor.feature_path(),
        timestamp: Utc::now(),
    })
}

/// GET /api/model
/// Irradiance model status
///
/// Reports whether the model artifacts loaded and, if not, why.
#[utoipa::path(
    get,
    path = "/api/model",
    responses(
        (status = 200, description = "Model status", body = ModelStatus)
    )
)]
pub async fn get_model_status(State(state): State<AppState>) -> Json<ModelStatus> {
    Json(state.predictor.status())
}

/// POST /api/predict
/// Predict irradiance without a session
#[utoipa::path(
    post,
    path = "/api/predict",
    request_body = FeatureRecord,
    responses(
        (status = 200, description = "Predicted GHI", body = PredictionResponse),
        (status = 422, description = "Prediction failed for these inputs"),
        (status = 503, description = "Model not loaded")
    )
)]
pub async fn predict(
    State(state): State<AppState>,
    Json(features): Json<FeatureRecord>,
) -> Result<Json<PredictionResponse>, ApiError> {
    run_prediction(&state, features).map(Json)
}

/// POST /api/sessions/{id}/predict
/// Predict irradiance and keep it for the sizing step
///
/// A successful prediction replaces the session's last irradiance. A failed
/// one leaves it untouched.
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/predict",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = FeatureRecord,
    responses(
        (status = 200, description = "Predicted GHI", body = PredictionResponse),
        (status = 404, description = "Session not found"),
        (status = 422, description = "Prediction failed for these inputs"),
        (status = 503, description = "Model not loaded")
    )
)]
pub async fn predict_in_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(features): Json<FeatureRecord>,
) -> Result<Json<PredictionResponse>, ApiError> {
    if state.get_session(&id).is_none() {
        return Err(ApiError::SessionNotFound(id));
    }
    let response = run_prediction(&state, features)?;
    state
        .record_irradiance(&id, response.ghi_w_m2, IrradianceOrigin::Predicted)
        .ok_or(ApiError::SessionNotFound(id))?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictError;
    use crate::shared_state::test_support;

    fn features() -> FeatureRecord {
        FeatureRecord {
            hour: 13.0,
            temperature_c: 31.0,
            dew_point_c: 17.0,
            relative_humidity_percent: 40.0,
            surface_albedo: 0.2,
            pressure_hpa: 987.0,
            wind_speed_m_s: 3.5,
        }
    }

    #[tokio::test]
    async fn test_predict_stateless() {
        let Json(resp) = predict(State(test_support::state()), Json(features())).await.unwrap();
        assert_eq!(resp.ghi_w_m2, 750.0);
        assert_eq!(resp.features, features());
    }

    #[tokio::test]
    async fn test_predict_without_model() {
        let state = test_support::state_without_model();
        let err = predict(State(state.clone()), Json(features())).await.unwrap_err();
        assert!(matches!(err, ApiError::Predict(PredictError::ModelUnavailable(_))));

        let Json(status) = get_model_status(State(state)).await;
        assert!(!status.available);
        assert!(status.error.unwrap().contains("knn.json"));
    }

    #[tokio::test]
    async fn test_predict_in_session_stores_value() {
        let state = test_support::state();
        let id = state.create_session();
        let Json(resp) = predict_in_session(Path(id), State(state.clone()), Json(features())).await.unwrap();
        assert_eq!(resp.ghi_w_m2, 750.0);

        let reading = state.get_session(&id).unwrap().last_irradiance.unwrap();
        assert_eq!(reading.ghi_w_m2, 750.0);
        assert_eq!(reading.origin, IrradianceOrigin::Predicted);
    }

    #[tokio::test]
    async fn test_failed_prediction_keeps_previous_value() {
        let state = test_support::state();
        let id = state.create_session();
        state.record_irradiance(&id, 512.0, IrradianceOrigin::Override);

        let bad = FeatureRecord { relative_humidity_percent: 140.0, ..features() };
        let err = predict_in_session(Path(id), State(state.clone()), Json(bad)).await.unwrap_err();
        assert_eq!(err.kind(), "PredictionFailed");
        assert_eq!(state.get_session(&id).unwrap().last_irradiance.unwrap().ghi_w_m2, 512.0);
    }

    #[tokio::test]
    async fn test_fractional_hour_names_the_field() {
        let bad = FeatureRecord { hour: 7.5, ..features() };
        let err = predict(State(test_support::state()), Json(bad)).await.unwrap_err();
        assert_eq!(err.kind(), "PredictionFailed");
        assert!(err.to_string().contains("Hour"));
    }

    #[tokio::test]
    async fn test_predict_unknown_session() {
        let state = test_support::state();
        let err = predict_in_session(Path(Uuid::new_v4()), State(state), Json(features()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "SessionNotFound");
    }
}
