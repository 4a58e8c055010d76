use axum::{
    routing::{get, post, put},
    Router,
};

use crate::controllers::prediction_controller::{get_model_status, predict, predict_in_session};
use crate::controllers::sizing_controller::{
    create_session, delete_session, get_session, set_irradiance, size_in_session, size_system,
};
use crate::controllers::weather_controller::{get_weather, list_panels};
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/weather",                  get(get_weather))
        .route("/panels",                   get(list_panels))
        .route("/model",                    get(get_model_status))
        .route("/predict",                  post(predict))
        .route("/sizing",                   post(size_system))
        .route("/sessions",                 post(create_session))
        .route("/sessions/{id}",            get(get_session).delete(delete_session))
        .route("/sessions/{id}/predict",    post(predict_in_session))
        .route("/sessions/{id}/irradiance", put(set_irradiance))
        .route("/sessions/{id}/sizing",     post(size_in_session))
        .with_state(state)
}
