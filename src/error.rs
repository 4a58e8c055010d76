use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use uuid::Uuid;

/// Failures of the irradiance predictor.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredictError {
    /// Model or scaler artifact failed to load at startup.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    /// Inference failed for this particular input.
    #[error("prediction failed: {0}")]
    PredictionFailed(String),
}

/// Failures of the weather lookup adapter. Both are recovered by the caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WeatherError {
    #[error("location not found: {0}")]
    LocationNotFound(String),
    #[error("weather unavailable: {0}")]
    WeatherUnavailable(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        WeatherError::WeatherUnavailable(e.to_string())
    }
}

/// Invalid arithmetic preconditions for panel sizing.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SizingError {
    #[error("rejected input: {0}")]
    RejectedInput(&'static str),
}

/// Errors surfaced by the REST layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error(transparent)]
    Sizing(#[from] SizingError),
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    #[error("no irradiance available in this session: predict first or set an override")]
    NoIrradiance,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Predict(PredictError::ModelUnavailable(_)) => "ModelUnavailable",
            ApiError::Predict(PredictError::PredictionFailed(_)) => "PredictionFailed",
            ApiError::Sizing(SizingError::RejectedInput(_)) => "RejectedInput",
            ApiError::SessionNotFound(_) => "SessionNotFound",
            ApiError::NoIrradiance => "NoIrradiance",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Predict(PredictError::ModelUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Predict(PredictError::PredictionFailed(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Sizing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NoIrradiance => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        (self.status(), Json(body)).into_response()
    }
}
