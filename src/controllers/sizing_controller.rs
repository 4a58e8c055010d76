use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, SizingError};
use crate::models::session::{
    IrradianceOrigin, IrradianceOverride, IrradianceReading, SessionCreated, SessionStatus,
};
use crate::models::sizing::{SizingReport, SizingRequest};
use crate::services::panel_sizing;
use crate::shared_state::AppState;

fn report(
    state: &AppState,
    ghi_w_m2: f64,
    origin: Option<IrradianceOrigin>,
    req: &SizingRequest,
) -> Result<SizingReport, ApiError> {
    let report = panel_sizing::evaluate(&state.catalog, ghi_w_m2, origin, req)?;
    info!(
        panel = %report.panel.brand,
        ghi_w_m2,
        panels_needed = report.sizing.panels_needed,
        system_power_w = report.sizing.system_power_w,
        "Sized system"
    );
    Ok(report)
}

/// POST /api/sessions
/// Start a session
///
/// A session carries the last predicted (or overridden) irradiance from the
/// prediction step to the sizing step.
#[utoipa::path(
    post,
    path = "/api/sessions",
    responses(
        (status = 201, description = "Session created", body = SessionCreated)
    )
)]
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.create_session();
    info!(%session_id, active = state.session_count(), "Session created");
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

/// GET /api/sessions/{id}
/// Session context
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session context", body = SessionStatus),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<SessionStatus>, ApiError> {
    let context = state.get_session(&id).ok_or(ApiError::SessionNotFound(id))?;
    Ok(Json(SessionStatus { session_id: id, context }))
}

/// DELETE /api/sessions/{id}
/// End a session
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 204, description = "Session removed"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn delete_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    if !state.remove_session(&id) {
        return Err(ApiError::SessionNotFound(id));
    }
    info!(session_id = %id, active = state.session_count(), "Session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/sessions/{id}/irradiance
/// Override the session irradiance
///
/// Replaces the last prediction with a user-supplied GHI. A later prediction
/// replaces the override in turn.
#[utoipa::path(
    put,
    path = "/api/sessions/{id}/irradiance",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = IrradianceOverride,
    responses(
        (status = 200, description = "Stored irradiance", body = IrradianceReading),
        (status = 404, description = "Session not found"),
        (status = 422, description = "Non-positive or non-finite GHI")
    )
)]
pub async fn set_irradiance(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<IrradianceOverride>,
) -> Result<Json<IrradianceReading>, ApiError> {
    if !body.ghi_w_m2.is_finite() || body.ghi_w_m2 <= 0.0 {
        return Err(SizingError::RejectedInput("non-positive GHI").into());
    }
    let reading = state
        .record_irradiance(&id, body.ghi_w_m2, IrradianceOrigin::Override)
        .ok_or(ApiError::SessionNotFound(id))?;
    Ok(Json(reading))
}

/// POST /api/sizing
/// Size a system for an explicit irradiance
#[utoipa::path(
    post,
    path = "/api/sizing",
    request_body = SizingRequest,
    responses(
        (status = 200, description = "Sizing and projections", body = SizingReport),
        (status = 422, description = "Rejected input")
    )
)]
pub async fn size_system(
    State(state): State<AppState>,
    Json(req): Json<SizingRequest>,
) -> Result<Json<SizingReport>, ApiError> {
    let ghi = req.ghi.ok_or(SizingError::RejectedInput("ghi is required outside a session"))?;
    report(&state, ghi, None, &req).map(Json)
}

/// POST /api/sessions/{id}/sizing
/// Size a system from the session irradiance
///
/// Uses `ghi` from the request when present, otherwise the session's last
/// prediction or override.
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/sizing",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = SizingRequest,
    responses(
        (status = 200, description = "Sizing and projections", body = SizingReport),
        (status = 404, description = "Session not found"),
        (status = 409, description = "No irradiance in session"),
        (status = 422, description = "Rejected input")
    )
)]
pub async fn size_in_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(req): Json<SizingRequest>,
) -> Result<Json<SizingReport>, ApiError> {
    let context = state.get_session(&id).ok_or(ApiError::SessionNotFound(id))?;
    let (ghi, origin) = match (req.ghi, context.last_irradiance) {
        (Some(ghi), _) => (ghi, IrradianceOrigin::Override),
        (None, Some(reading)) => (reading.ghi_w_m2, reading.origin),
        (None, None) => return Err(ApiError::NoIrradiance),
    };
    report(&state, ghi, Some(origin), &req).map(Json)
}
