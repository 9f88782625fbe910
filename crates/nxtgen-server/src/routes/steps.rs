use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use nxtgen_core::types::TargetKind;

use super::workflows::started;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/steps
pub async fn list_steps(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::to_value(app.dashboard.list_steps()?)?))
}

/// POST /api/steps/{name}/troubleshoot — `name` is case-insensitive.
pub async fn troubleshoot_step(
    State(app): State<AppState>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let handle = app.dashboard.troubleshoot_step(&name).await?;
    Ok(started(TargetKind::PipelineStep, &handle))
}
