use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use nxtgen_core::error::NxtgenError;
use nxtgen_core::types::TargetKind;

use super::workflows::started;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/findings — findings plus issue counts.
pub async fn list_findings(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::to_value(app.dashboard.findings_view()?)?))
}

/// POST /api/findings/scan — start a security scan in the background.
pub async fn scan(
    State(app): State<AppState>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if app.dashboard.is_scanning() {
        return Err(NxtgenError::Busy("security scan".to_string()).into());
    }
    let dashboard = app.dashboard.clone();
    tokio::spawn(async move {
        if let Err(e) = dashboard.scan().await {
            tracing::warn!(error = %e, "security scan did not run");
        }
    });
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "status": "scanning",
            "delay_ms": app.config.sequencer.scan_delay_ms,
        })),
    ))
}

/// POST /api/findings/{id}/fix
pub async fn fix_finding(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let handle = app.dashboard.fix_finding(&id).await?;
    Ok(started(TargetKind::SecurityFinding, &handle))
}
