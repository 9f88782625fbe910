use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use nxtgen_core::dashboard::NewWorkflow;
use nxtgen_core::sequencer::SequenceHandle;
use nxtgen_core::types::TargetKind;

use crate::error::AppError;
use crate::state::AppState;

/// Response body for any action that starts a sequence.
pub(crate) fn started(kind: TargetKind, handle: &SequenceHandle) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "status": "started",
            "kind": kind,
            "target_id": handle.target_id,
            "sequence_id": handle.sequence_id,
            "events": format!("/api/sequences/{kind}/{}/events", handle.target_id),
        })),
    )
}

/// GET /api/workflows — list all workflows.
pub async fn list_workflows(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let workflows = app.dashboard.list_workflows()?;
    Ok(Json(serde_json::to_value(workflows)?))
}

/// POST /api/workflows — create a pending workflow.
pub async fn create_workflow(
    State(app): State<AppState>,
    Json(req): Json<NewWorkflow>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let wf = app.dashboard.create_workflow(req)?;
    Ok((StatusCode::CREATED, Json(serde_json::to_value(wf)?)))
}

/// GET /api/workflows/{id} — workflow detail with its pipeline.
pub async fn get_workflow(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let wf = app.dashboard.workflow(&id)?;
    let active = app.dashboard.workflow_sequencer().is_active(&id).await;
    let mut body = serde_json::to_value(wf)?;
    body["pipeline"] = serde_json::to_value(app.dashboard.list_steps()?)?;
    body["sequence_active"] = serde_json::Value::Bool(active);
    Ok(Json(body))
}

/// POST /api/workflows/{id}/troubleshoot
pub async fn troubleshoot_workflow(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let handle = app.dashboard.troubleshoot_workflow(&id).await?;
    Ok(started(TargetKind::Workflow, &handle))
}

/// POST /api/workflows/{id}/stop
pub async fn stop_workflow(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let wf = app.dashboard.stop_workflow(&id).await?;
    Ok(Json(serde_json::to_value(wf)?))
}

/// POST /api/workflows/{id}/auto-heal
pub async fn toggle_auto_heal(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let wf = app.dashboard.toggle_auto_heal(&id)?;
    Ok(Json(serde_json::json!({ "id": wf.id, "auto_heal": wf.auto_heal })))
}
