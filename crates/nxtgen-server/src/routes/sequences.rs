use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use nxtgen_core::types::TargetKind;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/sequences — every running sequence across all kinds.
pub async fn list_sequences(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let active = app.dashboard.active_sequences().await;
    Ok(Json(serde_json::to_value(active)?))
}

/// GET /api/sequences/{kind}/{id}/events — SSE stream of one sequence.
///
/// Each frame's event name is the sequence event type (`emitted`,
/// `resolved`, ...) and its data is the event as JSON. The stream closes
/// once the sequence resolves or is cancelled.
pub async fn sequence_events(
    State(app): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let kind: TargetKind = kind.parse()?;
    let Some(rx) = app.dashboard.subscribe(kind, &id).await else {
        return Err(AppError::not_found(format!("no active sequence for {kind} '{id}'")));
    };
    info!(%kind, id = %id, "sequence SSE subscribe");

    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        let ev = msg.ok()?;
        Event::default()
            .event(ev.name())
            .json_data(&ev)
            .ok()
            .map(Ok::<Event, Infallible>)
    });
    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response())
}

/// GET /api/sequences/{kind}/{id}/log — output of the target's current or
/// most recent sequence.
pub async fn sequence_log(
    State(app): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kind: TargetKind = kind.parse()?;
    let lines = app.dashboard.sequence_log(kind, &id)?;
    Ok(Json(serde_json::json!({
        "kind": kind,
        "target_id": id,
        "lines": lines,
    })))
}

/// POST /api/sequences/{kind}/{id}/cancel
pub async fn cancel_sequence(
    State(app): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kind: TargetKind = kind.parse()?;
    let cancelled = app.dashboard.cancel(kind, &id).await?;
    Ok(Json(serde_json::json!({
        "kind": kind,
        "target_id": id,
        "cancelled": cancelled,
    })))
}
