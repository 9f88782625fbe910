use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use nxtgen_core::types::TargetKind;

use super::workflows::started;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/servers — MCP servers with their tools and status.
pub async fn list_servers(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::to_value(app.dashboard.list_servers()?)?))
}

/// GET /api/servers/{id}
pub async fn get_server(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::to_value(app.dashboard.server(&id)?)?))
}

/// POST /api/servers/{id}/connect
pub async fn connect_server(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let handle = app.dashboard.connect_server(&id).await?;
    Ok(started(TargetKind::McpServer, &handle))
}

/// POST /api/servers/{id}/disconnect
pub async fn disconnect_server(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let server = app.dashboard.disconnect_server(&id).await?;
    Ok(Json(serde_json::to_value(server)?))
}

/// GET /api/servers/{id}/tools/{tool}/test — output of the latest test run.
pub async fn get_tool_test(
    State(app): State<AppState>,
    Path((id, tool)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::to_value(app.dashboard.tool_test(&id, &tool)?)?))
}

/// POST /api/servers/{id}/tools/{tool}/test
pub async fn test_tool(
    State(app): State<AppState>,
    Path((id, tool)): Path<(String, String)>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let handle = app.dashboard.test_tool(&id, &tool).await?;
    Ok(started(TargetKind::ToolTest, &handle))
}
