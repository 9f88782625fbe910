pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Workflows
        .route(
            "/api/workflows",
            get(routes::workflows::list_workflows).post(routes::workflows::create_workflow),
        )
        .route("/api/workflows/{id}", get(routes::workflows::get_workflow))
        .route(
            "/api/workflows/{id}/troubleshoot",
            post(routes::workflows::troubleshoot_workflow),
        )
        .route(
            "/api/workflows/{id}/stop",
            post(routes::workflows::stop_workflow),
        )
        .route(
            "/api/workflows/{id}/auto-heal",
            post(routes::workflows::toggle_auto_heal),
        )
        // Security findings
        .route("/api/findings", get(routes::findings::list_findings))
        .route("/api/findings/scan", post(routes::findings::scan))
        .route(
            "/api/findings/{id}/fix",
            post(routes::findings::fix_finding),
        )
        // Pipeline steps
        .route("/api/steps", get(routes::steps::list_steps))
        .route(
            "/api/steps/{name}/troubleshoot",
            post(routes::steps::troubleshoot_step),
        )
        // MCP servers
        .route("/api/servers", get(routes::servers::list_servers))
        .route("/api/servers/{id}", get(routes::servers::get_server))
        .route(
            "/api/servers/{id}/connect",
            post(routes::servers::connect_server),
        )
        .route(
            "/api/servers/{id}/disconnect",
            post(routes::servers::disconnect_server),
        )
        .route(
            "/api/servers/{id}/tools/{tool}/test",
            get(routes::servers::get_tool_test).post(routes::servers::test_tool),
        )
        // Sequences
        .route("/api/sequences", get(routes::sequences::list_sequences))
        .route(
            "/api/sequences/{kind}/{id}/events",
            get(routes::sequences::sequence_events),
        )
        .route(
            "/api/sequences/{kind}/{id}/log",
            get(routes::sequences::sequence_log),
        )
        .route(
            "/api/sequences/{kind}/{id}/cancel",
            post(routes::sequences::cancel_sequence),
        )
        // Config
        .route("/api/config", get(routes::config::get_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the API server on `port`.
pub async fn serve(root: PathBuf, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(root, listener).await
}

/// Start the API server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(root: PathBuf, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app_state = AppState::load(root)?;
    let dashboard = app_state.dashboard.clone();
    let app = build_router(app_state);

    tracing::info!("nxtgen API listening on http://localhost:{actual_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let cancelled = dashboard.shutdown().await;
    tracing::info!(cancelled, "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
