use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nxtgen_core::error::NxtgenError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 404 Not Found errors
// ---------------------------------------------------------------------------

/// Carries an explicit 404 for conditions that are not a missing entity,
/// such as streaming a sequence that is not running.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses. Body is `{"error": "..."}`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }
}

fn status_for(e: &NxtgenError) -> StatusCode {
    match e {
        NxtgenError::TargetNotFound { .. } => StatusCode::NOT_FOUND,
        NxtgenError::TargetExists { .. } | NxtgenError::Busy(_) => StatusCode::CONFLICT,
        NxtgenError::InvalidKind(_)
        | NxtgenError::InvalidStatus(_)
        | NxtgenError::InvalidSeverity(_)
        | NxtgenError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        NxtgenError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        NxtgenError::Io(_) | NxtgenError::Yaml(_) | NxtgenError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.downcast_ref::<NotFoundError>().is_some() {
            StatusCode::NOT_FOUND
        } else if let Some(e) = self.0.downcast_ref::<NxtgenError>() {
            status_for(e)
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxtgen_core::types::TargetKind;

    #[test]
    fn target_not_found_maps_to_404() {
        let err = AppError(NxtgenError::not_found(TargetKind::Workflow, "9").into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_transition_maps_to_422() {
        let err = AppError(
            NxtgenError::InvalidTransition {
                from: "completed".into(),
                to: "in_progress".into(),
                reason: "already resolved".into(),
            }
            .into(),
        );
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn busy_maps_to_409() {
        let err = AppError(NxtgenError::Busy("security scan".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_kind_maps_to_400() {
        let err = AppError(NxtgenError::InvalidKind("widget".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn sentinel_not_found_maps_to_404() {
        let response = AppError::not_found("no active sequence").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unknown_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("boom"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
