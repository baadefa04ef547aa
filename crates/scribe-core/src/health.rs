use axum::http::StatusCode;

/// Handler for `GET /healthz`: liveness check.
///
/// Readiness depends on each service's backing stores and lives with the
/// service.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
