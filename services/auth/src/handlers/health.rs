use axum::{extract::State, http::StatusCode};

use scribe_core::error::AppError;

use crate::state::AppState;

/// Handler for `GET /readyz`: ready once both PostgreSQL and Redis answer.
pub async fn readyz(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    if let Err(e) = state.db.ping().await {
        tracing::warn!(error = %e, "readiness: database unreachable");
        return Err(AppError::Unavailable);
    }
    if let Err(e) = state.redis.get().await {
        tracing::warn!(error = %e, "readiness: redis unreachable");
        return Err(AppError::Unavailable);
    }
    Ok(StatusCode::OK)
}
