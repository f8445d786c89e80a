//! Handler for `GET /api/sessions`.

use axum::{Json, extract::State};
use hansard_core::{session::Session, store::BillStore};
use hansard_sync::UpstreamSource;

use crate::{AppState, error::ApiError};

/// `GET /api/sessions` — newest first.
pub async fn list<U, S>(
  State(state): State<AppState<U, S>>,
) -> Result<Json<Vec<Session>>, ApiError>
where
  U: UpstreamSource + Send + Sync + 'static,
  S: BillStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let sessions = state
    .store
    .list_sessions()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(sessions))
}
