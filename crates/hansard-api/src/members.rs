//! Handler for `GET /api/members/:id`.

use axum::{
  Json,
  extract::{Path, State},
};
use hansard_core::{member::Member, store::BillStore};
use hansard_sync::UpstreamSource;

use crate::{AppState, error::ApiError};

/// `GET /api/members/:id` — 404 when the member has never been seen.
pub async fn get_one<U, S>(
  State(state): State<AppState<U, S>>,
  Path(id): Path<i64>,
) -> Result<Json<Member>, ApiError>
where
  U: UpstreamSource + Send + Sync + 'static,
  S: BillStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let member = state
    .store
    .get_member(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("member {id} not found")))?;
  Ok(Json(member))
}
