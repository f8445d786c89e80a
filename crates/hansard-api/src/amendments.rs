//! Handler for `GET /api/stages/:id/amendments`.

use axum::{
  Json,
  extract::{Path, State},
};
use hansard_core::{amendment::AmendmentWithSponsors, store::BillStore};
use hansard_sync::UpstreamSource;

use crate::{AppState, error::ApiError};

/// `GET /api/stages/:id/amendments` — each amendment with its ordered
/// sponsor rows.
pub async fn for_stage<U, S>(
  State(state): State<AppState<U, S>>,
  Path(stage_id): Path<i64>,
) -> Result<Json<Vec<AmendmentWithSponsors>>, ApiError>
where
  U: UpstreamSource + Send + Sync + 'static,
  S: BillStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let amendments = state
    .store
    .amendments_for_stage(stage_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(amendments))
}
