//! Handlers for the sync trigger and status endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/sync[?type=full\|incremental]` | Basic auth; 202 + ack, 409 while a run is live |
//! | `GET`  | `/api/sync/status` | Last completed runs, live flag, row counts |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use hansard_core::{store::BillStore, synclog::SyncType};
use hansard_sync::{Error as SyncError, SyncStatusReport, UpstreamSource};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct TriggerParams {
  /// Defaults to incremental when omitted.
  #[serde(rename = "type", default)]
  pub sync_type: SyncType,
}

/// `POST /api/sync[?type=full|incremental]`
///
/// Starts the run in the background and answers immediately; the caller
/// polls `/api/sync/status` for progress.
pub async fn trigger<U, S>(
  _auth: Authenticated,
  State(state): State<AppState<U, S>>,
  Query(params): Query<TriggerParams>,
) -> Result<impl IntoResponse, ApiError>
where
  U: UpstreamSource + Send + Sync + 'static,
  S: BillStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let ack = state.sync.trigger(params.sync_type).await.map_err(|e| match e {
    SyncError::AlreadyRunning => {
      ApiError::Conflict("a sync is already running".to_owned())
    }
    other => ApiError::Store(Box::new(other)),
  })?;

  Ok((StatusCode::ACCEPTED, Json(ack)))
}

/// `GET /api/sync/status`
pub async fn status<U, S>(
  State(state): State<AppState<U, S>>,
) -> Result<Json<SyncStatusReport>, ApiError>
where
  U: UpstreamSource + Send + Sync + 'static,
  S: BillStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let report = state
    .sync
    .status()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(report))
}
