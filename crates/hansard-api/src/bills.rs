//! Handlers for `/api/bills` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/bills` | Filters: `session`, `house`, `active`, `q`; paging: `limit`, `offset` |
//! | `GET`  | `/api/bills/:id` | Bill plus its stages and sittings |
//! | `GET`  | `/api/bills/:id/stages` | Stages only |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use hansard_core::{
  bill::{Bill, BillStage, BillStageSitting, House},
  store::{BillQuery, BillStore},
};
use hansard_sync::UpstreamSource;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub session: Option<i64>,
  pub house:   Option<House>,
  /// `true` — only bills still in progress; `false` — only concluded ones.
  pub active:  Option<bool>,
  /// Substring filter over short and long titles.
  pub q:       Option<String>,
  pub limit:   Option<usize>,
  pub offset:  Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct BillListResponse {
  pub items: Vec<Bill>,
  pub total: u64,
}

/// `GET /api/bills[?session=..][&house=..][&active=..][&q=..][&limit=..][&offset=..]`
pub async fn list<U, S>(
  State(state): State<AppState<U, S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<BillListResponse>, ApiError>
where
  U: UpstreamSource + Send + Sync + 'static,
  S: BillStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = BillQuery {
    session: params.session,
    house:   params.house,
    active:  params.active,
    text:    params.q,
    limit:   params.limit,
    offset:  params.offset,
  };

  let page = state
    .store
    .list_bills(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(BillListResponse { items: page.items, total: page.total }))
}

// ─── Detail ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StageWithSittings {
  pub stage:    BillStage,
  pub sittings: Vec<BillStageSitting>,
}

#[derive(Debug, Serialize)]
pub struct BillDetail {
  pub bill:   Bill,
  pub stages: Vec<StageWithSittings>,
}

/// `GET /api/bills/:id`
pub async fn get_one<U, S>(
  State(state): State<AppState<U, S>>,
  Path(id): Path<i64>,
) -> Result<Json<BillDetail>, ApiError>
where
  U: UpstreamSource + Send + Sync + 'static,
  S: BillStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let bill = state
    .store
    .get_bill(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("bill {id} not found")))?;

  let bare_stages = state
    .store
    .stages_for_bill(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let mut stages = Vec::with_capacity(bare_stages.len());
  for stage in bare_stages {
    let sittings = state
      .store
      .sittings_for_stage(stage.stage_id)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    stages.push(StageWithSittings { stage, sittings });
  }

  Ok(Json(BillDetail { bill, stages }))
}

/// `GET /api/bills/:id/stages`
pub async fn stages<U, S>(
  State(state): State<AppState<U, S>>,
  Path(id): Path<i64>,
) -> Result<Json<Vec<BillStage>>, ApiError>
where
  U: UpstreamSource + Send + Sync + 'static,
  S: BillStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let stages = state
    .store
    .stages_for_bill(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(stages))
}
