//! Sync-run bookkeeping: the persisted record of every sync attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

// ─── Vocabulary ──────────────────────────────────────────────────────────────

/// Which sync variant a run executed.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncType {
  Full,
  #[default]
  Incremental,
}

/// Lifecycle of a sync run: `Running` until the terminal write lands.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncStatus {
  Running,
  Completed,
  Failed,
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Aggregate counters accumulated over one sync run, serialised as JSON
/// into the sync-log row when the run reaches a terminal state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
  pub sessions:         u64,
  pub bills_processed:  u64,
  /// Bills excluded by the incremental activity filter.
  pub bills_skipped:    u64,
  pub stages:           u64,
  pub sittings:         u64,
  pub amendments:       u64,
  pub members_enriched: u64,
  /// Per-bill and per-member failures recovered during the run.
  pub errors:           Vec<String>,
}

// ─── SyncLog ─────────────────────────────────────────────────────────────────

/// One row per sync attempt. At most one row may be `Running` at a time,
/// enforced by the orchestration layer checking before it starts — not by a
/// database constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLog {
  pub sync_log_id:  Uuid,
  pub sync_type:    SyncType,
  pub status:       SyncStatus,
  pub started_at:   DateTime<Utc>,
  /// `None` until the run reaches a terminal state.
  pub completed_at: Option<DateTime<Utc>>,
  pub error:        Option<String>,
  pub stats:        Option<SyncStats>,
}

impl SyncLog {
  /// A fresh `Running` row for a run starting now.
  pub fn started(sync_type: SyncType) -> Self {
    Self {
      sync_log_id:  Uuid::new_v4(),
      sync_type,
      status:       SyncStatus::Running,
      started_at:   Utc::now(),
      completed_at: None,
      error:        None,
      stats:        None,
    }
  }
}
