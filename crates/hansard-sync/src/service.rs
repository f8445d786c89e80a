//! Fire-and-forget sync triggering and status reporting.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hansard_core::{
  store::{BillStore, DatasetCounts},
  synclog::SyncType,
};
use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{Error, Result, run::Orchestrator, source::UpstreamSource};

/// Returned immediately by [`SyncService::trigger`]; the run itself
/// proceeds in the background.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SyncAck {
  pub sync_type:  SyncType,
  pub started_at: DateTime<Utc>,
}

/// What the status endpoint reports.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatusReport {
  pub last_full_completed_at:        Option<DateTime<Utc>>,
  pub last_incremental_completed_at: Option<DateTime<Utc>>,
  pub running:                       bool,
  pub counts:                        DatasetCounts,
}

/// Owns the orchestrator and hands sync runs to the tokio runtime.
///
/// The spawned run's [`JoinHandle`] is captured so a cancellation path can
/// be added later; nothing awaits it today.
pub struct SyncService<U, S> {
  orchestrator: Arc<Orchestrator<U, S>>,
  handle:       Mutex<Option<JoinHandle<()>>>,
}

impl<U, S> SyncService<U, S>
where
  U: UpstreamSource + Send + Sync + 'static,
  S: BillStore + 'static,
{
  pub fn new(orchestrator: Orchestrator<U, S>) -> Self {
    Self {
      orchestrator: Arc::new(orchestrator),
      handle:       Mutex::new(None),
    }
  }

  /// Start a sync run in the background and acknowledge immediately.
  ///
  /// The guard below and the log insert inside the run are not atomic:
  /// two triggers landing in that window can both pass the check. Known
  /// limitation of the current single-operator design.
  pub async fn trigger(&self, sync_type: SyncType) -> Result<SyncAck> {
    if self
      .orchestrator
      .store()
      .running_sync()
      .await
      .map_err(Error::store)?
      .is_some()
    {
      return Err(Error::AlreadyRunning);
    }

    let started_at = Utc::now();
    let orchestrator = Arc::clone(&self.orchestrator);
    let handle = tokio::spawn(async move {
      // Terminal state is recorded in the sync log; nothing to do with
      // the error here beyond what `run` already traced.
      let _ = orchestrator.run(sync_type).await;
    });
    *self.handle.lock().await = Some(handle);

    Ok(SyncAck { sync_type, started_at })
  }

  pub async fn status(&self) -> Result<SyncStatusReport> {
    let store = self.orchestrator.store();

    let last_full = store
      .latest_completed_sync(SyncType::Full)
      .await
      .map_err(Error::store)?;
    let last_incremental = store
      .latest_completed_sync(SyncType::Incremental)
      .await
      .map_err(Error::store)?;
    let running = store.running_sync().await.map_err(Error::store)?;
    let counts = store.dataset_counts().await.map_err(Error::store)?;

    Ok(SyncStatusReport {
      last_full_completed_at:        last_full.and_then(|l| l.completed_at),
      last_incremental_completed_at: last_incremental.and_then(|l| l.completed_at),
      running:                       running.is_some(),
      counts,
    })
  }
}
