//! The sync orchestrator: full and incremental variants.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::Utc;
use hansard_core::{
  session::Session,
  store::BillStore,
  synclog::{SyncLog, SyncStats, SyncStatus, SyncType},
};

use crate::{
  Error, Result,
  reconcile::{enriched_member, reconcile_bill, summary_is_active},
  source::UpstreamSource,
};

/// Pause between bills, on top of the fetch client's admission control.
/// Defence in depth at the orchestration layer.
const BILL_PACING: Duration = Duration::from_millis(100);

/// Drives one sync run end to end: session upserts, per-bill
/// reconciliation, member backfill, and the sync-log bookkeeping around
/// all of it.
///
/// The "no concurrent syncs" guard lives with the callers
/// ([`SyncService`](crate::service::SyncService) and the one-shot CLI
/// path), not here: `run` assumes the caller has already checked.
pub struct Orchestrator<U, S> {
  source:      U,
  store:       S,
  bill_pacing: Duration,
}

impl<U: UpstreamSource, S: BillStore> Orchestrator<U, S> {
  pub fn new(source: U, store: S) -> Self {
    Self { source, store, bill_pacing: BILL_PACING }
  }

  /// Override the inter-bill pacing delay. Tests run with zero.
  pub fn with_bill_pacing(mut self, pacing: Duration) -> Self {
    self.bill_pacing = pacing;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  /// Execute one sync run and record it in the sync log.
  ///
  /// The log row is written `running` up front and finished `completed`
  /// or `failed` whatever happens in between; a failure escaping the
  /// per-bill loop is returned to the caller after the terminal write.
  pub async fn run(&self, sync_type: SyncType) -> Result<SyncStats> {
    let mut log = SyncLog::started(sync_type);
    self
      .store
      .insert_sync_log(log.clone())
      .await
      .map_err(Error::store)?;

    tracing::info!(%sync_type, run = %log.sync_log_id, "sync started");

    let mut stats = SyncStats::default();
    let result = self.run_inner(sync_type, &mut stats).await;

    log.completed_at = Some(Utc::now());
    log.stats = Some(stats.clone());
    match result {
      Ok(()) => {
        log.status = SyncStatus::Completed;
        self.store.finish_sync_log(log).await.map_err(Error::store)?;
        tracing::info!(
          %sync_type,
          bills = stats.bills_processed,
          skipped = stats.bills_skipped,
          amendments = stats.amendments,
          errors = stats.errors.len(),
          "sync completed"
        );
        Ok(stats)
      }
      Err(e) => {
        log.status = SyncStatus::Failed;
        log.error = Some(e.to_string());
        self.store.finish_sync_log(log).await.map_err(Error::store)?;
        tracing::error!(%sync_type, error = %e, "sync failed");
        Err(e)
      }
    }
  }

  async fn run_inner(
    &self,
    sync_type: SyncType,
    stats: &mut SyncStats,
  ) -> Result<()> {
    let sessions = self.source.sessions();
    for upstream in &sessions {
      let session = Session {
        session_id: upstream.session_id,
        name:       upstream.name.to_owned(),
        start_date: upstream.start_date,
        end_date:   upstream.end_date,
        is_current: upstream.end_date.is_none(),
      };
      self
        .store
        .upsert_session(session)
        .await
        .map_err(Error::store)?;
      stats.sessions += 1;
    }

    let full = sync_type == SyncType::Full;
    let mut pending_members = BTreeSet::new();

    for upstream in &sessions {
      let bills = self.source.bills_in_session(upstream.session_id).await?;
      tracing::info!(
        session = upstream.session_id,
        bills = bills.len(),
        "reconciling session"
      );

      for summary in &bills {
        if !full && !summary_is_active(summary) {
          stats.bills_skipped += 1;
          continue;
        }

        match reconcile_bill(
          &self.source,
          &self.store,
          summary,
          upstream.session_id,
          full,
        )
        .await
        {
          Ok(outcome) => {
            stats.bills_processed += 1;
            stats.stages += outcome.stages;
            stats.sittings += outcome.sittings;
            stats.amendments += outcome.amendments;
            pending_members.extend(outcome.pending_members);
          }
          Err(e) => {
            tracing::warn!(bill = summary.bill_id, error = %e, "bill reconciliation failed");
            stats.errors.push(format!("bill {}: {e}", summary.bill_id));
          }
        }

        tokio::time::sleep(self.bill_pacing).await;
      }
    }

    self.backfill_members(pending_members, stats).await?;
    Ok(())
  }

  /// Second pass: replace every stub member row touched this run with its
  /// full profile. Individual lookup failures are recorded and skipped.
  async fn backfill_members(
    &self,
    pending: BTreeSet<i64>,
    stats: &mut SyncStats,
  ) -> Result<()> {
    for member_id in pending {
      match self.source.member(member_id).await {
        Ok(Some(profile)) => {
          self
            .store
            .upsert_member_full(enriched_member(&profile))
            .await
            .map_err(Error::store)?;
          stats.members_enriched += 1;
        }
        Ok(None) => {
          tracing::warn!(member = member_id, "member profile not found");
          stats.errors.push(format!("member {member_id}: profile not found"));
        }
        Err(e) => {
          tracing::warn!(member = member_id, error = %e, "member profile fetch failed");
          stats.errors.push(format!("member {member_id}: {e}"));
        }
      }
    }
    Ok(())
  }
}
