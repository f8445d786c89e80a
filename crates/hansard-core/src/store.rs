//! The `BillStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `hansard-store-sqlite`). The sync pipeline is the only writer; the API
//! layer reads concurrently and may observe a partially-synced dataset.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  amendment::{Amendment, AmendmentSponsor, AmendmentWithSponsors},
  bill::{Bill, BillStage, BillStageSitting, House},
  member::Member,
  session::Session,
  synclog::{SyncLog, SyncType},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`BillStore::list_bills`].
#[derive(Debug, Clone, Default)]
pub struct BillQuery {
  /// Restrict to bills currently tracked in this session.
  pub session: Option<i64>,
  pub house:   Option<House>,
  /// `Some(true)` — only bills not withdrawn/defeated/enacted;
  /// `Some(false)` — only the rest.
  pub active:  Option<bool>,
  /// Case-insensitive substring filter over short and long titles.
  pub text:    Option<String>,
  pub limit:   Option<usize>,
  pub offset:  Option<usize>,
}

/// One page of bills plus the unpaginated match count.
#[derive(Debug, Clone)]
pub struct BillPage {
  pub items: Vec<Bill>,
  pub total: u64,
}

/// Aggregate row counts reported by the sync status endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCounts {
  pub bills:      u64,
  pub amendments: u64,
  pub members:    u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the Hansard relational store.
///
/// All writes are idempotent upserts keyed on upstream primary keys, so
/// re-running a sync against an unchanged upstream reproduces the same
/// rows. Sponsor sets are the one exception: they are replaced wholesale
/// per amendment.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait BillStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn upsert_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_sessions(
    &self,
  ) -> impl Future<Output = Result<Vec<Session>, Self::Error>> + Send + '_;

  // ── Bills ─────────────────────────────────────────────────────────────

  /// Insert or update a bill.
  ///
  /// On update every column is overwritten except `session_id`, which only
  /// moves forward: the stored value survives unless the incoming one is
  /// numerically greater.
  fn upsert_bill(
    &self,
    bill: Bill,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_bill(
    &self,
    bill_id: i64,
  ) -> impl Future<Output = Result<Option<Bill>, Self::Error>> + Send + '_;

  fn list_bills<'a>(
    &'a self,
    query: &'a BillQuery,
  ) -> impl Future<Output = Result<BillPage, Self::Error>> + Send + 'a;

  // ── Stages and sittings ───────────────────────────────────────────────

  fn upsert_stage(
    &self,
    stage: BillStage,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn stages_for_bill(
    &self,
    bill_id: i64,
  ) -> impl Future<Output = Result<Vec<BillStage>, Self::Error>> + Send + '_;

  fn upsert_sitting(
    &self,
    sitting: BillStageSitting,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn sittings_for_stage(
    &self,
    stage_id: i64,
  ) -> impl Future<Output = Result<Vec<BillStageSitting>, Self::Error>> + Send + '_;

  // ── Amendments ────────────────────────────────────────────────────────

  fn upsert_amendment(
    &self,
    amendment: Amendment,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete all sponsor rows for `amendment_id` and insert `sponsors` in
  /// their given order, atomically. Upstream exposes no sponsor-level
  /// deltas, so the set is never diffed.
  fn replace_sponsors(
    &self,
    amendment_id: i64,
    sponsors: Vec<AmendmentSponsor>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn amendments_for_stage(
    &self,
    stage_id: i64,
  ) -> impl Future<Output = Result<Vec<AmendmentWithSponsors>, Self::Error>> + Send + '_;

  // ── Members ───────────────────────────────────────────────────────────

  /// Best-effort upsert from a sponsor payload. Creates the row if absent;
  /// on conflict refreshes only the fields a sponsor payload carries,
  /// leaving enrichment-only columns (display name, party colour,
  /// thumbnail) untouched.
  fn upsert_member_stub(
    &self,
    member: Member,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Overwrite every column from a full members-API profile.
  fn upsert_member_full(
    &self,
    member: Member,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_member(
    &self,
    member_id: i64,
  ) -> impl Future<Output = Result<Option<Member>, Self::Error>> + Send + '_;

  // ── Sync log ──────────────────────────────────────────────────────────

  fn insert_sync_log(
    &self,
    log: SyncLog,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Write the terminal state (status, completion time, error, stats) of
  /// an existing sync-log row.
  fn finish_sync_log(
    &self,
    log: SyncLog,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_sync_log(
    &self,
    sync_log_id: Uuid,
  ) -> impl Future<Output = Result<Option<SyncLog>, Self::Error>> + Send + '_;

  /// The currently-running sync, if any.
  fn running_sync(
    &self,
  ) -> impl Future<Output = Result<Option<SyncLog>, Self::Error>> + Send + '_;

  /// The most recently completed run of the given type.
  fn latest_completed_sync(
    &self,
    sync_type: SyncType,
  ) -> impl Future<Output = Result<Option<SyncLog>, Self::Error>> + Send + '_;

  /// The most recently started attempt, whatever its outcome. This is what
  /// distinguishes a failed run from one that never happened.
  fn latest_sync_log(
    &self,
  ) -> impl Future<Output = Result<Option<SyncLog>, Self::Error>> + Send + '_;

  // ── Aggregates ────────────────────────────────────────────────────────

  fn dataset_counts(
    &self,
  ) -> impl Future<Output = Result<DatasetCounts, Self::Error>> + Send + '_;
}
