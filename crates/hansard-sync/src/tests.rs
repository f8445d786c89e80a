//! End-to-end tests for the orchestrator and reconciler: a scripted
//! upstream source feeding an in-memory SQLite store.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use hansard_core::{
  bill::House,
  store::BillStore,
  synclog::{SyncLog, SyncStatus, SyncType},
};
use hansard_store_sqlite::SqliteStore;
use hansard_upstream::Error as UpstreamError;
use hansard_upstream::gateway::{
  AmendmentRecord, BillSummary, HouseMembership, MemberProfile, PartyRef,
  SittingRecord, SponsorRecord, StageRecord, UpstreamSession,
};

use crate::{Error, Orchestrator, SyncService, source::UpstreamSource};

// ─── Scripted source ─────────────────────────────────────────────────────────

#[derive(Default, Clone)]
struct FakeSource {
  sessions:      Vec<UpstreamSession>,
  bills:         HashMap<i64, Vec<BillSummary>>,
  stages:        HashMap<i64, Vec<StageRecord>>,
  amendments:    HashMap<(i64, i64), Vec<AmendmentRecord>>,
  members:       HashMap<i64, MemberProfile>,
  /// Bills whose stage fetch answers 500.
  broken_bills:  Vec<i64>,
  /// Fail every bill listing, for fatal-path tests.
  fail_listings: bool,
}

impl UpstreamSource for FakeSource {
  fn sessions(&self) -> Vec<UpstreamSession> { self.sessions.clone() }

  async fn bills_in_session(
    &self,
    session_id: i64,
  ) -> Result<Vec<BillSummary>, UpstreamError> {
    if self.fail_listings {
      return Err(UpstreamError::Http {
        status: 500,
        url:    format!("fake://bills?session={session_id}"),
      });
    }
    Ok(self.bills.get(&session_id).cloned().unwrap_or_default())
  }

  async fn stages(&self, bill_id: i64) -> Result<Vec<StageRecord>, UpstreamError> {
    if self.broken_bills.contains(&bill_id) {
      return Err(UpstreamError::Http {
        status: 500,
        url:    format!("fake://bills/{bill_id}/stages"),
      });
    }
    Ok(self.stages.get(&bill_id).cloned().unwrap_or_default())
  }

  async fn amendments(
    &self,
    bill_id: i64,
    stage_id: i64,
  ) -> Result<Vec<AmendmentRecord>, UpstreamError> {
    Ok(
      self
        .amendments
        .get(&(bill_id, stage_id))
        .cloned()
        .unwrap_or_default(),
    )
  }

  async fn member(
    &self,
    member_id: i64,
  ) -> Result<Option<MemberProfile>, UpstreamError> {
    Ok(self.members.get(&member_id).cloned())
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn two_sessions() -> Vec<UpstreamSession> {
  vec![
    UpstreamSession {
      session_id: 39,
      name:       "2024-26",
      start_date: date(2024, 7, 17),
      end_date:   None,
    },
    UpstreamSession {
      session_id: 38,
      name:       "2023-24",
      start_date: date(2023, 11, 7),
      end_date:   Some(date(2024, 5, 30)),
    },
  ]
}

fn summary(bill_id: i64, introduced: i64, included: &[i64]) -> BillSummary {
  BillSummary {
    bill_id,
    short_title: format!("Bill {bill_id}"),
    long_title: Some(format!("A Bill to make provision number {bill_id}")),
    originating_house: "Commons".into(),
    current_house: "Commons".into(),
    bill_withdrawn: None,
    is_defeated: false,
    is_act: false,
    last_update: Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap(),
    introduced_session_id: introduced,
    included_session_ids: included.to_vec(),
  }
}

fn stage(id: i64, bill_id: i64, sittings: Vec<SittingRecord>) -> StageRecord {
  StageRecord {
    id,
    stage_id: 7,
    description: "Committee stage".into(),
    house: "Commons".into(),
    sort_order: 1,
    stage_sittings: sittings,
  }
}

fn sitting(id: i64, stage_id: i64, bill_id: i64) -> SittingRecord {
  SittingRecord {
    id,
    bill_stage_id: stage_id,
    bill_id,
    date: date(2024, 3, 12).and_hms_opt(0, 0, 0),
  }
}

fn sponsor(member_id: i64) -> SponsorRecord {
  SponsorRecord {
    member_id,
    name: Some(format!("Member {member_id}")),
    party: Some("Labour".into()),
    house: Some("Commons".into()),
    member_from: None,
    member_photo: None,
  }
}

fn amendment(id: i64, stage_id: i64, sponsors: Vec<SponsorRecord>) -> AmendmentRecord {
  AmendmentRecord {
    amendment_id: id,
    bill_stage_id: stage_id,
    amendment_number: Some(format!("{id}")),
    amendment_line: None,
    amendment_type: Some("Clause".into()),
    decision: Some("NotMoved".into()),
    decision_explanation: None,
    summary_text: vec!["Leave out clause 2.".into(), "Insert new clause.".into()],
    marshalled_list_text: None,
    d_num: None,
    sponsors,
  }
}

fn profile(member_id: i64, display: &str, house_code: i64) -> MemberProfile {
  MemberProfile {
    id:                      member_id,
    name_list_as:            Some(format!("{display} (listed)")),
    name_display_as:         display.into(),
    latest_party:            Some(PartyRef {
      name:              "Labour".into(),
      background_colour: Some("d50000".into()),
    }),
    latest_house_membership: Some(HouseMembership {
      membership_from: Some("Holborn and St Pancras".into()),
      house:           house_code,
    }),
    thumbnail_url:           Some(format!("fake://thumb/{member_id}")),
  }
}

/// One session-39 bill with a stage, a sitting, and an amendment carried
/// by two sponsors.
fn small_world() -> FakeSource {
  let mut source = FakeSource { sessions: two_sessions(), ..Default::default() };
  source.bills.insert(39, vec![summary(100, 39, &[39])]);
  source.bills.insert(38, vec![]);
  source
    .stages
    .insert(100, vec![stage(10, 100, vec![sitting(500, 10, 100)])]);
  source.amendments.insert(
    (100, 10),
    vec![amendment(1000, 10, vec![sponsor(10), sponsor(11)])],
  );
  source.members.insert(10, profile(10, "Keir Starmer", 1));
  source.members.insert(11, profile(11, "Baroness Smith", 2));
  source
}

async fn orchestrator(source: FakeSource) -> Orchestrator<FakeSource, SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  Orchestrator::new(source, store).with_bill_pacing(Duration::ZERO)
}

// ─── Full sync ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_sync_populates_every_table() {
  let orch = orchestrator(small_world()).await;
  let stats = orch.run(SyncType::Full).await.unwrap();

  assert_eq!(stats.sessions, 2);
  assert_eq!(stats.bills_processed, 1);
  assert_eq!(stats.bills_skipped, 0);
  assert_eq!(stats.stages, 1);
  assert_eq!(stats.sittings, 1);
  assert_eq!(stats.amendments, 1);
  assert_eq!(stats.members_enriched, 2);
  assert!(stats.errors.is_empty());

  let store = orch.store();

  // Current flag follows the open end date.
  let sessions = store.list_sessions().await.unwrap();
  assert!(sessions.iter().any(|s| s.session_id == 39 && s.is_current));
  assert!(sessions.iter().any(|s| s.session_id == 38 && !s.is_current));

  let bill = store.get_bill(100).await.unwrap().unwrap();
  assert_eq!(bill.session_id, 39);
  assert!(!bill.is_carry_over());

  let stages = store.stages_for_bill(100).await.unwrap();
  assert_eq!(stages.len(), 1);
  assert_eq!(stages[0].stage_type_id, 7);

  let sittings = store.sittings_for_stage(10).await.unwrap();
  assert_eq!(sittings.len(), 1);
  assert_eq!(sittings[0].date, Some(date(2024, 3, 12)));

  let amendments = store.amendments_for_stage(10).await.unwrap();
  assert_eq!(amendments.len(), 1);
  assert_eq!(
    amendments[0].amendment.summary.as_deref(),
    Some("Leave out clause 2.\nInsert new clause.")
  );
  let sponsors = &amendments[0].sponsors;
  assert_eq!(sponsors.len(), 2);
  assert!(sponsors[0].is_lead && sponsors[0].member_id == 10);
  assert!(!sponsors[1].is_lead && sponsors[1].member_id == 11);

  // Backfill overwrote the stubs, including the house-code mapping.
  let commons = store.get_member(10).await.unwrap().unwrap();
  assert_eq!(commons.display_name, "Keir Starmer");
  assert_eq!(commons.house, House::Commons);
  assert_eq!(commons.party_colour.as_deref(), Some("d50000"));
  let lords = store.get_member(11).await.unwrap().unwrap();
  assert_eq!(lords.house, House::Lords);

  // Terminal bookkeeping.
  assert!(store.running_sync().await.unwrap().is_none());
  let log = store.latest_sync_log().await.unwrap().unwrap();
  assert_eq!(log.status, SyncStatus::Completed);
  assert_eq!(log.stats.unwrap(), stats);
}

#[tokio::test]
async fn resync_against_unchanged_upstream_is_idempotent() {
  let orch = orchestrator(small_world()).await;

  let first = orch.run(SyncType::Full).await.unwrap();
  let counts_after_first = orch.store().dataset_counts().await.unwrap();

  let second = orch.run(SyncType::Full).await.unwrap();
  let counts_after_second = orch.store().dataset_counts().await.unwrap();

  assert_eq!(counts_after_first, counts_after_second);
  assert_eq!(first.bills_processed, second.bills_processed);

  let amendments = orch.store().amendments_for_stage(10).await.unwrap();
  assert_eq!(amendments[0].sponsors.len(), 2);
  assert_eq!(orch.store().stages_for_bill(100).await.unwrap().len(), 1);
  assert_eq!(orch.store().sittings_for_stage(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn carry_over_bill_takes_its_highest_included_session() {
  let mut source = FakeSource { sessions: two_sessions(), ..Default::default() };
  // Listed under session 38 but already carried into 39.
  source.bills.insert(38, vec![summary(100, 37, &[37, 38, 39])]);
  let orch = orchestrator(source).await;

  orch.run(SyncType::Full).await.unwrap();
  let bill = orch.store().get_bill(100).await.unwrap().unwrap();
  assert_eq!(bill.session_id, 39);
  assert!(bill.is_carry_over());

  // A later run that no longer sees the newest session id must not
  // regress the stored one.
  let mut older = FakeSource { sessions: two_sessions(), ..Default::default() };
  older.bills.insert(38, vec![summary(100, 37, &[37, 38])]);
  let orch2 =
    Orchestrator::new(older, orch.store().clone()).with_bill_pacing(Duration::ZERO);
  orch2.run(SyncType::Full).await.unwrap();
  assert_eq!(orch2.store().get_bill(100).await.unwrap().unwrap().session_id, 39);
}

#[tokio::test]
async fn bill_without_included_sessions_uses_the_iterated_one() {
  let mut source = FakeSource { sessions: two_sessions(), ..Default::default() };
  source.bills.insert(39, vec![summary(100, 39, &[])]);
  let orch = orchestrator(source).await;

  orch.run(SyncType::Full).await.unwrap();
  assert_eq!(orch.store().get_bill(100).await.unwrap().unwrap().session_id, 39);
}

// ─── Failure isolation ───────────────────────────────────────────────────────

#[tokio::test]
async fn one_broken_bill_does_not_abort_the_run() {
  let mut source = FakeSource { sessions: two_sessions(), ..Default::default() };
  source
    .bills
    .insert(39, vec![summary(1, 39, &[39]), summary(2, 39, &[39]), summary(3, 39, &[39])]);
  for id in [1, 2, 3] {
    source.stages.insert(id, vec![stage(id * 10, id, vec![])]);
  }
  source.broken_bills = vec![2];

  let orch = orchestrator(source).await;
  let stats = orch.run(SyncType::Full).await.unwrap();

  assert_eq!(stats.bills_processed, 2);
  assert_eq!(stats.errors.len(), 1);
  assert!(stats.errors[0].starts_with("bill 2:"));

  let store = orch.store();
  assert_eq!(store.stages_for_bill(1).await.unwrap().len(), 1);
  assert_eq!(store.stages_for_bill(3).await.unwrap().len(), 1);
  assert!(store.stages_for_bill(2).await.unwrap().is_empty());

  let log = store.latest_sync_log().await.unwrap().unwrap();
  assert_eq!(log.status, SyncStatus::Completed);
}

#[tokio::test]
async fn listing_failure_is_fatal_and_marks_the_log_failed() {
  let source = FakeSource {
    sessions: two_sessions(),
    fail_listings: true,
    ..Default::default()
  };
  let orch = orchestrator(source).await;

  let err = orch.run(SyncType::Incremental).await.unwrap_err();
  assert!(matches!(err, Error::Upstream(_)));

  let store = orch.store();
  assert!(store.running_sync().await.unwrap().is_none());
  let log = store.latest_sync_log().await.unwrap().unwrap();
  assert_eq!(log.status, SyncStatus::Failed);
  assert!(log.error.unwrap().contains("HTTP 500"));
  // Sessions were already upserted before the failure.
  assert_eq!(log.stats.unwrap().sessions, 2);
}

#[tokio::test]
async fn missing_member_profile_is_logged_and_skipped() {
  let mut source = small_world();
  source.members.remove(&11);
  let orch = orchestrator(source).await;

  let stats = orch.run(SyncType::Full).await.unwrap();
  assert_eq!(stats.members_enriched, 1);
  assert_eq!(stats.errors.len(), 1);
  assert!(stats.errors[0].starts_with("member 11:"));

  // The stub row from the sponsor payload survives.
  let stub = orch.store().get_member(11).await.unwrap().unwrap();
  assert_eq!(stub.name, "Member 11");
}

// ─── Incremental sync ────────────────────────────────────────────────────────

#[tokio::test]
async fn incremental_reconciles_only_active_bills() {
  let mut source = FakeSource { sessions: two_sessions(), ..Default::default() };

  let active = summary(1, 39, &[39]);
  let mut withdrawn = summary(2, 39, &[39]);
  withdrawn.bill_withdrawn = Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
  let mut defeated = summary(3, 39, &[39]);
  defeated.is_defeated = true;
  let mut act = summary(4, 39, &[39]);
  act.is_act = true;

  source.bills.insert(39, vec![active, withdrawn, defeated, act]);
  source
    .stages
    .insert(1, vec![stage(10, 1, vec![sitting(500, 10, 1)])]);

  let orch = orchestrator(source).await;
  let stats = orch.run(SyncType::Incremental).await.unwrap();

  assert_eq!(stats.bills_processed, 1);
  assert_eq!(stats.bills_skipped, 3);

  let store = orch.store();
  assert!(store.get_bill(1).await.unwrap().is_some());
  for skipped in [2, 3, 4] {
    assert!(store.get_bill(skipped).await.unwrap().is_none());
  }

  // Sittings are a full-sync-only concern.
  assert_eq!(stats.sittings, 0);
  assert!(store.sittings_for_stage(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn full_sync_includes_inactive_bills() {
  let mut source = FakeSource { sessions: two_sessions(), ..Default::default() };
  let mut act = summary(4, 38, &[38]);
  act.is_act = true;
  source.bills.insert(38, vec![act]);

  let orch = orchestrator(source).await;
  let stats = orch.run(SyncType::Full).await.unwrap();

  assert_eq!(stats.bills_processed, 1);
  assert_eq!(stats.bills_skipped, 0);
  let bill = orch.store().get_bill(4).await.unwrap().unwrap();
  assert!(bill.is_act);
}

// ─── Service ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn trigger_refuses_while_a_run_is_live() {
  let orch = orchestrator(small_world()).await;
  let store = orch.store().clone();
  let service = SyncService::new(orch);

  store
    .insert_sync_log(SyncLog::started(SyncType::Full))
    .await
    .unwrap();

  let err = service.trigger(SyncType::Incremental).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyRunning));

  let status = service.status().await.unwrap();
  assert!(status.running);
}

#[tokio::test]
async fn trigger_acknowledges_and_completes_in_the_background() {
  let orch = orchestrator(small_world()).await;
  let store = orch.store().clone();
  let service = SyncService::new(orch);

  let ack = service.trigger(SyncType::Full).await.unwrap();
  assert_eq!(ack.sync_type, SyncType::Full);

  // The fake source is instant; give the spawned run a moment to land.
  let mut done = false;
  for _ in 0..200 {
    if let Some(log) = store.latest_sync_log().await.unwrap()
      && log.status != SyncStatus::Running
    {
      assert_eq!(log.status, SyncStatus::Completed);
      done = true;
      break;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  assert!(done, "background sync never reached a terminal state");

  let status = service.status().await.unwrap();
  assert!(!status.running);
  assert!(status.last_full_completed_at.is_some());
  assert!(status.last_incremental_completed_at.is_none());
  assert_eq!(status.counts.bills, 1);
  assert_eq!(status.counts.members, 2);
}
