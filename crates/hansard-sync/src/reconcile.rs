//! The per-bill reconciliation algorithm.
//!
//! One call to [`reconcile_bill`] turns one upstream bill record into a
//! consistent slice of the store: the bill row, its stages (and, on full
//! sync, their sittings), every amendment with a freshly-replaced sponsor
//! set, and a minimal member row per sponsor. Failures anywhere inside a
//! bill are the caller's to catch — one bad bill must not abort the run.

use hansard_core::{
  amendment::{Amendment, AmendmentSponsor, Decision},
  bill::{Bill, BillStage, BillStageSitting, House},
  member::Member,
  store::BillStore,
};
use hansard_upstream::gateway::{
  AmendmentRecord, BillSummary, MemberProfile, SittingRecord, SponsorRecord,
  StageRecord,
};

use crate::{Error, Result, source::UpstreamSource};

/// What one bill contributed to the run: counters for the stats block and
/// the member ids that now need a profile backfill.
#[derive(Debug, Default)]
pub struct BillOutcome {
  pub stages:          u64,
  pub sittings:        u64,
  pub amendments:      u64,
  pub pending_members: Vec<i64>,
}

/// Reconcile one upstream bill into the store.
///
/// `iterated_session` is the session whose bill list produced `summary`;
/// it is the fallback when the record carries no included-session ids.
/// `include_sittings` is true only for the full-sync variant.
pub async fn reconcile_bill<U: UpstreamSource, S: BillStore>(
  source: &U,
  store: &S,
  summary: &BillSummary,
  iterated_session: i64,
  include_sittings: bool,
) -> Result<BillOutcome> {
  let session_id = authoritative_session(summary, iterated_session);

  store
    .upsert_bill(map_bill(summary, session_id)?)
    .await
    .map_err(Error::store)?;

  let mut outcome = BillOutcome::default();

  let stages = source.stages(summary.bill_id).await?;
  for record in &stages {
    store
      .upsert_stage(map_stage(record, summary.bill_id)?)
      .await
      .map_err(Error::store)?;
    outcome.stages += 1;

    if include_sittings {
      for sitting in &record.stage_sittings {
        store
          .upsert_sitting(map_sitting(sitting))
          .await
          .map_err(Error::store)?;
        outcome.sittings += 1;
      }
    }
  }

  for record in &stages {
    let amendments = source.amendments(summary.bill_id, record.id).await?;
    for amendment in amendments {
      reconcile_amendment(store, &amendment, &mut outcome).await?;
    }
  }

  Ok(outcome)
}

async fn reconcile_amendment<S: BillStore>(
  store: &S,
  record: &AmendmentRecord,
  outcome: &mut BillOutcome,
) -> Result<()> {
  store
    .upsert_amendment(map_amendment(record)?)
    .await
    .map_err(Error::store)?;
  outcome.amendments += 1;

  // Member rows must exist before the sponsor join rows that reference
  // them.
  let mut sponsors = Vec::with_capacity(record.sponsors.len());
  for (position, sponsor) in record.sponsors.iter().enumerate() {
    store
      .upsert_member_stub(stub_member(sponsor))
      .await
      .map_err(Error::store)?;
    outcome.pending_members.push(sponsor.member_id);

    sponsors.push(AmendmentSponsor {
      amendment_id: record.amendment_id,
      member_id:    sponsor.member_id,
      is_lead:      position == 0,
      sort_order:   position as i64,
    });
  }

  store
    .replace_sponsors(record.amendment_id, sponsors)
    .await
    .map_err(Error::store)?;

  Ok(())
}

// ─── Session resolution ──────────────────────────────────────────────────────

/// The latest session a bill belongs to: the maximum of its included
/// session ids when any are present, else the session being iterated.
/// This is what moves a carry-over bill forward.
pub fn authoritative_session(summary: &BillSummary, iterated_session: i64) -> i64 {
  summary
    .included_session_ids
    .iter()
    .copied()
    .max()
    .unwrap_or(iterated_session)
}

/// Active bills are the incremental-sync scope: not withdrawn, not
/// defeated, not yet an act.
pub fn summary_is_active(summary: &BillSummary) -> bool {
  summary.bill_withdrawn.is_none() && !summary.is_defeated && !summary.is_act
}

// ─── Upstream → domain mapping ───────────────────────────────────────────────

fn parse_house(s: &str) -> Result<House> {
  s.parse().map_err(|_| Error::UnknownHouse(s.to_owned()))
}

fn map_bill(summary: &BillSummary, session_id: i64) -> Result<Bill> {
  Ok(Bill {
    bill_id:               summary.bill_id,
    short_title:           summary.short_title.clone(),
    long_title:            summary.long_title.clone().unwrap_or_default(),
    session_id,
    introduced_session_id: summary.introduced_session_id,
    originating_house:     parse_house(&summary.originating_house)?,
    current_house:         parse_house(&summary.current_house)?,
    is_withdrawn:          summary.bill_withdrawn.is_some(),
    is_defeated:           summary.is_defeated,
    is_act:                summary.is_act,
    last_update:           summary.last_update,
  })
}

fn map_stage(record: &StageRecord, bill_id: i64) -> Result<BillStage> {
  Ok(BillStage {
    stage_id: record.id,
    bill_id,
    stage_type_id: record.stage_id,
    description: record.description.clone(),
    house: parse_house(&record.house)?,
    sort_order: record.sort_order,
  })
}

fn map_sitting(record: &SittingRecord) -> BillStageSitting {
  BillStageSitting {
    sitting_id: record.id,
    stage_id:   record.bill_stage_id,
    bill_id:    record.bill_id,
    date:       record.date.map(|dt| dt.date()),
  }
}

fn map_amendment(record: &AmendmentRecord) -> Result<Amendment> {
  let decision = match record.decision.as_deref() {
    None | Some("") => Decision::default(),
    Some(s) => s
      .parse()
      .map_err(|_| Error::UnknownDecision(s.to_owned()))?,
  };

  let summary = if record.summary_text.is_empty() {
    None
  } else {
    Some(record.summary_text.join("\n"))
  };

  Ok(Amendment {
    amendment_id: record.amendment_id,
    stage_id: record.bill_stage_id,
    number: record.amendment_number.clone(),
    line: record.amendment_line.clone(),
    amendment_type: record.amendment_type.clone(),
    decision,
    decision_explanation: record.decision_explanation.clone(),
    summary,
    marshalled_list_text: record.marshalled_list_text.clone(),
    d_num: record.d_num.clone(),
  })
}

/// A best-effort member row from a sponsor payload. Unknown fields default
/// rather than fail — the backfill pass supplies the real values.
fn stub_member(sponsor: &SponsorRecord) -> Member {
  let name = sponsor.name.clone().unwrap_or_else(|| "Unknown".to_owned());
  Member {
    member_id:     sponsor.member_id,
    display_name:  name.clone(),
    name,
    party:         sponsor.party.clone().unwrap_or_else(|| "Unknown".to_owned()),
    party_colour:  None,
    house:         sponsor
      .house
      .as_deref()
      .and_then(|h| h.parse().ok())
      .unwrap_or(House::Commons),
    member_from:   sponsor
      .member_from
      .clone()
      .unwrap_or_else(|| "Unknown".to_owned()),
    thumbnail_url: sponsor.member_photo.clone(),
  }
}

/// The authoritative member row from a full members-API profile.
pub fn enriched_member(profile: &MemberProfile) -> Member {
  let party = profile.latest_party.as_ref();
  let membership = profile.latest_house_membership.as_ref();

  Member {
    member_id:     profile.id,
    name:          profile
      .name_list_as
      .clone()
      .unwrap_or_else(|| profile.name_display_as.clone()),
    display_name:  profile.name_display_as.clone(),
    party:         party
      .map(|p| p.name.clone())
      .unwrap_or_else(|| "Unknown".to_owned()),
    party_colour:  party.and_then(|p| p.background_colour.clone()),
    house:         House::from_code(membership.map(|m| m.house).unwrap_or(2)),
    member_from:   membership
      .and_then(|m| m.membership_from.clone())
      .unwrap_or_else(|| "Unknown".to_owned()),
    thumbnail_url: profile.thumbnail_url.clone(),
  }
}
