//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`.
//! Houses, decisions and sync vocabulary use their canonical spellings.
//! Stats are compact JSON. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use hansard_core::{
  amendment::{Amendment, Decision},
  bill::{Bill, BillStage, BillStageSitting, House},
  member::Member,
  session::Session,
  synclog::{SyncLog, SyncStats, SyncStatus, SyncType},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Closed vocabularies ─────────────────────────────────────────────────────

pub fn encode_house(h: House) -> String { h.to_string() }

pub fn decode_house(s: &str) -> Result<House> {
  s.parse()
    .map_err(|_| Error::Corrupt(format!("unknown house: {s:?}")))
}

pub fn encode_decision(d: Decision) -> String { d.to_string() }

pub fn decode_decision(s: &str) -> Result<Decision> {
  s.parse()
    .map_err(|_| Error::Corrupt(format!("unknown decision: {s:?}")))
}

pub fn encode_sync_type(t: SyncType) -> String { t.to_string() }

pub fn decode_sync_type(s: &str) -> Result<SyncType> {
  s.parse()
    .map_err(|_| Error::Corrupt(format!("unknown sync type: {s:?}")))
}

pub fn encode_sync_status(s: SyncStatus) -> String { s.to_string() }

pub fn decode_sync_status(s: &str) -> Result<SyncStatus> {
  s.parse()
    .map_err(|_| Error::Corrupt(format!("unknown sync status: {s:?}")))
}

pub fn encode_stats(stats: &SyncStats) -> Result<String> {
  Ok(serde_json::to_string(stats)?)
}

pub fn decode_stats(s: &str) -> Result<SyncStats> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `sessions` row.
pub struct RawSession {
  pub session_id: i64,
  pub name:       String,
  pub start_date: String,
  pub end_date:   Option<String>,
  pub is_current: bool,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      session_id: self.session_id,
      name:       self.name,
      start_date: decode_date(&self.start_date)?,
      end_date:   self.end_date.as_deref().map(decode_date).transpose()?,
      is_current: self.is_current,
    })
  }
}

/// Raw strings read directly from a `bills` row.
pub struct RawBill {
  pub bill_id:               i64,
  pub short_title:           String,
  pub long_title:            String,
  pub session_id:            i64,
  pub introduced_session_id: i64,
  pub originating_house:     String,
  pub current_house:         String,
  pub is_withdrawn:          bool,
  pub is_defeated:           bool,
  pub is_act:                bool,
  pub last_update:           String,
}

impl RawBill {
  pub fn into_bill(self) -> Result<Bill> {
    Ok(Bill {
      bill_id:               self.bill_id,
      short_title:           self.short_title,
      long_title:            self.long_title,
      session_id:            self.session_id,
      introduced_session_id: self.introduced_session_id,
      originating_house:     decode_house(&self.originating_house)?,
      current_house:         decode_house(&self.current_house)?,
      is_withdrawn:          self.is_withdrawn,
      is_defeated:           self.is_defeated,
      is_act:                self.is_act,
      last_update:           decode_dt(&self.last_update)?,
    })
  }
}

pub struct RawStage {
  pub stage_id:      i64,
  pub bill_id:       i64,
  pub stage_type_id: i64,
  pub description:   String,
  pub house:         String,
  pub sort_order:    i64,
}

impl RawStage {
  pub fn into_stage(self) -> Result<BillStage> {
    Ok(BillStage {
      stage_id:      self.stage_id,
      bill_id:       self.bill_id,
      stage_type_id: self.stage_type_id,
      description:   self.description,
      house:         decode_house(&self.house)?,
      sort_order:    self.sort_order,
    })
  }
}

pub struct RawSitting {
  pub sitting_id: i64,
  pub stage_id:   i64,
  pub bill_id:    i64,
  pub date:       Option<String>,
}

impl RawSitting {
  pub fn into_sitting(self) -> Result<BillStageSitting> {
    Ok(BillStageSitting {
      sitting_id: self.sitting_id,
      stage_id:   self.stage_id,
      bill_id:    self.bill_id,
      date:       self.date.as_deref().map(decode_date).transpose()?,
    })
  }
}

pub struct RawAmendment {
  pub amendment_id:         i64,
  pub stage_id:             i64,
  pub number:               Option<String>,
  pub line:                 Option<String>,
  pub amendment_type:       Option<String>,
  pub decision:             String,
  pub decision_explanation: Option<String>,
  pub summary:              Option<String>,
  pub marshalled_list_text: Option<String>,
  pub d_num:                Option<String>,
}

impl RawAmendment {
  pub fn into_amendment(self) -> Result<Amendment> {
    Ok(Amendment {
      amendment_id:         self.amendment_id,
      stage_id:             self.stage_id,
      number:               self.number,
      line:                 self.line,
      amendment_type:       self.amendment_type,
      decision:             decode_decision(&self.decision)?,
      decision_explanation: self.decision_explanation,
      summary:              self.summary,
      marshalled_list_text: self.marshalled_list_text,
      d_num:                self.d_num,
    })
  }
}

pub struct RawMember {
  pub member_id:     i64,
  pub name:          String,
  pub display_name:  String,
  pub party:         String,
  pub party_colour:  Option<String>,
  pub house:         String,
  pub member_from:   String,
  pub thumbnail_url: Option<String>,
}

impl RawMember {
  pub fn into_member(self) -> Result<Member> {
    Ok(Member {
      member_id:     self.member_id,
      name:          self.name,
      display_name:  self.display_name,
      party:         self.party,
      party_colour:  self.party_colour,
      house:         decode_house(&self.house)?,
      member_from:   self.member_from,
      thumbnail_url: self.thumbnail_url,
    })
  }
}

pub struct RawSyncLog {
  pub sync_log_id:  String,
  pub sync_type:    String,
  pub status:       String,
  pub started_at:   String,
  pub completed_at: Option<String>,
  pub error:        Option<String>,
  pub stats:        Option<String>,
}

impl RawSyncLog {
  pub fn into_sync_log(self) -> Result<SyncLog> {
    Ok(SyncLog {
      sync_log_id:  decode_uuid(&self.sync_log_id)?,
      sync_type:    decode_sync_type(&self.sync_type)?,
      status:       decode_sync_status(&self.status)?,
      started_at:   decode_dt(&self.started_at)?,
      completed_at: self.completed_at.as_deref().map(decode_dt).transpose()?,
      error:        self.error,
      stats:        self.stats.as_deref().map(decode_stats).transpose()?,
    })
  }
}
