//! Bills and their procedural stages.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ─── House ───────────────────────────────────────────────────────────────────

/// The chamber a bill or stage belongs to.
///
/// The members API encodes houses numerically; see [`House::from_code`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
pub enum House {
  Commons,
  Lords,
}

impl House {
  /// Map the members API house code: `1` is the Commons, anything else the
  /// Lords.
  pub fn from_code(code: i64) -> Self {
    if code == 1 { Self::Commons } else { Self::Lords }
  }
}

// ─── Bill ────────────────────────────────────────────────────────────────────

/// A piece of legislation tracked across one or more sessions.
///
/// `session_id` is monotonically advanced: once a bill has been observed in
/// session N it is never written back to an earlier session, so a carry-over
/// bill always points at its latest active session. Carry-over itself is
/// derived (`introduced_session_id != session_id`), never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
  pub bill_id:               i64,
  pub short_title:           String,
  pub long_title:            String,
  /// The most recent session the bill has been observed in.
  pub session_id:            i64,
  /// The session the bill was originally introduced in.
  pub introduced_session_id: i64,
  pub originating_house:     House,
  pub current_house:         House,
  pub is_withdrawn:          bool,
  pub is_defeated:           bool,
  pub is_act:                bool,
  pub last_update:           DateTime<Utc>,
}

impl Bill {
  /// A bill is active while it has not been withdrawn, defeated, or enacted.
  /// Only active bills are reconciled by an incremental sync.
  pub fn is_active(&self) -> bool {
    !self.is_withdrawn && !self.is_defeated && !self.is_act
  }

  pub fn is_carry_over(&self) -> bool {
    self.introduced_session_id != self.session_id
  }
}

// ─── Stages ──────────────────────────────────────────────────────────────────

/// A procedural step a bill passes through in a given house.
///
/// Stage ids are globally unique upstream, not scoped to the bill.
/// `sort_order` defines display ordering only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillStage {
  pub stage_id:      i64,
  pub bill_id:       i64,
  pub stage_type_id: i64,
  pub description:   String,
  pub house:         House,
  pub sort_order:    i64,
}

/// A calendar date on which a stage was (or will be) debated. Some sittings
/// are announced before they are scheduled, so the date is nullable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillStageSitting {
  pub sitting_id: i64,
  pub stage_id:   i64,
  pub bill_id:    i64,
  pub date:       Option<NaiveDate>,
}
