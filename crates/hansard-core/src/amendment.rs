//! Amendments and their sponsor sets.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ─── Decision ────────────────────────────────────────────────────────────────

/// The recorded outcome of an amendment. Closed vocabulary; the canonical
/// spellings round-trip unchanged from the upstream API.
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
pub enum Decision {
  Agreed,
  AgreedOnDivision,
  Disagreed,
  NegativedOnDivision,
  #[default]
  NoDecision,
  NotCalled,
  NotMoved,
  NotSelected,
  StoodPart,
  Withdrawn,
  WithdrawnBeforeDebate,
}

// ─── Amendment ───────────────────────────────────────────────────────────────

/// A proposed change to a bill, tabled at a specific stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amendment {
  pub amendment_id:         i64,
  pub stage_id:             i64,
  /// Marshalled amendment number, e.g. `"NC1"` or `"42"`.
  pub number:               Option<String>,
  /// Line reference within the bill text.
  pub line:                 Option<String>,
  pub amendment_type:       Option<String>,
  pub decision:             Decision,
  pub decision_explanation: Option<String>,
  /// Upstream delivers the summary as multiple lines; stored newline-joined.
  pub summary:              Option<String>,
  pub marshalled_list_text: Option<String>,
  /// Display identifier used on marshalled lists.
  pub d_num:                Option<String>,
}

// ─── Sponsors ────────────────────────────────────────────────────────────────

/// A member backing an amendment. The sponsor set for an amendment is fully
/// replaced on every re-sync — upstream exposes no sponsor-level deltas —
/// with payload order preserved as `sort_order` and position 0 as the lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendmentSponsor {
  pub amendment_id: i64,
  pub member_id:    i64,
  pub is_lead:      bool,
  pub sort_order:   i64,
}

/// An amendment together with its ordered sponsor rows — the shape the
/// browse API serves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendmentWithSponsors {
  pub amendment: Amendment,
  pub sponsors:  Vec<AmendmentSponsor>,
}
