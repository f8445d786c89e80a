//! Parliamentary sessions — the sitting periods bills belong to.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A parliamentary session. Upserted at the start of every sync run and
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub session_id: i64,
  /// Display name, e.g. `"2023-24"`.
  pub name:       String,
  pub start_date: NaiveDate,
  /// `None` while the session is ongoing.
  pub end_date:   Option<NaiveDate>,
  pub is_current: bool,
}
