//! Members of either house.

use serde::{Deserialize, Serialize};

use crate::bill::House;

/// A member who has sponsored at least one amendment.
///
/// Rows are first created minimally from amendment-sponsor payloads, where
/// name and party may be partial, then overwritten by the full-profile
/// backfill pass at the end of a sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
  pub member_id:     i64,
  /// Canonical listing name.
  pub name:          String,
  pub display_name:  String,
  pub party:         String,
  /// Hex colour supplied by the members API; absent until enrichment.
  pub party_colour:  Option<String>,
  pub house:         House,
  /// Constituency (Commons) or region (Lords).
  pub member_from:   String,
  pub thumbnail_url: Option<String>,
}
