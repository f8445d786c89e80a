//! Typed accessors for the two public Parliament APIs.
//!
//! One method per upstream concept, all routed through the shared
//! [`FetchClient`]. Payload types mirror the live JSON shapes closely
//! enough to deserialise them, no further — the upstream owns its schema.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::{Error, Result, fetch::{FetchClient, Transport}};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Endpoint roots and paging for the upstream APIs.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
  pub bills_base_url:   String,
  pub members_base_url: String,
  /// `Take` parameter used when paging list endpoints.
  pub page_size:        usize,
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self {
      bills_base_url:   "https://bills-api.parliament.uk".to_owned(),
      members_base_url: "https://members-api.parliament.uk".to_owned(),
      page_size:        100,
    }
  }
}

// ─── Session table ───────────────────────────────────────────────────────────

/// A session known to this build. The bills API has no sessions endpoint.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamSession {
  pub session_id: i64,
  pub name:       &'static str,
  pub start_date: NaiveDate,
  /// `None` for the session still sitting.
  pub end_date:   Option<NaiveDate>,
}

const fn table_date(y: i32, m: u32, d: u32) -> NaiveDate {
  match NaiveDate::from_ymd_opt(y, m, d) {
    Some(date) => date,
    None => panic!("invalid date in session table"),
  }
}

/// Hand-maintained table of the sessions in scope, newest first.
///
/// This must be extended by hand when a new parliamentary session begins;
/// until then, newly-introduced bills will not be discovered. Known data
/// freshness liability.
pub const SESSION_TABLE: &[UpstreamSession] = &[
  UpstreamSession {
    session_id: 39,
    name:       "2024-26",
    start_date: table_date(2024, 7, 17),
    end_date:   None,
  },
  UpstreamSession {
    session_id: 38,
    name:       "2023-24",
    start_date: table_date(2023, 11, 7),
    end_date:   Some(table_date(2024, 5, 30)),
  },
  UpstreamSession {
    session_id: 37,
    name:       "2022-23",
    start_date: table_date(2022, 5, 10),
    end_date:   Some(table_date(2023, 10, 26)),
  },
];

// ─── Payload types ───────────────────────────────────────────────────────────

/// The bills API list envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
  #[serde(default = "Vec::new")]
  pub items:         Vec<T>,
  #[serde(default)]
  pub total_results: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
  pub bill_id:               i64,
  pub short_title:           String,
  #[serde(default)]
  pub long_title:            Option<String>,
  pub originating_house:     String,
  pub current_house:         String,
  /// Date the bill was withdrawn; present iff withdrawn.
  #[serde(default)]
  pub bill_withdrawn:        Option<DateTime<Utc>>,
  #[serde(default)]
  pub is_defeated:           bool,
  #[serde(default)]
  pub is_act:                bool,
  pub last_update:           DateTime<Utc>,
  pub introduced_session_id: i64,
  /// Every session the bill has appeared in; the maximum is its current
  /// session when the bill has carried over.
  #[serde(default)]
  pub included_session_ids:  Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
  /// Bill-stage id, globally unique across all bills.
  pub id:             i64,
  /// Stage-type id (second reading, committee, ...).
  pub stage_id:       i64,
  pub description:    String,
  pub house:          String,
  pub sort_order:     i64,
  #[serde(default)]
  pub stage_sittings: Vec<SittingRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SittingRecord {
  pub id:            i64,
  pub bill_stage_id: i64,
  pub bill_id:       i64,
  /// Midnight-stamped datetime upstream; only the date carries meaning.
  #[serde(default)]
  pub date:          Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendmentRecord {
  pub amendment_id:         i64,
  pub bill_stage_id:        i64,
  #[serde(default)]
  pub amendment_number:     Option<String>,
  #[serde(default)]
  pub amendment_line:       Option<String>,
  #[serde(default)]
  pub amendment_type:       Option<String>,
  #[serde(default)]
  pub decision:             Option<String>,
  #[serde(default)]
  pub decision_explanation: Option<String>,
  /// Delivered as separate lines; joined with `\n` on the way to storage.
  #[serde(default)]
  pub summary_text:         Vec<String>,
  #[serde(default)]
  pub marshalled_list_text: Option<String>,
  #[serde(default)]
  pub d_num:                Option<String>,
  /// In tabling order: the first sponsor is the lead.
  #[serde(default)]
  pub sponsors:             Vec<SponsorRecord>,
}

/// The partial member record embedded in an amendment's sponsor list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorRecord {
  pub member_id:    i64,
  #[serde(default)]
  pub name:         Option<String>,
  #[serde(default)]
  pub party:        Option<String>,
  #[serde(default)]
  pub house:        Option<String>,
  #[serde(default)]
  pub member_from:  Option<String>,
  #[serde(default)]
  pub member_photo: Option<String>,
}

/// The members API wraps single results in a `value` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEnvelope {
  pub value: MemberProfile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
  pub id:                      i64,
  #[serde(default)]
  pub name_list_as:            Option<String>,
  pub name_display_as:         String,
  #[serde(default)]
  pub latest_party:            Option<PartyRef>,
  #[serde(default)]
  pub latest_house_membership: Option<HouseMembership>,
  #[serde(default)]
  pub thumbnail_url:           Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRef {
  pub name:              String,
  #[serde(default)]
  pub background_colour: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseMembership {
  #[serde(default)]
  pub membership_from: Option<String>,
  /// 1 is the Commons; anything else the Lords.
  pub house:           i64,
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// Typed wrapper over the two upstream APIs.
#[derive(Clone)]
pub struct Gateway<T> {
  client: FetchClient<T>,
  config: UpstreamConfig,
}

impl<T: Transport> Gateway<T> {
  pub fn new(client: FetchClient<T>, config: UpstreamConfig) -> Self {
    Self { client, config }
  }

  pub fn client(&self) -> &FetchClient<T> { &self.client }

  /// The sessions in scope. Served from [`SESSION_TABLE`], not the network.
  pub fn sessions(&self) -> &'static [UpstreamSession] { SESSION_TABLE }

  /// All bills in a session, regardless of status. Pages through the list
  /// endpoint until exhausted.
  pub async fn bills_in_session(&self, session_id: i64) -> Result<Vec<BillSummary>> {
    self
      .paged(|skip, take| {
        format!(
          "{}/api/v1/Bills?Session={session_id}&Skip={skip}&Take={take}",
          self.config.bills_base_url
        )
      })
      .await
  }

  /// All stages of a bill, each with its embedded sittings.
  pub async fn stages(&self, bill_id: i64) -> Result<Vec<StageRecord>> {
    self
      .paged(|skip, take| {
        format!(
          "{}/api/v1/Bills/{bill_id}/Stages?Skip={skip}&Take={take}",
          self.config.bills_base_url
        )
      })
      .await
  }

  /// All amendments tabled at one stage of a bill.
  pub async fn amendments(
    &self,
    bill_id: i64,
    stage_id: i64,
  ) -> Result<Vec<AmendmentRecord>> {
    self
      .paged(|skip, take| {
        format!(
          "{}/api/v1/Bills/{bill_id}/Stages/{stage_id}/Amendments?Skip={skip}&Take={take}",
          self.config.bills_base_url
        )
      })
      .await
  }

  /// One member's full profile. A 404 is reported as `Ok(None)` — member
  /// lookups must not abort a sync run.
  pub async fn member(&self, member_id: i64) -> Result<Option<MemberProfile>> {
    let url = format!("{}/api/Members/{member_id}", self.config.members_base_url);
    match self.client.fetch_json::<MemberEnvelope>(&url).await {
      Ok(envelope) => Ok(Some(envelope.value)),
      Err(Error::Http { status: 404, .. }) => Ok(None),
      Err(e) => Err(e),
    }
  }

  /// First page of a name-substring member search.
  pub async fn search_members(&self, name: &str) -> Result<Vec<MemberProfile>> {
    let url = format!(
      "{}/api/Members/Search?Name={}&skip=0&take={}",
      self.config.members_base_url,
      percent_encode(name),
      self.config.page_size,
    );
    let page: Paged<MemberEnvelope> = self.client.fetch_json(&url).await?;
    Ok(page.items.into_iter().map(|e| e.value).collect())
  }

  /// Page through `Skip`/`Take` until a short page or the reported total.
  async fn paged<D: serde::de::DeserializeOwned>(
    &self,
    url_for: impl Fn(usize, usize) -> String,
  ) -> Result<Vec<D>> {
    let take = self.config.page_size;
    let mut items = Vec::new();
    let mut skip = 0usize;

    loop {
      let page: Paged<D> = self.client.fetch_json(&url_for(skip, take)).await?;
      let fetched = page.items.len();
      items.extend(page.items);
      skip += fetched;

      let total_reached =
        page.total_results > 0 && skip as u64 >= page.total_results;
      if fetched < take || total_reached {
        return Ok(items);
      }
    }
  }
}

/// Minimal query-string escaping for the characters member names contain.
fn percent_encode(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      ' ' => out.push_str("%20"),
      '&' => out.push_str("%26"),
      '+' => out.push_str("%2B"),
      '#' => out.push_str("%23"),
      _ => out.push(c),
    }
  }
  out
}
