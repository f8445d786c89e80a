//! Tests for the fetch client and gateway against a scripted transport.
//!
//! All timing-sensitive tests run with the tokio clock paused, so the
//! backoff and rate-limit schedules are asserted deterministically.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::{
  Error, FetchClient, Gateway, Transport, TransportResponse, UpstreamConfig,
  fetch::TransportError,
  limiter::RateLimiter,
};

// ─── Scripted transport ──────────────────────────────────────────────────────

/// Replays a queue of canned outcomes and records every dispatch with its
/// timestamp. Once the script is exhausted it answers `200 {}`.
struct FakeTransport {
  script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
  log:    Mutex<Vec<(String, Instant)>>,
}

impl FakeTransport {
  fn scripted(
    script: Vec<Result<TransportResponse, TransportError>>,
  ) -> Arc<Self> {
    Arc::new(Self {
      script: Mutex::new(script.into()),
      log:    Mutex::new(Vec::new()),
    })
  }

  fn dispatch_times(&self) -> Vec<Instant> {
    self.log.lock().unwrap().iter().map(|(_, t)| *t).collect()
  }

  fn dispatched_urls(&self) -> Vec<String> {
    self.log.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
  }
}

impl Transport for Arc<FakeTransport> {
  async fn get(&self, url: &str) -> Result<TransportResponse, TransportError> {
    self
      .log
      .lock()
      .unwrap()
      .push((url.to_owned(), Instant::now()));
    self
      .script
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or(Ok(TransportResponse { status: 200, body: "{}".into() }))
  }
}

fn ok(body: &str) -> Result<TransportResponse, TransportError> {
  Ok(TransportResponse { status: 200, body: body.into() })
}

fn status(code: u16) -> Result<TransportResponse, TransportError> {
  Ok(TransportResponse { status: code, body: String::new() })
}

fn net_err() -> Result<TransportResponse, TransportError> {
  Err(TransportError("connection refused".into()))
}

fn client_over(
  transport: Arc<FakeTransport>,
) -> FetchClient<Arc<FakeTransport>> {
  FetchClient::new(transport, RateLimiter::default())
}

// ─── Rate ceiling ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn twenty_calls_never_exceed_five_per_rolling_second() {
  let transport = FakeTransport::scripted(vec![]);
  let client = client_over(Arc::clone(&transport));

  let mut tasks = Vec::new();
  for i in 0..20 {
    let c = client.clone();
    tasks.push(tokio::spawn(async move {
      c.fetch(&format!("https://example.test/{i}")).await.unwrap();
    }));
  }
  for t in tasks {
    t.await.unwrap();
  }

  let mut times = transport.dispatch_times();
  times.sort();
  assert_eq!(times.len(), 20);

  // The sixth dispatch after any given one must be at least a full
  // window later.
  for pair in times.windows(6) {
    assert!(
      pair[5] - pair[0] >= Duration::from_secs(1),
      "more than 5 dispatches within a rolling second"
    );
  }
}

// ─── Backoff schedule ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn three_429s_back_off_1s_2s_4s_then_succeed() {
  let transport = FakeTransport::scripted(vec![
    status(429),
    status(429),
    status(429),
    ok(r#"{"ok":true}"#),
  ]);
  let client = client_over(Arc::clone(&transport));

  let value = client.fetch("https://example.test/bills").await.unwrap();
  assert_eq!(value, serde_json::json!({ "ok": true }));

  let times = transport.dispatch_times();
  assert_eq!(times.len(), 4);

  let tolerance = Duration::from_millis(50);
  for (gap, expected_ms) in times.windows(2).zip([1000u64, 2000, 4000]) {
    let elapsed = gap[1] - gap[0];
    let expected = Duration::from_millis(expected_ms);
    assert!(
      elapsed >= expected && elapsed <= expected + tolerance,
      "expected ~{expected_ms}ms between attempts, got {elapsed:?}"
    );
  }
}

// ─── Retry exhaustion ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn persistent_429_fails_after_exactly_five_retries() {
  let transport = FakeTransport::scripted(
    std::iter::repeat_with(|| status(429)).take(10).collect(),
  );
  let client = client_over(Arc::clone(&transport));

  let err = client.fetch("https://example.test/bills").await.unwrap_err();
  assert!(matches!(err, Error::RateLimitExhausted { ref url } if url.ends_with("/bills")));

  // Initial attempt plus five retries, never a seventh dispatch.
  assert_eq!(transport.dispatch_times().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn persistent_network_failure_surfaces_as_network_error() {
  let transport = FakeTransport::scripted(
    std::iter::repeat_with(net_err).take(10).collect(),
  );
  let client = client_over(Arc::clone(&transport));

  let err = client.fetch("https://example.test/bills").await.unwrap_err();
  assert!(matches!(err, Error::Network { .. }));
  assert_eq!(transport.dispatch_times().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn other_http_statuses_fail_immediately() {
  let transport = FakeTransport::scripted(vec![status(500)]);
  let client = client_over(Arc::clone(&transport));

  let err = client.fetch("https://example.test/bills").await.unwrap_err();
  assert!(matches!(err, Error::Http { status: 500, .. }));
  assert_eq!(transport.dispatch_times().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_policy_override_is_respected() {
  let transport = FakeTransport::scripted(
    std::iter::repeat_with(|| status(429)).take(5).collect(),
  );
  let client = FetchClient::new(Arc::clone(&transport), RateLimiter::default())
    .with_retry_policy(1, Duration::from_millis(100));

  let err = client.fetch("https://example.test/x").await.unwrap_err();
  assert!(matches!(err, Error::RateLimitExhausted { .. }));
  assert_eq!(transport.dispatch_times().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn drain_resolves_once_idle() {
  let transport = FakeTransport::scripted(vec![]);
  let client = client_over(transport);

  client.fetch("https://example.test/x").await.unwrap();
  client.drain().await;
  assert_eq!(client.in_flight(), 0);
  assert_eq!(client.queue_depth(), 0);
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

fn gateway_over(
  transport: Arc<FakeTransport>,
  page_size: usize,
) -> Gateway<Arc<FakeTransport>> {
  let config = UpstreamConfig {
    bills_base_url:   "https://bills.test".into(),
    members_base_url: "https://members.test".into(),
    page_size,
  };
  Gateway::new(client_over(transport), config)
}

fn bill_json(id: i64, title: &str) -> String {
  format!(
    r#"{{"billId":{id},"shortTitle":"{title}","originatingHouse":"Commons",
        "currentHouse":"Commons","lastUpdate":"2024-01-01T00:00:00Z",
        "introducedSessionId":38,"includedSessionIds":[38,39]}}"#
  )
}

#[tokio::test(start_paused = true)]
async fn bills_listing_pages_until_exhausted() {
  let page1 = format!(
    r#"{{"items":[{},{}],"totalResults":3}}"#,
    bill_json(1, "A"),
    bill_json(2, "B"),
  );
  let page2 = format!(r#"{{"items":[{}],"totalResults":3}}"#, bill_json(3, "C"));

  let transport = FakeTransport::scripted(vec![ok(&page1), ok(&page2)]);
  let gateway = gateway_over(Arc::clone(&transport), 2);

  let bills = gateway.bills_in_session(39).await.unwrap();
  assert_eq!(
    bills.iter().map(|b| b.bill_id).collect::<Vec<_>>(),
    vec![1, 2, 3]
  );

  let urls = transport.dispatched_urls();
  assert_eq!(urls.len(), 2);
  assert!(urls[0].contains("Session=39") && urls[0].contains("Skip=0"));
  assert!(urls[1].contains("Skip=2"));
}

#[tokio::test(start_paused = true)]
async fn member_404_is_a_sentinel_not_an_error() {
  let transport = FakeTransport::scripted(vec![status(404)]);
  let gateway = gateway_over(transport, 20);

  let member = gateway.member(999_999).await.unwrap();
  assert!(member.is_none());
}

#[tokio::test(start_paused = true)]
async fn member_profile_unwraps_value_envelope() {
  let body = r#"{"value":{"id":172,"nameListAs":"Starmer, Keir",
    "nameDisplayAs":"Keir Starmer",
    "latestParty":{"name":"Labour","backgroundColour":"d50000"},
    "latestHouseMembership":{"membershipFrom":"Holborn and St Pancras","house":1},
    "thumbnailUrl":"https://members.test/172.jpg"}}"#;
  let transport = FakeTransport::scripted(vec![ok(body)]);
  let gateway = gateway_over(transport, 20);

  let member = gateway.member(172).await.unwrap().unwrap();
  assert_eq!(member.name_display_as, "Keir Starmer");
  assert_eq!(member.latest_party.unwrap().name, "Labour");
  assert_eq!(member.latest_house_membership.unwrap().house, 1);
}

#[tokio::test(start_paused = true)]
async fn member_search_escapes_the_name() {
  let transport =
    FakeTransport::scripted(vec![ok(r#"{"items":[],"totalResults":0}"#)]);
  let gateway = gateway_over(Arc::clone(&transport), 20);

  gateway.search_members("smith & jones").await.unwrap();
  let urls = transport.dispatched_urls();
  assert!(urls[0].contains("Name=smith%20%26%20jones"));
}

#[test]
fn session_table_is_newest_first_with_one_open_session() {
  let table = crate::gateway::SESSION_TABLE;
  assert!(table.windows(2).all(|w| w[0].session_id > w[1].session_id));
  assert_eq!(table.iter().filter(|s| s.end_date.is_none()).count(), 1);
}
