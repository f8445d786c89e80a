//! The rate-limited, retrying HTTP fetch client.
//!
//! [`FetchClient`] owns the retry/backoff policy; admission through the
//! shared [`RateLimiter`] happens once per dispatch, so a retried request
//! pays the rate-limit toll again each time it is re-issued.
//!
//! The [`Transport`] trait is the seam between policy and I/O: production
//! code uses [`ReqwestTransport`], tests script responses directly.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::watch;

use crate::{Error, Result, limiter::RateLimiter};

// ─── Transport ───────────────────────────────────────────────────────────────

/// A completed HTTP exchange: whatever status the server answered with,
/// plus the raw body text.
#[derive(Debug, Clone)]
pub struct TransportResponse {
  pub status: u16,
  pub body:   String,
}

/// Failure to obtain any HTTP response at all (DNS, connect, timeout).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Issues a single GET and reports either a response or a connection-level
/// failure. Implementations must not retry — retrying is the client's job.
pub trait Transport: Send + Sync {
  fn get<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send + 'a;
}

/// Production transport over a shared [`reqwest::Client`].
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new() -> Result<Self, TransportError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| TransportError(e.to_string()))?;
    Ok(Self { client })
  }
}

impl Transport for ReqwestTransport {
  async fn get(&self, url: &str) -> Result<TransportResponse, TransportError> {
    let resp = self
      .client
      .get(url)
      .header(reqwest::header::ACCEPT, "application/json")
      .send()
      .await
      .map_err(|e| TransportError(e.to_string()))?;

    let status = resp.status().as_u16();
    let body = resp
      .text()
      .await
      .map_err(|e| TransportError(e.to_string()))?;

    Ok(TransportResponse { status, body })
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Rate-limited GET-JSON client with exponential backoff.
///
/// Cheap to clone; clones share the limiter and the pending-work counter.
#[derive(Clone)]
pub struct FetchClient<T> {
  transport:    T,
  limiter:      RateLimiter,
  max_retries:  u32,
  backoff_base: Duration,
  pending_tx:   watch::Sender<usize>,
}

/// Decrements the pending counter however `fetch` returns.
struct PendingGuard(watch::Sender<usize>);

impl Drop for PendingGuard {
  fn drop(&mut self) {
    self.0.send_modify(|n| *n = n.saturating_sub(1));
  }
}

impl<T: Transport> FetchClient<T> {
  pub const DEFAULT_MAX_RETRIES: u32 = 5;
  pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(1000);

  pub fn new(transport: T, limiter: RateLimiter) -> Self {
    let (pending_tx, _) = watch::channel(0);
    Self {
      transport,
      limiter,
      max_retries: Self::DEFAULT_MAX_RETRIES,
      backoff_base: Self::DEFAULT_BACKOFF_BASE,
      pending_tx,
    }
  }

  /// Override the retry schedule.
  pub fn with_retry_policy(mut self, max_retries: u32, backoff_base: Duration) -> Self {
    self.max_retries = max_retries;
    self.backoff_base = backoff_base;
    self
  }

  /// GET `url` and parse the body as JSON.
  ///
  /// - 429: wait `backoff_base × 2^retry` and re-issue, up to
  ///   `max_retries` times; then [`Error::RateLimitExhausted`].
  /// - connection failure: same schedule; then [`Error::Network`].
  /// - any other non-2xx: [`Error::Http`] immediately, no retry.
  pub async fn fetch(&self, url: &str) -> Result<serde_json::Value> {
    self.pending_tx.send_modify(|n| *n += 1);
    let _guard = PendingGuard(self.pending_tx.clone());

    let mut retries = 0u32;
    loop {
      self.limiter.admit().await;
      tracing::debug!(url, retries, "dispatching upstream request");

      let failure = match self.transport.get(url).await {
        Ok(resp) if resp.status == 429 => Error::RateLimitExhausted {
          url: url.to_owned(),
        },
        Ok(resp) if (200..300).contains(&resp.status) => {
          return serde_json::from_str(&resp.body).map_err(|source| {
            Error::Decode { url: url.to_owned(), source }
          });
        }
        Ok(resp) => {
          return Err(Error::Http { status: resp.status, url: url.to_owned() });
        }
        Err(e) => Error::Network { url: url.to_owned(), message: e.to_string() },
      };

      if retries == self.max_retries {
        tracing::warn!(url, retries, "retry budget exhausted");
        return Err(failure);
      }

      let delay = self.backoff_base * 2u32.pow(retries);
      retries += 1;
      tracing::warn!(url, retries, delay_ms = delay.as_millis() as u64, "upstream request failed, backing off");
      tokio::time::sleep(delay).await;
    }
  }

  /// GET `url` and deserialise the body into `D`.
  pub async fn fetch_json<D: DeserializeOwned>(&self, url: &str) -> Result<D> {
    let value = self.fetch(url).await?;
    serde_json::from_value(value)
      .map_err(|source| Error::Decode { url: url.to_owned(), source })
  }

  // ── Observability ─────────────────────────────────────────────────────

  /// Calls currently inside `fetch`, including any sleeping between
  /// retries.
  pub fn in_flight(&self) -> usize { *self.pending_tx.borrow() }

  /// Callers waiting for a rate-limit slot.
  pub fn queue_depth(&self) -> usize { self.limiter.queued() }

  /// Resolve once no fetches are pending. The orchestrator awaits each
  /// call directly, so this is defensive rather than load-bearing.
  pub async fn drain(&self) {
    let mut rx = self.pending_tx.subscribe();
    while *rx.borrow_and_update() != 0 {
      if rx.changed().await.is_err() {
        return;
      }
    }
  }
}
