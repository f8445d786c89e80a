//! Error type for `hansard-upstream`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The upstream kept answering 429 until the retry budget ran out.
  #[error("rate limit retries exhausted for {url}")]
  RateLimitExhausted { url: String },

  /// No HTTP response could be obtained after the full retry schedule.
  #[error("network failure fetching {url}: {message}")]
  Network { url: String, message: String },

  /// A non-2xx, non-429 status. Never retried.
  #[error("HTTP {status} from {url}")]
  Http { status: u16, url: String },

  #[error("failed to decode response from {url}: {source}")]
  Decode {
    url:    String,
    #[source]
    source: serde_json::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
