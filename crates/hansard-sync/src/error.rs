//! Error type for `hansard-sync`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A sync-log row with `running` status already exists.
  #[error("a sync is already running")]
  AlreadyRunning,

  #[error(transparent)]
  Upstream(#[from] hansard_upstream::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A house string outside the Commons/Lords vocabulary.
  #[error("unrecognised house: {0:?}")]
  UnknownHouse(String),

  /// A decision string outside the documented vocabulary.
  #[error("unrecognised decision: {0:?}")]
  UnknownDecision(String),
}

impl Error {
  /// Wrap a backend error from any [`BillStore`](hansard_core::store::BillStore).
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
