//! Error types for `hansard-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown decision value: {0:?}")]
  UnknownDecision(String),

  #[error("unknown house value: {0:?}")]
  UnknownHouse(String),

  #[error("unknown sync type: {0:?}")]
  UnknownSyncType(String),

  #[error("unknown sync status: {0:?}")]
  UnknownSyncStatus(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
