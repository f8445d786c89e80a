//! JSON REST API for Hansard.
//!
//! Exposes an axum [`Router`] over any [`BillStore`] plus the sync
//! trigger/status surface backed by a [`SyncService`]. TLS and transport
//! concerns are the caller's responsibility.
//!
//! Browse endpoints are unauthenticated reads; only the sync trigger
//! requires credentials. Reads are fully concurrent with a running sync
//! and may observe partially-synced data.

pub mod amendments;
pub mod auth;
pub mod bills;
pub mod error;
pub mod members;
pub mod sessions;
pub mod sync;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use hansard_core::store::BillStore;
use hansard_sync::{SyncService, UpstreamSource};

use auth::AuthConfig;

pub use error::ApiError;

/// Shared state threaded through all axum handlers.
pub struct AppState<U, S> {
  pub store: Arc<S>,
  pub sync:  Arc<SyncService<U, S>>,
  pub auth:  Arc<AuthConfig>,
}

impl<U, S> Clone for AppState<U, S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      sync:  Arc::clone(&self.sync),
      auth:  Arc::clone(&self.auth),
    }
  }
}

/// Build a fully-materialised API router for `state`.
pub fn router<U, S>(state: AppState<U, S>) -> Router
where
  U: UpstreamSource + Send + Sync + 'static,
  S: BillStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Browse
    .route("/api/sessions", get(sessions::list::<U, S>))
    .route("/api/bills", get(bills::list::<U, S>))
    .route("/api/bills/{id}", get(bills::get_one::<U, S>))
    .route("/api/bills/{id}/stages", get(bills::stages::<U, S>))
    .route("/api/stages/{id}/amendments", get(amendments::for_stage::<U, S>))
    .route("/api/members/{id}", get(members::get_one::<U, S>))
    // Sync
    .route("/api/sync", post(sync::trigger::<U, S>))
    .route("/api/sync/status", get(sync::status::<U, S>))
    .with_state(state)
}
