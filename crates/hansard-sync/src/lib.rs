//! The Hansard sync pipeline.
//!
//! [`Orchestrator`](run::Orchestrator) drives the full and incremental sync
//! variants over any [`UpstreamSource`](source::UpstreamSource) and
//! [`BillStore`](hansard_core::store::BillStore);
//! [`reconcile`](reconcile::reconcile_bill) is the per-bill algorithm;
//! [`SyncService`](service::SyncService) is the fire-and-forget front door
//! the HTTP trigger talks to.

#![allow(async_fn_in_trait)]

pub mod error;
pub mod reconcile;
pub mod run;
pub mod service;
pub mod source;

pub use error::{Error, Result};
pub use run::Orchestrator;
pub use service::{SyncAck, SyncService, SyncStatusReport};
pub use source::UpstreamSource;

#[cfg(test)]
mod tests;
