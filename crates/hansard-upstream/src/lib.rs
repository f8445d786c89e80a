//! Upstream API access for Hansard.
//!
//! Two collaborators live here: the rate-limited, retrying
//! [`FetchClient`](fetch::FetchClient) and the typed [`Gateway`](gateway::Gateway)
//! over the two public Parliament APIs (bills and members). Everything the
//! sync pipeline fetches goes through this crate.

pub mod error;
pub mod fetch;
pub mod gateway;
pub mod limiter;

pub use error::{Error, Result};
pub use fetch::{FetchClient, ReqwestTransport, Transport, TransportResponse};
pub use gateway::{Gateway, UpstreamConfig};

#[cfg(test)]
mod tests;
