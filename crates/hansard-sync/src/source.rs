//! The `UpstreamSource` trait — what the orchestrator needs from upstream.
//!
//! [`Gateway`] is the production implementation; tests substitute a scripted
//! source. The payload types are the gateway's own, re-used unmapped: the
//! reconciler is where upstream shapes become domain rows.

use std::future::Future;

use hansard_upstream::gateway::{
  AmendmentRecord, BillSummary, Gateway, MemberProfile, StageRecord,
  UpstreamSession,
};
use hansard_upstream::{Error, Transport};

/// Everything a sync run fetches, one method per upstream concept.
pub trait UpstreamSource: Send + Sync {
  /// The sessions in scope, newest first.
  fn sessions(&self) -> Vec<UpstreamSession>;

  /// Every bill in a session, regardless of status.
  fn bills_in_session(
    &self,
    session_id: i64,
  ) -> impl Future<Output = Result<Vec<BillSummary>, Error>> + Send + '_;

  /// All stages of a bill, sittings embedded.
  fn stages(
    &self,
    bill_id: i64,
  ) -> impl Future<Output = Result<Vec<StageRecord>, Error>> + Send + '_;

  /// All amendments tabled at one stage.
  fn amendments(
    &self,
    bill_id: i64,
    stage_id: i64,
  ) -> impl Future<Output = Result<Vec<AmendmentRecord>, Error>> + Send + '_;

  /// One member's full profile; `None` when the member is unknown upstream.
  fn member(
    &self,
    member_id: i64,
  ) -> impl Future<Output = Result<Option<MemberProfile>, Error>> + Send + '_;
}

impl<T: Transport> UpstreamSource for Gateway<T> {
  fn sessions(&self) -> Vec<UpstreamSession> {
    Gateway::sessions(self).to_vec()
  }

  async fn bills_in_session(&self, session_id: i64) -> Result<Vec<BillSummary>, Error> {
    Gateway::bills_in_session(self, session_id).await
  }

  async fn stages(&self, bill_id: i64) -> Result<Vec<StageRecord>, Error> {
    Gateway::stages(self, bill_id).await
  }

  async fn amendments(
    &self,
    bill_id: i64,
    stage_id: i64,
  ) -> Result<Vec<AmendmentRecord>, Error> {
    Gateway::amendments(self, bill_id, stage_id).await
  }

  async fn member(&self, member_id: i64) -> Result<Option<MemberProfile>, Error> {
    Gateway::member(self, member_id).await
  }
}
