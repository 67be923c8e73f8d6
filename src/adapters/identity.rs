//! Identity adapter: resolves the acting member configured for this process.
//!
//! Token verification belongs to the transport layer; by the time a member id
//! reaches here it is already trusted.

use crate::domain::{DomainError, Member, MemberId};
use crate::ports::{IdentityPort, MemberRepository};
use std::sync::Arc;

pub struct ConfiguredIdentity {
    members: Arc<dyn MemberRepository>,
    member_id: MemberId,
}

impl ConfiguredIdentity {
    pub fn new(members: Arc<dyn MemberRepository>, member_id: MemberId) -> Self {
        Self { members, member_id }
    }
}

#[async_trait::async_trait]
impl IdentityPort for ConfiguredIdentity {
    async fn current_member(&self) -> Result<Member, DomainError> {
        self.members
            .find_by_id(self.member_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Member", self.member_id))
    }
}
