//! Inbound port. The boundary layer tells the application who is calling.

use crate::domain::{DomainError, Member};

/// Supplies the authenticated member for the current request.
///
/// Credential verification happens before this point; implementations only resolve identity.
#[async_trait::async_trait]
pub trait IdentityPort: Send + Sync {
    async fn current_member(&self) -> Result<Member, DomainError>;
}
