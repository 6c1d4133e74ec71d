use catalog_auth::{PrincipalId, Role};
use catalog_core::UserId;

/// Principal context for a request (authenticated identity + roles).
///
/// This is immutable and must be present for all protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        Self { principal_id, roles }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// The acting user's id as the domain knows it (audit attribution).
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(*self.principal_id.as_uuid())
    }
}
