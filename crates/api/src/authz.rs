//! API-side authorization guard.
//!
//! This enforces authorization at the route boundary, keeping services and
//! stores auth-agnostic: they only ever see the acting user's id.

use catalog_auth::{AuthzError, Permission, Principal, authorize};

use crate::context::PrincipalContext;

/// Check a required permission in the current request context.
///
/// Intended to be called **before** invoking a service operation.
pub fn require(principal: &PrincipalContext, permission: &Permission) -> Result<(), AuthzError> {
    let principal = Principal {
        principal_id: principal.principal_id(),
        roles: principal.roles().to_vec(),
        permissions: permissions_from_roles(principal.roles()),
    };

    authorize(&principal, permission)
}

/// Minimal role→permission mapping stub.
///
/// This is intentionally simple until a real policy source exists (e.g. DB-backed).
fn permissions_from_roles(roles: &[catalog_auth::Role]) -> Vec<Permission> {
    // Convention: "admin" grants all permissions.
    if roles.iter().any(|r| r.as_str() == "admin") {
        return vec![Permission::new("*")];
    }

    Vec::new()
}
