//! `casetrack-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;
pub mod verifier;

pub use authorize::{AuthzError, Requirement, authorize};
pub use claims::{AuthenticationError, IdentityClaims, validate_claims};
pub use permissions::{
    KeyValidation, Permission, PermissionDefinition, PermissionMap, PermissionValidationError,
    parse_permission_update, registry, validate_keys,
};
pub use principal::{Actor, Principal};
pub use roles::Role;
pub use user::{Registration, User};
pub use verifier::{Hs256IdentityVerifier, IdentityVerifier};
