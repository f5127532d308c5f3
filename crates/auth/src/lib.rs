//! `nexocrm-auth` — pure identity/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: role
//! parsing, the resolved user identity, session claims validation, and the
//! page-access policy all live here as IO-free logic.

pub mod claims;
pub mod identity;
pub mod policy;
pub mod principal;
pub mod roles;

pub use claims::{validate_claims, SessionClaims, TokenValidationError};
pub use identity::UserIdentity;
pub use policy::{default_access, effective_access};
pub use principal::Principal;
pub use roles::Role;
