//! `nexocrm-core` — shared kernel for the page-level ACL engine.
//!
//! Identifier newtypes, the failure taxonomy, and the page model. This crate
//! has no IO and no HTTP/storage assumptions.

pub mod error;
pub mod id;
pub mod page;

pub use error::{AclError, AclResult};
pub use id::{OrgId, UserId};
pub use page::{fallback_catalog, Page, PageKey, SENSITIVE_PAGE_KEY};
