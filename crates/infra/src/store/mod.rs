//! Storage boundary for the ACL engine.
//!
//! This module defines infrastructure-facing abstractions for the page
//! catalog, the user directory, identity lookups, and the override table,
//! without making storage assumptions.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryAclStore;
pub use postgres::PostgresAclStore;
pub use r#trait::{
    AccessOverride, CatalogStore, IdentityStore, NewOverride, OverrideStore, StoreError,
    UserDirectory, UserRecord,
};
