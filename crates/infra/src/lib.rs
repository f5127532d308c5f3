//! `nexocrm-infra` — storage seams and implementations for the ACL engine.
//!
//! The store boundary is trait-based: Postgres is the production backend,
//! the in-memory store backs tests and local development. The two
//! availability-sensitive read paths (page catalog, identity resolution)
//! get thin wrappers here that map *any* store failure to their documented
//! safe default in a single auditable place.

pub mod authorizer;
pub mod catalog;
pub mod resolver;
pub mod store;

pub use authorizer::{PathAuthorizer, PolicyPathAuthorizer};
pub use catalog::PageCatalog;
pub use resolver::IdentityResolver;
pub use store::{
    AccessOverride, CatalogStore, IdentityStore, InMemoryAclStore, NewOverride, OverrideStore,
    PostgresAclStore, StoreError, UserDirectory, UserRecord,
};
