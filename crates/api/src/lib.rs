//! `nexocrm-api` — HTTP surface of the page-level ACL engine.

pub mod app;
pub mod context;
pub mod middleware;
