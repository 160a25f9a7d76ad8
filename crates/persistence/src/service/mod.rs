//! Service layer - use cases returning response envelopes.

mod catalog_service;

pub use catalog_service::{CatalogManager, CatalogService, CategoryView, NewCategory};
