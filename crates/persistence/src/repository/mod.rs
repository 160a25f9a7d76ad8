//! Repository layer for data access.

pub mod entities;
mod generic;

pub use generic::GenericRepository;
