//! Common utilities shared across crates.
//!
//! This crate provides:
//! - Unified error handling rendered as response envelopes
//! - Response envelopes and page types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod pagination;
pub mod response;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
pub use pagination::{Page, PageRequest};
pub use response::{PagedResponse, Response};
