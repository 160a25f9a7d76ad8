//! Domain layer - Audit primitives shared by every crate.
//!
//! This crate contains pure logic with no infrastructure dependencies:
//! who is calling, what time it is for audit purposes, and the rules that
//! turn those into an audit stamp.

pub mod audit;
pub mod clock;
pub mod constants;
pub mod error;
pub mod identity;
pub mod time;

pub use audit::{AuditContext, AuditPolicy, AuditStamp, ChangeKind};
pub use clock::{Clock, FixedClock, SystemClock};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use identity::{Anonymous, CallerIdentity, IdentityProvider};
pub use time::{convert_to_local_date, parse_day_first_date, reformat_day_first_date};

#[cfg(any(test, feature = "test-utils"))]
pub use clock::MockClock;
#[cfg(any(test, feature = "test-utils"))]
pub use identity::MockIdentityProvider;
