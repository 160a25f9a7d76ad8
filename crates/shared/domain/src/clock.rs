//! Audit clock.
//!
//! "Now" for audit stamps is UTC shifted by a fixed offset. The offset is
//! part of the stored contract: every stamp written by one deployment must
//! carry the same offset, so it is configured once and never derived from
//! the host's local zone.

use chrono::{DateTime, FixedOffset, Offset, Utc};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use crate::constants::{DEFAULT_UTC_OFFSET_HOURS, SECONDS_PER_HOUR};
use crate::error::{DomainError, DomainResult};

/// Supplies the current time for audit stamps.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock at a fixed offset from UTC.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Clock at `hours` east of UTC.
    pub fn with_offset_hours(hours: i32) -> DomainResult<Self> {
        let offset = FixedOffset::east_opt(hours * SECONDS_PER_HOUR)
            .ok_or_else(|| DomainError::validation(format!("Invalid UTC offset: {} hours", hours)))?;
        Ok(Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::with_offset_hours(DEFAULT_UTC_OFFSET_HOURS).unwrap_or(Self { offset: Utc.fix() })
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Clock frozen at a single instant. Useful for deterministic stamps.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
