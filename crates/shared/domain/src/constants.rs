//! Domain-level constants.
//!
//! These constants define the audit and paging rules shared by every crate.

// =============================================================================
// Auditing
// =============================================================================

/// Actor recorded in `created_by` / `last_modified_by` when no caller is authenticated
pub const SYSTEM_ACTOR: &str = "Website Copolitan";

/// Offset (hours east of UTC) applied to the audit clock
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 3;

/// Seconds per hour (for offset calculation)
pub const SECONDS_PER_HOUR: i32 = 3600;

// =============================================================================
// Pagination
// =============================================================================

/// Default starting page number (1-indexed)
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Maximum allowed items per page to prevent excessive queries
pub const MAX_PAGE_SIZE: u64 = 100;

// =============================================================================
// Time zones
// =============================================================================

/// Zone that incoming wall-clock dates are expressed in
pub const SOURCE_TIME_ZONE: &str = "America/New_York";

/// Zone that dates are converted into for display
pub const LOCAL_TIME_ZONE: &str = "Africa/Cairo";

/// Day-first date format accepted from clients
pub const DAY_FIRST_DATE_FORMAT: &str = "%d-%m-%Y";

/// ISO date format used when reformatting
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
