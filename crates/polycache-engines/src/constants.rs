//! Engine-specific constants

/// COUNT hint for cursor-based SCAN batches
pub const SCAN_BATCH_SIZE: usize = 500;

/// Version-control directories skipped by filesystem clear walks
pub const VCS_DIRECTORIES: &[&str] = &[".git", ".svn", ".hg"];

/// Prefix for the scratch file probing base-directory writability
pub const WRITABILITY_PROBE_PREFIX: &str = ".polycache_probe";

/// Initial value for lazily created group counters
pub const GROUP_COUNTER_INITIAL: i64 = 1;
