//! Stable exit codes for the `polls` CLI.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid input, configuration, or storage failure.
pub const INVALID: i32 = 1;
/// The referenced poll does not exist.
pub const NOT_FOUND: i32 = 2;
