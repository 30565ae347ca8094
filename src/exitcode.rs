//! Process exit codes

/// Successful termination (including help, version and explain output)
pub const OK: i32 = 0;

/// Any failure: usage, configuration, connection or remote errors
pub const FAILURE: i32 = 1;
