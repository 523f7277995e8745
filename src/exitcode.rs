//! Standard exit codes (BSD sysexits.h compatible)

/// User declined a confirmation
pub const CANCELLED: i32 = 2;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error, also used for rejected structural edits
pub const DATAERR: i32 = 65;

/// Service unavailable
pub const UNAVAILABLE: i32 = 69;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Temporary failure, e.g. another write in flight
pub const TEMPFAIL: i32 = 75;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
