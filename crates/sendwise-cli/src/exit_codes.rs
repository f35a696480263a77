//! Process exit codes for the `sendwise` binary.
//! Scripts rely on these values; do not renumber.

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1; // Reply rejected by the parser, unreadable input
pub const INVALID_INPUT: i32 = 2; // Text outside the accepted length
pub const CONFIG_ERROR: i32 = 3; // Missing credential, bad config file
pub const UPSTREAM_ERROR: i32 = 4; // Rewrite service unreachable
pub const CANCELLED: i32 = 130; // Interrupted with Ctrl-C
