mod find_result;
mod misc;

pub use find_result::*;
pub use misc::*;

/// Env variable to set the log level of the optimizer (default "info")
pub const SEGO_LOG: &str = "SEGO_LOG";
