use std::result;
use super::Error;

/// A specialized `Result` type used throughout the planner.
pub type Result<T = ()> = result::Result<T, Error>;
