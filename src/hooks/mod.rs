//! External stage commands.
//!
//! Each `[stages.*]` entry is one command run from the project root with
//! `$WTTP_*` variables substituted into its arguments and exported to its
//! environment.

mod runner;

pub use runner::*;
