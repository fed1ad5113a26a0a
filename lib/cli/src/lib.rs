//! The `biopattern` binary lib: argument parsing, event sources and the
//! reporting loop around [`biopattern_counters`].

#![deny(
    missing_docs,
    dead_code,
    nonstandard_style,
    unused_mut,
    unused_variables,
    unused_unsafe,
    unreachable_patterns
)]
// Allowed because it makes code more readable.
#![allow(clippy::bool_comparison, clippy::match_like_matches_macro)]

pub mod cli;
pub mod commands;
pub mod disk;
pub mod logging;
pub mod partitions;
pub mod report;
pub mod source;

/// Version number of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
