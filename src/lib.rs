//! Workspace facade for the `biopattern` crates, used by the benchmarks.

pub use biopattern_counters as counters;
