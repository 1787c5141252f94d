//! Source merging.

pub mod merge_policy;
