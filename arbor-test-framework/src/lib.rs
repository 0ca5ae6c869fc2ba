//! Test framework for the arbor container crates.
//!
//! This crate provides the shared infrastructure for the black-box scenario
//! suites. Unlike the container crates, it runs in userspace and uses std.

pub mod helpers;
