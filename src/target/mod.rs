//! Benchmark target
//!
//! The target is a single regular file of a known size. [`file::TargetFile`]
//! opens it with the flags an experiment needs and closes it explicitly so
//! that `close(2)` failures are reported.

pub mod file;
