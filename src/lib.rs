//! iolat - direct IO vs memory-mapped IO latency harness
//!
//! iolat times how long it takes to touch every block of a fixed-size file
//! through two OS paths and reports per-trial samples with their mean and
//! standard deviation.
//!
//! # Architecture
//!
//! - **Position generation**: ascending or shuffled block/page offsets
//! - **Cache warm-up**: read the file once, then verify it is fully resident
//! - **Experiments**: O_DIRECT seek + read/write, or one marker byte per
//!   page of a memory mapping followed by msync and munmap
//! - **Statistics**: samples in seconds, population standard deviation
//!
//! Every failure is returned as an [`Error`]; nothing is retried.

pub mod cache;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod output;
pub mod stats;
pub mod target;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use engine::IOExperiment;
pub use error::{Error, ErrorKind};

/// Result type used throughout iolat
pub type Result<T> = std::result::Result<T, Error>;
