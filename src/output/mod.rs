//! Result reporting
//!
//! - [`text`]: the stdout results block and stderr progress lines
//! - [`json`]: optional JSON report file

pub mod json;
pub mod text;
