//! Shared utilities: aligned buffers, timing, resource usage

pub mod buffer;
pub mod resource;
pub mod time;
