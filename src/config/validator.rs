//! Configuration validation
//!
//! Runs before any file is touched, so a misconfigured run fails without
//! warming the cache or timing anything.

use super::*;
use crate::{Error, Result};

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_bench(&config.bench)?;
    validate_run(&config.run)?;
    Ok(())
}

/// Validate the shared constants
pub fn validate_bench(bench: &BenchConfig) -> Result<()> {
    if bench.file_size == 0 {
        return Err(Error::Config("file_size must be greater than 0".to_string()));
    }

    check_unit_size(bench.io_size, bench.file_size)?;
    check_unit_size(bench.page_size, bench.file_size)?;

    // O_DIRECT buffers are aligned to io_size
    if !bench.io_size.is_power_of_two() {
        return Err(Error::Config(format!(
            "io_size must be a power of two, got {}",
            bench.io_size
        )));
    }

    Ok(())
}

/// Validate per-invocation settings
pub fn validate_run(run: &RunConfig) -> Result<()> {
    if run.iterations == 0 {
        return Err(Error::Config("iterations must be at least 1".to_string()));
    }

    if run.path.is_none() {
        return Err(Error::Config("no target file specified".to_string()));
    }

    // CPU ids may be sparse, so run.cpu is not bounded by the core count.
    // A failed pin is a warning at run time.
    Ok(())
}

/// Unit sizes must be non-zero and tile the file exactly
pub fn check_unit_size(unit_size: u64, file_size: u64) -> Result<()> {
    if unit_size == 0 || file_size % unit_size != 0 {
        return Err(Error::InvalidUnitSize {
            unit_size,
            file_size,
        });
    }
    Ok(())
}
