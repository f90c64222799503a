//! CPU affinity binding
//!
//! Pinning the process to a single core before warming keeps the scheduler
//! from migrating it between trials, which removes one source of noise from
//! the timings. Pinning is an aid, not a requirement: callers report a
//! failure as a warning and carry on.
//!
//! # Platform Support
//!
//! CPU affinity is supported on Linux via `sched_setaffinity`.
//!
//! # Example
//!
//! ```no_run
//! use iolat::worker::affinity::pin_to_core;
//!
//! if let Err(e) = pin_to_core(0) {
//!     eprintln!("Warning: {}", e);
//! }
//! ```

use crate::{Error, Result};

/// Highest core ID a `cpu_set_t` can hold
pub const MAX_CORE_ID: usize = 1023;

/// Bind the calling thread to `core`
///
/// # Errors
///
/// Returns [`Error::Config`] for a core ID that does not fit in a CPU set
/// and a `sched_setaffinity` syscall error if the kernel rejects the mask
/// (for example a core outside the allowed set).
#[cfg(target_os = "linux")]
pub fn pin_to_core(core: usize) -> Result<()> {
    use libc::{cpu_set_t, sched_setaffinity, CPU_SET, CPU_ZERO};
    use std::mem;

    if core > MAX_CORE_ID {
        return Err(Error::Config(format!(
            "CPU core ID {} is too large (max {})",
            core, MAX_CORE_ID
        )));
    }

    // SAFETY: cpu_set_t is plain data; core is within the set's capacity
    let result = unsafe {
        let mut cpu_set: cpu_set_t = mem::zeroed();
        CPU_ZERO(&mut cpu_set);
        CPU_SET(core, &mut cpu_set);

        sched_setaffinity(
            0, // 0 = calling thread
            mem::size_of::<cpu_set_t>(),
            &cpu_set,
        )
    };

    if result != 0 {
        return Err(Error::last_os_error("sched_setaffinity"));
    }

    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn pin_to_core(_core: usize) -> Result<()> {
    Err(Error::Config(
        "CPU affinity is only supported on Linux".to_string(),
    ))
}

/// Number of logical CPUs
pub fn num_cpus() -> usize {
    num_cpus::get()
}
