//! Timed IO experiments
//!
//! An experiment performs one timed trial over a target file: open it, touch
//! every offset of a [`PositionSequence`] with one unit of work, tear down and
//! report the elapsed wall-clock time in microseconds.
//!
//! # Experiment Types
//!
//! - **Direct**: seek + read/write of `io_size` blocks through a single aligned
//!   buffer, with O_DIRECT so the page cache is bypassed
//! - **Mmap**: one marker byte written per page of a mapping, then a
//!   synchronous msync and munmap
//!
//! # Protocol
//!
//! Both variants follow the same sequence inside the timed region:
//!
//! 1. Start a monotonic timer
//! 2. Open the file with mode-specific flags
//! 3. Optionally verify the file size (`verify_size`)
//! 4. One unit of work per offset
//! 5. Mapped variant only: msync + munmap
//! 6. Close the file
//! 7. Stop the timer
//!
//! Any failing syscall aborts the trial with an error naming the operation.
//! There is no retry: a trial that hit an error has no meaningful timing.
//!
//! # Example
//!
//! ```no_run
//! use iolat::config::{BenchConfig, IoDirection};
//! use iolat::distribution::PositionGenerator;
//! use iolat::engine::{IOExperiment, direct::DirectIOExperiment};
//! use std::path::Path;
//!
//! let config = BenchConfig::default();
//! let mut experiment = DirectIOExperiment::new(&config, IoDirection::Read, true)?;
//! let positions = PositionGenerator::new(&config).generate(experiment.unit_size(), false)?;
//! let micros = experiment.run(Path::new("/data/1g.bin"), &positions)?;
//! println!("{}us", micros);
//! # Ok::<(), iolat::Error>(())
//! ```

pub mod direct;
pub mod mmap;

use crate::config::{BenchConfig, ExperimentKind};
use crate::distribution::PositionSequence;
use crate::{Error, Result};
use std::path::Path;

/// One timed trial over a target file
///
/// Experiments are reused across iterations; each call to [`run`] is an
/// independent trial that opens and closes the file itself.
///
/// [`run`]: IOExperiment::run
pub trait IOExperiment {
    /// Short name for reports ("direct", "mmap")
    fn name(&self) -> &'static str;

    /// Byte granularity of one unit of work
    ///
    /// Position sequences passed to [`run`](IOExperiment::run) must be generated
    /// with this unit size.
    fn unit_size(&self) -> u64;

    /// Run one trial and return the elapsed time in microseconds
    ///
    /// # Errors
    ///
    /// Returns an error naming the failing operation if any syscall fails,
    /// or if `positions` was generated for a different unit size.
    fn run(&mut self, path: &Path, positions: &PositionSequence) -> Result<u64>;
}

/// Build the experiment selected by `kind`
pub fn build_experiment(config: &BenchConfig, kind: ExperimentKind) -> Result<Box<dyn IOExperiment>> {
    match kind {
        ExperimentKind::Direct {
            direction,
            bypass_cache,
        } => Ok(Box::new(direct::DirectIOExperiment::new(
            config,
            direction,
            bypass_cache,
        )?)),
        ExperimentKind::Mmap { backing, sharing } => {
            Ok(Box::new(mmap::MmapExperiment::new(config, backing, sharing)))
        }
    }
}

/// Reject sequences built for a different unit size than the experiment uses
pub(crate) fn check_sequence(positions: &PositionSequence, unit_size: u64) -> Result<()> {
    if positions.unit_size() != unit_size {
        return Err(Error::UnitSizeMismatch {
            expected: unit_size,
            actual: positions.unit_size(),
        });
    }
    Ok(())
}
