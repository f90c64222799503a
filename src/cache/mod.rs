//! Page cache warm-up and residency verification
//!
//! Before any trial is timed, the target file is read end to end so that its
//! pages sit in the OS page cache, and a [`CacheInspector`] then confirms that
//! the whole file is resident. A file that is not fully cached would turn the
//! first trial into a cold-cache measurement, so a failed check aborts the run.
//!
//! # Inspectors
//!
//! - [`fincore::FincoreInspector`]: runs util-linux `fincore` as a subprocess
//! - [`mincore::MincoreInspector`]: maps the file and asks `mincore(2)` directly
//!
//! # Example
//!
//! ```no_run
//! use iolat::cache::{CacheWarmer, fincore::FincoreInspector};
//! use iolat::config::BenchConfig;
//! use std::path::Path;
//!
//! let config = BenchConfig::default();
//! let warmer = CacheWarmer::new(&config, Box::new(FincoreInspector::new()));
//! let report = warmer.warm_and_verify(Path::new("/data/1g.bin"))?;
//! println!("{} bytes resident", report.resident_bytes);
//! # Ok::<(), iolat::Error>(())
//! ```

pub mod fincore;
pub mod mincore;

use crate::config::{BenchConfig, InspectorType};
use crate::target::file::{OpenFlags, TargetFile};
use crate::util::time::Timestamp;
use crate::{Error, Result};
use std::os::unix::fs::FileExt;
use std::path::Path;

/// Reports how many bytes of a file are currently in the page cache
pub trait CacheInspector {
    /// Tool name for diagnostics
    fn name(&self) -> &str;

    /// Resident byte count for `path`
    fn resident_bytes(&self, path: &Path) -> Result<u64>;
}

/// Build the inspector selected in the configuration
pub fn build_inspector(kind: InspectorType) -> Box<dyn CacheInspector> {
    match kind {
        InspectorType::Fincore => Box::new(fincore::FincoreInspector::new()),
        InspectorType::Mincore => Box::new(mincore::MincoreInspector::new()),
    }
}

/// Outcome of a successful warm-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmReport {
    pub bytes_read: u64,
    pub resident_bytes: u64,
    pub elapsed_micros: u64,
}

/// Reads a file into the page cache and verifies it stayed there
pub struct CacheWarmer {
    file_size: u64,
    chunk_size: u64,
    inspector: Box<dyn CacheInspector>,
}

impl CacheWarmer {
    /// Warm in `io_size` chunks, verifying with `inspector`
    pub fn new(config: &BenchConfig, inspector: Box<dyn CacheInspector>) -> Self {
        Self {
            file_size: config.file_size,
            chunk_size: config.io_size,
            inspector,
        }
    }

    pub fn inspector(&self) -> &dyn CacheInspector {
        self.inspector.as_ref()
    }

    /// Read the whole file once, then require it to be fully resident
    ///
    /// # Errors
    ///
    /// - `open`/`read`/`close` syscall errors while reading the file
    /// - inspector errors (tool missing, failed, unparsable output)
    /// - [`Error::NotResident`] if fewer than `file_size` bytes are cached
    pub fn warm_and_verify(&self, path: &Path) -> Result<WarmReport> {
        let start = Timestamp::now();

        let bytes_read = self.warm(path)?;

        let resident_bytes = self.inspector.resident_bytes(path)?;
        if resident_bytes < self.file_size {
            return Err(Error::NotResident {
                path: path.to_path_buf(),
                resident: resident_bytes,
                expected: self.file_size,
            });
        }

        Ok(WarmReport {
            bytes_read,
            resident_bytes,
            elapsed_micros: start.elapsed_micros(),
        })
    }

    /// Sequentially read `[0, file_size)` and discard the data
    fn warm(&self, path: &Path) -> Result<u64> {
        let target = TargetFile::open(path, OpenFlags::read_only())?;
        let mut chunk = vec![0u8; self.chunk_size as usize];

        let mut offset = 0u64;
        while offset < self.file_size {
            let len = (self.file_size - offset).min(self.chunk_size) as usize;
            target
                .file()
                .read_exact_at(&mut chunk[..len], offset)
                .map_err(|e| Error::syscall("read", e))?;
            offset += len as u64;
        }

        target.close()?;
        Ok(offset)
    }
}
