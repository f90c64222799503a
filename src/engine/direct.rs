//! Direct IO experiment
//!
//! Opens the target read-write with O_DIRECT and, for every offset, seeks and
//! then reads or writes one `io_size` block through a single aligned buffer.
//!
//! # Features
//!
//! - lseek + read/write, one syscall pair per block
//! - One aligned buffer allocated up front and reused for every block
//! - A short transfer is an error, never retried: O_DIRECT on an aligned
//!   block completes in one call or the trial is invalid
//!
//! Writes push the buffer's current contents to every block, so after a write
//! trial the file holds copies of the same block.

use super::{check_sequence, IOExperiment};
use crate::config::{BenchConfig, IoDirection};
use crate::distribution::PositionSequence;
use crate::target::file::{OpenFlags, TargetFile};
use crate::util::buffer::AlignedBuffer;
use crate::util::time::Timestamp;
use crate::{Error, Result};
use std::os::unix::io::RawFd;
use std::path::Path;

/// Seek + read/write experiment
pub struct DirectIOExperiment {
    config: BenchConfig,
    direction: IoDirection,
    /// Open with O_DIRECT
    bypass_cache: bool,
    buffer: AlignedBuffer,
}

impl DirectIOExperiment {
    /// Create the experiment and allocate its `io_size`-aligned buffer
    pub fn new(config: &BenchConfig, direction: IoDirection, bypass_cache: bool) -> Result<Self> {
        let io_size = config.io_size as usize;
        Ok(Self {
            config: config.clone(),
            direction,
            bypass_cache,
            buffer: AlignedBuffer::new(io_size, io_size)?,
        })
    }

    pub fn direction(&self) -> IoDirection {
        self.direction
    }

    fn open_flags(&self) -> OpenFlags {
        if self.bypass_cache {
            OpenFlags::read_write_direct()
        } else {
            OpenFlags::read_write()
        }
    }

    /// Seek to `offset` and transfer one block
    #[inline(always)]
    fn transfer(&mut self, fd: RawFd, offset: u64) -> Result<()> {
        // SAFETY: lseek only requires a valid fd
        let pos = unsafe { libc::lseek(fd, offset as libc::off_t, libc::SEEK_SET) };
        if pos == -1 {
            return Err(Error::last_os_error("lseek"));
        }

        let length = self.buffer.size();
        let (op, ret) = match self.direction {
            IoDirection::Read => {
                // SAFETY: buffer is valid for `length` bytes and exclusively borrowed
                let ret = unsafe {
                    libc::read(fd, self.buffer.as_mut_ptr() as *mut libc::c_void, length)
                };
                ("read", ret)
            }
            IoDirection::Write => {
                // SAFETY: buffer is valid for `length` bytes
                let ret = unsafe {
                    libc::write(fd, self.buffer.as_ptr() as *const libc::c_void, length)
                };
                ("write", ret)
            }
        };

        if ret == -1 {
            return Err(Error::last_os_error(op));
        }
        if ret as usize != length {
            return Err(Error::ShortTransfer {
                op,
                offset,
                expected: length,
                actual: ret as usize,
            });
        }

        Ok(())
    }
}

impl IOExperiment for DirectIOExperiment {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn unit_size(&self) -> u64 {
        self.config.io_size
    }

    fn run(&mut self, path: &Path, positions: &PositionSequence) -> Result<u64> {
        check_sequence(positions, self.unit_size())?;

        let start = Timestamp::now();

        let file = TargetFile::open(path, self.open_flags())?;

        if self.config.verify_size {
            file.verify_size(self.config.file_size)?;
        }

        let fd = file.fd();
        for &offset in positions {
            self.transfer(fd, offset)?;
        }

        file.close()?;

        Ok(start.elapsed_micros())
    }
}
