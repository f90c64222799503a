//! Memory-mapped IO experiment
//!
//! Maps `file_size` bytes read-write and writes one marker byte at each
//! offset. Only a single byte per page is touched, so a trial measures the
//! per-page fault and dirtying cost rather than bulk copy throughput. After
//! the loop the mapping is flushed with `msync(MS_SYNC)` and unmapped, both
//! inside the timed region.
//!
//! # Mapping modes
//!
//! - **Shared file-backed** (default): writes reach the file on msync
//! - **Private**: copy-on-write, the file is never modified
//! - **Anonymous**: zero-filled memory, the file is opened but not mapped
//!
//! # Requirements
//!
//! - The file must be at least `file_size` bytes; touching a page past EOF
//!   raises SIGBUS (`verify_size` guards against this inside the trial)

use super::{check_sequence, IOExperiment};
use crate::config::{BenchConfig, MapBacking, MapSharing};
use crate::distribution::PositionSequence;
use crate::target::file::{OpenFlags, TargetFile};
use crate::util::time::Timestamp;
use crate::{Error, Result};
use std::os::unix::io::RawFd;
use std::path::Path;
use std::ptr;

/// An owned memory mapping
///
/// [`unmap`](Mapping::unmap) reports a failing munmap; dropping an unreleased
/// mapping unmaps it silently (only reached on error paths).
pub(crate) struct Mapping {
    addr: *mut u8,
    len: usize,
}

impl Mapping {
    /// mmap `len` bytes of `fd` (or anonymous memory when `fd` is -1)
    pub(crate) fn map(len: usize, prot: libc::c_int, flags: libc::c_int, fd: RawFd) -> Result<Self> {
        // SAFETY: a fresh mapping at a kernel-chosen address aliases no Rust memory
        let addr = unsafe { libc::mmap(ptr::null_mut(), len, prot, flags, fd, 0) };
        if addr == libc::MAP_FAILED {
            return Err(Error::last_os_error("mmap"));
        }
        Ok(Self {
            addr: addr as *mut u8,
            len,
        })
    }

    pub(crate) fn addr(&self) -> *mut u8 {
        self.addr
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Store `value` at `offset`
    #[inline(always)]
    pub(crate) fn write_byte(&mut self, offset: u64, value: u8) -> Result<()> {
        if offset >= self.len as u64 {
            return Err(Error::OffsetOutOfRange {
                offset,
                len: self.len as u64,
            });
        }
        // SAFETY: offset is within the mapping, which is mapped PROT_WRITE
        unsafe { ptr::write_volatile(self.addr.add(offset as usize), value) };
        Ok(())
    }

    /// Flush dirty pages and wait for the writeback
    pub(crate) fn sync(&self) -> Result<()> {
        // SAFETY: addr/len describe a live mapping
        let ret = unsafe { libc::msync(self.addr as *mut libc::c_void, self.len, libc::MS_SYNC) };
        if ret == -1 {
            return Err(Error::last_os_error("msync"));
        }
        Ok(())
    }

    /// Release the mapping, reporting a failing munmap
    pub(crate) fn unmap(mut self) -> Result<()> {
        let addr = std::mem::replace(&mut self.addr, ptr::null_mut());
        // SAFETY: addr/len describe a live mapping that is released exactly once
        let ret = unsafe { libc::munmap(addr as *mut libc::c_void, self.len) };
        if ret == -1 {
            return Err(Error::last_os_error("munmap"));
        }
        Ok(())
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        if !self.addr.is_null() {
            // SAFETY: the mapping was not released by unmap()
            unsafe {
                libc::munmap(self.addr as *mut libc::c_void, self.len);
            }
        }
    }
}

/// Marker-byte-per-page experiment
pub struct MmapExperiment {
    config: BenchConfig,
    backing: MapBacking,
    sharing: MapSharing,
}

impl MmapExperiment {
    pub fn new(config: &BenchConfig, backing: MapBacking, sharing: MapSharing) -> Self {
        Self {
            config: config.clone(),
            backing,
            sharing,
        }
    }

    /// mmap(2) flags for the configured backing and sharing
    pub fn mmap_flags(&self) -> libc::c_int {
        let backing = match self.backing {
            MapBacking::File => 0,
            MapBacking::Anonymous => libc::MAP_ANONYMOUS,
        };
        let sharing = match self.sharing {
            MapSharing::Shared => libc::MAP_SHARED,
            MapSharing::Private => libc::MAP_PRIVATE,
        };
        backing | sharing
    }
}

impl IOExperiment for MmapExperiment {
    fn name(&self) -> &'static str {
        "mmap"
    }

    fn unit_size(&self) -> u64 {
        self.config.page_size
    }

    fn run(&mut self, path: &Path, positions: &PositionSequence) -> Result<u64> {
        check_sequence(positions, self.unit_size())?;

        let start = Timestamp::now();

        let file = TargetFile::open(path, OpenFlags::read_write())?;

        if self.config.verify_size {
            file.verify_size(self.config.file_size)?;
        }

        let fd = match self.backing {
            MapBacking::File => file.fd(),
            MapBacking::Anonymous => -1,
        };
        let mut mapping = Mapping::map(
            self.config.file_size as usize,
            libc::PROT_READ | libc::PROT_WRITE,
            self.mmap_flags(),
            fd,
        )?;

        let marker = self.config.marker_byte;
        for &offset in positions {
            mapping.write_byte(offset, marker)?;
        }

        mapping.sync()?;
        mapping.unmap()?;
        file.close()?;

        Ok(start.elapsed_micros())
    }
}
