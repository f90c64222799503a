//! In-process `mincore(2)` inspector
//!
//! Maps the file read-only and counts the pages the kernel reports as
//! resident. Needs no external tool, and mapping without touching the pages
//! does not change what is cached.

use super::CacheInspector;
use crate::config::system_page_size;
use crate::engine::mmap::Mapping;
use crate::target::file::{OpenFlags, TargetFile};
use crate::{Error, Result};
use std::path::Path;

/// Page cache inspector using mincore(2)
#[derive(Debug, Clone, Copy, Default)]
pub struct MincoreInspector;

impl MincoreInspector {
    pub fn new() -> Self {
        Self
    }
}

impl CacheInspector for MincoreInspector {
    fn name(&self) -> &str {
        "mincore"
    }

    fn resident_bytes(&self, path: &Path) -> Result<u64> {
        let file = TargetFile::open(path, OpenFlags::read_only())?;
        let len = file.size()?;
        if len == 0 {
            file.close()?;
            return Ok(0);
        }

        let page_size = system_page_size();
        let mapping = Mapping::map(len as usize, libc::PROT_READ, libc::MAP_SHARED, file.fd())?;

        let pages = len.div_ceil(page_size) as usize;
        let mut vec = vec![0u8; pages];
        // SAFETY: the mapping covers `len` bytes and `vec` holds one entry per page
        let ret = unsafe {
            libc::mincore(
                mapping.addr() as *mut libc::c_void,
                mapping.len(),
                vec.as_mut_ptr() as *mut _,
            )
        };
        if ret == -1 {
            return Err(Error::last_os_error("mincore"));
        }

        mapping.unmap()?;
        file.close()?;

        let resident_pages = vec.iter().filter(|&&page| page & 1 == 1).count() as u64;
        Ok((resident_pages * page_size).min(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_freshly_written_file_is_resident() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hot.dat");
        std::fs::write(&path, vec![3u8; 64 * 1024]).unwrap();
        // Read it back so every page is cached even under writeback pressure
        let _ = std::fs::read(&path).unwrap();

        let resident = MincoreInspector::new().resident_bytes(&path).unwrap();
        assert_eq!(resident, 64 * 1024);
    }

    #[test]
    fn test_partial_last_page_is_clamped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("odd.dat");
        std::fs::write(&path, vec![3u8; 5000]).unwrap();
        let _ = std::fs::read(&path).unwrap();

        let resident = MincoreInspector::new().resident_bytes(&path).unwrap();
        assert_eq!(resident, 5000);
    }

    #[test]
    fn test_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.dat");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(MincoreInspector::new().resident_bytes(&path).unwrap(), 0);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = MincoreInspector::new()
            .resident_bytes(&temp_dir.path().join("missing.dat"))
            .unwrap_err();
        assert_eq!(err.operation(), Some("open"));
    }
}
