//! Target file handle
//!
//! Opens the benchmark file with experiment-specific flags and closes it
//! explicitly, so a failing `close(2)` is reported rather than swallowed by
//! `Drop`. On early returns the handle is still closed by the inner `File`.
//!
//! # Features
//!
//! - O_DIRECT via `custom_flags`
//! - fstat-based size check against the configured file size
//! - Explicit close with error reporting

use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};
use std::path::{Path, PathBuf};

/// Open flags beyond read-write access
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    /// Open for reading and writing (read-only otherwise)
    pub write: bool,
    /// Use O_DIRECT to bypass the page cache
    pub direct: bool,
}

impl OpenFlags {
    pub fn read_only() -> Self {
        Self::default()
    }

    pub fn read_write() -> Self {
        Self {
            write: true,
            direct: false,
        }
    }

    pub fn read_write_direct() -> Self {
        Self {
            write: true,
            direct: true,
        }
    }
}

/// An open target file
#[derive(Debug)]
pub struct TargetFile {
    path: PathBuf,
    file: File,
}

impl TargetFile {
    /// Open `path` with the given flags
    ///
    /// # Errors
    ///
    /// Returns an `open` syscall error if the file does not exist, cannot be
    /// accessed, or the filesystem rejects O_DIRECT.
    pub fn open(path: &Path, flags: OpenFlags) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.read(true).write(flags.write);

        if flags.direct {
            options.custom_flags(libc::O_DIRECT);
        }

        let file = options.open(path).map_err(|e| Error::syscall("open", e))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    /// Current size in bytes, via fstat
    pub fn size(&self) -> Result<u64> {
        let metadata = self.file.metadata().map_err(|e| Error::syscall("fstat", e))?;
        Ok(metadata.len())
    }

    /// Fail with [`Error::SizeMismatch`] unless the file is exactly `expected` bytes
    pub fn verify_size(&self, expected: u64) -> Result<()> {
        let actual = self.size()?;
        if actual != expected {
            return Err(Error::SizeMismatch {
                path: self.path.clone(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Close the file, reporting a failing `close(2)`
    pub fn close(self) -> Result<()> {
        let fd = self.file.into_raw_fd();
        // SAFETY: fd was just released from an owned File and is closed exactly once
        if unsafe { libc::close(fd) } == -1 {
            return Err(Error::last_os_error("close"));
        }
        Ok(())
    }
}

/// Open `path` read-only, check its size and close it again
///
/// A missing or inaccessible file fails as `open`, the same as it would
/// inside a trial.
pub fn check_file_size(path: &Path, expected: u64) -> Result<()> {
    let target = TargetFile::open(path, OpenFlags::read_only())?;
    target.verify_size(expected)?;
    target.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_open_and_close() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("target.dat");
        std::fs::write(&file_path, vec![0u8; 8192]).unwrap();

        let target = TargetFile::open(&file_path, OpenFlags::read_write()).unwrap();
        assert!(target.fd() >= 0);
        assert_eq!(target.size().unwrap(), 8192);
        assert_eq!(target.path(), file_path.as_path());
        assert!(target.close().is_ok());
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("missing.dat");

        let err = TargetFile::open(&file_path, OpenFlags::read_only()).unwrap_err();
        assert_eq!(err.operation(), Some("open"));
        assert_eq!(err.kind(), ErrorKind::Syscall);
        assert!(err.to_string().starts_with("open: "));
    }

    #[test]
    fn test_verify_size() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("sized.dat");
        std::fs::write(&file_path, vec![0u8; 4096]).unwrap();

        let target = TargetFile::open(&file_path, OpenFlags::read_only()).unwrap();
        assert!(target.verify_size(4096).is_ok());
        match target.verify_size(8192) {
            Err(Error::SizeMismatch { expected, actual, .. }) => {
                assert_eq!(expected, 8192);
                assert_eq!(actual, 4096);
            }
            other => panic!("Expected size mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_check_file_size() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("sized.dat");
        std::fs::write(&file_path, vec![0u8; 100]).unwrap();

        assert!(check_file_size(&file_path, 100).is_ok());
        assert!(matches!(
            check_file_size(&file_path, 101),
            Err(Error::SizeMismatch { expected: 101, actual: 100, .. })
        ));

        let err = check_file_size(&temp_dir.path().join("nope"), 100).unwrap_err();
        assert_eq!(err.operation(), Some("open"));
    }

    #[test]
    fn test_open_direct() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("direct.dat");
        std::fs::write(&file_path, vec![0u8; 4096]).unwrap();

        // O_DIRECT may not work on tmpfs, so we allow this to fail
        let result = TargetFile::open(&file_path, OpenFlags::read_write_direct());
        if let Ok(target) = result {
            assert_eq!(target.size().unwrap(), 4096);
            assert!(target.close().is_ok());
        }
    }
}
