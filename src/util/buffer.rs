//! Aligned buffers for O_DIRECT
//!
//! O_DIRECT requires the user buffer, the file offset and the transfer length
//! to be aligned to the device's logical block size. The direct experiment
//! allocates one buffer aligned to its IO size and reuses it for every block.

use crate::{Error, Result};
use std::alloc::{alloc_zeroed, dealloc, Layout};

/// Memory-aligned buffer suitable for O_DIRECT operations
///
/// The contents start zeroed and are whatever the last read left behind;
/// writes push the same bytes to every block.
pub struct AlignedBuffer {
    ptr: *mut u8,
    size: usize,
    layout: Layout,
}

impl AlignedBuffer {
    /// Allocate a zeroed buffer of `size` bytes aligned to `alignment`
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero, `alignment` is not a power of two,
    /// or the allocation fails.
    pub fn new(size: usize, alignment: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::Config("buffer size must be greater than 0".to_string()));
        }

        let layout = Layout::from_size_align(size, alignment).map_err(|_| {
            Error::Config(format!(
                "invalid buffer layout: size={}, alignment={}",
                size, alignment
            ))
        })?;

        // SAFETY: layout has a non-zero size
        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(Error::syscall(
                "memalign",
                std::io::Error::from(std::io::ErrorKind::OutOfMemory),
            ));
        }

        Ok(AlignedBuffer { ptr, size, layout })
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for size initialized bytes for the lifetime of self
        unsafe { std::slice::from_raw_parts(self.ptr, self.size) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and &mut self guarantees exclusive access
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.size) }
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    /// Verify that the buffer is properly aligned
    #[inline(always)]
    pub fn is_aligned(&self) -> bool {
        (self.ptr as usize) % self.alignment() == 0
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with exactly this layout
        unsafe {
            dealloc(self.ptr, self.layout);
        }
    }
}

// AlignedBuffer is Send because it owns its memory
unsafe impl Send for AlignedBuffer {}
