//! Sequential offset generation
//!
//! Produces block-aligned offsets in ascending order: 0, unit, 2 * unit, ...

/// Ascending offsets covering `[0, file_size)` in steps of `unit_size`
///
/// The caller guarantees `unit_size > 0` and that it divides `file_size`.
pub fn ascending_offsets(file_size: u64, unit_size: u64) -> Vec<u64> {
    let num_blocks = file_size / unit_size;
    (0..num_blocks).map(|block| block * unit_size).collect()
}
