//! Access position generation
//!
//! This module produces the byte offsets a trial touches. A trial covers the
//! whole file exactly once in `unit_size` steps, either in ascending order or
//! as a uniformly random permutation of the same offsets.
//!
//! # Block-Based Design
//!
//! Offsets are generated as block numbers multiplied by the unit size, so every
//! offset is naturally aligned to the unit (required for O_DIRECT, and for the
//! mapped experiment it lands exactly on a page boundary).
//!
//! # Example
//!
//! ```
//! use iolat::distribution::PositionGenerator;
//!
//! let generator = PositionGenerator::with_file_size(16384);
//! let positions = generator.generate(4096, false).unwrap();
//! assert_eq!(positions.as_slice(), &[0, 4096, 8192, 12288]);
//! ```

pub mod permutation;
pub mod sequential;

use crate::config::validator::check_unit_size;
use crate::config::BenchConfig;
use crate::Result;

/// Ordered byte offsets for one trial
///
/// Created fresh per iteration and owned by that iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSequence {
    unit_size: u64,
    offsets: Vec<u64>,
}

impl PositionSequence {
    pub fn unit_size(&self) -> u64 {
        self.unit_size
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.offsets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u64> {
        self.offsets.iter()
    }
}

impl<'a> IntoIterator for &'a PositionSequence {
    type Item = &'a u64;
    type IntoIter = std::slice::Iter<'a, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.offsets.iter()
    }
}

/// Builds position sequences covering a file of fixed size
#[derive(Debug, Clone, Copy)]
pub struct PositionGenerator {
    file_size: u64,
}

impl PositionGenerator {
    /// Create a generator for the configured file size
    pub fn new(config: &BenchConfig) -> Self {
        Self::with_file_size(config.file_size)
    }

    pub fn with_file_size(file_size: u64) -> Self {
        Self { file_size }
    }

    /// Generate `file_size / unit_size` offsets `{0, unit_size, ..., file_size - unit_size}`
    ///
    /// With `randomize` the offsets are shuffled with a generator freshly seeded
    /// from the clock, so no two calls share a seed and runs are not
    /// reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUnitSize`] if `unit_size` is zero or does
    /// not divide the file size.
    pub fn generate(&self, unit_size: u64, randomize: bool) -> Result<PositionSequence> {
        check_unit_size(unit_size, self.file_size)?;

        let mut offsets = sequential::ascending_offsets(self.file_size, unit_size);
        if randomize {
            permutation::shuffle_time_seeded(&mut offsets);
        }

        Ok(PositionSequence { unit_size, offsets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::collections::HashSet;

    #[test]
    fn test_sequential_positions() {
        let generator = PositionGenerator::with_file_size(1 << 20);

        for unit in [512u64, 4096, 65536, 1 << 20] {
            let positions = generator.generate(unit, false).unwrap();
            assert_eq!(positions.len() as u64, (1 << 20) / unit);
            assert_eq!(positions.unit_size(), unit);
            for (i, &offset) in positions.iter().enumerate() {
                assert_eq!(offset, i as u64 * unit);
            }
        }
    }

    #[test]
    fn test_random_positions_are_permutation() {
        let generator = PositionGenerator::with_file_size(1 << 20);
        let sequential = generator.generate(4096, false).unwrap();
        let random = generator.generate(4096, true).unwrap();

        assert_eq!(random.len(), sequential.len());

        let expected: HashSet<u64> = sequential.iter().copied().collect();
        let actual: HashSet<u64> = random.iter().copied().collect();
        assert_eq!(actual.len(), random.len(), "offsets must be distinct");
        assert_eq!(actual, expected);

        let mut sorted = random.as_slice().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, sequential.as_slice());
    }

    #[test]
    fn test_random_positions_differ_between_calls() {
        // 256 offsets: two equal permutations (or the identity) is vanishingly unlikely
        let generator = PositionGenerator::with_file_size(1 << 20);
        let sequential = generator.generate(4096, false).unwrap();
        let a = generator.generate(4096, true).unwrap();
        let b = generator.generate(4096, true).unwrap();

        assert_ne!(a, sequential);
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_non_dividing_unit() {
        let generator = PositionGenerator::with_file_size(10000);
        let err = generator.generate(4096, false).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidUnitSize {
                unit_size: 4096,
                file_size: 10000
            }
        ));
    }

    #[test]
    fn test_rejects_zero_unit() {
        let generator = PositionGenerator::with_file_size(4096);
        assert!(generator.generate(0, true).is_err());
    }

    #[test]
    fn test_from_config() {
        let config = BenchConfig::with_file_size(8192);
        let positions = PositionGenerator::new(&config).generate(4096, false).unwrap();
        assert_eq!(positions.as_slice(), &[0, 4096]);
    }
}
