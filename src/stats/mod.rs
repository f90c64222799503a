//! Sample statistics
//!
//! Each trial yields one elapsed time in microseconds. The aggregator keeps
//! them in run order, converted to seconds, and summarizes them with the
//! arithmetic mean and the population standard deviation (divide by n, not
//! n - 1).
//!
//! # Example
//!
//! ```
//! use iolat::stats::StatsAggregator;
//!
//! let mut stats = StatsAggregator::new();
//! stats.record(2_000_000);
//! stats.record(4_000_000);
//!
//! let summary = stats.summarize()?;
//! assert_eq!(summary.mean, 3.0);
//! assert_eq!(summary.std_dev, 1.0);
//! # Ok::<(), iolat::Error>(())
//! ```

use crate::util::time::micros_to_secs;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Mean and spread of a sample set, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Summarize `samples`
///
/// # Errors
///
/// Returns [`Error::EmptySamples`] for an empty slice instead of producing NaN.
pub fn summarize(samples: &[f64]) -> Result<Summary> {
    if samples.is_empty() {
        return Err(Error::EmptySamples);
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(Summary {
        mean,
        std_dev: variance.sqrt(),
        min,
        max,
        count: samples.len(),
    })
}

/// Ordered collection of per-trial samples
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    samples: Vec<f64>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for a known number of iterations
    pub fn with_capacity(iterations: usize) -> Self {
        Self {
            samples: Vec::with_capacity(iterations),
        }
    }

    /// Append one trial's elapsed time
    pub fn record(&mut self, elapsed_micros: u64) {
        self.samples.push(micros_to_secs(elapsed_micros));
    }

    /// Samples in seconds, in recording order
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn summarize(&self) -> Result<Summary> {
        summarize(&self.samples)
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_single_sample() {
        let summary = summarize(&[0.25]).unwrap();
        assert_eq!(summary.mean, 0.25);
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.min, 0.25);
        assert_eq!(summary.max, 0.25);
        assert_eq!(summary.count, 1);
    }

    #[test]
    fn test_population_std_dev() {
        let summary = summarize(&[2.0, 4.0]).unwrap();
        assert_eq!(summary.mean, 3.0);
        assert_eq!(summary.std_dev, 1.0);

        // Sample SD would be ~2.138 here; population SD is exactly 2
        let summary = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(summary.mean, 5.0);
        assert_eq!(summary.std_dev, 2.0);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);
    }

    #[test]
    fn test_empty_samples_rejected() {
        let err = summarize(&[]).unwrap_err();
        assert!(matches!(err, Error::EmptySamples));
        assert_eq!(err.kind(), ErrorKind::Precondition);

        assert!(StatsAggregator::new().summarize().is_err());
    }

    #[test]
    fn test_aggregator_converts_to_seconds() {
        let mut stats = StatsAggregator::with_capacity(3);
        assert!(stats.is_empty());

        stats.record(1_500_000);
        stats.record(250);
        stats.record(0);

        assert_eq!(stats.len(), 3);
        assert_eq!(stats.samples(), &[1.5, 0.00025, 0.0]);
        assert_eq!(stats.into_samples().len(), 3);
    }

    #[test]
    fn test_aggregator_summary() {
        let mut stats = StatsAggregator::new();
        stats.record(2_000_000);
        stats.record(4_000_000);

        let summary = stats.summarize().unwrap();
        assert_eq!(summary.mean, 3.0);
        assert_eq!(summary.std_dev, 1.0);
        assert_eq!(summary.count, 2);
    }
}
