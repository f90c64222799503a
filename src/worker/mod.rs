//! Benchmark run loop
//!
//! The [`Worker`] drives one invocation from start to finish:
//!
//! 1. Check the target file size up front (file-backed experiments only)
//! 2. Pin the process to the configured core (warning on failure)
//! 3. Warm the page cache and verify residency, unless disabled or anonymous
//! 4. For each iteration: generate a fresh position sequence, run one timed
//!    trial, report progress and record the sample
//! 5. Summarize the samples
//!
//! Nothing is retried. The first error ends the run and is returned to the
//! caller, which decides how to exit.
//!
//! # Example
//!
//! ```no_run
//! use iolat::config::Config;
//! use iolat::worker::Worker;
//! use std::path::PathBuf;
//!
//! let mut config = Config::default();
//! config.run.path = Some(PathBuf::from("/data/1g.bin"));
//! config.run.iterations = 10;
//!
//! let mut worker = Worker::new(&config)?;
//! let outcome = worker.run()?;
//! println!("mean {:.6}s", outcome.summary.mean);
//! # Ok::<(), iolat::Error>(())
//! ```

pub mod affinity;

use crate::cache::{build_inspector, CacheInspector, CacheWarmer};
use crate::config::Config;
use crate::distribution::PositionGenerator;
use crate::engine::{build_experiment, IOExperiment};
use crate::output::text::progress_line;
use crate::stats::{StatsAggregator, Summary};
use crate::target::file::check_file_size;
use crate::util::time::format_duration;
use crate::{Error, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Samples and summary of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: Summary,
    /// Per-trial elapsed time in seconds, in run order
    pub samples: Vec<f64>,
}

/// Executes the configured experiment for every iteration
pub struct Worker {
    config: Config,
    path: PathBuf,
    experiment: Box<dyn IOExperiment>,
    generator: PositionGenerator,
    inspector: Option<Box<dyn CacheInspector>>,
}

impl Worker {
    /// Build the experiment and cache inspector described by `config`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no target path is set, or any error
    /// from constructing the experiment (e.g. buffer allocation).
    pub fn new(config: &Config) -> Result<Self> {
        let path = config
            .run
            .path
            .clone()
            .ok_or_else(|| Error::Config("no target file given".to_string()))?;

        let experiment = build_experiment(&config.bench, config.run.experiment)?;

        Ok(Self {
            config: config.clone(),
            path,
            experiment,
            generator: PositionGenerator::new(&config.bench),
            inspector: Some(build_inspector(config.run.inspector)),
        })
    }

    /// Replace the cache inspector selected by the configuration
    pub fn with_inspector(mut self, inspector: Box<dyn CacheInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    pub fn experiment(&self) -> &dyn IOExperiment {
        self.experiment.as_ref()
    }

    /// Run with progress lines on stderr
    pub fn run(&mut self) -> Result<RunOutcome> {
        let stderr = io::stderr();
        let mut progress = stderr.lock();
        self.run_with_progress(&mut progress)
    }

    /// Run, writing one progress line per completed trial to `progress`
    pub fn run_with_progress<W: Write>(&mut self, progress: &mut W) -> Result<RunOutcome> {
        let run = self.config.run.clone();
        let debug = run.debug;

        if !run.experiment.is_anonymous() {
            check_file_size(&self.path, self.config.bench.file_size)?;
        }

        if run.pin_cpu {
            match affinity::pin_to_core(run.cpu) {
                Ok(()) => {
                    if debug {
                        eprintln!("DEBUG: Pinned to CPU {}", run.cpu);
                    }
                }
                Err(e) => eprintln!("Warning: Failed to pin to CPU {}: {}", run.cpu, e),
            }
        }

        if run.should_warm() {
            self.warm_cache()?;
        } else if debug {
            eprintln!("DEBUG: Skipping cache warm-up");
        }

        let unit_size = self.experiment.unit_size();
        let randomize = run.randomize();
        let mut stats = StatsAggregator::with_capacity(run.iterations);

        for iteration in 0..run.iterations {
            let positions = self.generator.generate(unit_size, randomize)?;
            let elapsed_micros = self.experiment.run(&self.path, &positions)?;

            writeln!(progress, "{}", progress_line(iteration, elapsed_micros))
                .map_err(|e| Error::syscall("write", e))?;
            stats.record(elapsed_micros);
        }

        let summary = stats.summarize()?;
        Ok(RunOutcome {
            summary,
            samples: stats.into_samples(),
        })
    }

    fn warm_cache(&mut self) -> Result<()> {
        let inspector = match self.inspector.take() {
            Some(inspector) => inspector,
            None => build_inspector(self.config.run.inspector),
        };
        let warmer = CacheWarmer::new(&self.config.bench, inspector);

        if self.config.run.debug {
            eprintln!(
                "DEBUG: Warming {} with {} verification",
                self.path.display(),
                warmer.inspector().name()
            );
        }

        let report = warmer.warm_and_verify(&self.path)?;

        if self.config.run.debug {
            eprintln!(
                "DEBUG: Warmed {} bytes, {} resident, took {}",
                report.bytes_read,
                report.resident_bytes,
                format_duration(Duration::from_micros(report.elapsed_micros))
            );
        }

        Ok(())
    }
}
