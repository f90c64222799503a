//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//!
//! Configuration is split in two:
//!
//! - [`BenchConfig`] holds the constants every component is built from (file
//!   size, unit sizes, marker byte). It is immutable once constructed and is
//!   passed by reference into each component.
//! - [`RunConfig`] describes one invocation: which file, how many iterations,
//!   which experiment and its mode flags.

pub mod cli;
pub mod toml;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bench: BenchConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Constants shared by every component of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Exact byte length the target file must have
    #[serde(default = "default_file_size")]
    pub file_size: u64,
    /// Unit size for memory-mapped access
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Unit size (and buffer alignment) for direct IO
    #[serde(default = "default_io_size")]
    pub io_size: u64,
    /// Byte stored at every touched offset by the mapped experiment
    #[serde(default = "default_marker_byte")]
    pub marker_byte: u8,
    /// Check the file size after every open
    #[serde(default)]
    pub verify_size: bool,
}

/// 1 GiB
pub const DEFAULT_FILE_SIZE: u64 = 1 << 30;

/// Default direct IO unit
pub const DEFAULT_IO_SIZE: u64 = 4096;

pub const DEFAULT_MARKER_BYTE: u8 = b'?';

fn default_file_size() -> u64 {
    DEFAULT_FILE_SIZE
}

fn default_io_size() -> u64 {
    DEFAULT_IO_SIZE
}

fn default_marker_byte() -> u8 {
    DEFAULT_MARKER_BYTE
}

fn default_page_size() -> u64 {
    system_page_size()
}

/// Page size reported by the OS, falling back to 4 KiB if sysconf fails
pub fn system_page_size() -> u64 {
    // SAFETY: sysconf has no memory-safety preconditions
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as u64
    } else {
        4096
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            file_size: default_file_size(),
            page_size: default_page_size(),
            io_size: default_io_size(),
            marker_byte: default_marker_byte(),
            verify_size: false,
        }
    }
}

impl BenchConfig {
    /// Same defaults with a different file size (mostly for tests)
    pub fn with_file_size(file_size: u64) -> Self {
        Self {
            file_size,
            ..Self::default()
        }
    }

    /// Unit size used by the given experiment
    pub fn unit_size(&self, experiment: &ExperimentKind) -> u64 {
        match experiment {
            ExperimentKind::Direct { .. } => self.io_size,
            ExperimentKind::Mmap { .. } => self.page_size,
        }
    }
}

/// Per-invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Target file
    pub path: Option<PathBuf>,
    /// Number of timed trials
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Experiment to run
    #[serde(default)]
    pub experiment: ExperimentKind,
    /// Permute positions; `None` uses the experiment's default order
    #[serde(default)]
    pub randomize: Option<bool>,
    /// Pin the process to `cpu` before warming
    #[serde(default = "default_pin_cpu")]
    pub pin_cpu: bool,
    /// Core to pin to
    #[serde(default)]
    pub cpu: usize,
    /// How page cache residency is checked
    #[serde(default)]
    pub inspector: InspectorType,
    /// Warm the page cache before the first trial
    #[serde(default = "default_warm")]
    pub warm: bool,
    /// Print process resource usage after the results
    #[serde(default)]
    pub verbose: bool,
    /// Write a JSON report here
    pub json_output: Option<PathBuf>,
    /// Enable debug output on stderr
    #[serde(default)]
    pub debug: bool,
}

fn default_iterations() -> usize {
    1
}

fn default_pin_cpu() -> bool {
    true
}

fn default_warm() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            path: None,
            iterations: default_iterations(),
            experiment: ExperimentKind::default(),
            randomize: None,
            pin_cpu: default_pin_cpu(),
            cpu: 0,
            inspector: InspectorType::default(),
            warm: default_warm(),
            verbose: false,
            json_output: None,
            debug: false,
        }
    }
}

impl RunConfig {
    /// Effective position order for this run
    ///
    /// The direct experiment defaults to sequential order, the mapped
    /// experiment to a random permutation.
    pub fn randomize(&self) -> bool {
        self.randomize.unwrap_or(match self.experiment {
            ExperimentKind::Direct { .. } => false,
            ExperimentKind::Mmap { .. } => true,
        })
    }

    /// Whether the page cache should be warmed before timing
    ///
    /// Anonymous mappings never touch file content, so warming is skipped.
    pub fn should_warm(&self) -> bool {
        self.warm && !self.experiment.is_anonymous()
    }
}

/// Experiment variant and its mode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExperimentKind {
    /// Seek + read/write of `io_size` blocks
    Direct {
        #[serde(default)]
        direction: IoDirection,
        /// Open with O_DIRECT
        #[serde(default = "default_bypass_cache")]
        bypass_cache: bool,
    },
    /// One marker byte written per page of a mapping
    Mmap {
        #[serde(default)]
        backing: MapBacking,
        #[serde(default)]
        sharing: MapSharing,
    },
}

fn default_bypass_cache() -> bool {
    true
}

impl Default for ExperimentKind {
    fn default() -> Self {
        Self::Direct {
            direction: IoDirection::default(),
            bypass_cache: default_bypass_cache(),
        }
    }
}

impl ExperimentKind {
    pub fn is_anonymous(&self) -> bool {
        matches!(
            self,
            ExperimentKind::Mmap {
                backing: MapBacking::Anonymous,
                ..
            }
        )
    }
}

/// Transfer direction for the direct experiment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoDirection {
    #[default]
    Read,
    Write,
}

/// What backs a mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapBacking {
    #[default]
    File,
    Anonymous,
}

/// Whether mapped writes are visible to other mappings of the file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapSharing {
    #[default]
    Shared,
    Private,
}

/// Page cache residency checker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InspectorType {
    /// util-linux `fincore` subprocess
    #[default]
    Fincore,
    /// In-process `mincore(2)`
    Mincore,
}

// Display trait implementations

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Bench: {}", self.bench)?;
        writeln!(f, "  Run:   {}", self.run)?;
        Ok(())
    }
}

impl fmt::Display for BenchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file_size={}, page_size={}, io_size={}, marker={:#04x}",
            self.file_size, self.page_size, self.io_size, self.marker_byte
        )?;
        if self.verify_size {
            write!(f, ", verify_size")?;
        }
        Ok(())
    }
}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string());
        write!(
            f,
            "{} on {}, iterations={}, order={}",
            self.experiment,
            path,
            self.iterations,
            if self.randomize() { "random" } else { "sequential" }
        )
    }
}

impl fmt::Display for ExperimentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentKind::Direct {
                direction,
                bypass_cache,
            } => {
                write!(f, "direct {}", direction)?;
                if !bypass_cache {
                    write!(f, " (buffered)")?;
                }
                Ok(())
            }
            ExperimentKind::Mmap { backing, sharing } => {
                write!(f, "mmap {} {}", sharing, backing)
            }
        }
    }
}

impl fmt::Display for IoDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoDirection::Read => write!(f, "read"),
            IoDirection::Write => write!(f, "write"),
        }
    }
}

impl fmt::Display for MapBacking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapBacking::File => write!(f, "file-backed"),
            MapBacking::Anonymous => write!(f, "anonymous"),
        }
    }
}

impl fmt::Display for MapSharing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapSharing::Shared => write!(f, "shared"),
            MapSharing::Private => write!(f, "private"),
        }
    }
}

impl fmt::Display for InspectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectorType::Fincore => write!(f, "fincore"),
            InspectorType::Mincore => write!(f, "mincore"),
        }
    }
}
