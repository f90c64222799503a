//! CLI argument parsing using clap

use super::InspectorType;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// iolat - direct IO vs memory-mapped IO latency harness
#[derive(Parser, Debug)]
#[command(name = "iolat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Target file (must be exactly --file-size bytes)
    #[arg(long, global = true, env = "IOLAT_FILE")]
    pub file: Option<PathBuf>,

    /// Number of timed iterations
    #[arg(long, global = true)]
    pub iter: Option<usize>,

    /// TOML configuration file (CLI flags take precedence)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Expected size of the target file (e.g., 1G, 64M)
    #[arg(long, global = true)]
    pub file_size: Option<String>,

    /// Check the file size after every open
    #[arg(long, global = true)]
    pub verify_size: bool,

    /// CPU core to pin the process to (default: 0)
    #[arg(long, global = true)]
    pub cpu: Option<usize>,

    /// Do not pin the process to a CPU core
    #[arg(long, global = true, conflicts_with = "cpu")]
    pub no_pin: bool,

    /// How page cache residency is verified after warm-up
    #[arg(long, global = true, value_enum)]
    pub inspector: Option<InspectorType>,

    /// Skip the page cache warm-up pass
    #[arg(long, global = true)]
    pub no_warm: bool,

    /// Write a JSON report to this path
    #[arg(long, global = true)]
    pub json_output: Option<PathBuf>,

    /// Enable debug output on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Experiment to run (defaults to the config file's, then `direct`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Experiment selection
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Seek + read/write fixed-size blocks, bypassing the page cache
    Direct(DirectArgs),
    /// Write one byte per page through a memory mapping
    Mmap(MmapArgs),
}

/// Options for the direct IO experiment
#[derive(Args, Debug, Clone, Default)]
pub struct DirectArgs {
    /// Visit blocks in random order
    #[arg(long)]
    pub rand: bool,

    /// Write blocks instead of reading them
    #[arg(long)]
    pub write: bool,

    /// Block size (e.g., 4k)
    #[arg(long)]
    pub io_size: Option<String>,

    /// Open without O_DIRECT (for filesystems that reject it, e.g. tmpfs)
    #[arg(long)]
    pub buffered: bool,
}

/// Options for the memory-mapped experiment
#[derive(Args, Debug, Clone, Default)]
pub struct MmapArgs {
    /// Use an anonymous mapping instead of mapping the file
    #[arg(long)]
    pub anon: bool,

    /// Use a private copy-on-write mapping instead of a shared one
    #[arg(long = "priv")]
    pub private: bool,

    /// Print process resource usage after the results
    #[arg(long)]
    pub verbose: bool,

    /// Touch pages in ascending order instead of a random permutation
    #[arg(long)]
    pub sequential: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(0) = self.iter {
            anyhow::bail!("iter must be at least 1");
        }
        if self.file.is_none() && self.config.is_none() {
            anyhow::bail!("must specify --file or a --config file with run.path");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direct() {
        let cli = Cli::try_parse_from([
            "iolat", "--file", "/tmp/f", "--iter", "5", "direct", "--rand", "--write",
        ])
        .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("/tmp/f")));
        assert_eq!(cli.iter, Some(5));
        match &cli.command {
            Some(Command::Direct(args)) => {
                assert!(args.rand);
                assert!(args.write);
                assert!(!args.buffered);
            }
            other => panic!("Expected direct command, got {:?}", other),
        }
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_parse_mmap_flags() {
        let cli = Cli::try_parse_from([
            "iolat", "mmap", "--anon", "--priv", "--verbose", "--file", "/tmp/f",
        ])
        .unwrap();
        match &cli.command {
            Some(Command::Mmap(args)) => {
                assert!(args.anon);
                assert!(args.private);
                assert!(args.verbose);
                assert!(!args.sequential);
            }
            other => panic!("Expected mmap command, got {:?}", other),
        }
    }

    #[test]
    fn test_cpu_conflicts_with_no_pin() {
        let result = Cli::try_parse_from(["iolat", "--cpu", "2", "--no-pin", "direct"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_zero_iterations() {
        let cli = Cli::try_parse_from(["iolat", "--file", "/tmp/f", "--iter", "0"]).unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_validate_requires_target() {
        let cli = Cli::try_parse_from(["iolat", "direct"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
