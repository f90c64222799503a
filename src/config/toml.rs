//! TOML configuration file parsing

use super::*;
use crate::config::cli::{Cli, Command};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Build the effective configuration: defaults, then the config file, then CLI flags
pub fn build_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => parse_toml_file(path)?,
        None => Config::default(),
    };
    merge_cli_with_config(cli, config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    if let Some(ref path) = cli.file {
        config.run.path = Some(path.clone());
    }
    if let Some(iterations) = cli.iter {
        config.run.iterations = iterations;
    }
    if let Some(ref size_str) = cli.file_size {
        config.bench.file_size = parse_size(size_str)?;
    }
    if cli.verify_size {
        config.bench.verify_size = true;
    }

    // CPU pinning
    if let Some(cpu) = cli.cpu {
        config.run.pin_cpu = true;
        config.run.cpu = cpu;
    }
    if cli.no_pin {
        config.run.pin_cpu = false;
    }

    if let Some(inspector) = cli.inspector {
        config.run.inspector = inspector;
    }
    if cli.no_warm {
        config.run.warm = false;
    }
    if let Some(ref path) = cli.json_output {
        config.run.json_output = Some(path.clone());
    }
    if cli.debug {
        config.run.debug = true;
    }

    // Experiment selection
    match &cli.command {
        Some(Command::Direct(args)) => {
            // Flags refine the config file's direct settings
            let (mut direction, mut bypass_cache) = match config.run.experiment {
                ExperimentKind::Direct {
                    direction,
                    bypass_cache,
                } => (direction, bypass_cache),
                ExperimentKind::Mmap { .. } => (IoDirection::default(), super::default_bypass_cache()),
            };
            if args.write {
                direction = IoDirection::Write;
            }
            if args.buffered {
                bypass_cache = false;
            }
            config.run.experiment = ExperimentKind::Direct {
                direction,
                bypass_cache,
            };
            if let Some(ref size_str) = args.io_size {
                config.bench.io_size = parse_size(size_str)?;
            }
            if args.rand {
                config.run.randomize = Some(true);
            }
        }
        Some(Command::Mmap(args)) => {
            let (mut backing, mut sharing) = match config.run.experiment {
                ExperimentKind::Mmap { backing, sharing } => (backing, sharing),
                ExperimentKind::Direct { .. } => (MapBacking::default(), MapSharing::default()),
            };
            if args.anon {
                backing = MapBacking::Anonymous;
            }
            if args.private {
                sharing = MapSharing::Private;
            }
            config.run.experiment = ExperimentKind::Mmap { backing, sharing };
            if args.sequential {
                config.run.randomize = Some(false);
            }
            if args.verbose {
                config.run.verbose = true;
            }
        }
        None => {}
    }

    Ok(config)
}

/// Parse size string (e.g., "1G", "100MB", "4k") to bytes
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    if s.is_empty() {
        anyhow::bail!("Empty size string");
    }

    // A trailing B is optional: 4K and 4KB are the same size
    let unit = s
        .strip_suffix('B')
        .filter(|rest| rest.ends_with(&['K', 'M', 'G', 'T'][..]));
    let body = unit.unwrap_or(s.as_str());

    let (num_str, multiplier) = if let Some(n) = body.strip_suffix('K') {
        (n, 1024u64)
    } else if let Some(n) = body.strip_suffix('M') {
        (n, 1024 * 1024)
    } else if let Some(n) = body.strip_suffix('G') {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = body.strip_suffix('T') {
        (n, 1024 * 1024 * 1024 * 1024)
    } else {
        (body, 1)
    };

    let num: u64 = num_str.parse()
        .with_context(|| format!("Invalid number in size: {}", num_str))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Size overflows 64 bits: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size("4k").unwrap(), 4096);
        assert_eq!(parse_size("64M").unwrap(), 64 * 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1 << 30);
        assert_eq!(parse_size(" 2t ").unwrap(), 2 << 40);
        assert!(parse_size("").is_err());
        assert!(parse_size("abcK").is_err());
        assert!(parse_size("99999999999T").is_err());
    }

    #[test]
    fn test_parse_size_byte_suffix() {
        assert_eq!(parse_size("4KB").unwrap(), 4096);
        assert_eq!(parse_size("64mb").unwrap(), 64 * 1024 * 1024);
        assert_eq!(parse_size("1GB").unwrap(), 1 << 30);
        assert_eq!(parse_size("2Tb").unwrap(), 2 << 40);
        assert!(parse_size("4B").is_err());
        assert!(parse_size("GB").is_err());
    }

    #[test]
    fn test_parse_toml_basic() {
        let toml = r#"
[bench]
file_size = 1048576
io_size = 8192
verify_size = true

[run]
path = "/tmp/testfile"
iterations = 10
cpu = 3

[run.experiment]
kind = "direct"
direction = "write"
"#;

        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.bench.file_size, 1048576);
        assert_eq!(config.bench.io_size, 8192);
        assert_eq!(config.bench.marker_byte, b'?');
        assert!(config.bench.verify_size);
        assert_eq!(config.run.iterations, 10);
        assert_eq!(config.run.cpu, 3);
        assert_eq!(
            config.run.experiment,
            ExperimentKind::Direct {
                direction: IoDirection::Write,
                bypass_cache: true
            }
        );
    }

    #[test]
    fn test_parse_toml_mmap() {
        let toml = r#"
[run]
path = "/tmp/testfile"
inspector = "mincore"

[run.experiment]
kind = "mmap"
sharing = "private"
"#;

        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.run.inspector, InspectorType::Mincore);
        match config.run.experiment {
            ExperimentKind::Mmap { backing, sharing } => {
                assert_eq!(backing, MapBacking::File);
                assert_eq!(sharing, MapSharing::Private);
            }
            _ => panic!("Expected mmap experiment"),
        }
        assert!(config.run.randomize());
    }

    #[test]
    fn test_parse_toml_rejects_unknown_kind() {
        let toml = r#"
[run.experiment]
kind = "io_uring"
"#;
        assert!(parse_toml_string(toml).is_err());
    }

    #[test]
    fn test_cli_overrides_toml() {
        let toml = r#"
[bench]
file_size = 1048576

[run]
path = "/tmp/from_toml"
iterations = 10
"#;
        let config = parse_toml_string(toml).unwrap();
        let cli = Cli::try_parse_from([
            "iolat", "--file", "/tmp/from_cli", "--file-size", "64k", "--no-pin",
            "direct", "--rand", "--buffered",
        ])
        .unwrap();

        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert_eq!(merged.run.path, Some(PathBuf::from("/tmp/from_cli")));
        assert_eq!(merged.run.iterations, 10);
        assert_eq!(merged.bench.file_size, 64 * 1024);
        assert!(!merged.run.pin_cpu);
        assert!(merged.run.randomize());
        assert_eq!(
            merged.run.experiment,
            ExperimentKind::Direct {
                direction: IoDirection::Read,
                bypass_cache: false
            }
        );
    }

    #[test]
    fn test_cli_mmap_defaults_to_random() {
        let cli = Cli::try_parse_from(["iolat", "--file", "/tmp/f", "mmap", "--priv"]).unwrap();
        let merged = merge_cli_with_config(&cli, Config::default()).unwrap();
        assert!(merged.run.randomize());
        assert!(!merged.run.verbose);

        let cli = Cli::try_parse_from(["iolat", "--file", "/tmp/f", "mmap", "--sequential"]).unwrap();
        let merged = merge_cli_with_config(&cli, Config::default()).unwrap();
        assert!(!merged.run.randomize());
    }

    #[test]
    fn test_direct_subcommand_keeps_toml_settings() {
        let toml = r#"
[run]
path = "/tmp/from_toml"
randomize = true

[run.experiment]
kind = "direct"
direction = "write"
bypass_cache = false
"#;
        let config = parse_toml_string(toml).unwrap();
        let cli = Cli::try_parse_from(["iolat", "direct"]).unwrap();

        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert!(merged.run.randomize());
        assert_eq!(
            merged.run.experiment,
            ExperimentKind::Direct {
                direction: IoDirection::Write,
                bypass_cache: false
            }
        );
    }

    #[test]
    fn test_direct_flags_refine_toml() {
        let toml = r#"
[run.experiment]
kind = "direct"
direction = "read"
"#;
        let config = parse_toml_string(toml).unwrap();
        let cli = Cli::try_parse_from(["iolat", "--file", "/tmp/f", "direct", "--write", "--rand"]).unwrap();

        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert!(merged.run.randomize());
        assert_eq!(
            merged.run.experiment,
            ExperimentKind::Direct {
                direction: IoDirection::Write,
                bypass_cache: true
            }
        );
    }

    #[test]
    fn test_mmap_subcommand_keeps_toml_settings() {
        let toml = r#"
[run]
randomize = false

[run.experiment]
kind = "mmap"
backing = "anonymous"
sharing = "private"
"#;
        let config = parse_toml_string(toml).unwrap();
        let cli = Cli::try_parse_from(["iolat", "--file", "/tmp/f", "mmap"]).unwrap();

        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert!(!merged.run.randomize());
        assert_eq!(
            merged.run.experiment,
            ExperimentKind::Mmap {
                backing: MapBacking::Anonymous,
                sharing: MapSharing::Private
            }
        );
    }

    #[test]
    fn test_subcommand_switches_experiment_kind() {
        let toml = r#"
[run.experiment]
kind = "mmap"
sharing = "private"
"#;
        let config = parse_toml_string(toml).unwrap();
        let cli = Cli::try_parse_from(["iolat", "--file", "/tmp/f", "direct"]).unwrap();

        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert_eq!(merged.run.experiment, ExperimentKind::default());
        assert!(!merged.run.randomize());
    }
}
