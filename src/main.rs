//! iolat CLI entry point

use anyhow::{Context, Result};
use iolat::config::{cli::Cli, toml::build_config, validator::validate_config, Config, ExperimentKind};
use iolat::output::{json, text};
use iolat::util::resource::ResourceUsage;
use iolat::worker::{RunOutcome, Worker};
use std::io::Write;
use std::time::Instant;

fn main() -> Result<()> {
    let main_start = Instant::now();

    // Parse CLI arguments
    let cli = Cli::parse_args();
    cli.validate()?;

    // Build configuration: defaults, then config file, then CLI flags
    let config = build_config(&cli).context("Failed to build configuration")?;
    validate_config(&config).context("Configuration validation failed")?;

    if config.run.debug {
        print_configuration(&config);
    }

    let mut worker = Worker::new(&config).context("Failed to set up experiment")?;
    let outcome = worker.run().with_context(|| {
        format!("{} experiment failed", worker.experiment().name())
    })?;

    print_results(&config, &outcome)?;

    if let Some(path) = &config.run.json_output {
        let report = json::build_report(&config, &outcome.summary, &outcome.samples);
        json::write_json_output(path, &report, true)
            .with_context(|| format!("Failed to write JSON report to {}", path.display()))?;
        if config.run.debug {
            eprintln!("DEBUG: JSON report written to {}", path.display());
        }
    }

    if config.run.debug {
        eprintln!(
            "DEBUG TIMING: Total: {:.3}s",
            main_start.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Print the results block, plus resource usage for a verbose mapped run
fn print_results(config: &Config, outcome: &RunOutcome) -> Result<()> {
    text::print_results(&outcome.summary, &outcome.samples)
        .context("Failed to write results")?;

    if config.run.verbose && matches!(config.run.experiment, ExperimentKind::Mmap { .. }) {
        let usage = ResourceUsage::current().context("Failed to read resource usage")?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        usage
            .write_report(&mut out)
            .and_then(|_| out.flush())
            .context("Failed to write resource usage")?;
    }

    Ok(())
}

/// Print the effective configuration to stderr
fn print_configuration(config: &Config) {
    eprintln!("DEBUG: {}", config.bench);
    eprintln!("DEBUG: {}", config.run);
    eprintln!(
        "DEBUG: unit_size={}, warm={}, inspector={}, pin={}",
        config.bench.unit_size(&config.run.experiment),
        config.run.should_warm(),
        config.run.inspector,
        if config.run.pin_cpu {
            format!("cpu {}", config.run.cpu)
        } else {
            "off".to_string()
        }
    );
}
