//! JSON output formatting
//!
//! Optional machine-readable report of a completed run: what was measured,
//! when, every sample in seconds and the summary statistics.

use crate::config::Config;
use crate::stats::Summary;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Top-level JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    /// RFC 3339 completion time
    pub timestamp: String,
    pub test_config: JsonTestConfig,
    pub summary: Summary,
    /// Per-trial elapsed time in seconds, in run order
    pub samples_secs: Vec<f64>,
}

/// Settings the samples were taken under
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTestConfig {
    /// Human-readable experiment description, e.g. "mmap shared file"
    pub experiment: String,
    pub path: Option<String>,
    pub file_size: u64,
    pub unit_size: u64,
    pub randomize: bool,
    pub iterations: usize,
    pub warmed: bool,
    /// Pinned core, if pinning was requested
    pub cpu: Option<usize>,
}

/// Build the test configuration section from the effective config
pub fn build_test_config(config: &Config) -> JsonTestConfig {
    let run = &config.run;
    JsonTestConfig {
        experiment: run.experiment.to_string(),
        path: run.path.as_ref().map(|p| p.display().to_string()),
        file_size: config.bench.file_size,
        unit_size: config.bench.unit_size(&run.experiment),
        randomize: run.randomize(),
        iterations: run.iterations,
        warmed: run.should_warm(),
        cpu: run.pin_cpu.then_some(run.cpu),
    }
}

/// Assemble a report timestamped now
pub fn build_report(config: &Config, summary: &Summary, samples: &[f64]) -> JsonReport {
    build_report_at(Utc::now(), config, summary, samples)
}

fn build_report_at(
    time: DateTime<Utc>,
    config: &Config,
    summary: &Summary,
    samples: &[f64],
) -> JsonReport {
    JsonReport {
        timestamp: time.to_rfc3339(),
        test_config: build_test_config(config),
        summary: *summary,
        samples_secs: samples.to_vec(),
    }
}

/// Write the report to `output_path`
pub fn write_json_output(output_path: &Path, report: &JsonReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path).map_err(|e| Error::syscall("create", e))?;
    let mut writer = BufWriter::new(file);

    let written = if pretty {
        serde_json::to_writer_pretty(&mut writer, report)
    } else {
        serde_json::to_writer(&mut writer, report)
    };
    written.map_err(|e| Error::syscall("write", e.into()))?;

    writer.flush().map_err(|e| Error::syscall("write", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExperimentKind, MapBacking, MapSharing};
    use crate::stats::summarize;
    use chrono::TimeZone;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn mmap_config() -> Config {
        let mut config = Config::default();
        config.bench.file_size = 1 << 20;
        config.bench.page_size = 4096;
        config.run.path = Some(PathBuf::from("/data/1m.bin"));
        config.run.iterations = 2;
        config.run.experiment = ExperimentKind::Mmap {
            backing: MapBacking::File,
            sharing: MapSharing::Private,
        };
        config
    }

    #[test]
    fn test_build_test_config() {
        let test_config = build_test_config(&mmap_config());
        assert_eq!(test_config.path.as_deref(), Some("/data/1m.bin"));
        assert_eq!(test_config.unit_size, 4096);
        assert!(test_config.randomize);
        assert!(test_config.warmed);
        assert_eq!(test_config.cpu, Some(0));
        assert!(test_config.experiment.starts_with("mmap"));
    }

    #[test]
    fn test_report_timestamp() {
        let samples = [0.5, 1.5];
        let summary = summarize(&samples).unwrap();
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        let report = build_report_at(time, &mmap_config(), &summary, &samples);
        assert_eq!(report.timestamp, "2024-03-01T12:30:00+00:00");
        assert_eq!(report.samples_secs, vec![0.5, 1.5]);
        assert_eq!(report.summary.mean, 1.0);
    }

    #[test]
    fn test_write_json_output() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.json");

        let samples = [0.25, 0.75];
        let summary = summarize(&samples).unwrap();
        let report = build_report(&mmap_config(), &summary, &samples);

        write_json_output(&path, &report, true).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["summary"]["mean"], 0.5);
        assert_eq!(value["summary"]["std_dev"], 0.25);
        assert_eq!(value["samples_secs"][1], 0.75);
        assert_eq!(value["test_config"]["iterations"], 2);
    }

    #[test]
    fn test_write_json_output_bad_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("report.json");

        let samples = [1.0];
        let summary = summarize(&samples).unwrap();
        let report = build_report(&mmap_config(), &summary, &samples);

        let err = write_json_output(&path, &report, false).unwrap_err();
        assert_eq!(err.operation(), Some("create"));
    }
}
