//! util-linux `fincore` inspector
//!
//! Runs `fincore --bytes --noheadings --raw --output RES <path>` and parses the
//! single number it prints. Asking for raw bytes avoids comparing human-readable
//! strings like "1G", which only match for one particular file size.

use super::CacheInspector;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

const DEFAULT_PROGRAM: &str = "fincore";
const FINCORE_ARGS: [&str; 5] = ["--bytes", "--noheadings", "--raw", "--output", "RES"];

/// Page cache inspector backed by the `fincore` tool
#[derive(Debug, Clone)]
pub struct FincoreInspector {
    program: PathBuf,
}

impl FincoreInspector {
    /// Use `fincore` from `PATH`
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Use a specific executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn tool(&self) -> String {
        self.program.display().to_string()
    }
}

impl Default for FincoreInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheInspector for FincoreInspector {
    fn name(&self) -> &str {
        "fincore"
    }

    fn resident_bytes(&self, path: &Path) -> Result<u64> {
        let output = Command::new(&self.program)
            .args(FINCORE_ARGS)
            .arg(path)
            .output()
            .map_err(|e| Error::InspectorUnavailable {
                tool: self.tool(),
                error: e,
            })?;

        if !output.status.success() {
            return Err(Error::InspectorFailed {
                tool: self.tool(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_resident_bytes(&stdout).ok_or_else(|| Error::InspectorOutput {
            tool: self.tool(),
            output: stdout.trim().to_string(),
        })
    }
}

/// Parse the RES column of `fincore --bytes --noheadings --raw`
pub fn parse_resident_bytes(output: &str) -> Option<u64> {
    output.split_whitespace().next()?.parse().ok()
}
