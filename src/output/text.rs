//! Human-readable text output
//!
//! Results go to stdout, one trial per line after the summary; progress
//! lines go to stderr while the run is in flight.

use crate::stats::Summary;
use std::io::{self, Write};

/// Write the summary and every sample, in seconds with six decimals
pub fn write_results<W: Write>(out: &mut W, summary: &Summary, samples: &[f64]) -> io::Result<()> {
    writeln!(out, "Mean:     {:.6}", summary.mean)?;
    writeln!(out, "SD:       {:.6}", summary.std_dev)?;
    for (i, sample) in samples.iter().enumerate() {
        writeln!(out, "Sample {}: {:.6}", i, sample)?;
    }
    Ok(())
}

/// Print results to stdout
pub fn print_results(summary: &Summary, samples: &[f64]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results(&mut out, summary, samples)?;
    out.flush()
}

/// Progress line for one completed trial
pub fn progress_line(iteration: usize, elapsed_micros: u64) -> String {
    format!("Iteration {}: {}μs", iteration, elapsed_micros)
}
