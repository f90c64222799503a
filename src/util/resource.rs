//! Process resource usage
//!
//! Snapshot of `getrusage(RUSAGE_SELF)`, printed after a mapped run with
//! `--verbose` to show how many page faults and block operations the trials
//! caused.

use crate::{Error, Result};
use std::fmt;
use std::io::Write;

/// Resource usage counters for the current process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    /// User CPU time, whole seconds
    pub user_cpu_secs: i64,
    /// System CPU time, whole seconds
    pub system_cpu_secs: i64,
    /// Maximum resident set size (KiB on Linux)
    pub max_rss: i64,
    /// Page reclaims (soft page faults)
    pub minor_faults: i64,
    /// Hard page faults
    pub major_faults: i64,
    pub block_input_ops: i64,
    pub block_output_ops: i64,
    pub voluntary_switches: i64,
    pub involuntary_switches: i64,
}

impl ResourceUsage {
    /// Take a snapshot for the calling process
    pub fn current() -> Result<Self> {
        // SAFETY: rusage is plain old data; getrusage fills it in
        let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
        if ret == -1 {
            return Err(Error::last_os_error("getrusage"));
        }

        Ok(Self {
            user_cpu_secs: usage.ru_utime.tv_sec as i64,
            system_cpu_secs: usage.ru_stime.tv_sec as i64,
            max_rss: usage.ru_maxrss as i64,
            minor_faults: usage.ru_minflt as i64,
            major_faults: usage.ru_majflt as i64,
            block_input_ops: usage.ru_inblock as i64,
            block_output_ops: usage.ru_oublock as i64,
            voluntary_switches: usage.ru_nvcsw as i64,
            involuntary_switches: usage.ru_nivcsw as i64,
        })
    }

    /// Write the counters, one per line
    pub fn write_report<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "{}", self)
    }
}

impl fmt::Display for ResourceUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "User CPU time used:               {}", self.user_cpu_secs)?;
        writeln!(f, "System CPU time used:             {}", self.system_cpu_secs)?;
        writeln!(f, "Maximum resident set size:        {}", self.max_rss)?;
        writeln!(f, "Page reclaims (soft page faults): {}", self.minor_faults)?;
        writeln!(f, "Page faults (hard page faults):   {}", self.major_faults)?;
        writeln!(f, "Block input operations:           {}", self.block_input_ops)?;
        writeln!(f, "Block output operations:          {}", self.block_output_ops)?;
        writeln!(f, "Voluntary context switches:       {}", self.voluntary_switches)?;
        writeln!(f, "Involuntary context switches:     {}", self.involuntary_switches)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_usage() {
        let usage = ResourceUsage::current().unwrap();
        assert!(usage.max_rss > 0);
        assert!(usage.user_cpu_secs >= 0);
    }

    #[test]
    fn test_minor_faults_grow_with_touched_pages() {
        let before = ResourceUsage::current().unwrap();
        let mut data = vec![0u8; 8 << 20];
        for i in (0..data.len()).step_by(4096) {
            data[i] = 1;
        }
        std::hint::black_box(&data);
        let after = ResourceUsage::current().unwrap();
        assert!(after.minor_faults >= before.minor_faults);
    }

    #[test]
    fn test_report_format() {
        let usage = ResourceUsage {
            minor_faults: 42,
            ..ResourceUsage::default()
        };
        let mut out = Vec::new();
        usage.write_report(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 9);
        assert!(text.contains("Page reclaims (soft page faults): 42\n"));
    }
}
