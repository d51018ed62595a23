//! Load probes.

use sysinfo::{Pid, System};

/// Source of a worker's current load percentage.
pub trait LoadProbe: Send + 'static {
    fn sample(&mut self) -> i64;
}

/// CPU usage of the current process, normalised to 0-100 across all cores.
///
/// Usage is measured between consecutive samples, so the first sample reads 0.
pub struct CpuProbe {
    system: System,
    pid: Option<Pid>,
    cores: f32,
}

impl CpuProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = e, "Cannot resolve own pid, load will read as 0");
                None
            }
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get() as f32)
            .unwrap_or(1.0);

        Self {
            system: System::new(),
            pid,
            cores,
        }
    }
}

impl Default for CpuProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadProbe for CpuProbe {
    fn sample(&mut self) -> i64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        self.system.refresh_process(pid);
        self.system
            .process(pid)
            .map(|p| ((p.cpu_usage() / self.cores).round() as i64).clamp(0, 100))
            .unwrap_or(0)
    }
}

/// Fixed load value.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub i64);

impl LoadProbe for FixedProbe {
    fn sample(&mut self) -> i64 {
        self.0
    }
}
