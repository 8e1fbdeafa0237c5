use crate::error::OsActionError;
use serde::{Deserialize, Serialize};

pub const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub cpu_percent: f32,
    pub mem_used: u64,
    pub mem_total: u64,
    pub disk_used: u64,
    pub disk_total: u64,
    pub os_label: String,
}

fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0) as f32
    }
}

impl SystemStatus {
    pub fn mem_percent(&self) -> f32 {
        percent(self.mem_used, self.mem_total)
    }

    pub fn disk_percent(&self) -> f32 {
        percent(self.disk_used, self.disk_total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessUsage {
    pub name: String,
    pub mem_percent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeDirection {
    Up,
    Down,
    Mute,
}

/// OS primitives the agent drives. Every call may be slow and may fail.
pub trait OsActions: Send + Sync {
    fn open(&self, app_name: &str) -> Result<(), OsActionError>;

    /// Captures the display into a timestamped file and returns its name.
    fn screenshot(&self) -> Result<String, OsActionError>;

    /// Blocks briefly to sample CPU load.
    fn system_status(&self) -> Result<SystemStatus, OsActionError>;

    /// Processes above `threshold_percent` of RAM, in no particular order.
    fn list_processes(&self, threshold_percent: f32) -> Result<Vec<ProcessUsage>, OsActionError>;

    /// Terminates every process whose name is in `process_names`.
    /// `Ok(false)` means none was running.
    fn close(&self, process_names: &[&str]) -> Result<bool, OsActionError>;

    fn set_volume(&self, direction: VolumeDirection) -> Result<(), OsActionError>;

    fn open_url(&self, url: &str) -> Result<(), OsActionError>;

    fn disk_cleanup(&self) -> Result<(), OsActionError>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Scriptable `OsActions` that records calls.
    #[derive(Default)]
    pub struct FakeOs {
        pub calls: Mutex<Vec<String>>,
        pub fail: bool,
        pub running: Vec<String>,
        pub processes: Vec<ProcessUsage>,
        pub status: Option<SystemStatus>,
    }

    impl FakeOs {
        fn record(&self, call: String) -> Result<(), OsActionError> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                Err(OsActionError::Probe("scripted failure".to_string()))
            } else {
                Ok(())
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl OsActions for FakeOs {
        fn open(&self, app_name: &str) -> Result<(), OsActionError> {
            self.record(format!("open:{}", app_name))
        }

        fn screenshot(&self) -> Result<String, OsActionError> {
            self.record("screenshot".to_string())?;
            Ok("screenshot_20240501_101500.png".to_string())
        }

        fn system_status(&self) -> Result<SystemStatus, OsActionError> {
            self.record("status".to_string())?;
            self.status
                .clone()
                .ok_or_else(|| OsActionError::Probe("no status scripted".to_string()))
        }

        fn list_processes(&self, threshold_percent: f32) -> Result<Vec<ProcessUsage>, OsActionError> {
            self.record(format!("processes:{}", threshold_percent))?;
            Ok(self
                .processes
                .iter()
                .filter(|p| p.mem_percent > threshold_percent)
                .cloned()
                .collect())
        }

        fn close(&self, process_names: &[&str]) -> Result<bool, OsActionError> {
            self.record(format!("close:{}", process_names.join(",")))?;
            Ok(process_names.iter().any(|n| self.running.iter().any(|r| r == n)))
        }

        fn set_volume(&self, direction: VolumeDirection) -> Result<(), OsActionError> {
            self.record(format!("volume:{:?}", direction))
        }

        fn open_url(&self, url: &str) -> Result<(), OsActionError> {
            self.record(format!("url:{}", url))
        }

        fn disk_cleanup(&self) -> Result<(), OsActionError> {
            self.record("cleanup".to_string())
        }
    }
}
