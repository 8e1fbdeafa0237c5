//! `OsActions` backed by sysinfo probes and platform shell commands.

use super::os::{OsActions, ProcessUsage, SystemStatus, VolumeDirection};
use crate::error::OsActionError;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use sysinfo::{Disks, Signal, System};

const CPU_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            _ => Platform::Linux,
        }
    }
}

/// Launches a program without waiting for it.
fn spawn(program: &str, args: &[&str]) -> Result<(), OsActionError> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|source| OsActionError::Spawn {
            program: program.to_string(),
            source,
        })
}

/// Runs a program to completion and checks its exit status.
fn run(program: &str, args: &[&str]) -> Result<(), OsActionError> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|source| OsActionError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(OsActionError::CommandFailed {
            program: program.to_string(),
            status: status.to_string(),
        })
    }
}

pub struct SystemActions {
    platform: Platform,
    screenshot_dir: PathBuf,
}

impl SystemActions {
    pub fn new(screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            platform: Platform::current(),
            screenshot_dir: screenshot_dir.into(),
        }
    }

    fn screenshot_path(&self) -> PathBuf {
        let name = format!("screenshot_{}.png", Local::now().format("%Y%m%d_%H%M%S"));
        self.screenshot_dir.join(name)
    }

    fn capture(&self, path: &Path) -> Result<(), OsActionError> {
        let target = path.to_string_lossy().into_owned();
        let target = target.as_str();
        match self.platform {
            Platform::MacOs => run("screencapture", &["-x", target]),
            Platform::Windows => {
                let script = format!(
                    "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
                     $b = [System.Windows.Forms.Screen]::PrimaryScreen.Bounds; \
                     $bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
                     $g = [System.Drawing.Graphics]::FromImage($bmp); \
                     $g.CopyFromScreen($b.Location, [System.Drawing.Point]::Empty, $b.Size); \
                     $bmp.Save('{}')",
                    target
                );
                run("powershell", &["-NoProfile", "-Command", &script])
            }
            Platform::Linux => {
                let tools: [(&str, Vec<&str>); 4] = [
                    ("gnome-screenshot", vec!["-f", target]),
                    ("grim", vec![target]),
                    ("import", vec!["-window", "root", target]),
                    ("scrot", vec![target]),
                ];
                let mut last_err = OsActionError::Unsupported("linux without a screenshot tool");
                for (program, args) in tools.iter() {
                    match run(program, args) {
                        Ok(()) => return Ok(()),
                        Err(e) => last_err = e,
                    }
                }
                Err(last_err)
            }
        }
    }
}

impl Default for SystemActions {
    fn default() -> Self {
        Self::new(".")
    }
}

impl OsActions for SystemActions {
    fn open(&self, app_name: &str) -> Result<(), OsActionError> {
        match self.platform {
            Platform::Windows => {
                let program = match app_name {
                    "notepad" => "notepad",
                    "calculator" => "calc",
                    "cmd" => "cmd",
                    "explorer" => "explorer",
                    other => return spawn("cmd", &["/C", "start", "", other]),
                };
                spawn(program, &[])
            }
            Platform::MacOs => run("open", &["-a", app_name]),
            Platform::Linux => spawn(app_name, &[]),
        }
    }

    fn screenshot(&self) -> Result<String, OsActionError> {
        let path = self.screenshot_path();
        self.capture(&path)?;
        Ok(path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()))
    }

    fn system_status(&self) -> Result<SystemStatus, OsActionError> {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        std::thread::sleep(CPU_SAMPLE_INTERVAL);
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let disks = Disks::new_with_refreshed_list();
        let root = if self.platform == Platform::Windows { "C:\\" } else { "/" };
        let disk = disks
            .list()
            .iter()
            .find(|d| d.mount_point() == Path::new(root))
            .or_else(|| disks.list().first())
            .ok_or_else(|| OsActionError::Probe("no disks reported".to_string()))?;

        let os_label = match (System::name(), System::os_version()) {
            (Some(name), Some(version)) => format!("{} {}", name, version),
            (Some(name), None) => name,
            _ => std::env::consts::OS.to_string(),
        };

        Ok(SystemStatus {
            cpu_percent: sys.global_cpu_usage(),
            mem_used: sys.used_memory(),
            mem_total: sys.total_memory(),
            disk_used: disk.total_space().saturating_sub(disk.available_space()),
            disk_total: disk.total_space(),
            os_label,
        })
    }

    fn list_processes(&self, threshold_percent: f32) -> Result<Vec<ProcessUsage>, OsActionError> {
        let sys = System::new_all();
        let total = sys.total_memory();
        if total == 0 {
            return Err(OsActionError::Probe("total memory reported as zero".to_string()));
        }

        Ok(sys
            .processes()
            .values()
            .map(|p| ProcessUsage {
                name: p.name().to_string_lossy().into_owned(),
                mem_percent: (p.memory() as f64 / total as f64 * 100.0) as f32,
            })
            .filter(|p| p.mem_percent > threshold_percent)
            .collect())
    }

    fn close(&self, process_names: &[&str]) -> Result<bool, OsActionError> {
        let sys = System::new_all();
        let mut matched = false;
        let mut closed = false;

        for process in sys.processes().values() {
            let name = process.name().to_string_lossy();
            if process_names.iter().any(|n| *n == name) {
                matched = true;
                if process.kill_with(Signal::Term).unwrap_or_else(|| process.kill()) {
                    closed = true;
                }
            }
        }

        if matched && !closed {
            return Err(OsActionError::CommandFailed {
                program: process_names.join(", "),
                status: "termination refused".to_string(),
            });
        }
        Ok(closed)
    }

    fn set_volume(&self, direction: VolumeDirection) -> Result<(), OsActionError> {
        match self.platform {
            Platform::Windows => match direction {
                VolumeDirection::Up => run("nircmd", &["changesysvolume", "5000"]),
                VolumeDirection::Down => run("nircmd", &["changesysvolume", "-5000"]),
                VolumeDirection::Mute => run("nircmd", &["mutesysvolume", "2"]),
            },
            Platform::MacOs => {
                let script = match direction {
                    VolumeDirection::Up => {
                        "set volume output volume ((output volume of (get volume settings)) + 10)"
                    }
                    VolumeDirection::Down => {
                        "set volume output volume ((output volume of (get volume settings)) - 10)"
                    }
                    VolumeDirection::Mute => "set volume with output muted",
                };
                run("osascript", &["-e", script])
            }
            Platform::Linux => match direction {
                VolumeDirection::Up => run("pactl", &["set-sink-volume", "@DEFAULT_SINK@", "+10%"]),
                VolumeDirection::Down => run("pactl", &["set-sink-volume", "@DEFAULT_SINK@", "-10%"]),
                VolumeDirection::Mute => run("pactl", &["set-sink-mute", "@DEFAULT_SINK@", "toggle"]),
            },
        }
    }

    fn open_url(&self, url: &str) -> Result<(), OsActionError> {
        match self.platform {
            Platform::Windows => spawn("rundll32", &["url.dll,FileProtocolHandler", url]),
            Platform::MacOs => spawn("open", &[url]),
            Platform::Linux => spawn("xdg-open", &[url]),
        }
    }

    fn disk_cleanup(&self) -> Result<(), OsActionError> {
        match self.platform {
            Platform::Windows => spawn("cleanmgr", &["/sagerun:1"]),
            Platform::MacOs => Err(OsActionError::Unsupported("macos")),
            Platform::Linux => Err(OsActionError::Unsupported("linux")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screenshot_path_is_timestamped_in_dir() {
        let actions = SystemActions::new("/tmp/shots");
        let path = actions.screenshot_path();
        assert!(path.starts_with("/tmp/shots"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("screenshot_"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), "screenshot_20240101_120000.png".len());
    }

    #[test]
    fn test_spawn_missing_program_is_an_error() {
        let err = spawn("definitely-not-a-real-program-xyz", &[]).unwrap_err();
        assert!(matches!(err, OsActionError::Spawn { .. }));
    }

    #[test]
    fn test_close_unknown_process_reports_not_running() {
        let actions = SystemActions::default();
        assert!(!actions.close(&["no-such-process-name.exe"]).unwrap());
    }

    #[test]
    fn test_cleanup_is_windows_only() {
        let actions = SystemActions::default();
        if actions.platform != Platform::Windows {
            assert!(matches!(actions.disk_cleanup(), Err(OsActionError::Unsupported(_))));
        }
    }
}
