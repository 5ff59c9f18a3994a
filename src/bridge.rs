/*
 * This file is part of RemoteSysMon.
 *
 * Copyright (C) 2025 RemoteSysMon contributors
 *
 * RemoteSysMon is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * RemoteSysMon is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with RemoteSysMon. If not, see <https://www.gnu.org/licenses/>.
 */

//! adb bridge: file push, device listing and device control.
//!
//! Every call is a bounded subprocess invocation. Failures are logged and
//! reported as `false`/`None`; nothing here panics or aborts the poll loop.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AdbSettings;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const MIN_BRIGHTNESS: i32 = 0;
pub const MAX_BRIGHTNESS: i32 = 255;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("bridge tool not found: {0}")]
    ToolMissing(PathBuf),
    #[error("failed to run bridge tool: {0}")]
    Spawn(#[source] io::Error),
    #[error("bridge command timed out after {0:?}")]
    Timeout(Duration),
    #[error("bridge command exited with {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },
    #[error("temporary file error: {0}")]
    TempFile(#[source] io::Error),
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs the bridge executable with the given arguments.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send {
    fn run(&self, args: &[String], timeout: Duration) -> Result<CommandOutput, BridgeError>;
}

/// Spawns the real executable, killing it when `timeout` elapses.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
}

impl ProcessRunner {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self { program: program.into() }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut p) = pipe {
            let _ = p.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

impl CommandRunner for ProcessRunner {
    fn run(&self, args: &[String], timeout: Duration) -> Result<CommandOutput, BridgeError> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => BridgeError::ToolMissing(self.program.clone()),
                _ => BridgeError::Spawn(e),
            })?;

        // Drain pipes concurrently so a chatty command cannot block on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let start = Instant::now();
        let status = loop {
            match child.try_wait().map_err(BridgeError::Spawn)? {
                Some(status) => break status,
                None if start.elapsed() >= timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(BridgeError::Timeout(timeout));
                }
                None => thread::sleep(Duration::from_millis(10)),
            }
        };

        Ok(CommandOutput {
            code: status.code(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub state: String,
    pub model: String,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) - {}", self.model, self.id, self.state)
    }
}

const DEVICE_LIST_HEADER: &str = "List of devices";

/// Parse `adb devices -l` output. The header line and daemon notices are skipped
/// wherever they appear.
pub fn parse_devices(output: &str) -> Vec<Device> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('*') && !l.starts_with(DEVICE_LIST_HEADER))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 2 {
                return None;
            }
            let model = parts[2..]
                .iter()
                .find_map(|p| p.strip_prefix("model:"))
                .and_then(|m| m.split(':').next())
                .unwrap_or("Unknown")
                .to_string();
            Some(Device { id: parts[0].to_string(), state: parts[1].to_string(), model })
        })
        .collect()
}

pub fn clamp_brightness(level: i32) -> i32 {
    level.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS)
}

pub struct Bridge<R: CommandRunner = ProcessRunner> {
    runner: R,
    device_id: Option<String>,
    target_path: String,
    timeout: Duration,
}

impl Bridge<ProcessRunner> {
    pub fn from_settings(settings: &AdbSettings) -> Self {
        Self::with_runner(ProcessRunner::new(&settings.bridge_path), settings)
    }
}

impl<R: CommandRunner> Bridge<R> {
    pub fn with_runner(runner: R, settings: &AdbSettings) -> Self {
        Self {
            runner,
            device_id: settings.device_id.clone(),
            target_path: settings.target_path.clone(),
            timeout: settings.timeout(),
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    fn device_args(&self) -> Vec<String> {
        match &self.device_id {
            Some(id) => vec!["-s".to_string(), id.clone()],
            None => Vec::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.runner.run(&["version".to_string()], PROBE_TIMEOUT), Ok(out) if out.success())
    }

    pub fn devices(&self) -> Vec<Device> {
        let args = ["devices".to_string(), "-l".to_string()];
        match self.runner.run(&args, self.timeout) {
            Ok(out) => parse_devices(&out.stdout),
            Err(e) => {
                warn!("Error getting devices: {}", e);
                Vec::new()
            }
        }
    }

    /// Select `device_id` for all later commands and probe it.
    pub fn connect(&mut self, device_id: &str) -> bool {
        self.device_id = Some(device_id.to_string());
        self.execute("echo \"test\"", true).is_some()
    }

    pub fn push_file(&self, local: &Path) -> Result<(), BridgeError> {
        let mut args = self.device_args();
        args.push("push".to_string());
        args.push(local.to_string_lossy().into_owned());
        args.push(self.target_path.clone());

        let out = self.runner.run(&args, self.timeout)?;
        if out.success() {
            Ok(())
        } else {
            Err(BridgeError::Exit { code: out.code, stderr: out.stderr.trim().to_string() })
        }
    }

    /// Serialize `payload` into a fresh temp file and push it to the target path.
    ///
    /// The temp file is removed whatever the push outcome.
    pub fn push_json<T: Serialize>(&self, payload: &T) -> Result<(), BridgeError> {
        let mut tmp = tempfile::Builder::new()
            .prefix("remote-sysmon-")
            .suffix(".json")
            .tempfile()
            .map_err(BridgeError::TempFile)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), payload)?;
        tmp.as_file_mut().flush().map_err(BridgeError::TempFile)?;

        let pushed = self.push_file(tmp.path());
        if let Err(e) = tmp.close() {
            warn!("failed to remove temporary payload file: {}", e);
        }
        pushed
    }

    pub fn push<T: Serialize>(&self, payload: &T) -> bool {
        match self.push_json(payload) {
            Ok(()) => {
                debug!("pushed payload to {}", self.target_path);
                true
            }
            Err(e) => {
                warn!("Failed to push data: {}", e);
                false
            }
        }
    }

    /// Run `command` through `adb shell`; trimmed stdout on exit 0.
    fn execute(&self, command: &str, silent: bool) -> Option<String> {
        let mut args = self.device_args();
        args.push("shell".to_string());
        args.push(command.to_string());

        match self.runner.run(&args, self.timeout) {
            Ok(out) if out.success() => Some(out.stdout.trim().to_string()),
            Ok(out) => {
                if !silent {
                    warn!("Command failed: {}", out.stderr.trim());
                }
                None
            }
            Err(e) => {
                if !silent {
                    warn!("Error executing command: {}", e);
                }
                None
            }
        }
    }

    pub fn wake(&self) -> bool {
        self.execute("input keyevent KEYCODE_WAKEUP", false).is_some()
    }

    /// Wake, then swipe to unlock.
    pub fn screen_on(&self) -> bool {
        let ok = self.wake();
        if ok {
            self.unlock();
        }
        ok
    }

    pub fn screen_off(&self) -> bool {
        self.execute("input keyevent KEYCODE_SLEEP", false).is_some()
    }

    pub fn press_power(&self) -> bool {
        self.execute("input keyevent KEYCODE_POWER", false).is_some()
    }

    pub fn unlock(&self) -> bool {
        self.execute("input swipe 540 1500 540 500", false).is_some()
    }

    pub fn volume_up(&self) -> bool {
        self.execute("input keyevent KEYCODE_VOLUME_UP", false).is_some()
    }

    pub fn volume_down(&self) -> bool {
        self.execute("input keyevent KEYCODE_VOLUME_DOWN", false).is_some()
    }

    pub fn set_brightness(&self, level: i32) -> bool {
        let level = clamp_brightness(level);
        self.execute(&format!("settings put system screen_brightness {}", level), false).is_some()
    }

    pub fn brightness(&self) -> Option<i32> {
        self.execute("settings get system screen_brightness", false)?
            .trim()
            .parse()
            .ok()
    }

    /// `Some(true)` when the display is held on, `None` when unknown.
    pub fn screen_state(&self) -> Option<bool> {
        let out = self.execute("dumpsys power | grep \"mHoldingDisplaySuspendBlocker\"", false)?;
        if out.is_empty() {
            return None;
        }
        Some(out.to_lowercase().contains("true"))
    }

    pub fn custom(&self, command: &str) -> Option<String> {
        self.execute(command, false)
    }
}
