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

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::bridge::Device;
use crate::config::Config;
use crate::service::{CycleOutcome, CycleReport};
use crate::session::{Event, SessionState};

const MAX_LOG_LINES: usize = 50;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
    Interval,
}

pub struct App {
    pub state: SessionState,
    pub interval: Duration,
    pub devices: Vec<Device>,
    pub device_idx: usize,
    pub selected_device: Option<String>,
    pub brightness: Option<i32>,
    pub last_report: Option<CycleReport>,
    pub last_update: Option<DateTime<Local>>,
    pub input_mode: InputMode,
    pub input: String,
    pub log: VecDeque<String>,
    // header
    pub cpu_model: String,
    pub elevated: bool,
    pub target_path: String,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: &Config, cpu_model: String, elevated: bool) -> Self {
        Self {
            state: SessionState::Idle,
            interval: config.monitoring.interval(),
            devices: Vec::new(),
            device_idx: 0,
            selected_device: config.adb.device_id.clone(),
            brightness: None,
            last_report: None,
            last_update: None,
            input_mode: InputMode::Normal,
            input: String::new(),
            log: VecDeque::new(),
            cpu_model,
            elevated,
            target_path: config.adb.target_path.clone(),
            should_quit: false,
        }
    }

    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let stamp = Local::now().format("%H:%M:%S");
        self.log.push_back(format!("{} {}", stamp, line.into()));
        while self.log.len() > MAX_LOG_LINES {
            self.log.pop_front();
        }
    }

    pub fn highlighted_device(&self) -> Option<&Device> {
        self.devices.get(self.device_idx)
    }

    pub fn apply_event(&mut self, event: Event) {
        match event {
            Event::StateChanged(state) => {
                self.state = state;
                self.push_log(match state {
                    SessionState::Running => "monitoring started",
                    SessionState::Idle => "monitoring stopped",
                });
            }
            Event::IntervalChanged(interval) => {
                self.interval = interval;
                self.push_log(format!("interval set to {} ms", interval.as_millis()));
            }
            Event::Cycle(report) => {
                if let CycleOutcome::Failed { reason } = &report.outcome {
                    self.push_log(format!("push failed: {}", reason));
                }
                self.last_report = Some(report);
                self.last_update = Some(Local::now());
            }
            Event::Devices(devices) => {
                if devices.is_empty() {
                    self.push_log("No devices found");
                }
                self.devices = devices;
                if self.device_idx >= self.devices.len() {
                    self.device_idx = self.devices.len().saturating_sub(1);
                }
            }
            Event::DeviceSelected { id, reachable } => {
                if let Some(i) = self.devices.iter().position(|d| d.id == id) {
                    self.device_idx = i;
                }
                self.push_log(if reachable {
                    format!("connected to {}", id)
                } else {
                    format!("{} did not respond", id)
                });
                self.selected_device = Some(id);
            }
            Event::Brightness(level) => self.brightness = level,
            Event::BrightnessSet { level, ok } => {
                if ok {
                    self.brightness = Some(level);
                } else {
                    self.push_log(format!("Failed to set brightness to {}", level));
                }
            }
            Event::ActionDone { action, ok } => {
                self.push_log(format!("{:?}: {}", action, if ok { "ok" } else { "failed" }));
            }
            Event::CommandOutput { command, output } => match output {
                Some(out) => {
                    self.push_log(format!("$ {}", command));
                    for line in out.lines().take(10) {
                        self.push_log(line.to_string());
                    }
                }
                None => self.push_log(format!("$ {} failed", command)),
            },
        }
    }

    /// Text shown in the preview pane.
    pub fn preview_lines(&self) -> Vec<String> {
        let Some(report) = &self.last_report else {
            return vec!["Waiting for first update...".to_string()];
        };
        let s = &report.snapshot;

        let mut cpu = format!("CPU: {:.1}% | Temp: {:.1}°C", s.cpu.percent, s.cpu.temp_celsius);
        if let Some(w) = s.cpu.power_watts {
            cpu.push_str(&format!(" | Power: {:.1}W", w));
        }
        let mem = format!(
            "Memory: {:.1}% ({:.1}/{:.1} GB)",
            s.memory.percent, s.memory.used_gb, s.memory.total_gb
        );
        let mut gpu = format!("GPU: {}% | Temp: {:.1}°C", s.gpu.usage_percent, s.gpu.temp_celsius);
        if let Some(w) = s.gpu.power_watts {
            gpu.push_str(&format!(" | Power: {:.1}W", w));
        }

        let mut lines = vec![cpu, mem, gpu, String::new()];
        lines.push(format!(
            "ADB Push: {}",
            if report.outcome.delivered() { "✓ Success" } else { "✗ Failed" }
        ));
        if let Some(t) = self.last_update {
            lines.push(format!("Last Update: {}", t.format("%H:%M:%S")));
        }
        if let Some(w) = &s.warning {
            lines.push(format!("⚠ {}", w));
        }
        lines
    }
}
