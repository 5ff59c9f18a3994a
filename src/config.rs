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

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_TARGET_PATH: &str = "/data/local/tmp/system_stats.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Parse error in {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Appearance {
    pub background_color: String,
    pub text_color: String,
    pub tile_background_color: String,
    pub tile_text_color: String,
    pub font_size: u32,
    pub show_graphs: bool,
    /// Device-side display refresh, not the poll interval.
    pub refresh_rate_ms: u64,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            background_color: "#1e1e1e".into(),
            text_color: "#ffffff".into(),
            tile_background_color: "#0078d4".into(),
            tile_text_color: "#ffffff".into(),
            font_size: 14,
            show_graphs: true,
            refresh_rate_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdbSettings {
    pub device_id: Option<String>,
    pub auto_connect: bool,
    pub target_path: String,
    /// Bridge executable, looked up on PATH when not absolute.
    pub bridge_path: String,
    pub timeout_secs: u64,
}

impl Default for AdbSettings {
    fn default() -> Self {
        Self {
            device_id: None,
            auto_connect: true,
            target_path: DEFAULT_TARGET_PATH.into(),
            bridge_path: "adb".into(),
            timeout_secs: 10,
        }
    }
}

impl AdbSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    #[default]
    Snapshot,
    Envelope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringSettings {
    pub auto_start: bool,
    pub minimize_to_tray: bool,
    pub start_minimized: bool,
    pub interval_ms: u64,
    /// Sleep between the two energy counter reads.
    pub power_sample_ms: u64,
    pub payload: PayloadFormat,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            auto_start: true,
            minimize_to_tray: true,
            start_minimized: false,
            interval_ms: 2000,
            power_sample_ms: 1000,
            payload: PayloadFormat::Snapshot,
        }
    }
}

impl MonitoringSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn power_sample(&self) -> Duration {
        Duration::from_millis(self.power_sample_ms.max(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub appearance: Appearance,
    pub adb: AdbSettings,
    pub monitoring: MonitoringSettings,
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("remote-sysmon").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("remote-sysmon")
            .join("config.json");
    }
    PathBuf::from("/etc/remote-sysmon/config.json")
}

/// Rewrite legacy keys in place before deserializing.
fn migrate(value: &mut Value) {
    let Some(appearance) = value.get_mut("appearance").and_then(Value::as_object_mut) else {
        return;
    };
    if !appearance.contains_key("tile_background_color") {
        if let Some(accent) = appearance.remove("accent_color") {
            appearance.insert("tile_background_color".into(), accent);
        }
    }
    if !appearance.contains_key("tile_text_color") {
        let text = appearance
            .get("text_color")
            .cloned()
            .unwrap_or_else(|| Value::String("#ffffff".into()));
        appearance.insert("tile_text_color".into(), text);
    }
}

impl Config {
    /// Parse configuration text, filling missing keys with defaults.
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        let mut value: Value = serde_json::from_str(data)?;
        migrate(&mut value);
        serde_json::from_value(value)
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = match fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path: path.to_path_buf(), source }),
        };
        Self::from_json(&data).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("{}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        fs::write(path, json).map_err(io_err)
    }

    pub fn reset(path: &Path) -> Result<Self, ConfigError> {
        let cfg = Self::default();
        cfg.save(path)?;
        Ok(cfg)
    }
}
