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

//! Best-effort CPU, memory and GPU readings.
//!
//! Nothing here returns an error: a missing or unreadable sensor becomes a zero
//! for required fields or `None` for optional ones, and is recorded as a
//! [`SensorGap`] so the caller can tell a degraded cycle from a clean one.

use std::fmt;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use serde::Serialize;
use sysinfo::{System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::debug;

use crate::hwmon::{self, find_named_temp, read_chip_temps, read_i64, read_millidegrees};
use crate::snapshot::{round2, CpuStats, GpuStats, MemoryStats};

/// hwmon chip names tried, in order, when the thermal zone is unreadable.
pub const CPU_SENSOR_NAMES: [&str; 4] = ["coretemp", "k10temp", "cpu_thermal", "cpu-thermal"];

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorGap {
    CpuTemperature,
    CpuPower,
    GpuStats,
    GpuPower,
}

impl fmt::Display for SensorGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SensorGap::CpuTemperature => "cpu temperature",
            SensorGap::CpuPower => "cpu power",
            SensorGap::GpuStats => "gpu stats",
            SensorGap::GpuPower => "gpu power",
        };
        f.write_str(s)
    }
}

/// Where each sysfs sensor lives. Overridable for hosts with a different card
/// or hwmon numbering, and for tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorPaths {
    pub thermal_zone: PathBuf,
    pub hwmon_root: PathBuf,
    pub gpu_usage: PathBuf,
    pub gpu_temp: PathBuf,
    pub gpu_power: PathBuf,
}

impl Default for SensorPaths {
    fn default() -> Self {
        Self {
            thermal_zone: "/sys/class/thermal/thermal_zone0/temp".into(),
            hwmon_root: hwmon::HWMON_ROOT.into(),
            gpu_usage: "/sys/class/drm/card1/device/gpu_busy_percent".into(),
            gpu_temp: "/sys/class/drm/card1/device/hwmon/hwmon5/temp1_input".into(),
            gpu_power: "/sys/class/drm/card1/device/hwmon/hwmon5/power1_average".into(),
        }
    }
}

/// CPU temperature: thermal zone first, then the named hwmon chips.
pub fn read_cpu_temp(paths: &SensorPaths) -> Option<f64> {
    match read_millidegrees(&paths.thermal_zone) {
        Ok(c) => return Some(c),
        Err(e) => debug!("thermal zone unreadable: {}", e),
    }
    let chips = read_chip_temps(&paths.hwmon_root).ok()?;
    find_named_temp(&chips, &CPU_SENSOR_NAMES)
}

/// GPU usage and temperature, plus power when its file is readable.
pub fn read_gpu(paths: &SensorPaths, gaps: &mut Vec<SensorGap>) -> GpuStats {
    let primary = read_i64(&paths.gpu_usage)
        .and_then(|usage| Ok((usage as f64, read_millidegrees(&paths.gpu_temp)?)));
    let (usage_percent, temp_celsius) = match primary {
        Ok(pair) => pair,
        Err(e) => {
            debug!("GPU stats unavailable: {}", e);
            gaps.push(SensorGap::GpuStats);
            return GpuStats::default();
        }
    };

    let power_watts = match read_i64(&paths.gpu_power) {
        Ok(uw) => Some(round2(uw as f64 / 1_000_000.0)),
        Err(_) => {
            gaps.push(SensorGap::GpuPower);
            None
        }
    };

    GpuStats { usage_percent, temp_celsius, power_watts }
}

pub fn memory_from_bytes(total: u64, used: u64, available: u64) -> MemoryStats {
    let percent = if total == 0 {
        0.0
    } else {
        round2(total.saturating_sub(available) as f64 / total as f64 * 100.0)
    };
    MemoryStats {
        total_gb: round2(total as f64 / BYTES_PER_GB),
        used_gb: round2(used as f64 / BYTES_PER_GB),
        percent,
    }
}

/// Holds the sysinfo handle so CPU usage is measured between successive cycles.
pub struct SensorReader {
    paths: SensorPaths,
    system: System,
    last_cpu_refresh: Instant,
}

impl SensorReader {
    pub fn new(paths: SensorPaths) -> Self {
        let mut system = System::new();
        // Prime the usage counters; the first real reading is a delta from here.
        system.refresh_cpu_usage();
        Self { paths, system, last_cpu_refresh: Instant::now() }
    }

    pub fn paths(&self) -> &SensorPaths {
        &self.paths
    }

    /// Blocks until at least [`MINIMUM_CPU_UPDATE_INTERVAL`] has passed since the
    /// previous refresh, so a reading taken right after construction is still a
    /// real usage delta.
    pub fn read_cpu(&mut self, gaps: &mut Vec<SensorGap>) -> CpuStats {
        let since = self.last_cpu_refresh.elapsed();
        if since < MINIMUM_CPU_UPDATE_INTERVAL {
            thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL - since);
        }
        self.system.refresh_cpu_usage();
        self.last_cpu_refresh = Instant::now();
        let percent = round2(self.system.global_cpu_usage() as f64);
        let temp_celsius = read_cpu_temp(&self.paths).unwrap_or_else(|| {
            gaps.push(SensorGap::CpuTemperature);
            0.0
        });
        CpuStats { percent, temp_celsius, power_watts: None }
    }

    pub fn read_memory(&mut self) -> MemoryStats {
        self.system.refresh_memory();
        memory_from_bytes(
            self.system.total_memory(),
            self.system.used_memory(),
            self.system.available_memory(),
        )
    }

    pub fn read_gpu(&self, gaps: &mut Vec<SensorGap>) -> GpuStats {
        read_gpu(&self.paths, gaps)
    }
}

impl Default for SensorReader {
    fn default() -> Self {
        Self::new(SensorPaths::default())
    }
}
