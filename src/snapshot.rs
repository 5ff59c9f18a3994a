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

//! Telemetry document pushed to the device.
//!
//! Field names on the wire follow what the Android consumer reads
//! (`cpu_percent`, `gpu_temp_celsius`, ...). An absent optional field means the
//! sensor was unavailable, never zero.

use serde::{Deserialize, Serialize};

use crate::config::Appearance;

pub const PAYLOAD_VERSION: &str = "2.0.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuStats {
    #[serde(rename = "cpu_percent")]
    pub percent: f64,
    #[serde(rename = "cpu_temp_celsius")]
    pub temp_celsius: f64,
    #[serde(rename = "cpu_power_watts", default, skip_serializing_if = "Option::is_none")]
    pub power_watts: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_gb: f64,
    pub used_gb: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuStats {
    #[serde(rename = "gpu_usage_percent")]
    pub usage_percent: f64,
    #[serde(rename = "gpu_temp_celsius")]
    pub temp_celsius: f64,
    #[serde(rename = "gpu_power_watts", default, skip_serializing_if = "Option::is_none")]
    pub power_watts: Option<f64>,
}

/// One complete set of readings produced per poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub gpu: GpuStats,
    /// RFC 3339 local time the snapshot was assembled.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub gpu: GpuStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub timestamp: String,
    pub version: String,
    pub warning: Option<String>,
}

/// Document carrying display styling alongside the stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub stats: Stats,
    pub appearance: Appearance,
    pub metadata: Metadata,
}

impl Envelope {
    pub fn wrap(snapshot: &Snapshot, appearance: &Appearance) -> Self {
        Self {
            stats: Stats {
                cpu: snapshot.cpu.clone(),
                memory: snapshot.memory.clone(),
                gpu: snapshot.gpu.clone(),
            },
            appearance: appearance.clone(),
            metadata: Metadata {
                timestamp: snapshot.timestamp.clone(),
                version: PAYLOAD_VERSION.to_string(),
                warning: snapshot.warning.clone(),
            },
        }
    }
}

/// Round to two decimals, as the device display expects.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::create_mock_snapshot;
    use serde_json::Value;

    #[test]
    fn test_snapshot_wire_names() {
        let snap = create_mock_snapshot();
        let v: Value = serde_json::to_value(&snap).unwrap();
        assert_eq!(v["cpu"]["cpu_percent"], 12.5);
        assert_eq!(v["cpu"]["cpu_temp_celsius"], 48.0);
        assert_eq!(v["cpu"]["cpu_power_watts"], 17.25);
        assert_eq!(v["memory"]["total_gb"], 31.27);
        assert_eq!(v["gpu"]["gpu_usage_percent"], 3.0);
        assert!(v["gpu"].get("gpu_power_watts").is_none());
        assert!(v.get("warning").is_none());
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let mut snap = create_mock_snapshot();
        snap.warning = Some("CPU power unavailable - run with sudo".to_string());
        let json = serde_json::to_string_pretty(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_snapshot_parse_ignores_field_order() {
        let json = r#"{
            "warning": "w",
            "timestamp": "2025-01-01T00:00:00+00:00",
            "gpu": {"gpu_temp_celsius": 40.0, "gpu_usage_percent": 1.0},
            "memory": {"percent": 50.0, "used_gb": 8.0, "total_gb": 16.0},
            "cpu": {"cpu_temp_celsius": 30.0, "cpu_percent": 2.0}
        }"#;
        let snap: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.cpu.power_watts, None);
        assert_eq!(snap.memory.used_gb, 8.0);
        assert_eq!(snap.warning.as_deref(), Some("w"));
    }

    #[test]
    fn test_envelope_carries_metadata() {
        let mut snap = create_mock_snapshot();
        snap.warning = Some("warn".into());
        let env = Envelope::wrap(&snap, &Appearance::default());
        assert_eq!(env.metadata.version, PAYLOAD_VERSION);
        assert_eq!(env.metadata.warning.as_deref(), Some("warn"));
        assert_eq!(env.metadata.timestamp, snap.timestamp);
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["stats"]["cpu"]["cpu_percent"], 12.5);
        assert_eq!(v["appearance"]["tile_background_color"], "#0078d4");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(1.235001), 1.24);
        assert_eq!(round2(0.0), 0.0);
    }
}
