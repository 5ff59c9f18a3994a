/*
 * Integration tests for RemoteSysMon
 *
 * These tests drive the public API end to end: a fake sysfs tree on one side
 * and a stand-in bridge executable on the other.
 */

use remote_sysmon::bridge::{parse_devices, Bridge};
use remote_sysmon::config::{AdbSettings, Config, PayloadFormat};
use remote_sysmon::power::{watts_from_energy, PowerEstimator};
use remote_sysmon::sensors::{SensorGap, SensorPaths, SensorReader};
use remote_sysmon::service::{CycleOutcome, Monitor};
use remote_sysmon::snapshot::Snapshot;
use remote_sysmon::stats::{StatsAggregator, POWER_WARNING};
use serial_test::serial;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

// Test utilities

/// Writes an executable that answers like adb. Pushed files are copied to
/// `dir/pushed.json`, the local source path is recorded in `dir/pushed_from`
/// and shell commands are appended to `dir/shell.log`.
fn fake_bridge(dir: &Path) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
[ "$1" = "-s" ] && shift 2
case "$1" in
  version) echo "Android Debug Bridge version 1.0.41" ;;
  devices) printf 'List of devices attached\nEMU1\tdevice product:sdk model:Pixel_7 device:emu\n\n' ;;
  push) cp "$2" "{dir}/pushed.json" && echo "$2" > "{dir}/pushed_from" ;;
  shell)
    shift
    echo "$*" >> "{dir}/shell.log"
    case "$*" in
      "settings get system screen_brightness") echo 120 ;;
      *) echo "$*" ;;
    esac ;;
  *) exit 1 ;;
esac
"#,
        dir = dir.display()
    );
    let path = dir.join("fake-adb");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn settings_for(tool: &Path) -> AdbSettings {
    AdbSettings {
        bridge_path: tool.display().to_string(),
        timeout_secs: 5,
        ..AdbSettings::default()
    }
}

fn sensor_tree(dir: &Path) -> SensorPaths {
    let root = dir.join("sys");
    let hwmon = root.join("hwmon");
    fs::create_dir_all(hwmon.join("hwmon0")).unwrap();
    fs::write(hwmon.join("hwmon0").join("name"), "coretemp\n").unwrap();
    fs::write(hwmon.join("hwmon0").join("temp1_input"), "47000\n").unwrap();
    fs::write(root.join("gpu_busy_percent"), "12\n").unwrap();
    fs::write(root.join("gpu_temp"), "44000\n").unwrap();
    fs::write(root.join("gpu_power"), "30500000\n").unwrap();
    SensorPaths {
        thermal_zone: root.join("no_thermal_zone"),
        hwmon_root: hwmon,
        gpu_usage: root.join("gpu_busy_percent"),
        gpu_temp: root.join("gpu_temp"),
        gpu_power: root.join("gpu_power"),
    }
}

fn monitor(dir: &Path, paths: SensorPaths, elevated: bool, config: &Config) -> Monitor {
    let aggregator = StatsAggregator::new(
        SensorReader::new(paths),
        PowerEstimator::new(dir.join("energy_uj")),
        elevated,
        Duration::from_millis(5),
    );
    Monitor::new(aggregator, Bridge::from_settings(&config.adb), config)
}

#[test]
#[serial]
fn test_cycle_pushes_snapshot_to_device() {
    let dir = TempDir::new().unwrap();
    let tool = fake_bridge(dir.path());
    fs::write(dir.path().join("energy_uj"), "123456").unwrap();
    let config = Config { adb: settings_for(&tool), ..Config::default() };

    let mut m = monitor(dir.path(), sensor_tree(dir.path()), false, &config);
    let report = m.run_cycle();
    assert_eq!(report.outcome, CycleOutcome::Delivered);

    let pushed: Snapshot =
        serde_json::from_str(&fs::read_to_string(dir.path().join("pushed.json")).unwrap()).unwrap();
    assert_eq!(pushed, report.snapshot);
    // thermal zone missing, so the named hwmon chip is used
    assert_eq!(pushed.cpu.temp_celsius, 47.0);
    assert_eq!(pushed.gpu.usage_percent, 12.0);
    assert_eq!(pushed.gpu.power_watts, Some(30.5));
    assert_eq!(pushed.warning, None);

    // local temp file is gone once the push returns
    let from = fs::read_to_string(dir.path().join("pushed_from")).unwrap();
    assert!(!Path::new(from.trim()).exists());
}

#[test]
#[serial]
fn test_missing_sensors_still_produce_a_valid_document() {
    let dir = TempDir::new().unwrap();
    let tool = fake_bridge(dir.path());
    let config = Config { adb: settings_for(&tool), ..Config::default() };
    let nowhere = dir.path().join("nowhere");
    let paths = SensorPaths {
        thermal_zone: nowhere.join("temp"),
        hwmon_root: nowhere.join("hwmon"),
        gpu_usage: nowhere.join("busy"),
        gpu_temp: nowhere.join("temp1_input"),
        gpu_power: nowhere.join("power1_average"),
    };

    let mut m = monitor(dir.path(), paths, false, &config);
    let report = m.run_cycle();
    match &report.outcome {
        CycleOutcome::Partial { gaps } => {
            assert!(gaps.contains(&SensorGap::CpuTemperature));
            assert!(gaps.contains(&SensorGap::CpuPower));
            assert!(gaps.contains(&SensorGap::GpuStats));
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("pushed.json")).unwrap()).unwrap();
    assert_eq!(raw["cpu"]["cpu_temp_celsius"], 0.0);
    assert!(raw["cpu"].get("cpu_power_watts").is_none());
    assert_eq!(raw["gpu"]["gpu_usage_percent"], 0.0);
    assert_eq!(raw["warning"], POWER_WARNING);
    assert!(raw["memory"]["total_gb"].as_f64().unwrap() > 0.0);
}

#[test]
#[serial]
fn test_envelope_payload_from_config() {
    let dir = TempDir::new().unwrap();
    let tool = fake_bridge(dir.path());
    let mut config = Config { adb: settings_for(&tool), ..Config::default() };
    config.monitoring.payload = PayloadFormat::Envelope;
    config.appearance.font_size = 18;

    let mut m = monitor(dir.path(), sensor_tree(dir.path()), true, &config);
    assert!(m.run_cycle().outcome.delivered());

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("pushed.json")).unwrap()).unwrap();
    assert_eq!(raw["appearance"]["font_size"], 18);
    assert_eq!(raw["stats"]["gpu"]["gpu_temp_celsius"], 44.0);
    assert_eq!(raw["metadata"]["warning"], serde_json::Value::Null);
}

#[test]
#[serial]
fn test_push_without_tool_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let settings = AdbSettings { bridge_path: dir.path().join("missing-adb").display().to_string(), ..AdbSettings::default() };
    let bridge = Bridge::from_settings(&settings);
    assert!(!bridge.is_available());
    assert!(!bridge.push(&Snapshot::default()));
    assert!(bridge.devices().is_empty());
    assert_eq!(bridge.brightness(), None);
}

#[test]
#[serial]
fn test_device_listing_and_selection() {
    let dir = TempDir::new().unwrap();
    let tool = fake_bridge(dir.path());
    let mut bridge = Bridge::from_settings(&settings_for(&tool));
    assert!(bridge.is_available());

    let devices = bridge.devices();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id, "EMU1");
    assert_eq!(devices[0].model, "Pixel_7");

    assert!(bridge.connect("EMU1"));
    assert_eq!(bridge.device_id(), Some("EMU1"));
    assert_eq!(bridge.custom("uptime").as_deref(), Some("uptime"));
}

#[test]
#[serial]
fn test_brightness_round_trip_and_clamp() {
    let dir = TempDir::new().unwrap();
    let tool = fake_bridge(dir.path());
    let bridge = Bridge::from_settings(&settings_for(&tool));

    assert_eq!(bridge.brightness(), Some(120));
    assert!(bridge.set_brightness(400));
    assert!(bridge.set_brightness(-3));
    assert!(bridge.volume_up());

    let log = fs::read_to_string(dir.path().join("shell.log")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(
        lines,
        vec![
            "settings get system screen_brightness",
            "settings put system screen_brightness 255",
            "settings put system screen_brightness 0",
            "input keyevent KEYCODE_VOLUME_UP",
        ]
    );
}

#[test]
fn test_power_from_counter_delta() {
    assert_eq!(watts_from_energy(1_000_000, 3_000_000, Duration::from_secs(2), None), Some(1.0));
    assert_eq!(watts_from_energy(5, 4, Duration::from_secs(1), None), None);
}

#[test]
fn test_parse_devices_skips_noise() {
    let out = "List of devices attached\n* daemon started successfully\nR58M123 unauthorized usb:1-1\n\n";
    let devices = parse_devices(out);
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].state, "unauthorized");
    assert_eq!(devices[0].model, "Unknown");
}

#[test]
fn test_legacy_config_file_migrates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r##"{"appearance": {"accent_color": "#ff0000", "text_color": "#eeeeee"}, "adb": {"device_id": "XYZ"}}"##,
    )
    .unwrap();
    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg.appearance.tile_background_color, "#ff0000");
    assert_eq!(cfg.appearance.tile_text_color, "#eeeeee");
    assert_eq!(cfg.adb.device_id.as_deref(), Some("XYZ"));
    assert_eq!(cfg.monitoring.interval(), Duration::from_secs(2));

    cfg.save(&path).unwrap();
    assert_eq!(Config::load(&path).unwrap(), cfg);
}
