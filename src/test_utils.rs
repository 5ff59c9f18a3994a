/*
 * Test utilities and mock helpers for RemoteSysMon
 *
 * Fake sysfs trees, canned snapshots and a ready-made App that the unit tests
 * in the other modules build on.
 */

#[cfg(test)]
pub mod test_utils {
    use crate::app::App;
    use crate::bridge::Device;
    use crate::config::Config;
    use crate::sensors::SensorPaths;
    use crate::service::{CycleOutcome, CycleReport};
    use crate::snapshot::{CpuStats, GpuStats, MemoryStats, Snapshot};
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    /// Creates `root/dir_name` as an hwmon chip with the given `(index, millidegrees)` inputs.
    pub fn write_hwmon_chip(root: &Path, dir_name: &str, chip_name: &str, temps: &[(usize, i64)]) {
        let chip = root.join(dir_name);
        fs::create_dir_all(&chip).unwrap();
        fs::write(chip.join("name"), format!("{}\n", chip_name)).unwrap();
        for (idx, milli) in temps {
            fs::write(chip.join(format!("temp{}_input", idx)), format!("{}\n", milli)).unwrap();
        }
    }

    /// Lays out a complete sensor tree under `dir`: 52 °C CPU zone, GPU at
    /// 37 % / 58 °C / 45.12 W, and an empty hwmon root. No RAPL counter.
    pub fn fake_sensor_tree(dir: &Path) -> SensorPaths {
        let paths = SensorPaths {
            thermal_zone: dir.join("thermal_zone0_temp"),
            hwmon_root: dir.join("hwmon"),
            gpu_usage: dir.join("gpu_busy_percent"),
            gpu_temp: dir.join("gpu_temp1_input"),
            gpu_power: dir.join("gpu_power1_average"),
        };
        fs::create_dir_all(&paths.hwmon_root).unwrap();
        fs::write(&paths.thermal_zone, "52000\n").unwrap();
        fs::write(&paths.gpu_usage, "37\n").unwrap();
        fs::write(&paths.gpu_temp, "58000\n").unwrap();
        fs::write(&paths.gpu_power, "45120000\n").unwrap();
        paths
    }

    /// Creates a mock Snapshot with CPU power present and GPU power absent
    pub fn create_mock_snapshot() -> Snapshot {
        Snapshot {
            cpu: CpuStats { percent: 12.5, temp_celsius: 48.0, power_watts: Some(17.25) },
            memory: MemoryStats { total_gb: 31.27, used_gb: 12.5, percent: 40.0 },
            gpu: GpuStats { usage_percent: 3.0, temp_celsius: 41.0, power_watts: None },
            timestamp: "2025-03-01T12:00:00+01:00".to_string(),
            warning: None,
        }
    }

    pub fn create_mock_report(outcome: CycleOutcome) -> CycleReport {
        CycleReport { snapshot: create_mock_snapshot(), outcome, elapsed: Duration::from_millis(5) }
    }

    /// Creates a mock App with two listed devices and default settings
    pub fn create_mock_app() -> App {
        let mut app = App::new(&Config::default(), "Test CPU @ 3.00GHz".to_string(), true);
        app.devices = vec![
            Device { id: "AAA".into(), state: "device".into(), model: "One".into() },
            Device { id: "BBB".into(), state: "device".into(), model: "Two".into() },
        ];
        app
    }

    /// Asserts that two floating point values are approximately equal
    pub fn assert_approx_eq(a: f64, b: f64, tolerance: f64) {
        assert!(
            (a - b).abs() < tolerance,
            "Values not approximately equal: {} vs {} (tolerance: {})",
            a,
            b,
            tolerance
        );
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use crate::hwmon::read_chip_temps;
    use tempfile::TempDir;

    #[test]
    fn test_fake_sensor_tree_layout() {
        let dir = TempDir::new().unwrap();
        let paths = fake_sensor_tree(dir.path());
        assert!(paths.hwmon_root.is_dir());
        assert!(paths.gpu_power.is_file());
        assert!(!dir.path().join("energy_uj").exists());
    }

    #[test]
    fn test_write_hwmon_chip() {
        let dir = TempDir::new().unwrap();
        write_hwmon_chip(dir.path(), "hwmon0", "coretemp", &[(2, 45500), (1, 40000)]);
        let chips = read_chip_temps(dir.path()).unwrap();
        assert_eq!(chips.len(), 1);
        assert_eq!(chips[0].name, "coretemp");
        assert_approx_eq(chips[0].temps[0].1, 40.0, 1e-9);
    }

    #[test]
    fn test_mock_snapshot_memory_consistent() {
        let snap = create_mock_snapshot();
        assert_approx_eq(snap.memory.used_gb / snap.memory.total_gb * 100.0, snap.memory.percent, 0.1);
    }

    #[test]
    fn test_assert_approx_eq() {
        assert_approx_eq(1.0, 1.001, 0.01);
    }

    #[test]
    #[should_panic]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq(1.0, 1.1, 0.01);
    }
}
