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

//! CPU package power from a RAPL-style cumulative energy counter.
//!
//! The counter is only readable by root on most kernels, so "unavailable" is an
//! expected outcome and is reported as `None`.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::hwmon::read_i64;

pub const RAPL_ENERGY_PATH: &str = "/sys/class/powercap/intel-rapl/intel-rapl:0/energy_uj";

/// Average power in watts between two microjoule counter readings.
///
/// `max_range_uj` corrects a single wraparound of the counter. Returns `None`
/// for a zero interval or a backwards counter without a known range.
pub fn watts_from_energy(first_uj: i64, second_uj: i64, elapsed: Duration, max_range_uj: Option<i64>) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return None;
    }
    let delta = if second_uj >= first_uj {
        second_uj - first_uj
    } else {
        let range = max_range_uj.filter(|r| *r > first_uj)?;
        range - first_uj + second_uj
    };
    Some(delta as f64 / 1_000_000.0 / secs)
}

#[derive(Debug, Clone)]
pub struct PowerEstimator {
    energy_path: PathBuf,
}

impl Default for PowerEstimator {
    fn default() -> Self {
        Self::new(RAPL_ENERGY_PATH)
    }
}

impl PowerEstimator {
    pub fn new<P: Into<PathBuf>>(energy_path: P) -> Self {
        Self { energy_path: energy_path.into() }
    }

    pub fn energy_path(&self) -> &Path {
        &self.energy_path
    }

    fn max_range(&self) -> Option<i64> {
        let sibling = self.energy_path.with_file_name("max_energy_range_uj");
        read_i64(sibling).ok()
    }

    /// Read the counter, sleep `interval`, read again.
    ///
    /// The sleep is skipped when the first read already fails.
    pub fn sample(&self, interval: Duration) -> Option<f64> {
        let first = match read_i64(&self.energy_path) {
            Ok(v) => v,
            Err(e) => {
                debug!("energy counter unavailable at {}: {}", self.energy_path.display(), e);
                return None;
            }
        };
        let start = Instant::now();
        thread::sleep(interval);
        let second = read_i64(&self.energy_path).ok()?;
        let watts = watts_from_energy(first, second, start.elapsed(), self.max_range());
        debug!(?watts, first, second, "energy counter sampled");
        watts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_watts_divides_by_elapsed_seconds() {
        let w = watts_from_energy(1_000_000, 3_000_000, Duration::from_secs(2), None).unwrap();
        assert!((w - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_watts_one_second() {
        let w = watts_from_energy(0, 15_500_000, Duration::from_secs(1), None).unwrap();
        assert!((w - 15.5).abs() < 1e-12);
    }

    #[test]
    fn test_watts_sub_second_interval() {
        let w = watts_from_energy(0, 1_000_000, Duration::from_millis(100), None).unwrap();
        assert!((w - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_watts_zero_interval() {
        assert_eq!(watts_from_energy(0, 10, Duration::ZERO, None), None);
    }

    #[test]
    fn test_watts_wraparound() {
        let w = watts_from_energy(9_000_000, 1_000_000, Duration::from_secs(1), Some(10_000_000)).unwrap();
        assert!((w - 2.0).abs() < 1e-12);
        assert_eq!(watts_from_energy(9_000_000, 1_000_000, Duration::from_secs(1), None), None);
    }

    #[test]
    fn test_sample_missing_counter() {
        let dir = TempDir::new().unwrap();
        let est = PowerEstimator::new(dir.path().join("energy_uj"));
        let start = Instant::now();
        assert_eq!(est.sample(Duration::from_secs(5)), None);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_sample_static_counter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("energy_uj");
        fs::write(&path, "123456\n").unwrap();
        let est = PowerEstimator::new(&path);
        assert_eq!(est.sample(Duration::from_millis(10)), Some(0.0));
    }

    #[test]
    fn test_sample_unparseable_counter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("energy_uj");
        fs::write(&path, "n/a").unwrap();
        assert_eq!(PowerEstimator::new(&path).sample(Duration::from_millis(1)), None);
    }
}
