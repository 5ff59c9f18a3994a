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

//! Poll cycle (collect, format, push) and the headless loop around it.

use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::bridge::{Bridge, BridgeError, CommandRunner, ProcessRunner};
use crate::config::{Appearance, Config, PayloadFormat};
use crate::logger;
use crate::power::PowerEstimator;
use crate::sensors::{SensorGap, SensorPaths, SensorReader};
use crate::snapshot::{Envelope, Snapshot};
use crate::stats::StatsAggregator;
use crate::system::is_elevated;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Pushed with every sensor read.
    Delivered,
    /// Pushed, but some sensors were unavailable.
    Partial { gaps: Vec<SensorGap> },
    /// Not delivered to the device.
    Failed { reason: String },
}

impl CycleOutcome {
    pub fn delivered(&self) -> bool {
        !matches!(self, CycleOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub snapshot: Snapshot,
    pub outcome: CycleOutcome,
    pub elapsed: Duration,
}

/// One sensor stack bound to one bridge. Runs a single cycle at a time.
pub struct Monitor<R: CommandRunner = ProcessRunner> {
    aggregator: StatsAggregator,
    bridge: Bridge<R>,
    payload: PayloadFormat,
    appearance: Appearance,
}

impl Monitor<ProcessRunner> {
    pub fn from_config(config: &Config) -> Self {
        let aggregator = StatsAggregator::new(
            SensorReader::new(SensorPaths::default()),
            PowerEstimator::default(),
            is_elevated(),
            config.monitoring.power_sample(),
        );
        Self::new(aggregator, Bridge::from_settings(&config.adb), config)
    }
}

impl<R: CommandRunner> Monitor<R> {
    pub fn new(aggregator: StatsAggregator, bridge: Bridge<R>, config: &Config) -> Self {
        Self {
            aggregator,
            bridge,
            payload: config.monitoring.payload,
            appearance: config.appearance.clone(),
        }
    }

    pub fn bridge(&self) -> &Bridge<R> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge<R> {
        &mut self.bridge
    }

    pub fn set_power_sample(&mut self, interval: Duration) {
        self.aggregator.set_power_sample(interval);
    }

    fn deliver(&self, snapshot: &Snapshot) -> Result<(), BridgeError> {
        match self.payload {
            PayloadFormat::Snapshot => self.bridge.push_json(snapshot),
            PayloadFormat::Envelope => self.bridge.push_json(&Envelope::wrap(snapshot, &self.appearance)),
        }
    }

    pub fn run_cycle(&mut self) -> CycleReport {
        let start = Instant::now();
        let collected = self.aggregator.collect();
        let outcome = match self.deliver(&collected.snapshot) {
            Err(e) => CycleOutcome::Failed { reason: e.to_string() },
            Ok(()) if collected.gaps.is_empty() => CycleOutcome::Delivered,
            Ok(()) => CycleOutcome::Partial { gaps: collected.gaps },
        };
        CycleReport { snapshot: collected.snapshot, outcome, elapsed: start.elapsed() }
    }
}

pub fn log_cycle(report: &CycleReport) {
    match &report.outcome {
        CycleOutcome::Delivered => info!("cycle delivered in {:?}", report.elapsed),
        CycleOutcome::Partial { gaps } => {
            let names: Vec<String> = gaps.iter().map(|g| g.to_string()).collect();
            info!("cycle delivered in {:?}, unavailable: {}", report.elapsed, names.join(", "));
        }
        CycleOutcome::Failed { reason } => warn!("Failed to send data over ADB: {}", reason),
    }
    logger::log_event("cycle", json!({
        "snapshot": report.snapshot,
        "outcome": report.outcome,
        "elapsed_ms": report.elapsed.as_millis() as u64,
    }));
}

#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    pub interval: Duration,
    pub once: bool,
}

/// Headless loop: one cycle, fixed delay, repeat until the process ends.
pub fn run_service<R: CommandRunner>(monitor: &mut Monitor<R>, opts: ServiceOptions) {
    info!("starting headless monitor, interval {:?}, target {}", opts.interval, monitor.bridge().target_path());
    loop {
        let report = monitor.run_cycle();
        log_cycle(&report);
        if opts.once {
            return;
        }
        thread::sleep(opts.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{CommandOutput, MockCommandRunner};
    use crate::test_utils::test_utils::fake_sensor_tree;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn monitor(dir: &TempDir, runner: MockCommandRunner, config: &Config) -> Monitor<MockCommandRunner> {
        let aggregator = StatsAggregator::new(
            SensorReader::new(fake_sensor_tree(dir.path())),
            PowerEstimator::new(dir.path().join("energy_uj")),
            false,
            Duration::from_millis(5),
        );
        Monitor::new(aggregator, Bridge::with_runner(runner, &config.adb), config)
    }

    fn ok() -> CommandOutput {
        CommandOutput { code: Some(0), ..CommandOutput::default() }
    }

    #[test]
    fn test_cycle_partial_when_power_missing() {
        let dir = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_, _| Ok(ok()));
        let mut m = monitor(&dir, runner, &Config::default());
        let report = m.run_cycle();
        assert_eq!(report.outcome, CycleOutcome::Partial { gaps: vec![SensorGap::CpuPower] });
        assert!(report.outcome.delivered());
    }

    #[test]
    fn test_cycle_delivered_with_all_sensors() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("energy_uj"), "5").unwrap();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_, _| Ok(ok()));
        let mut m = monitor(&dir, runner, &Config::default());
        assert_eq!(m.run_cycle().outcome, CycleOutcome::Delivered);
    }

    #[test]
    fn test_cycle_failed_push_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_, _| Err(BridgeError::ToolMissing(PathBuf::from("adb"))));
        let mut m = monitor(&dir, runner, &Config::default());
        let report = m.run_cycle();
        assert!(matches!(&report.outcome, CycleOutcome::Failed { reason } if reason.contains("not found")));
        assert_eq!(report.snapshot.gpu.usage_percent, 37.0);
    }

    #[test]
    fn test_envelope_payload_pushed() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.monitoring.payload = PayloadFormat::Envelope;
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|args, _| {
            let body: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&args[1]).unwrap()).unwrap();
            assert!(body["stats"]["cpu"].get("cpu_percent").is_some());
            assert_eq!(body["metadata"]["version"], crate::snapshot::PAYLOAD_VERSION);
            Ok(CommandOutput { code: Some(0), ..CommandOutput::default() })
        });
        let mut m = monitor(&dir, runner, &config);
        assert!(m.run_cycle().outcome.delivered());
    }

    #[test]
    fn test_run_service_once() {
        let dir = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_, _| Ok(ok()));
        let mut m = monitor(&dir, runner, &Config::default());
        run_service(&mut m, ServiceOptions { interval: Duration::from_secs(60), once: true });
    }

    #[test]
    fn test_outcome_serialization() {
        let v = serde_json::to_value(CycleOutcome::Partial { gaps: vec![SensorGap::GpuPower] }).unwrap();
        assert_eq!(v, json!({"status": "partial", "gaps": ["gpu_power"]}));
        let v = serde_json::to_value(CycleOutcome::Delivered).unwrap();
        assert_eq!(v, json!({"status": "delivered"}));
    }
}
