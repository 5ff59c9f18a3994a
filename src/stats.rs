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

use std::time::Duration;

use chrono::Local;

use crate::power::PowerEstimator;
use crate::sensors::{SensorGap, SensorReader};
use crate::snapshot::{round2, Snapshot};

pub const POWER_WARNING: &str = "CPU power unavailable - run with sudo";

/// A snapshot plus the sensors that could not be read while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    pub snapshot: Snapshot,
    pub gaps: Vec<SensorGap>,
}

pub struct StatsAggregator {
    reader: SensorReader,
    power: PowerEstimator,
    elevated: bool,
    power_sample: Duration,
}

impl StatsAggregator {
    pub fn new(reader: SensorReader, power: PowerEstimator, elevated: bool, power_sample: Duration) -> Self {
        Self { reader, power, elevated, power_sample }
    }

    pub fn set_power_sample(&mut self, interval: Duration) {
        self.power_sample = interval;
    }

    /// Sample power first (this blocks for the sample interval), then the rest.
    pub fn collect(&mut self) -> Collected {
        let mut gaps = Vec::new();
        let cpu_power = self.power.sample(self.power_sample).map(round2);

        let mut cpu = self.reader.read_cpu(&mut gaps);
        let memory = self.reader.read_memory();
        let gpu = self.reader.read_gpu(&mut gaps);

        cpu.power_watts = cpu_power;
        if cpu_power.is_none() {
            gaps.push(SensorGap::CpuPower);
        }

        let warning = (cpu_power.is_none() && !self.elevated).then(|| POWER_WARNING.to_string());

        Collected {
            snapshot: Snapshot {
                cpu,
                memory,
                gpu,
                timestamp: Local::now().to_rfc3339(),
                warning,
            },
            gaps,
        }
    }
}
