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

//! RemoteSysMon - push desktop telemetry to an Android display over adb
//!
//! This library reads CPU, memory and GPU sensors from sysfs, assembles them
//! into a JSON snapshot and delivers it to the device through the bridge tool,
//! either in a headless loop or from the interactive terminal session.

pub mod hwmon;
pub mod sensors;
pub mod power;
pub mod snapshot;
pub mod stats;
pub mod bridge;
pub mod config;
pub mod system;
pub mod service;
pub mod session;
pub mod logger;
pub mod app;
pub mod events;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
