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

use std::fs;

/// True when running as root; the energy counter usually needs it.
pub fn is_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// CPU model from `/proc/cpuinfo` text: `model name`, else `Hardware` (ARM boards).
pub fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    let mut hardware: Option<String> = None;
    for line in cpuinfo.lines() {
        let Some((k, v)) = line.split_once(':') else { continue };
        let val = v.trim();
        if val.is_empty() {
            continue;
        }
        match k.trim().to_ascii_lowercase().as_str() {
            "model name" => return Some(val.to_string()),
            "hardware" if hardware.is_none() => hardware = Some(val.to_string()),
            _ => {}
        }
    }
    hardware
}

pub fn cpu_model() -> String {
    if let Some(m) = fs::read_to_string("/proc/cpuinfo").ok().as_deref().and_then(parse_cpu_model) {
        return m;
    }
    // device-tree boards
    fs::read_to_string("/proc/device-tree/model")
        .map(|mut s| {
            s.retain(|c| c != '\u{0}');
            s.trim().to_string()
        })
        .unwrap_or_default()
}
