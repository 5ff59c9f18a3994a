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

//! Low-level sysfs helpers shared by the sensor and power readers.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;

/// Default hwmon class directory.
pub const HWMON_ROOT: &str = "/sys/class/hwmon";

#[derive(Error, Debug)]
pub enum HwmonError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Temperatures exposed by one hwmon chip, ordered by sensor index.
#[derive(Debug, Clone, PartialEq)]
pub struct ChipTemps {
    pub name: String,
    pub temps: Vec<(String, f64)>, // Celsius
}

pub fn read_trimmed<P: AsRef<Path>>(p: P) -> io::Result<String> {
    let mut s = String::new();
    fs::File::open(p)?.read_to_string(&mut s)?;
    Ok(s.trim().to_string())
}

/// Read a sysfs file holding a single integer.
pub fn read_i64<P: AsRef<Path>>(p: P) -> Result<i64, HwmonError> {
    let raw = read_trimmed(&p)?;
    raw.parse::<i64>()
        .map_err(|e| HwmonError::Parse(format!("{}: {:?} ({})", p.as_ref().display(), raw, e)))
}

/// Read a millidegree file and convert to Celsius.
pub fn read_millidegrees<P: AsRef<Path>>(p: P) -> Result<f64, HwmonError> {
    Ok(read_i64(p)? as f64 / 1000.0)
}

pub fn extract_index(fname: &str, prefix: &str, suffix: &str) -> Option<usize> {
    if fname.len() < prefix.len() + suffix.len() {
        return None;
    }
    if fname.starts_with(prefix) && fname.ends_with(suffix) {
        let mid = &fname[prefix.len()..fname.len() - suffix.len()];
        mid.parse().ok()
    } else {
        None
    }
}

/// Read every chip under `root` with its temperature inputs.
///
/// A missing root yields an empty list; unreadable individual sensors are skipped.
pub fn read_chip_temps<P: AsRef<Path>>(root: P) -> Result<Vec<ChipTemps>, HwmonError> {
    let mut out: Vec<ChipTemps> = Vec::new();

    let entries = match fs::read_dir(root.as_ref()) {
        Ok(it) => it,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(out),
        Err(e) => return Err(e.into()),
    };

    for ent in entries.flatten() {
        let path = ent.path();
        if !path.is_dir() { continue; }
        let dir = fs::canonicalize(&path).unwrap_or(path);
        let name = read_trimmed(dir.join("name")).unwrap_or_else(|_| "unknown".into());

        let mut indexed: Vec<(usize, String, f64)> = Vec::new();
        let Ok(dir_iter) = fs::read_dir(&dir) else { continue };
        for file in dir_iter.flatten() {
            let fname = file.file_name();
            let fname = fname.to_string_lossy();
            let Some(idx) = extract_index(&fname, "temp", "_input") else { continue };
            let label = read_trimmed(dir.join(format!("temp{}_label", idx)))
                .unwrap_or_else(|_| format!("temp{}", idx));
            if let Ok(c) = read_millidegrees(file.path()) {
                indexed.push((idx, label, c));
            }
        }
        indexed.sort_by_key(|(idx, _, _)| *idx);

        out.push(ChipTemps {
            name,
            temps: indexed.into_iter().map(|(_, l, c)| (l, c)).collect(),
        });
    }

    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

/// First temperature of the first chip whose name matches, honouring the order of `names`.
pub fn find_named_temp(chips: &[ChipTemps], names: &[&str]) -> Option<f64> {
    names.iter().find_map(|want| {
        chips
            .iter()
            .filter(|c| c.name == *want)
            .find_map(|c| c.temps.first().map(|(_, t)| *t))
    })
}
