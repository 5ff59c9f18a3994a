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

//! Diagnostics go through `tracing`; cycle records optionally go to a JSON-lines
//! event log (`{"ts_ms", "event", "data"}` per line).

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

lazy_static! {
    static ref EVENT_LOG: Mutex<Option<File>> = Mutex::new(None);
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)))
}

/// Install the stderr subscriber. `RUST_LOG` wins over `verbosity`.
pub fn init_tracing(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(io::stderr)
        .with_env_filter(env_filter(verbosity))
        .try_init();
}

/// Install a subscriber writing to `path`, for when stderr belongs to the terminal UI.
pub fn init_tracing_to_file(verbosity: u8, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_env_filter(env_filter(verbosity))
        .try_init();
    Ok(())
}

pub fn init_event_log(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let f = OpenOptions::new().create(true).append(true).open(path)?;
    if let Ok(mut guard) = EVENT_LOG.lock() {
        *guard = Some(f);
    }
    Ok(())
}

/// Append one event line. No-op until [`init_event_log`] succeeded.
pub fn log_event(event: &str, data: Value) {
    let Ok(mut guard) = EVENT_LOG.lock() else { return };
    let Some(f) = guard.as_mut() else { return };
    let line = json!({
        "ts_ms": now_millis(),
        "event": event,
        "data": data,
    })
    .to_string();
    let _ = writeln!(f, "{}", line);
}
