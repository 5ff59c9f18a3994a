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

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode};
use crate::bridge::{clamp_brightness, MAX_BRIGHTNESS};
use crate::session::{Command, DeviceAction, SessionState};

const BRIGHTNESS_STEP: i32 = 16;
const MIN_INTERVAL_MS: u64 = 100;

/// Main event handler. Returns the command to forward to the session, if any.
/// Sets `app.should_quit` when the user asks to leave.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Option<Command> {
    let KeyEvent { code, modifiers, .. } = key_event;

    // Ctrl-C always quits, even while typing
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Some(Command::Shutdown);
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_events(app, code),
        InputMode::Command | InputMode::Interval => handle_input_events(app, code),
    }
}

/// Text entry for a custom shell command or a new interval.
fn handle_input_events(app: &mut App, code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Esc => {
            app.input.clear();
            app.input_mode = InputMode::Normal;
            None
        }
        KeyCode::Backspace => {
            app.input.pop();
            None
        }
        KeyCode::Char(c) => {
            if app.input_mode == InputMode::Command || c.is_ascii_digit() {
                app.input.push(c);
            }
            None
        }
        KeyCode::Enter => {
            let text = std::mem::take(&mut app.input);
            let mode = std::mem::replace(&mut app.input_mode, InputMode::Normal);
            submit_input(app, mode, text.trim())
        }
        _ => None,
    }
}

fn submit_input(app: &mut App, mode: InputMode, text: &str) -> Option<Command> {
    if text.is_empty() {
        return None;
    }
    match mode {
        InputMode::Command => Some(Command::Custom(text.to_string())),
        InputMode::Interval => match text.parse::<u64>() {
            Ok(ms) if ms >= MIN_INTERVAL_MS => Some(Command::SetInterval(Duration::from_millis(ms))),
            _ => {
                app.push_log(format!("interval must be at least {} ms", MIN_INTERVAL_MS));
                None
            }
        },
        InputMode::Normal => None,
    }
}

fn adjust_brightness(app: &mut App, delta: i32) -> Option<Command> {
    match app.brightness {
        Some(level) => Some(Command::SetBrightness(clamp_brightness(level.saturating_add(delta)))),
        // Unknown level: ask the device first
        None => Some(Command::ReadBrightness),
    }
}

fn handle_normal_events(app: &mut App, code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
            Some(Command::Shutdown)
        }
        KeyCode::Char('s') => Some(match app.state {
            SessionState::Idle => Command::Start,
            SessionState::Running => Command::Stop,
        }),
        KeyCode::Char('r') => Some(Command::RefreshDevices),
        KeyCode::Up => {
            app.device_idx = app.device_idx.saturating_sub(1);
            None
        }
        KeyCode::Down => {
            if app.device_idx + 1 < app.devices.len() {
                app.device_idx += 1;
            }
            None
        }
        KeyCode::Enter => app.highlighted_device().map(|d| Command::SelectDevice(d.id.clone())),
        KeyCode::Char('+') | KeyCode::Char('=') => adjust_brightness(app, BRIGHTNESS_STEP),
        KeyCode::Char('-') => adjust_brightness(app, -BRIGHTNESS_STEP),
        KeyCode::Char('M') => Some(Command::SetBrightness(MAX_BRIGHTNESS)),
        KeyCode::Char('b') => Some(Command::ReadBrightness),
        KeyCode::Char('o') => Some(Command::Action(DeviceAction::ScreenOn)),
        KeyCode::Char('f') => Some(Command::Action(DeviceAction::ScreenOff)),
        KeyCode::Char('w') => Some(Command::Action(DeviceAction::Wake)),
        KeyCode::Char('p') => Some(Command::Action(DeviceAction::Power)),
        KeyCode::Char('u') => Some(Command::Action(DeviceAction::Unlock)),
        KeyCode::Char(']') => Some(Command::Action(DeviceAction::VolumeUp)),
        KeyCode::Char('[') => Some(Command::Action(DeviceAction::VolumeDown)),
        KeyCode::Char(':') => {
            app.input.clear();
            app.input_mode = InputMode::Command;
            None
        }
        KeyCode::Char('i') => {
            app.input = app.interval.as_millis().to_string();
            app.input_mode = InputMode::Interval;
            None
        }
        _ => None,
    }
}
