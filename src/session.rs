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

//! Interactive monitoring session.
//!
//! A single worker thread owns the [`Monitor`] and the bridge. The presentation
//! layer talks to it only through [`Command`]s and reads back [`Event`]s, so no
//! mutable state is shared and cycles never overlap: commands are handled
//! between cycles, and a cycle in flight runs to completion (the bridge call is
//! bounded by its own timeout).

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::bridge::{CommandRunner, Device};
use crate::service::{log_cycle, CycleReport, Monitor};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceAction {
    ScreenOn,
    ScreenOff,
    Wake,
    Power,
    Unlock,
    VolumeUp,
    VolumeDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    SetInterval(Duration),
    RefreshDevices,
    /// List devices and select `preferred` if present, else the first one.
    AutoConnect { preferred: Option<String> },
    SelectDevice(String),
    Action(DeviceAction),
    SetBrightness(i32),
    ReadBrightness,
    Custom(String),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StateChanged(SessionState),
    IntervalChanged(Duration),
    Cycle(CycleReport),
    Devices(Vec<Device>),
    DeviceSelected { id: String, reachable: bool },
    Brightness(Option<i32>),
    ActionDone { action: DeviceAction, ok: bool },
    BrightnessSet { level: i32, ok: bool },
    CommandOutput { command: String, output: Option<String> },
}

struct Worker<R: CommandRunner> {
    monitor: Monitor<R>,
    state: SessionState,
    interval: Duration,
    next_tick: Instant,
    events: Sender<Event>,
}

impl<R: CommandRunner> Worker<R> {
    fn emit(&self, event: Event) {
        // A closed receiver just means the UI is gone; Shutdown follows.
        let _ = self.events.send(event);
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            self.state = state;
            info!("monitoring {:?}", state);
            self.emit(Event::StateChanged(state));
        }
    }

    fn select(&mut self, id: &str) {
        let reachable = self.monitor.bridge_mut().connect(id);
        if !reachable {
            warn!("device {} did not answer", id);
        }
        self.emit(Event::DeviceSelected { id: id.to_string(), reachable });
        if reachable {
            let level = self.monitor.bridge().brightness();
            self.emit(Event::Brightness(level));
        }
    }

    fn act(&self, action: DeviceAction) -> bool {
        let bridge = self.monitor.bridge();
        match action {
            DeviceAction::ScreenOn => bridge.screen_on(),
            DeviceAction::ScreenOff => bridge.screen_off(),
            DeviceAction::Wake => bridge.wake(),
            DeviceAction::Power => bridge.press_power(),
            DeviceAction::Unlock => bridge.unlock(),
            DeviceAction::VolumeUp => bridge.volume_up(),
            DeviceAction::VolumeDown => bridge.volume_down(),
        }
    }

    /// Returns false on shutdown.
    fn handle(&mut self, cmd: Command) -> bool {
        debug!(?cmd, "session command");
        match cmd {
            Command::Start => {
                self.next_tick = Instant::now();
                self.set_state(SessionState::Running);
            }
            Command::Stop => self.set_state(SessionState::Idle),
            Command::SetInterval(interval) => {
                self.interval = interval;
                self.next_tick = Instant::now() + interval;
                self.emit(Event::IntervalChanged(interval));
            }
            Command::RefreshDevices => {
                let devices = self.monitor.bridge().devices();
                self.emit(Event::Devices(devices));
            }
            Command::AutoConnect { preferred } => {
                let devices = self.monitor.bridge().devices();
                let pick = preferred
                    .filter(|p| devices.iter().any(|d| &d.id == p))
                    .or_else(|| devices.first().map(|d| d.id.clone()));
                self.emit(Event::Devices(devices));
                if let Some(id) = pick {
                    self.select(&id);
                }
            }
            Command::SelectDevice(id) => self.select(&id),
            Command::Action(action) => {
                let ok = self.act(action);
                self.emit(Event::ActionDone { action, ok });
            }
            Command::SetBrightness(level) => {
                let ok = self.monitor.bridge().set_brightness(level);
                self.emit(Event::BrightnessSet { level: crate::bridge::clamp_brightness(level), ok });
            }
            Command::ReadBrightness => {
                let level = self.monitor.bridge().brightness();
                self.emit(Event::Brightness(level));
            }
            Command::Custom(command) => {
                let output = self.monitor.bridge().custom(&command);
                self.emit(Event::CommandOutput { command, output });
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn tick(&mut self) {
        let report = self.monitor.run_cycle();
        log_cycle(&report);
        self.emit(Event::Cycle(report));
        // Fixed delay after completion; a slow cycle never overlaps the next.
        self.next_tick = Instant::now() + self.interval;
    }

    fn run(mut self, commands: Receiver<Command>) {
        loop {
            let next = match self.state {
                SessionState::Idle => match commands.recv() {
                    Ok(cmd) => Some(cmd),
                    Err(_) => return,
                },
                SessionState::Running => {
                    let wait = self.next_tick.saturating_duration_since(Instant::now());
                    match commands.recv_timeout(wait) {
                        Ok(cmd) => Some(cmd),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
            };
            match next {
                Some(cmd) => {
                    if !self.handle(cmd) {
                        return;
                    }
                }
                None => self.tick(),
            }
        }
    }
}

/// Presentation-side handle to the worker thread.
pub struct SessionHandle {
    commands: Sender<Command>,
    events: Receiver<Event>,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn spawn<R: CommandRunner + 'static>(monitor: Monitor<R>, interval: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (evt_tx, evt_rx) = mpsc::channel();
        let worker = Worker {
            monitor,
            state: SessionState::Idle,
            interval,
            next_tick: Instant::now(),
            events: evt_tx,
        };
        let handle = thread::Builder::new()
            .name("sysmon-session".into())
            .spawn(move || worker.run(cmd_rx))
            .ok();
        if handle.is_none() {
            warn!("failed to spawn session worker");
        }
        Self { commands: cmd_tx, events: evt_rx, worker: handle }
    }

    pub fn send(&self, cmd: Command) {
        if self.commands.send(cmd).is_err() {
            warn!("session worker is gone");
        }
    }

    /// Drain every pending event without blocking.
    pub fn poll_events(&self) -> Vec<Event> {
        self.events.try_iter().collect()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Event> {
        self.events.recv_timeout(timeout).ok()
    }

    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn stop_worker(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(h) = self.worker.take() {
            let _ = h.join();
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop_worker();
    }
}
