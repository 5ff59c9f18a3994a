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

mod cli;

use std::io::stdout;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{self, Event as TermEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use serde_json::json;
use tracing::{info, warn};

use remote_sysmon::app::App;
use remote_sysmon::bridge::Bridge;
use remote_sysmon::config::{config_path, Config};
use remote_sysmon::events::handle_key_event;
use remote_sysmon::logger;
use remote_sysmon::service::{run_service, Monitor, ServiceOptions};
use remote_sysmon::session::{Command, SessionHandle};
use remote_sysmon::system;
use remote_sysmon::ui::ui;

use cli::{Cli, Commands};

const UI_TICK: Duration = Duration::from_millis(200);

fn main() -> anyhow::Result<()> {
    let Cli { config, verbose, event_log, command } = Cli::parse();
    let config_file = config.unwrap_or_else(config_path);
    let command = command.unwrap_or(Commands::Run { once: false, interval_ms: None });

    // stderr belongs to the alternate screen while the dashboard is up
    if command == Commands::Tui {
        let log_path = config_file.with_file_name("remote-sysmon.log");
        if let Err(e) = logger::init_tracing_to_file(verbose, &log_path) {
            eprintln!("Warning: could not open log file {}: {}", log_path.display(), e);
        }
    } else {
        logger::init_tracing(verbose);
    }

    if let Some(path) = &event_log {
        if let Err(e) = logger::init_event_log(path) {
            warn!("Could not open event log {}: {}", path.display(), e);
        }
    }

    let config = Config::load_or_default(&config_file);

    match command {
        Commands::Run { once, interval_ms } => {
            logger::log_event("startup", json!({ "mode": "run", "config": config_file }));
            startup_checks(&config);
            let interval = interval_ms
                .map(|ms| Duration::from_millis(ms.max(1)))
                .unwrap_or_else(|| config.monitoring.interval());
            let mut monitor = Monitor::from_config(&config);
            run_service(&mut monitor, ServiceOptions { interval, once });
            Ok(())
        }
        Commands::Tui => {
            logger::log_event("startup", json!({ "mode": "tui", "config": config_file }));
            startup_checks(&config);
            run_tui(config, &config_file)
        }
        other => cli::run_cli(&other, &config, &config_file),
    }
}

/// Warn about degraded operation; never fatal.
fn startup_checks(config: &Config) {
    if !system::is_elevated() {
        warn!("Not running as root: CPU power readings will be unavailable");
    }
    if !Bridge::from_settings(&config.adb).is_available() {
        warn!("'{}' is not runnable; pushes will fail until it is installed", config.adb.bridge_path);
    }
}

fn run_tui(config: Config, config_file: &Path) -> anyhow::Result<()> {
    let session = SessionHandle::spawn(Monitor::from_config(&config), config.monitoring.interval());
    if config.adb.auto_connect {
        session.send(Command::AutoConnect { preferred: config.adb.device_id.clone() });
    }
    if config.monitoring.auto_start {
        session.send(Command::Start);
    }
    let mut app = App::new(&config, system::cpu_model(), system::is_elevated());

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let res = run_app(&mut terminal, &mut app, &session);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    session.shutdown();
    persist_choices(&config, &app, config_file);
    logger::log_event("shutdown", json!({ "mode": "tui" }));
    res
}

/// Keep the interval and device picked in the dashboard for the next start.
fn persist_choices(config: &Config, app: &App, config_file: &Path) {
    let interval_ms = app.interval.as_millis() as u64;
    if interval_ms == config.monitoring.interval_ms && app.selected_device == config.adb.device_id {
        return;
    }
    let mut updated = config.clone();
    updated.monitoring.interval_ms = interval_ms;
    updated.adb.device_id = app.selected_device.clone();
    match updated.save(config_file) {
        Ok(()) => info!("saved settings to {}", config_file.display()),
        Err(e) => warn!("{}", e),
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    session: &SessionHandle,
) -> anyhow::Result<()> {
    loop {
        for ev in session.poll_events() {
            app.apply_event(ev);
        }

        terminal.draw(|f| ui(f, app))?;

        if event::poll(UI_TICK)? {
            if let TermEvent::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    match handle_key_event(app, key_event) {
                        Some(Command::Shutdown) => return Ok(()),
                        Some(cmd) => session.send(cmd),
                        None => {}
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
