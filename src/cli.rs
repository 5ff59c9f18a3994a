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

//! Command Line Interface
//!
//! One-shot device and configuration commands. `run` and `tui` are dispatched
//! from `main`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use remote_sysmon::bridge::Bridge;
use remote_sysmon::config::Config;

#[derive(Parser, Debug)]
#[command(name = "remote-sysmon")]
#[command(version)]
#[command(about = "Push desktop CPU/GPU/memory telemetry to an Android device over adb")]
#[command(long_about = "Push desktop CPU/GPU/memory telemetry to an Android device over adb

EXAMPLES:
    remote-sysmon                          Run the headless monitor (default)
    remote-sysmon run --once               Collect and push a single snapshot
    remote-sysmon tui                      Interactive dashboard
    remote-sysmon devices                  List attached devices
    remote-sysmon brightness set 128       Set device screen brightness
    remote-sysmon screen off               Turn the device screen off
    remote-sysmon config show              Print the effective configuration

ENVIRONMENT VARIABLES:
    RUST_LOG=debug         Override the log filter

FILES:
    ~/.config/remote-sysmon/config.json    Settings
    ~/.config/remote-sysmon/remote-sysmon.log   Diagnostics while in the TUI")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Append JSON-lines cycle events to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub event_log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Collect and push telemetry on a fixed interval (default)
    Run {
        /// Push one snapshot and exit
        #[arg(long)]
        once: bool,
        /// Override monitoring.interval_ms
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
    },

    /// Interactive terminal dashboard
    Tui,

    /// List attached devices
    Devices,

    /// Run a shell command on the device and print its output
    Shell {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Read or set screen brightness (0-255)
    Brightness {
        #[command(subcommand)]
        action: Option<BrightnessCommands>,
    },

    /// Screen control
    Screen {
        #[arg(value_enum)]
        action: ScreenAction,
    },

    /// Volume control
    Volume {
        #[arg(value_enum)]
        direction: VolumeDirection,
    },

    /// Configuration file management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum BrightnessCommands {
    /// Print the current level
    Get,
    /// Set the level; values outside 0-255 are clamped
    Set {
        #[arg(allow_hyphen_values = true)]
        level: i32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenAction {
    On,
    Off,
    Wake,
    Power,
    Unlock,
    State,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeDirection {
    Up,
    Down,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Print the effective configuration as JSON
    Show,
    /// Print the configuration file path
    Path,
    /// Overwrite the configuration file with defaults
    Reset,
}

fn require(ok: bool, what: &str) -> anyhow::Result<()> {
    if !ok {
        bail!("{} failed", what);
    }
    println!("{}: ok", what);
    Ok(())
}

/// Execute a one-shot command. `run` and `tui` never reach here.
pub fn run_cli(command: &Commands, config: &Config, config_file: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Config(sub) => cmd_config(sub, config, config_file),
        Commands::Run { .. } | Commands::Tui => Ok(()),
        device_cmd => cmd_device(device_cmd, &Bridge::from_settings(&config.adb)),
    }
}

fn cmd_config(sub: &ConfigCommands, config: &Config, config_file: &Path) -> anyhow::Result<()> {
    match sub {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigCommands::Path => println!("{}", config_file.display()),
        ConfigCommands::Reset => {
            Config::reset(config_file)
                .with_context(|| format!("resetting {}", config_file.display()))?;
            println!("Wrote defaults to {}", config_file.display());
        }
    }
    Ok(())
}

fn cmd_device(command: &Commands, bridge: &Bridge) -> anyhow::Result<()> {
    match command {
        Commands::Devices => {
            let devices = bridge.devices();
            if devices.is_empty() {
                println!("No devices found");
            }
            for d in devices {
                println!("{}", d);
            }
        }
        Commands::Shell { command } => {
            let line = command.join(" ");
            match bridge.custom(&line) {
                Some(out) => println!("{}", out),
                None => bail!("command failed: {}", line),
            }
        }
        Commands::Brightness { action } => match action.as_ref().unwrap_or(&BrightnessCommands::Get) {
            BrightnessCommands::Get => match bridge.brightness() {
                Some(level) => println!("{}", level),
                None => bail!("could not read brightness"),
            },
            BrightnessCommands::Set { level } => require(bridge.set_brightness(*level), "set brightness")?,
        },
        Commands::Screen { action } => match action {
            ScreenAction::On => require(bridge.screen_on(), "screen on")?,
            ScreenAction::Off => require(bridge.screen_off(), "screen off")?,
            ScreenAction::Wake => require(bridge.wake(), "wake")?,
            ScreenAction::Power => require(bridge.press_power(), "power")?,
            ScreenAction::Unlock => require(bridge.unlock(), "unlock")?,
            ScreenAction::State => match bridge.screen_state() {
                Some(true) => println!("on"),
                Some(false) => println!("off"),
                None => println!("unknown"),
            },
        },
        Commands::Volume { direction } => match direction {
            VolumeDirection::Up => require(bridge.volume_up(), "volume up")?,
            VolumeDirection::Down => require(bridge.volume_down(), "volume down")?,
        },
        Commands::Run { .. } | Commands::Tui | Commands::Config(_) => {}
    }
    Ok(())
}
