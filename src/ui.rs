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

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap};

use crate::app::{App, InputMode};
use crate::bridge::MAX_BRIGHTNESS;
use crate::session::SessionState;

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn rounded(title: &str) -> Block<'_> {
    Block::default().borders(Borders::ALL).border_type(BorderType::Rounded).title(title)
}

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .split(size);

    render_header(f, app, rows[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[1]);
    render_devices(f, app, middle[0]);
    render_preview(f, app, middle[1]);

    let log: Vec<ListItem> = app
        .log
        .iter()
        .rev()
        .take(rows[2].height.saturating_sub(2) as usize)
        .rev()
        .map(|l| ListItem::new(l.as_str()))
        .collect();
    f.render_widget(List::new(log).block(rounded(" Log ")), rows[2]);

    let help = Paragraph::new(
        "s start/stop | r devices | ↑/↓ Enter select | +/- M brightness | o/f/w/p/u screen | [/] volume | : shell | i interval | q quit",
    )
    .style(Style::default().fg(Color::Gray))
    .alignment(Alignment::Center);
    f.render_widget(help, rows[3]);

    if app.input_mode != InputMode::Normal {
        render_input_popup(f, app, size);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let (status, color) = match app.state {
        SessionState::Running => ("● Monitoring Active", Color::Green),
        SessionState::Idle => ("● Monitoring Stopped", Color::Red),
    };
    let mut spans = vec![
        Span::styled(status, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(format!("  every {} ms  |  {}", app.interval.as_millis(), app.cpu_model)),
    ];
    if !app.elevated {
        spans.push(Span::styled("  |  not root: CPU power unavailable", Style::default().fg(Color::Yellow)));
    }
    let header = Paragraph::new(Line::from(spans)).block(rounded(" Remote System Monitor "));
    f.render_widget(header, area);
}

fn render_devices(f: &mut Frame, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let mut items: Vec<ListItem> = Vec::new();
    if app.devices.is_empty() {
        items.push(ListItem::new("(no devices) press 'r' to scan"));
    }
    for (i, d) in app.devices.iter().enumerate() {
        let sel = if i == app.device_idx { "> " } else { "  " };
        let style = if app.selected_device.as_deref() == Some(d.id.as_str()) {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        items.push(ListItem::new(format!("{}{}", sel, d)).style(style));
    }
    let mut state = ListState::default();
    if !app.devices.is_empty() {
        state.select(Some(app.device_idx.min(app.devices.len() - 1)));
    }
    f.render_stateful_widget(List::new(items).block(rounded(" Devices ")), cols[0], &mut state);

    let (ratio, label) = match app.brightness {
        Some(level) => (
            (level as f64 / MAX_BRIGHTNESS as f64).clamp(0.0, 1.0),
            format!("{}/{}", level, MAX_BRIGHTNESS),
        ),
        None => (0.0, "unknown".to_string()),
    };
    let gauge = Gauge::default()
        .block(rounded(" Brightness "))
        .gauge_style(Style::default().fg(Color::Yellow))
        .ratio(ratio)
        .label(label);
    f.render_widget(gauge, cols[1]);
}

fn render_preview(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .preview_lines()
        .into_iter()
        .map(|l| {
            if l.starts_with("ADB Push: ✗") || l.starts_with('⚠') {
                Line::styled(l, Style::default().fg(Color::Red))
            } else {
                Line::raw(l)
            }
        })
        .collect();
    let title = format!(" Preview -> {} ", app.target_path);
    let preview = Paragraph::new(lines).block(rounded(&title)).wrap(Wrap { trim: false });
    f.render_widget(preview, area);
}

fn render_input_popup(f: &mut Frame, app: &App, size: Rect) {
    let area = centered_rect(60, 20, size);
    let title = match app.input_mode {
        InputMode::Interval => " Update interval (ms) ",
        _ => " Device shell command ",
    };
    let block = rounded(title).border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
        .split(inner);
    f.render_widget(Paragraph::new(format!("> {}_", app.input)), chunks[0]);
    let help = Paragraph::new("Enter run  |  Esc cancel")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    f.render_widget(help, chunks[2]);
}
