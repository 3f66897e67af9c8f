// SPDX-License-Identifier: GPL-3.0-only

//! Terminal mirror viewer
//!
//! Renders the visible surface to the terminal using Unicode half-block
//! characters for improved vertical resolution. The terminal cannot float a
//! window, so Picture-in-Picture is reported as not enabled.

use crate::backends::camera::devices::{device_id_at, selected_index, selector_options};
use crate::backends::camera::types::{CameraDevice, CameraFrame};
use crate::backends::camera::{SessionOutputs, StreamConstraints, StreamManager, get_backend};
use crate::config::{self, Preferences, SharedStore};
use crate::constants::{AspectRatio, app_info};
use crate::errors::PipError;
use crate::pip::{PipAction, PipController, VideoSurface};
use crate::selection::Selection;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::time::Duration;
use tracing::{error, info};

/// Per-run overrides from the command line; not persisted
#[derive(Debug, Clone, Default)]
pub struct TerminalOptions {
    pub device: Option<String>,
    pub ratio: Option<AspectRatio>,
}

/// Run the terminal mirror viewer
pub fn run(options: TerminalOptions) -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, options);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Everything the key handlers act on
struct Viewer {
    store: SharedStore,
    preferences: Preferences,
    selection: Selection,
    devices: Vec<CameraDevice>,
    manager: StreamManager,
    outputs: Option<SessionOutputs>,
    pip: PipController,
    primary: FrameWidget,
    mirrored: FrameWidget,
    status: String,
}

impl Viewer {
    fn new(options: TerminalOptions) -> Self {
        let store = config::open_store(app_info::APP_ID);
        let manager = StreamManager::new(get_backend());
        Self::with_parts(store, manager, options)
    }

    fn with_parts(store: SharedStore, manager: StreamManager, options: TerminalOptions) -> Self {
        let preferences = Preferences::load(store.as_ref());
        let mut selection = Selection::from_preferences(&preferences);
        if let Some(device) = &options.device {
            selection.select_device(device);
        }
        if let Some(ratio) = options.ratio {
            selection.select_ratio(ratio);
        }

        let devices = manager.enumerate_devices();
        info!(count = devices.len(), "Found cameras");

        let mut viewer = Self {
            store,
            preferences,
            selection,
            devices,
            manager,
            outputs: None,
            pip: PipController::new(false),
            primary: FrameWidget::default(),
            mirrored: FrameWidget::default(),
            status: String::new(),
        };
        let constraints = viewer.selection.constraints();
        viewer.acquire(constraints);
        viewer
    }

    /// Returns whether a new stream is running
    fn acquire(&mut self, constraints: StreamConstraints) -> bool {
        // Failures are logged by the manager; the last picture stays up
        let acquired = match self.manager.replace(&constraints) {
            Ok(generation) => {
                self.outputs = self.manager.take_outputs(generation);
                true
            }
            Err(_) => {
                self.outputs = None;
                false
            }
        };
        self.status = self.status_message();
        acquired
    }

    /// Keep only the newest frame of each output
    fn drain_frames(&mut self) {
        let Some(outputs) = self.outputs.as_mut() else {
            return;
        };
        while let Ok(Some(frame)) = outputs.primary.try_next() {
            self.primary.update_frame(frame);
        }
        while let Ok(Some(frame)) = outputs.mirrored.try_next() {
            self.mirrored.update_frame(frame);
        }
    }

    fn visible(&self) -> &FrameWidget {
        match self.selection.visible_surface() {
            VideoSurface::Primary => &self.primary,
            VideoSurface::Mirrored => &self.mirrored,
        }
    }

    fn camera_label(&self) -> String {
        let index = selected_index(&self.devices, self.selection.device_id());
        selector_options(&self.devices)
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    fn status_message(&self) -> String {
        let stream = if self.manager.is_active() {
            ""
        } else {
            " | camera unavailable"
        };
        format!(
            "{} | {} | mirror {}{} | 'h' help | 'q' quit",
            self.camera_label(),
            self.selection.ratio(),
            if self.selection.is_mirrored() { "on" } else { "off" },
            stream
        )
    }

    fn toggle_mirror(&mut self) {
        let mirrored = !self.selection.is_mirrored();
        self.selection.set_mirrored(mirrored);
        if let Err(err) = self.preferences.set_mirrored(self.store.as_ref(), mirrored) {
            error!(%err, "Failed to save mirror setting");
        }
        self.status = self.status_message();
    }

    fn cycle_ratio(&mut self) {
        let next = self.selection.ratio().next();
        if let Some(constraints) = self.selection.select_ratio(next) {
            self.acquire(constraints);
        }
    }

    fn cycle_camera(&mut self) {
        let options = self.devices.len() + 1;
        let next = (selected_index(&self.devices, self.selection.device_id()) + 1) % options;
        let device_id = device_id_at(&self.devices, next);

        if let Some(constraints) = self.selection.select_device(&device_id) {
            if let Err(err) = self
                .preferences
                .set_preferred_camera(self.store.as_ref(), &device_id)
            {
                error!(%err, "Failed to save preferred camera");
            }
            // Frames of the previous camera stay up until the new one runs
            if self.acquire(constraints) {
                self.primary = FrameWidget::default();
                self.mirrored = FrameWidget::default();
            }
        }
    }

    fn toggle_pip(&mut self) {
        match self.pip.toggle(self.selection.is_mirrored()) {
            PipAction::Nothing => {
                self.status = PipError::Unsupported.to_string();
            }
            // Never entered here, so there is nothing to exit either
            PipAction::Enter(_) | PipAction::Exit => {}
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    options: TerminalOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut viewer = Viewer::new(options);
    let mut show_help = false;

    loop {
        viewer.drain_frames();

        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let camera_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            f.render_widget(viewer.visible(), camera_area);

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            let message = if show_help {
                HELP_MESSAGE
            } else {
                viewer.status.as_str()
            };
            f.render_widget(StatusBar { message }, status_area);
        })?;

        // Handle input with timeout for frame updates
        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Char('h') => show_help = !show_help,
                KeyCode::Char('m') => viewer.toggle_mirror(),
                KeyCode::Char('a') => viewer.cycle_ratio(),
                KeyCode::Char('s') => viewer.cycle_camera(),
                KeyCode::Char('p') => viewer.toggle_pip(),
                _ => {}
            }
        }
    }

    viewer.manager.stop();
    Ok(())
}

const HELP_MESSAGE: &str =
    "m: Mirror | a: Aspect ratio | s: Switch camera | p: PIP | h: Toggle help | q/Ctrl+C: Quit";

/// Widget that renders a camera frame using half-block characters
#[derive(Default)]
struct FrameWidget {
    frame: Option<CameraFrame>,
}

impl FrameWidget {
    fn update_frame(&mut self, frame: CameraFrame) {
        if !frame.is_empty() {
            self.frame = Some(frame);
        }
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let x = x.min(frame.width.saturating_sub(1));
    let y = y.min(frame.height.saturating_sub(1));
    match frame.pixel(x, y) {
        Some([r, g, b, _]) => Color::Rgb(r, g, b),
        None => Color::Black,
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}
