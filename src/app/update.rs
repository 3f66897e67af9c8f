// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The `update()` dispatcher routes each message to a handler in
//! `handlers::camera` or `handlers::pip`.

use crate::app::state::{AppModel, Message};
use cosmic::Task;

impl AppModel {
    /// Main message handler
    pub fn update(&mut self, message: Message) -> Task<cosmic::Action<Message>> {
        match message {
            // ===== Devices =====
            Message::DevicesLoaded(devices) => self.handle_devices_loaded(devices),
            Message::RefreshDevices => self.handle_refresh_devices(),

            // ===== Controls =====
            Message::SelectCamera(index) => self.handle_select_camera(index),
            Message::SelectAspectRatio(index) => self.handle_select_aspect_ratio(index),
            Message::ToggleMirror(mirrored) => self.handle_toggle_mirror(mirrored),
            Message::TogglePip => self.handle_toggle_pip(),

            // ===== Picture-in-Picture window =====
            Message::PipOpened(id) => self.handle_pip_opened(id),
            Message::WindowCloseRequested(id) => self.handle_window_close_requested(id),

            // ===== Stream =====
            Message::StreamReplaced(result) => self.handle_stream_replaced(result),
            Message::Frame(surface, frame) => self.handle_frame(surface, frame),
        }
    }
}
