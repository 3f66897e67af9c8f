// SPDX-License-Identifier: GPL-3.0-only

//! Picture-in-Picture handlers
//!
//! The overlay is a second, always-on-top window showing one surface.

use crate::app::state::{AppModel, Message};
use crate::constants::pip;
use crate::pip::PipAction;
use cosmic::Task;
use cosmic::iced::{Size, window};
use tracing::{debug, info};

impl AppModel {
    pub(crate) fn handle_toggle_pip(&mut self) -> Task<cosmic::Action<Message>> {
        match self.pip.toggle(self.selection.is_mirrored()) {
            PipAction::Exit => {
                self.pip.exited();
                match self.pip_window.take() {
                    Some(id) => window::close(id),
                    None => Task::none(),
                }
            }
            PipAction::Enter(surface) => {
                let (id, open) = window::open(overlay_settings());
                info!(surface = surface.name(), "Opening Picture-in-Picture window");

                self.pip_window = Some(id);
                self.pip.entered(surface);
                open.map(|id| cosmic::Action::App(Message::PipOpened(id)))
            }
            PipAction::Nothing => Task::none(),
        }
    }

    pub(crate) fn handle_pip_opened(&mut self, id: window::Id) -> Task<cosmic::Action<Message>> {
        debug!(?id, "Picture-in-Picture window opened");
        Task::none()
    }

    /// The user closed a window by hand
    pub(crate) fn handle_window_close_requested(
        &mut self,
        id: window::Id,
    ) -> Task<cosmic::Action<Message>> {
        if self.pip_window != Some(id) {
            return Task::none();
        }
        self.pip_window = None;
        self.pip.exited();
        window::close(id)
    }
}

/// Settings for the floating overlay window
///
/// `AlwaysOnTop` is only a request; see [`crate::constants::pip`].
fn overlay_settings() -> window::Settings {
    window::Settings {
        size: Size::new(pip::WINDOW_WIDTH, pip::WINDOW_HEIGHT),
        min_size: Some(Size::new(pip::MIN_WINDOW_SIZE, pip::MIN_WINDOW_SIZE)),
        level: window::Level::AlwaysOnTop,
        resizable: true,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_floats_above_other_windows() {
        let settings = overlay_settings();
        assert_eq!(settings.level, window::Level::AlwaysOnTop);
        assert!(settings.resizable);
        assert_eq!(settings.size, Size::new(320.0, 240.0));
        assert_eq!(settings.min_size, Some(Size::new(120.0, 120.0)));
    }
}
