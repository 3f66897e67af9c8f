// SPDX-License-Identifier: GPL-3.0-only

//! Picture-in-Picture controller
//!
//! A single toggle: exit the overlay when one is showing, otherwise float
//! whichever surface is visible. Where the platform cannot float a window
//! the toggle does nothing.

use tracing::{debug, info};

/// The two views of the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoSurface {
    /// Frames as captured
    Primary,
    /// Horizontally flipped frames
    Mirrored,
}

impl VideoSurface {
    pub fn name(&self) -> &'static str {
        match self {
            VideoSurface::Primary => "primary",
            VideoSurface::Mirrored => "mirrored",
        }
    }
}

/// Surface shown for the mirror flag
pub fn visible_surface(mirrored: bool) -> VideoSurface {
    if mirrored {
        VideoSurface::Mirrored
    } else {
        VideoSurface::Primary
    }
}

/// What the front end should do for a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipAction {
    /// Float this surface
    Enter(VideoSurface),
    /// Close the floating overlay
    Exit,
    /// Overlay not supported here
    Nothing,
}

/// Tracks whether an overlay is showing
#[derive(Debug, Clone, Default)]
pub struct PipController {
    enabled: bool,
    active: Option<VideoSurface>,
}

impl PipController {
    /// `enabled` says whether the platform can float a window at all
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            active: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Surface currently floated, if any
    pub fn active_surface(&self) -> Option<VideoSurface> {
        self.active
    }

    /// Decide what a toggle does given the current mirror flag
    pub fn toggle(&self, mirrored: bool) -> PipAction {
        if self.active.is_some() {
            PipAction::Exit
        } else if self.enabled {
            PipAction::Enter(visible_surface(mirrored))
        } else {
            debug!("Picture-in-Picture not enabled, ignoring toggle");
            PipAction::Nothing
        }
    }

    /// The overlay now shows `surface`
    pub fn entered(&mut self, surface: VideoSurface) {
        info!(surface = surface.name(), "Entered Picture-in-Picture");
        self.active = Some(surface);
    }

    /// The overlay is gone (closed by us or by the user)
    pub fn exited(&mut self) {
        if self.active.take().is_some() {
            info!("Exited Picture-in-Picture");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_uses_visible_surface() {
        let pip = PipController::new(true);
        assert_eq!(pip.toggle(true), PipAction::Enter(VideoSurface::Mirrored));
        assert_eq!(pip.toggle(false), PipAction::Enter(VideoSurface::Primary));
    }

    #[test]
    fn test_active_always_exits() {
        let mut pip = PipController::new(true);
        pip.entered(VideoSurface::Primary);
        // The mirror flag changed since entering; still an exit
        assert_eq!(pip.toggle(true), PipAction::Exit);
        assert_eq!(pip.toggle(false), PipAction::Exit);

        pip.exited();
        assert!(!pip.is_active());
        assert_eq!(pip.toggle(true), PipAction::Enter(VideoSurface::Mirrored));
    }

    #[test]
    fn test_disabled_is_noop() {
        let pip = PipController::new(false);
        assert_eq!(pip.toggle(true), PipAction::Nothing);
        assert!(!pip.is_active());
    }
}
