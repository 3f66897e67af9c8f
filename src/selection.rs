// SPDX-License-Identifier: GPL-3.0-only

//! What the user picked: camera, aspect ratio and mirror flag
//!
//! Camera and ratio feed the stream constraints, so changing either asks
//! for a new stream. The mirror flag only decides which surface is shown
//! and never touches the stream.

use crate::backends::camera::StreamConstraints;
use crate::config::Preferences;
use crate::constants::AspectRatio;
use crate::pip::{VideoSurface, visible_surface};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Stored camera identifier, used as-is even when the device is gone
    device_id: String,
    ratio: AspectRatio,
    mirrored: bool,
}

impl Selection {
    /// Start from the persisted preferences and the default ratio
    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self {
            device_id: prefs.preferred_camera.clone(),
            ratio: AspectRatio::default(),
            mirrored: prefs.is_mirrored,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn ratio(&self) -> AspectRatio {
        self.ratio
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    /// Constraints for the current camera and ratio, built fresh
    pub fn constraints(&self) -> StreamConstraints {
        StreamConstraints::for_selection(&self.device_id, self.ratio)
    }

    /// Pick a camera (empty for the default); returns the constraints to
    /// acquire if the choice changed
    pub fn select_device(&mut self, device_id: &str) -> Option<StreamConstraints> {
        if self.device_id == device_id {
            return None;
        }
        debug!(from = %self.device_id, to = %device_id, "Camera selection changed");
        self.device_id = device_id.to_string();
        Some(self.constraints())
    }

    /// Pick a ratio; returns the constraints to acquire if it changed
    pub fn select_ratio(&mut self, ratio: AspectRatio) -> Option<StreamConstraints> {
        if self.ratio == ratio {
            return None;
        }
        debug!(from = %self.ratio, to = %ratio, "Aspect ratio changed");
        self.ratio = ratio;
        Some(self.constraints())
    }

    /// Set the mirror flag; returns the surface to show now
    pub fn set_mirrored(&mut self, mirrored: bool) -> VideoSurface {
        self.mirrored = mirrored;
        self.visible_surface()
    }

    pub fn visible_surface(&self) -> VideoSurface {
        visible_surface(self.mirrored)
    }
}
