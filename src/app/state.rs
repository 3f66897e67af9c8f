// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::backends::camera::StreamManager;
use crate::backends::camera::devices::selected_index;
use crate::backends::camera::types::{CameraDevice, CameraFrame};
use crate::config::{Preferences, SharedStore};
use crate::errors::AppError;
use crate::pip::{PipController, VideoSurface};
use crate::selection::Selection;
use cosmic::iced::window;
use cosmic::widget::image;
use std::sync::Arc;

/// Latest picture of each surface, ready for the image widget
#[derive(Debug, Default)]
pub struct SurfaceImages {
    pub primary: Option<image::Handle>,
    pub mirrored: Option<image::Handle>,
}

impl SurfaceImages {
    pub fn get(&self, surface: VideoSurface) -> Option<&image::Handle> {
        match surface {
            VideoSurface::Primary => self.primary.as_ref(),
            VideoSurface::Mirrored => self.mirrored.as_ref(),
        }
    }

    pub fn set(&mut self, surface: VideoSurface, handle: image::Handle) {
        match surface {
            VideoSurface::Primary => self.primary = Some(handle),
            VideoSurface::Mirrored => self.mirrored = Some(handle),
        }
    }
}

/// The application model stores app-specific state used to describe its
/// interface and drive its logic.
pub struct AppModel {
    /// Application state which is managed by the COSMIC runtime.
    pub core: cosmic::Core,
    /// Where the two preferences live
    pub store: SharedStore,
    pub preferences: Preferences,
    pub selection: Selection,
    /// Video inputs in display order
    pub devices: Vec<CameraDevice>,
    pub camera_dropdown_options: Vec<String>,
    pub ratio_dropdown_options: Vec<String>,
    pub stream_manager: StreamManager,
    /// Generation of the stream whose frames the subscription forwards
    /// (0 before the first successful acquisition)
    pub stream_generation: u64,
    pub images: SurfaceImages,
    pub pip: PipController,
    /// Floating overlay window, while open
    pub pip_window: Option<window::Id>,
}

impl AppModel {
    /// Dropdown position of the selected camera
    pub fn selected_camera_index(&self) -> usize {
        selected_index(&self.devices, self.selection.device_id())
    }

    /// Whether frames for `surface` are shown anywhere right now
    pub fn is_displayed(&self, surface: VideoSurface) -> bool {
        self.selection.visible_surface() == surface || self.pip.active_surface() == Some(surface)
    }
}

/// Messages emitted by the application and its widgets.
#[derive(Debug, Clone)]
pub enum Message {
    // ===== Devices =====
    /// Device enumeration finished
    DevicesLoaded(Vec<CameraDevice>),
    /// Re-run device enumeration
    RefreshDevices,

    // ===== Controls =====
    /// Select camera by dropdown index (0 = default camera)
    SelectCamera(usize),
    /// Select aspect ratio by dropdown index
    SelectAspectRatio(usize),
    /// Show the mirrored (true) or primary (false) surface
    ToggleMirror(bool),
    /// Enter or leave Picture-in-Picture
    TogglePip,

    // ===== Picture-in-Picture window =====
    PipOpened(window::Id),
    /// A window asked to close
    WindowCloseRequested(window::Id),

    // ===== Stream =====
    /// Acquisition finished with the new generation, was superseded by a
    /// newer request (`None`), or failed
    StreamReplaced(Result<Option<u64>, AppError>),
    /// New frame for a surface
    Frame(VideoSurface, Arc<CameraFrame>),
}
