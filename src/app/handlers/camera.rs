// SPDX-License-Identifier: GPL-3.0-only

//! Camera handlers
//!
//! Device enumeration, camera and ratio selection, the mirror toggle, and
//! frames arriving from the stream.

use crate::app::state::{AppModel, Message};
use crate::backends::camera::StreamConstraints;
use crate::backends::camera::devices::{device_id_at, selector_options};
use crate::backends::camera::types::{CameraDevice, CameraFrame};
use crate::constants::AspectRatio;
use crate::errors::{AppError, AppResult};
use crate::pip::VideoSurface;
use cosmic::Task;
use cosmic::widget::image;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

impl AppModel {
    /// Enumerate devices off the UI thread
    pub(crate) fn enumerate_devices_task(&self) -> Task<cosmic::Action<Message>> {
        let manager = self.stream_manager.clone();
        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || manager.enumerate_devices())
                    .await
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "Device enumeration task failed");
                        Vec::new()
                    })
            },
            |devices| cosmic::Action::App(Message::DevicesLoaded(devices)),
        )
    }

    /// Replace the running stream with one for `constraints`
    ///
    /// The request is numbered here, in selection order; GStreamer state
    /// changes block, so the work itself runs on the blocking pool.
    pub(crate) fn acquire_stream(
        &self,
        constraints: StreamConstraints,
    ) -> Task<cosmic::Action<Message>> {
        let manager = self.stream_manager.clone();
        let request = manager.request(constraints);
        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || manager.apply(&request))
                    .await
                    .unwrap_or_else(|e| Err(AppError::Other(e.to_string())))
            },
            |result| cosmic::Action::App(Message::StreamReplaced(result)),
        )
    }

    pub(crate) fn handle_devices_loaded(
        &mut self,
        devices: Vec<CameraDevice>,
    ) -> Task<cosmic::Action<Message>> {
        info!(count = devices.len(), "Camera list updated");
        self.camera_dropdown_options = selector_options(&devices);
        self.devices = devices;
        Task::none()
    }

    pub(crate) fn handle_refresh_devices(&self) -> Task<cosmic::Action<Message>> {
        debug!("Refreshing camera list");
        self.enumerate_devices_task()
    }

    pub(crate) fn handle_select_camera(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        let device_id = device_id_at(&self.devices, index);
        let Some(constraints) = self.selection.select_device(&device_id) else {
            return Task::none();
        };

        info!(index, device_id = %device_id, "Camera selected");
        if let Err(err) = self
            .preferences
            .set_preferred_camera(self.store.as_ref(), &device_id)
        {
            error!(%err, "Failed to save preferred camera");
        }
        self.acquire_stream(constraints)
    }

    pub(crate) fn handle_select_aspect_ratio(
        &mut self,
        index: usize,
    ) -> Task<cosmic::Action<Message>> {
        let Some(ratio) = AspectRatio::from_index(index) else {
            warn!(index, "Unknown aspect ratio index");
            return Task::none();
        };
        match self.selection.select_ratio(ratio) {
            Some(constraints) => {
                info!(ratio = %ratio, "Aspect ratio selected");
                self.acquire_stream(constraints)
            }
            None => Task::none(),
        }
    }

    /// Swap the visible surface; the stream keeps running untouched
    pub(crate) fn handle_toggle_mirror(&mut self, mirrored: bool) -> Task<cosmic::Action<Message>> {
        let surface = self.selection.set_mirrored(mirrored);
        info!(mirrored, surface = surface.name(), "Mirror toggled");

        if let Err(err) = self.preferences.set_mirrored(self.store.as_ref(), mirrored) {
            error!(%err, "Failed to save mirror setting");
        }
        Task::none()
    }

    pub(crate) fn handle_stream_replaced(
        &mut self,
        result: AppResult<Option<u64>>,
    ) -> Task<cosmic::Action<Message>> {
        match next_generation(self.stream_generation, &result) {
            Some(generation) => {
                debug!(generation, "Forwarding frames of new stream");
                self.stream_generation = generation;
            }
            None => match result {
                Ok(Some(generation)) => debug!(
                    generation,
                    current = self.stream_generation,
                    "Ignoring late stream result"
                ),
                Ok(None) => debug!("Stream request superseded"),
                // Already logged; the preview keeps its last picture
                Err(err) => debug!(%err, "Stream not replaced"),
            },
        }
        Task::none()
    }

    pub(crate) fn handle_frame(
        &mut self,
        surface: VideoSurface,
        frame: Arc<CameraFrame>,
    ) -> Task<cosmic::Action<Message>> {
        if self.is_displayed(surface) && !frame.is_empty() {
            let handle = image::Handle::from_rgba(frame.width, frame.height, frame.packed_rgba());
            self.images.set(surface, handle);
        }
        Task::none()
    }
}

/// Generation to follow after an acquisition result, if it moves forward
///
/// Results can arrive out of order; an older generation's outputs are
/// never handed out again, so following it would freeze the preview.
fn next_generation(current: u64, result: &AppResult<Option<u64>>) -> Option<u64> {
    match result {
        Ok(Some(generation)) if *generation > current => Some(*generation),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CameraError;

    #[test]
    fn test_newer_generation_is_followed() {
        assert_eq!(next_generation(0, &Ok(Some(1))), Some(1));
        assert_eq!(next_generation(3, &Ok(Some(5))), Some(5));
    }

    #[test]
    fn test_late_or_missing_generation_is_ignored() {
        assert_eq!(next_generation(5, &Ok(Some(4))), None);
        assert_eq!(next_generation(5, &Ok(Some(5))), None);
        assert_eq!(next_generation(5, &Ok(None)), None);
        assert_eq!(
            next_generation(5, &Err(AppError::Camera(CameraError::Busy))),
            None
        );
    }
}
