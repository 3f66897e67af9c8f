// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera backend
//!
//! Enumeration goes through `pw-cli`, capture through a GStreamer
//! `pipewiresrc` pipeline. Inside a Flatpak sandbox PipeWire only exposes
//! cameras once the camera portal granted access.

mod enumeration;
mod pipeline;

pub use enumeration::{
    enumerate_pipewire_cameras, get_pipewire_formats, is_pipewire_available, parse_enum_formats,
    parse_node_list,
};
pub use pipeline::{PipeWirePipeline, PipelineRequest, build_pipeline_string};

use super::constraints::{StreamConstraints, select_format};
use super::types::*;
use super::{CameraBackend, CaptureHandle};
use tracing::{debug, info, warn};

/// PipeWire backend implementation
#[derive(Debug, Default)]
pub struct PipeWireBackend;

impl PipeWireBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Turn constraints into a concrete pipeline request
///
/// The device id is a preference, not a requirement: an id that is no
/// longer in `devices` falls back to the default camera, like the
/// facing-mode request. That request leaves device and format choice to
/// PipeWire; the crop enforces the ratio either way.
fn resolve_request(
    constraints: &StreamConstraints,
    devices: &[CameraDevice],
    formats_for: impl Fn(&CameraDevice) -> Vec<CameraFormat>,
) -> PipelineRequest {
    let ratio = constraints.ratio();
    let default_request = PipelineRequest {
        device_id: String::new(),
        format: None,
        ratio,
    };

    let Some(device_id) = constraints.video.device.device_id() else {
        debug!("No device requested, letting PipeWire pick the camera");
        return default_request;
    };

    let Some(device) = devices.iter().find(|d| d.id == device_id) else {
        warn!(device_id, "Requested camera not found, using the default camera");
        return default_request;
    };

    let formats = formats_for(device);
    let format = select_format(&formats, constraints.video.aspect_ratio).cloned();
    match &format {
        Some(format) => info!(device = %device.label, %format, "Selected capture format"),
        None => warn!(device = %device.label, "No formats reported, using auto-negotiation"),
    }

    PipelineRequest {
        device_id: device.id.clone(),
        format,
        ratio,
    }
}

impl CameraBackend for PipeWireBackend {
    fn name(&self) -> &'static str {
        "PipeWire"
    }

    fn is_available(&self) -> bool {
        is_pipewire_available()
    }

    fn enumerate_devices(&self) -> BackendResult<Vec<CameraDevice>> {
        enumerate_pipewire_cameras()
    }

    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        get_pipewire_formats(device)
    }

    fn open_stream(
        &self,
        constraints: &StreamConstraints,
        sender: FrameSender,
    ) -> BackendResult<Box<dyn CaptureHandle>> {
        info!(constraints = %constraints.to_json(), "Opening camera stream");
        let devices = match constraints.video.device.device_id() {
            Some(_) => self.enumerate_devices()?,
            None => Vec::new(),
        };
        let request = resolve_request(constraints, &devices, |device| self.get_formats(device));
        let pipeline = PipeWirePipeline::new(&request, sender)?;
        Ok(Box::new(pipeline))
    }

    fn supports_frame_callbacks(&self) -> bool {
        // Every appsink sample reaches the frame channel
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::AspectRatio;

    fn device(id: &str) -> CameraDevice {
        CameraDevice {
            id: id.to_string(),
            label: format!("Camera {}", id),
            node_id: None,
        }
    }

    fn formats(_device: &CameraDevice) -> Vec<CameraFormat> {
        vec![
            CameraFormat {
                width: 640,
                height: 480,
                framerate: Some(Framerate::from_int(30)),
                pixel_format: "YUY2".to_string(),
            },
            CameraFormat {
                width: 1280,
                height: 720,
                framerate: Some(Framerate::from_int(30)),
                pixel_format: "MJPG".to_string(),
            },
        ]
    }

    #[test]
    fn test_known_device_gets_closest_format() {
        let devices = vec![device("pipewire-serial-3")];
        let constraints =
            StreamConstraints::for_selection("pipewire-serial-3", AspectRatio::Widescreen);

        let request = resolve_request(&constraints, &devices, formats);
        assert_eq!(request.device_id, "pipewire-serial-3");
        assert_eq!(request.format.map(|f| f.width), Some(1280));
        assert_eq!(request.ratio, AspectRatio::Widescreen);
    }

    #[test]
    fn test_missing_device_falls_back_to_default_camera() {
        let devices = vec![device("pipewire-serial-3")];
        let constraints = StreamConstraints::for_selection("pipewire-serial-9", AspectRatio::Standard);

        let request = resolve_request(&constraints, &devices, formats);
        assert_eq!(request.device_id, "");
        assert!(request.format.is_none());
        assert_eq!(request.ratio, AspectRatio::Standard);
    }

    #[test]
    fn test_missing_device_with_empty_list() {
        let constraints = StreamConstraints::for_selection("pipewire-serial-9", AspectRatio::Square);
        let request = resolve_request(&constraints, &[], formats);
        assert_eq!(request.device_id, "");
    }
}
