// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire GStreamer pipeline for camera capture
//!
//! `pipewiresrc ! <caps> ! [jpegdec] ! videoconvert ! aspectratiocrop ! videoconvert ! RGBA appsink`

use super::super::constraints::frame_matches_ratio;
use super::super::types::*;
use crate::constants::{AspectRatio, pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What to capture: resolved from the stream constraints
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// Device identifier; empty lets PipeWire pick the default camera
    pub device_id: String,
    /// Device mode to negotiate, if known
    pub format: Option<CameraFormat>,
    /// Ratio the delivered frames are cropped to
    pub ratio: AspectRatio,
}

/// PipeWire camera pipeline
pub struct PipeWirePipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    description: String,
    stopped: bool,
}

impl PipeWirePipeline {
    /// Build and start a pipeline delivering RGBA frames to `frame_sender`
    pub fn new(request: &PipelineRequest, frame_sender: FrameSender) -> BackendResult<Self> {
        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        if gstreamer::ElementFactory::find("pipewiresrc").is_none() {
            return Err(BackendError::NotAvailable(
                "pipewiresrc not available".to_string(),
            ));
        }

        let launch = build_pipeline_string(request);
        info!(pipeline = %launch, "Launching capture pipeline");

        let pipeline = gstreamer::parse::launch(&launch)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| BackendError::InitializationFailed("Not a pipeline".to_string()))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to cast appsink".to_string())
            })?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(frame_callback(frame_sender, request.ratio))
                .build(),
        );

        let description = match &request.format {
            Some(format) => format!("{} {} crop {}", display_id(request), format, request.ratio),
            None => format!("{} auto crop {}", display_id(request), request.ratio),
        };

        let mut this = Self {
            pipeline,
            appsink,
            description,
            stopped: false,
        };

        if let Err(err) = this.start() {
            let _ = this.stop();
            return Err(err);
        }
        Ok(this)
    }

    fn start(&self) -> BackendResult<()> {
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Playing) {
            error!(error = %e, "Failed to set pipeline to PLAYING");
            return Err(self.bus_error().unwrap_or_else(|| {
                BackendError::InitializationFailed(format!("Failed to start pipeline: {}", e))
            }));
        }

        let (result, state, pending) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(?result, ?state, ?pending, "Pipeline state");

        match result {
            Ok(_) if state == gstreamer::State::Playing => Ok(()),
            // Live sources may still be negotiating; frames arrive once ready
            Ok(gstreamer::StateChangeSuccess::Async) if pending == gstreamer::State::Playing => {
                Ok(())
            }
            _ => Err(self.bus_error().unwrap_or_else(|| {
                BackendError::InitializationFailed(format!(
                    "Pipeline did not reach PLAYING (state: {:?})",
                    state
                ))
            })),
        }
    }

    /// Classify the first error posted on the bus
    fn bus_error(&self) -> Option<BackendError> {
        let bus = self.pipeline.bus()?;
        let msg = bus.timed_pop_filtered(
            gstreamer::ClockTime::from_mseconds(100),
            &[gstreamer::MessageType::Error],
        )?;
        let gstreamer::MessageView::Error(err) = msg.view() else {
            return None;
        };

        let glib_err = err.error();
        let text = format!("{} ({:?})", glib_err, err.debug());
        error!(
            error = %glib_err,
            debug = ?err.debug(),
            source = ?err.src().map(|s| s.name()),
            "GStreamer error while starting capture"
        );

        Some(match glib_err.kind::<gstreamer::ResourceError>() {
            Some(gstreamer::ResourceError::Busy) => BackendError::DeviceBusy(text),
            Some(gstreamer::ResourceError::NotAuthorized)
            | Some(gstreamer::ResourceError::OpenRead)
            | Some(gstreamer::ResourceError::OpenReadWrite) => BackendError::PermissionDenied(text),
            Some(gstreamer::ResourceError::NotFound) => BackendError::DeviceNotFound(text),
            _ if glib_err.kind::<gstreamer::CoreError>() == Some(gstreamer::CoreError::Negotiation) => {
                BackendError::FormatNotSupported(text)
            }
            _ => BackendError::InitializationFailed(text),
        })
    }
}

impl super::super::CaptureHandle for PipeWirePipeline {
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn stop(&mut self) -> BackendResult<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        info!(stream = %self.description, "Stopping capture pipeline");

        // Dropping the callbacks drops the frame sender, which ends the mirror loop
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        self.pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| BackendError::Other(format!("Failed to stop pipeline: {}", e)))?;

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        if let Err(e) = result {
            debug!(error = ?e, state = ?state, "Pipeline state change had issues");
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        !self.stopped && self.pipeline.current_state() == gstreamer::State::Playing
    }
}

impl Drop for PipeWirePipeline {
    fn drop(&mut self) {
        if !self.stopped {
            use super::super::CaptureHandle;
            if let Err(e) = self.stop() {
                warn!(error = %e, "Failed to stop pipeline on drop");
            }
        }
    }
}

fn display_id(request: &PipelineRequest) -> &str {
    if request.device_id.is_empty() {
        "default camera"
    } else {
        &request.device_id
    }
}

/// Appsink callback copying each sample into a `CameraFrame`
fn frame_callback(
    mut frame_sender: FrameSender,
    ratio: AspectRatio,
) -> impl FnMut(&AppSink) -> Result<gstreamer::FlowSuccess, gstreamer::FlowError> + Send + 'static
{
    let frame_counter = AtomicU64::new(0);

    move |appsink| {
        let frame_num = frame_counter.fetch_add(1, Ordering::Relaxed);

        let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;
        let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
        if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
            debug!(frame = frame_num, "Skipping corrupted buffer");
            return Ok(gstreamer::FlowSuccess::Ok);
        }

        let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
        let info = VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
        let map = buffer
            .map_readable()
            .map_err(|_| gstreamer::FlowError::Error)?;

        let frame = CameraFrame {
            width: info.width(),
            height: info.height(),
            stride: info.stride()[0] as u32,
            data: Arc::from(map.as_slice()),
            captured_at: Instant::now(),
        };

        if frame_num == 0 && !frame_matches_ratio(&frame, ratio.value()) {
            warn!(
                width = frame.width,
                height = frame.height,
                requested = %ratio,
                "Camera delivered frames off the requested ratio"
            );
        }

        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
            debug!(
                frame = frame_num,
                width = frame.width,
                height = frame.height,
                stride = frame.stride,
                "Captured frame"
            );
        }

        match frame_sender.try_send(frame) {
            Ok(()) => Ok(gstreamer::FlowSuccess::Ok),
            // The consumer is gone: stop pushing
            Err(e) if e.is_disconnected() => Err(gstreamer::FlowError::Eos),
            Err(_) => {
                debug!(frame = frame_num, "Frame dropped (channel full)");
                Ok(gstreamer::FlowSuccess::Ok)
            }
        }
    }
}

/// `pipewiresrc` property selecting the device
fn target_property(device_id: &str) -> String {
    if device_id.is_empty() {
        String::new()
    } else if let Some(serial) = device_id.strip_prefix("pipewire-serial-") {
        format!("target-object={} ", serial)
    } else if let Some(node_id) = device_id.strip_prefix("pipewire-") {
        format!("target-object={} ", node_id)
    } else if device_id.starts_with("/dev/video") {
        format!("path=v4l2:{} ", device_id)
    } else {
        format!("target-object={} ", device_id)
    }
}

/// Caps and decoder between the source and the converter
fn source_caps(format: &CameraFormat) -> String {
    let mut caps = format!("width=(int){},height=(int){}", format.width, format.height);
    if let Some(fps) = format.framerate {
        caps.push_str(&format!(",framerate=(fraction){}", fps.as_gst_fraction()));
    }

    if format.is_mjpeg() {
        format!("image/jpeg,{} ! jpegdec ! ", caps)
    } else {
        format!("video/x-raw,{} ! ", caps)
    }
}

/// Full `gst-launch` description for a request
pub fn build_pipeline_string(request: &PipelineRequest) -> String {
    let (ratio_w, ratio_h) = request.ratio.fraction();
    let caps = request.format.as_ref().map(source_caps).unwrap_or_default();

    format!(
        "pipewiresrc {}do-timestamp=true ! {}videoconvert ! aspectratiocrop aspect-ratio={}/{} ! \
         videoconvert ! video/x-raw,format={} ! appsink name=sink",
        target_property(&request.device_id),
        caps,
        ratio_w,
        ratio_h,
        pipeline::OUTPUT_FORMAT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera_pipeline() {
        let request = PipelineRequest {
            device_id: String::new(),
            format: None,
            ratio: AspectRatio::Square,
        };
        assert_eq!(
            build_pipeline_string(&request),
            "pipewiresrc do-timestamp=true ! videoconvert ! aspectratiocrop aspect-ratio=1/1 ! \
             videoconvert ! video/x-raw,format=RGBA ! appsink name=sink"
        );
    }

    #[test]
    fn test_mjpeg_device_pipeline() {
        let request = PipelineRequest {
            device_id: "pipewire-serial-2146".into(),
            format: Some(CameraFormat {
                width: 1280,
                height: 720,
                framerate: Some(Framerate::from_int(30)),
                pixel_format: "MJPG".into(),
            }),
            ratio: AspectRatio::Widescreen,
        };
        let launch = build_pipeline_string(&request);
        assert!(launch.starts_with("pipewiresrc target-object=2146 do-timestamp=true ! "));
        assert!(launch.contains(
            "image/jpeg,width=(int)1280,height=(int)720,framerate=(fraction)30/1 ! jpegdec ! "
        ));
        assert!(launch.contains("aspect-ratio=16/9"));
    }

    #[test]
    fn test_target_property_forms() {
        assert_eq!(target_property("pipewire-77"), "target-object=77 ");
        assert_eq!(target_property("/dev/video0"), "path=v4l2:/dev/video0 ");
        assert_eq!(target_property(""), "");
    }
}
