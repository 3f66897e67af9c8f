// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for stream replacement and the mirror outputs

use futures::StreamExt;
use futures::executor::block_on;
use std::sync::{Arc, Mutex};
use tiny_mirror::Selection;
use tiny_mirror::backends::camera::pipewire::{PipelineRequest, build_pipeline_string};
use tiny_mirror::backends::camera::{
    BackendResult, CameraBackend, CameraDevice, CameraFormat, CameraFrame, CaptureHandle,
    FrameSender, StreamConstraints, StreamManager,
};
use tiny_mirror::config::Preferences;
use tiny_mirror::constants::AspectRatio;

/// Backend that counts opens and emits one frame per stream
#[derive(Default)]
struct OneFrameBackend {
    opens: Arc<Mutex<Vec<StreamConstraints>>>,
}

struct OneFrameHandle {
    sender: Option<FrameSender>,
}

impl CaptureHandle for OneFrameHandle {
    fn describe(&self) -> String {
        "one-frame".to_string()
    }

    fn stop(&mut self) -> BackendResult<()> {
        self.sender = None;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.sender.is_some()
    }
}

impl CameraBackend for OneFrameBackend {
    fn name(&self) -> &'static str {
        "one-frame"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn enumerate_devices(&self) -> BackendResult<Vec<CameraDevice>> {
        Ok(vec![CameraDevice {
            id: "cam-1".to_string(),
            label: "Test Camera".to_string(),
            node_id: None,
        }])
    }

    fn get_formats(&self, _device: &CameraDevice) -> Vec<CameraFormat> {
        Vec::new()
    }

    fn open_stream(
        &self,
        constraints: &StreamConstraints,
        mut sender: FrameSender,
    ) -> BackendResult<Box<dyn CaptureHandle>> {
        self.opens.lock().unwrap().push(constraints.clone());
        // Two pixels: red then blue
        let frame = CameraFrame::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]);
        sender.try_send(frame).unwrap();
        Ok(Box::new(OneFrameHandle {
            sender: Some(sender),
        }))
    }

    fn supports_frame_callbacks(&self) -> bool {
        true
    }
}

#[test]
fn test_outputs_carry_plain_and_flipped_frames() {
    let manager = StreamManager::new(Arc::new(OneFrameBackend::default()));
    let generation = manager
        .replace(&StreamConstraints::for_selection("cam-1", AspectRatio::Square))
        .unwrap();
    let mut outputs = manager.take_outputs(generation).unwrap();

    let plain = block_on(outputs.primary.next()).unwrap();
    let flipped = block_on(outputs.mirrored.next()).unwrap();

    assert_eq!(plain.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(flipped.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(flipped.pixel(1, 0), Some([255, 0, 0, 255]));

    manager.stop();
    assert!(!manager.is_active());
}

#[test]
fn test_mirror_toggle_does_not_reacquire() {
    let backend = Arc::new(OneFrameBackend::default());
    let opens = Arc::clone(&backend.opens);
    let manager = StreamManager::new(backend);

    let mut selection = Selection::from_preferences(&Preferences::default());
    let generation = manager.replace(&selection.constraints()).unwrap();

    selection.set_mirrored(false);
    selection.set_mirrored(true);

    assert_eq!(manager.generation(), generation);
    assert_eq!(opens.lock().unwrap().len(), 1);
}

#[test]
fn test_ratio_change_reacquires_with_new_ratio() {
    let backend = Arc::new(OneFrameBackend::default());
    let opens = Arc::clone(&backend.opens);
    let manager = StreamManager::new(backend);

    let mut selection = Selection::from_preferences(&Preferences::default());
    manager.replace(&selection.constraints()).unwrap();
    if let Some(constraints) = selection.select_ratio(AspectRatio::Standard) {
        manager.replace(&constraints).unwrap();
    }

    let opens = opens.lock().unwrap();
    assert_eq!(opens.len(), 2);
    assert!((opens[1].video.aspect_ratio - 4.0 / 3.0).abs() < 1e-9);
    assert_eq!(manager.current_constraints().as_ref(), Some(&opens[1]));
}

#[test]
fn test_pipeline_string_for_v4l2_path() {
    let request = PipelineRequest {
        device_id: "/dev/video0".to_string(),
        format: None,
        ratio: AspectRatio::Portrait,
    };
    let launch = build_pipeline_string(&request);

    assert!(launch.starts_with("pipewiresrc path=v4l2:/dev/video0 "));
    assert!(launch.contains("aspect-ratio=3/4"));
    assert!(launch.ends_with("video/x-raw,format=RGBA ! appsink name=sink"));
}
