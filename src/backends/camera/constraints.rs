// SPDX-License-Identifier: GPL-3.0-only

//! Stream constraints
//!
//! A constraint object is rebuilt from the current selection every time a
//! stream is requested. It serializes to the same JSON shape browsers use
//! for `getUserMedia`, which keeps logs comparable across platforms.

use super::types::{CameraFormat, CameraFrame};
use crate::constants::AspectRatio;
use crate::constants::devices::DEFAULT_FACING_MODE;
use serde::Serialize;

/// Which camera to open
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeviceSelector {
    /// No explicit choice: the camera facing the user
    Facing {
        #[serde(rename = "facingMode")]
        facing_mode: String,
    },
    /// A specific device from the enumerated list
    Device {
        #[serde(rename = "deviceId")]
        device_id: String,
    },
}

impl DeviceSelector {
    /// Device identifier, if a specific device was chosen
    pub fn device_id(&self) -> Option<&str> {
        match self {
            DeviceSelector::Device { device_id } => Some(device_id),
            DeviceSelector::Facing { .. } => None,
        }
    }
}

/// Video part of the constraints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoConstraints {
    #[serde(flatten)]
    pub device: DeviceSelector,
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: f64,
}

/// Everything a capture request asks for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamConstraints {
    pub video: VideoConstraints,
    /// Always false: the mirror never captures sound
    pub audio: bool,
}

impl StreamConstraints {
    /// Constraints for the current selection
    ///
    /// An empty `device_id` asks for the user-facing camera.
    pub fn for_selection(device_id: &str, ratio: AspectRatio) -> Self {
        let device = if device_id.is_empty() {
            DeviceSelector::Facing {
                facing_mode: DEFAULT_FACING_MODE.to_string(),
            }
        } else {
            DeviceSelector::Device {
                device_id: device_id.to_string(),
            }
        };

        Self {
            video: VideoConstraints {
                device,
                aspect_ratio: ratio.value(),
            },
            audio: false,
        }
    }

    /// The requested ratio as a selector option
    pub fn ratio(&self) -> AspectRatio {
        AspectRatio::ALL
            .into_iter()
            .min_by(|a, b| {
                let da = (a.value() - self.video.aspect_ratio).abs();
                let db = (b.value() - self.video.aspect_ratio).abs();
                da.total_cmp(&db)
            })
            .unwrap_or_default()
    }

    /// JSON form, for logs
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Pick the device format that best fits `ratio`
///
/// Closest width/height ratio wins; among equally close formats the largest
/// resolution, then the highest framerate.
pub fn select_format(formats: &[CameraFormat], ratio: f64) -> Option<&CameraFormat> {
    formats.iter().min_by(|a, b| {
        let da = (a.aspect_ratio() - ratio).abs();
        let db = (b.aspect_ratio() - ratio).abs();
        // Formats within rounding of each other count as equally close
        if (da - db).abs() > 1e-3 {
            return da.total_cmp(&db);
        }
        let pixels = |f: &CameraFormat| u64::from(f.width) * u64::from(f.height);
        let fps = |f: &CameraFormat| f.framerate.map(|r| r.as_int()).unwrap_or(0);
        pixels(b)
            .cmp(&pixels(a))
            .then_with(|| fps(b).cmp(&fps(a)))
    })
}

/// Whether a delivered frame honours the requested ratio
pub fn frame_matches_ratio(frame: &CameraFrame, ratio: f64) -> bool {
    if frame.height == 0 {
        return false;
    }
    let actual = frame.width as f64 / frame.height as f64;
    // Crops land on whole pixels, so allow one pixel of slack
    (actual - ratio).abs() <= ratio / frame.width.max(1) as f64 + 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::Framerate;

    fn format(width: u32, height: u32, fps: u32) -> CameraFormat {
        CameraFormat {
            width,
            height,
            framerate: Some(Framerate::from_int(fps)),
            pixel_format: "MJPG".into(),
        }
    }

    #[test]
    fn test_empty_device_uses_facing_mode() {
        let c = StreamConstraints::for_selection("", AspectRatio::Square);
        assert_eq!(c.video.device.device_id(), None);
        assert_eq!(
            c.to_json(),
            r#"{"video":{"facingMode":"user","aspectRatio":1.0},"audio":false}"#
        );
    }

    #[test]
    fn test_widescreen_constraint_carries_exact_ratio() {
        let c = StreamConstraints::for_selection("cam-1", AspectRatio::Widescreen);
        assert_eq!(c.video.aspect_ratio, 1.7777777778);
        assert_eq!(c.video.device.device_id(), Some("cam-1"));
        assert!(!c.audio);
        assert_eq!(
            c.to_json(),
            r#"{"video":{"deviceId":"cam-1","aspectRatio":1.7777777778},"audio":false}"#
        );
    }

    #[test]
    fn test_every_ratio_is_requested_verbatim() {
        for ratio in AspectRatio::ALL {
            let c = StreamConstraints::for_selection("", ratio);
            assert_eq!(c.video.aspect_ratio, ratio.value());
            assert_eq!(c.ratio(), ratio);
        }
    }

    #[test]
    fn test_select_format_prefers_matching_ratio_then_size() {
        let formats = vec![
            format(640, 480, 30),
            format(1280, 720, 30),
            format(1920, 1080, 30),
            format(1920, 1080, 60),
        ];
        let wide = select_format(&formats, AspectRatio::Widescreen.value()).unwrap();
        assert_eq!((wide.width, wide.height), (1920, 1080));
        assert_eq!(wide.framerate.unwrap().as_int(), 60);

        let standard = select_format(&formats, AspectRatio::Standard.value()).unwrap();
        assert_eq!((standard.width, standard.height), (640, 480));

        assert!(select_format(&[], 1.0).is_none());
    }

    #[test]
    fn test_frame_ratio_check() {
        let frame = CameraFrame::from_rgba(16, 9, vec![0; 16 * 9 * 4]);
        assert!(frame_matches_ratio(&frame, AspectRatio::Widescreen.value()));
        assert!(!frame_matches_ratio(&frame, AspectRatio::Square.value()));
    }
}
