// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use crate::constants::mirror::BYTES_PER_PIXEL;
use crate::errors::{AppError, CameraError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// A video input the user can pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraDevice {
    /// Stable identifier stored in preferences (e.g. "pipewire-serial-57")
    pub id: String,
    /// Human-readable name shown in the selector
    pub label: String,
    /// PipeWire node ID, used for format enumeration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

/// Framerate as a fraction (numerator/denominator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    pub fn new(num: u32, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    pub fn from_int(fps: u32) -> Self {
        Self { num: fps, denom: 1 }
    }

    pub fn as_int(&self) -> u32 {
        self.num / self.denom
    }

    /// Format as GStreamer fraction string (e.g., "60000/1001")
    pub fn as_gst_fraction(&self) -> String {
        format!("{}/{}", self.num, self.denom)
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denom != 1 {
            write!(f, "{:.2}", self.num as f64 / self.denom as f64)
        } else {
            write!(f, "{}", self.num)
        }
    }
}

/// One capture mode a device supports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    /// None when the device negotiates the rate itself (libcamera nodes)
    pub framerate: Option<Framerate>,
    /// FourCC or GStreamer name (e.g., "MJPG", "YUY2", "NV12")
    pub pixel_format: String,
}

impl CameraFormat {
    /// Width divided by height
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    /// Whether frames arrive JPEG-compressed and need decoding
    pub fn is_mjpeg(&self) -> bool {
        matches!(
            self.pixel_format.to_ascii_uppercase().as_str(),
            "MJPG" | "MJPEG" | "JPEG"
        )
    }
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fps) = &self.framerate {
            write!(
                f,
                "{}x{} @ {}fps ({})",
                self.width, self.height, fps, self.pixel_format
            )
        } else {
            write!(f, "{}x{} ({})", self.width, self.height, self.pixel_format)
        }
    }
}

/// A single RGBA frame
///
/// Frames are cheap to clone: pixel data is shared.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, may include padding
    pub stride: u32,
    pub data: Arc<[u8]>,
    /// When the frame left the capture pipeline
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * BYTES_PER_PIXEL as u32,
            data: Arc::from(data),
            captured_at: Instant::now(),
        }
    }

    /// True while the source has not decoded any picture yet
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Row `y` without stride padding, if the buffer holds it
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let start = y as usize * self.stride as usize;
        let end = start + self.width as usize * BYTES_PER_PIXEL;
        self.data.get(start..end)
    }

    /// RGBA pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let row = self.row(y)?;
        let idx = x as usize * BYTES_PER_PIXEL;
        let px = row.get(idx..idx + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Tightly packed copy of the pixel data
    pub fn packed_rgba(&self) -> Vec<u8> {
        if self.stride as usize == self.width as usize * BYTES_PER_PIXEL {
            return self.data.to_vec();
        }
        (0..self.height)
            .filter_map(|y| self.row(y))
            .flatten()
            .copied()
            .collect()
    }
}

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Access to the device was refused
    PermissionDenied(String),
    /// Device is held by another process
    DeviceBusy(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// No format satisfies the constraints
    FormatNotSupported(String),
    /// Failed to build or start the pipeline
    InitializationFailed(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::DeviceBusy(msg) => write!(f, "Device busy: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::PermissionDenied(_) => CameraError::PermissionDenied,
            BackendError::DeviceBusy(_) => CameraError::Busy,
            BackendError::DeviceNotFound(msg) | BackendError::FormatNotSupported(msg) => {
                CameraError::ConstraintUnsatisfiable(msg)
            }
            BackendError::InitializationFailed(msg) => CameraError::InitializationFailed(msg),
            BackendError::NotAvailable(msg) | BackendError::Other(msg) => {
                CameraError::BackendError(msg)
            }
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_rows_are_packed() {
        // 2x2 frame with 4 bytes of padding per row
        let mut data = Vec::new();
        data.extend_from_slice(&[1, 1, 1, 1, 2, 2, 2, 2, 0, 0, 0, 0]);
        data.extend_from_slice(&[3, 3, 3, 3, 4, 4, 4, 4, 0, 0, 0, 0]);
        let frame = CameraFrame {
            width: 2,
            height: 2,
            stride: 12,
            data: Arc::from(data),
            captured_at: Instant::now(),
        };

        assert_eq!(frame.pixel(1, 1), Some([4, 4, 4, 4]));
        assert_eq!(frame.packed_rgba().len(), 16);
        assert_eq!(&frame.packed_rgba()[8..12], &[3, 3, 3, 3]);
    }

    #[test]
    fn test_busy_maps_to_camera_busy() {
        let err: CameraError = BackendError::DeviceBusy("/dev/video0".into()).into();
        assert!(matches!(err, CameraError::Busy));
    }

    #[test]
    fn test_format_ratio() {
        let format = CameraFormat {
            width: 1280,
            height: 720,
            framerate: Some(Framerate::from_int(30)),
            pixel_format: "MJPG".into(),
        };
        assert!((format.aspect_ratio() - 16.0 / 9.0).abs() < 1e-9);
        assert!(format.is_mjpeg());
    }
}
