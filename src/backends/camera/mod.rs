// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │  GUI / terminal     │
//! └──────────┬──────────┘
//!            │ StreamConstraints
//!            ▼
//! ┌─────────────────────┐
//! │   StreamManager     │  ← one CaptureSession at a time
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend trait │  ← enumeration + stream acquisition
//! └──────────┬──────────┘
//!            ▼
//!       ┌────────┐
//!       │PipeWire│
//!       └────────┘
//! ```

pub mod constraints;
pub mod devices;
pub mod frame_loop;
pub mod manager;
pub mod pipewire;
pub mod session;
pub mod types;

pub use constraints::{DeviceSelector, StreamConstraints};
pub use manager::{StreamManager, StreamRequest};
pub use session::{CaptureSession, SessionOutputs};
pub use types::*;

use std::sync::Arc;

/// What a platform must provide to feed the mirror
pub trait CameraBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Check if this backend can run on the current system
    fn is_available(&self) -> bool;

    /// List the video inputs currently present, in display order
    fn enumerate_devices(&self) -> BackendResult<Vec<CameraDevice>>;

    /// Capture modes supported by `device`
    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat>;

    /// Start capturing with `constraints`, delivering RGBA frames to `sender`
    ///
    /// The stream has no audio. It runs until the returned handle is
    /// stopped or dropped.
    fn open_stream(
        &self,
        constraints: &StreamConstraints,
        sender: FrameSender,
    ) -> BackendResult<Box<dyn CaptureHandle>>;

    /// Whether the backend signals every decoded frame, so the mirror can
    /// redraw per frame instead of per display refresh
    fn supports_frame_callbacks(&self) -> bool;
}

/// A running capture stream
pub trait CaptureHandle: Send {
    /// Human-readable description (device and format) for logs
    fn describe(&self) -> String;

    /// Release the camera; no frames are delivered afterwards
    fn stop(&mut self) -> BackendResult<()>;

    /// True until stopped or until the stream fails
    fn is_active(&self) -> bool;
}

/// Get the platform backend (PipeWire)
pub fn get_backend() -> Arc<dyn CameraBackend> {
    Arc::new(pipewire::PipeWireBackend::new())
}
