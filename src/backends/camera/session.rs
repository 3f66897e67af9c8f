// SPDX-License-Identifier: GPL-3.0-only

//! Capture session: one camera stream and the mirror loop fed by it

use super::constraints::StreamConstraints;
use super::types::FrameReceiver;
use super::{CameraBackend, CaptureHandle};
use crate::constants::{mirror, pipeline};
use crate::errors::AppResult;
use crate::pipelines::mirror::{MirrorConfig, MirrorPipeline};
use futures::channel::mpsc;
use tracing::{info, warn};

/// Frame streams a session publishes to the display surfaces
pub struct SessionOutputs {
    /// Camera frames as captured
    pub primary: FrameReceiver,
    /// Horizontally flipped frames
    pub mirrored: FrameReceiver,
}

/// A live camera stream paired with its mirror loop
///
/// The two are released together by [`CaptureSession::stop`] (or on drop):
/// the camera first, then the loop.
pub struct CaptureSession {
    handle: Box<dyn CaptureHandle>,
    mirror: MirrorPipeline,
    constraints: StreamConstraints,
    stopped: bool,
}

impl CaptureSession {
    /// Acquire a stream for `constraints` and start mirroring it
    pub fn open(
        backend: &dyn CameraBackend,
        constraints: &StreamConstraints,
    ) -> AppResult<(Self, SessionOutputs)> {
        let (frame_tx, frame_rx) = mpsc::channel(pipeline::FRAME_QUEUE);
        let (primary_tx, primary_rx) = mpsc::channel(mirror::OUTPUT_QUEUE);
        let (mirrored_tx, mirrored_rx) = mpsc::channel(mirror::OUTPUT_QUEUE);

        let handle = backend.open_stream(constraints, frame_tx)?;
        info!(backend = backend.name(), stream = %handle.describe(), "Camera stream acquired");

        let mirror = MirrorPipeline::start(
            frame_rx,
            primary_tx,
            mirrored_tx,
            MirrorConfig::for_source(backend.supports_frame_callbacks()),
        );

        let session = Self {
            handle,
            mirror,
            constraints: constraints.clone(),
            stopped: false,
        };
        let outputs = SessionOutputs {
            primary: primary_rx,
            mirrored: mirrored_rx,
        };
        Ok((session, outputs))
    }

    pub fn constraints(&self) -> &StreamConstraints {
        &self.constraints
    }

    pub fn describe(&self) -> String {
        self.handle.describe()
    }

    /// True while both the camera and the mirror loop run
    pub fn is_active(&self) -> bool {
        !self.stopped && self.handle.is_active() && self.mirror.is_running()
    }

    /// Release the camera and end the mirror loop
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        info!(stream = %self.handle.describe(), "Stopping capture session");
        if let Err(e) = self.handle.stop() {
            warn!(error = %e, "Camera stream did not stop cleanly");
        }
        self.mirror.stop();
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}
