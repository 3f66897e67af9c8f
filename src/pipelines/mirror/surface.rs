// SPDX-License-Identifier: GPL-3.0-only

//! Drawing surface holding the horizontally flipped frame

use crate::backends::camera::CameraFrame;
use crate::constants::mirror::BYTES_PER_PIXEL;
use tracing::{debug, warn};

/// RGBA surface the mirror loop draws into
///
/// The surface takes the dimensions of the frames drawn into it. It is
/// resized (and cleared) only when a frame of different dimensions arrives.
#[derive(Debug, Default)]
pub struct MirrorSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    resize_count: u64,
}

impl MirrorSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// How many times the surface changed size
    pub fn resize_count(&self) -> u64 {
        self.resize_count
    }

    /// True until the first non-empty frame is drawn
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Draw `frame` flipped horizontally
    ///
    /// Returns false when nothing was drawn: the source has no decoded
    /// picture yet, or its buffer is shorter than its dimensions claim.
    pub fn draw(&mut self, frame: &CameraFrame) -> bool {
        if frame.is_empty() {
            return false;
        }
        if (frame.width, frame.height) != (self.width, self.height) {
            self.resize(frame.width, frame.height);
        }

        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        for (y, dst) in self.pixels.chunks_exact_mut(row_bytes).enumerate() {
            let Some(src) = frame.row(y as u32) else {
                warn!(row = y, height = frame.height, "Frame buffer shorter than its size");
                return false;
            };
            for (d, s) in dst
                .chunks_exact_mut(BYTES_PER_PIXEL)
                .zip(src.chunks_exact(BYTES_PER_PIXEL).rev())
            {
                d.copy_from_slice(s);
            }
        }
        true
    }

    /// Current contents as a frame, or None before anything was drawn
    pub fn snapshot(&self) -> Option<CameraFrame> {
        if self.is_empty() {
            return None;
        }
        Some(CameraFrame::from_rgba(
            self.width,
            self.height,
            self.pixels.clone(),
        ))
    }

    fn resize(&mut self, width: u32, height: u32) {
        debug!(
            from = ?(self.width, self.height),
            to = ?(width, height),
            "Resizing mirror surface"
        );
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels
            .resize(width as usize * height as usize * BYTES_PER_PIXEL, 0);
        self.resize_count += 1;
    }
}
