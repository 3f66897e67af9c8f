// SPDX-License-Identifier: GPL-3.0-only

//! Mirror pipeline
//!
//! Turns the camera stream into two outputs:
//!
//! ```text
//!                    ┌──────────────┐   primary (unflipped)
//! camera frames ───▶ │  mirror loop │ ─────────────────────▶
//!                    │  (thread)    │   mirrored (flipped, ≤ 60 fps)
//!                    └──────┬───────┘ ─────────────────────▶
//!                           │ draw
//!                    ┌──────▼───────┐
//!                    │MirrorSurface │
//!                    └──────────────┘
//! ```
//!
//! The loop stops when [`MirrorPipeline::stop`] is called, when the
//! pipeline is dropped, or when the camera stream ends.

mod scheduler;
mod surface;

pub use scheduler::FrameScheduler;
pub use surface::MirrorSurface;

use crate::backends::camera::frame_loop::{FrameLoopController, LoopAction};
use crate::backends::camera::{CameraFrame, FrameReceiver, FrameSender};
use crate::constants::{mirror, timing};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Mirror loop settings
#[derive(Debug, Clone, Copy)]
pub struct MirrorConfig {
    pub scheduler: FrameScheduler,
    /// Minimum time between two mirrored frames
    pub min_interval: Duration,
}

impl MirrorConfig {
    /// Settings for a source that does (or does not) signal every frame
    pub fn for_source(per_frame_available: bool) -> Self {
        Self {
            scheduler: FrameScheduler::select(per_frame_available),
            min_interval: Duration::from_secs(1) / mirror::TARGET_FPS,
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self::for_source(true)
    }
}

/// Outcome of waiting for one scheduling opportunity
enum Tick {
    Frame { frame: CameraFrame, fresh: bool },
    Idle,
    Closed,
}

/// State owned by the loop thread
struct MirrorLoop {
    runtime: tokio::runtime::Runtime,
    config: MirrorConfig,
    source: FrameReceiver,
    primary: FrameSender,
    mirrored: FrameSender,
    surface: MirrorSurface,
    latest: Option<CameraFrame>,
    last_published: Option<Instant>,
    frames: u64,
}

impl MirrorLoop {
    fn tick(&mut self) -> Tick {
        match self.config.scheduler {
            FrameScheduler::PerFrame { wait } => {
                let next = self
                    .runtime
                    .block_on(tokio::time::timeout(wait, self.source.next()));
                match next {
                    Ok(Some(frame)) => Tick::Frame { frame, fresh: true },
                    Ok(None) => Tick::Closed,
                    Err(_) => Tick::Idle,
                }
            }
            FrameScheduler::Refresh { interval } => {
                std::thread::sleep(interval);

                let mut fresh = false;
                loop {
                    match self.source.try_next() {
                        Ok(Some(frame)) => {
                            self.latest = Some(frame);
                            fresh = true;
                        }
                        Ok(None) => return Tick::Closed,
                        Err(_) => break,
                    }
                }

                match &self.latest {
                    Some(frame) => Tick::Frame {
                        frame: frame.clone(),
                        fresh,
                    },
                    None => Tick::Idle,
                }
            }
        }
    }

    fn run_once(&mut self) -> LoopAction {
        let (frame, fresh) = match self.tick() {
            Tick::Frame { frame, fresh } => (frame, fresh),
            Tick::Idle => return LoopAction::Continue,
            Tick::Closed => {
                info!(frames = self.frames, "Camera stream ended, stopping mirror loop");
                return LoopAction::Stop;
            }
        };

        if fresh {
            // Full outputs drop the frame; the next one replaces it
            let _ = self.primary.try_send(frame.clone());
        }

        let due = self
            .last_published
            .is_none_or(|at| at.elapsed() >= self.config.min_interval);
        if due && self.surface.draw(&frame) {
            if let Some(flipped) = self.surface.snapshot() {
                let _ = self.mirrored.try_send(flipped);
            }
            self.last_published = Some(Instant::now());
            self.frames += 1;

            if self.frames % timing::FRAME_LOG_INTERVAL == 0 {
                debug!(
                    frames = self.frames,
                    size = ?self.surface.dimensions(),
                    resizes = self.surface.resize_count(),
                    "Mirror loop progress"
                );
            }
        }

        if self.primary.is_closed() && self.mirrored.is_closed() {
            info!("Nobody is watching, stopping mirror loop");
            return LoopAction::Stop;
        }
        LoopAction::Continue
    }
}

/// Running mirror loop
pub struct MirrorPipeline {
    controller: FrameLoopController,
}

impl MirrorPipeline {
    /// Start mirroring `source` into `primary` and `mirrored`
    pub fn start(
        source: FrameReceiver,
        primary: FrameSender,
        mirrored: FrameSender,
        config: MirrorConfig,
    ) -> Self {
        info!(scheduler = config.scheduler.name(), "Starting mirror pipeline");

        let controller = FrameLoopController::start_with_init(
            "mirror-loop",
            move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .map_err(|e| e.to_string())?;
                Ok(MirrorLoop {
                    runtime,
                    config,
                    source,
                    primary,
                    mirrored,
                    surface: MirrorSurface::new(),
                    latest: None,
                    last_published: None,
                    frames: 0,
                })
            },
            MirrorLoop::run_once,
        );

        Self { controller }
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Cancel the loop and wait for it; no further frames are published
    pub fn stop(&mut self) {
        self.controller.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;

    fn unlimited(scheduler: FrameScheduler) -> MirrorConfig {
        MirrorConfig {
            scheduler,
            min_interval: Duration::ZERO,
        }
    }

    fn two_pixel_frame() -> CameraFrame {
        CameraFrame::from_rgba(2, 1, vec![1, 1, 1, 1, 2, 2, 2, 2])
    }

    #[test]
    fn test_outputs_plain_and_flipped_until_source_ends() {
        let (mut source_tx, source_rx) = mpsc::channel(4);
        let (primary_tx, primary_rx) = mpsc::channel(4);
        let (mirrored_tx, mirrored_rx) = mpsc::channel(4);

        let mut pipeline = MirrorPipeline::start(
            source_rx,
            primary_tx,
            mirrored_tx,
            unlimited(FrameScheduler::select(true)),
        );

        source_tx.try_send(two_pixel_frame()).unwrap();
        source_tx.try_send(two_pixel_frame()).unwrap();
        drop(source_tx);

        // Ends by itself once the source closes
        pipeline.controller.join();
        assert!(!pipeline.is_running());

        let primary: Vec<_> = futures::executor::block_on(primary_rx.collect());
        let mirrored: Vec<_> = futures::executor::block_on(mirrored_rx.collect());
        assert_eq!(primary.len(), 2);
        assert_eq!(mirrored.len(), 2);
        assert_eq!(primary[0].pixel(0, 0), Some([1, 1, 1, 1]));
        assert_eq!(mirrored[0].pixel(0, 0), Some([2, 2, 2, 2]));
    }

    #[test]
    fn test_empty_frames_produce_no_output() {
        let (mut source_tx, source_rx) = mpsc::channel(4);
        let (primary_tx, _primary_rx) = mpsc::channel(4);
        let (mirrored_tx, mirrored_rx) = mpsc::channel(4);

        let mut pipeline = MirrorPipeline::start(
            source_rx,
            primary_tx,
            mirrored_tx,
            unlimited(FrameScheduler::select(true)),
        );
        source_tx
            .try_send(CameraFrame::from_rgba(0, 0, Vec::new()))
            .unwrap();
        drop(source_tx);
        pipeline.controller.join();

        let mirrored: Vec<_> = futures::executor::block_on(mirrored_rx.collect());
        assert!(mirrored.is_empty());
    }

    #[test]
    fn test_stop_cancels_idle_loop() {
        let (_source_tx, source_rx) = mpsc::channel::<CameraFrame>(4);
        let (primary_tx, _primary_rx) = mpsc::channel(4);
        let (mirrored_tx, _mirrored_rx) = mpsc::channel(4);

        let mut pipeline = MirrorPipeline::start(
            source_rx,
            primary_tx,
            mirrored_tx,
            unlimited(FrameScheduler::PerFrame {
                wait: Duration::from_millis(10),
            }),
        );
        assert!(pipeline.is_running());

        // The source stays open; only the explicit stop ends the loop
        pipeline.stop();
        assert!(!pipeline.is_running());
    }

    #[test]
    fn test_refresh_scheduler_redraws_latest_frame() {
        let (mut source_tx, source_rx) = mpsc::channel(4);
        let (primary_tx, primary_rx) = mpsc::channel(16);
        let (mirrored_tx, mut mirrored_rx) = mpsc::channel(16);

        let mut pipeline = MirrorPipeline::start(
            source_rx,
            primary_tx,
            mirrored_tx,
            unlimited(FrameScheduler::Refresh {
                interval: Duration::from_millis(5),
            }),
        );
        source_tx.try_send(two_pixel_frame()).unwrap();

        // Without new frames the surface is still redrawn every refresh
        let first = futures::executor::block_on(mirrored_rx.next());
        let second = futures::executor::block_on(mirrored_rx.next());
        assert!(first.is_some() && second.is_some());

        drop(source_tx);
        pipeline.controller.join();
        drop(mirrored_rx);

        let primary: Vec<_> = futures::executor::block_on(primary_rx.collect());
        assert_eq!(primary.len(), 1);
    }
}
