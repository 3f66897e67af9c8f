// SPDX-License-Identifier: GPL-3.0-only

//! When the mirror loop draws

use crate::constants::mirror::{FRAME_WAIT, REFRESH_INTERVAL};
use std::time::Duration;

/// Scheduling strategy for the mirror loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameScheduler {
    /// Draw once per decoded source frame
    ///
    /// `wait` bounds how long one iteration blocks, so a stop request is
    /// noticed even when the camera stalls.
    PerFrame { wait: Duration },
    /// Draw the latest frame once per display refresh
    Refresh { interval: Duration },
}

impl FrameScheduler {
    /// Per-frame scheduling when the source signals frames, else refresh
    pub fn select(per_frame_available: bool) -> Self {
        if per_frame_available {
            FrameScheduler::PerFrame { wait: FRAME_WAIT }
        } else {
            FrameScheduler::Refresh {
                interval: REFRESH_INTERVAL,
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FrameScheduler::PerFrame { .. } => "per-frame",
            FrameScheduler::Refresh { .. } => "refresh",
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::select(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_per_frame() {
        assert!(matches!(
            FrameScheduler::select(true),
            FrameScheduler::PerFrame { .. }
        ));
        assert_eq!(
            FrameScheduler::select(false),
            FrameScheduler::Refresh {
                interval: REFRESH_INTERVAL
            }
        );
    }
}
