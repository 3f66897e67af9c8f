// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Aspect ratio requested from the camera
///
/// The selector offers a small fixed set of ratios. The value is width
/// divided by height, rounded the same way the constraint carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1
    #[default]
    Square,
    /// 3:4 (taller than wide)
    Portrait,
    /// 16:9
    Widescreen,
    /// 4:3
    Standard,
}

impl AspectRatio {
    /// All ratios in selector order
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Square,
        AspectRatio::Portrait,
        AspectRatio::Widescreen,
        AspectRatio::Standard,
    ];

    /// Label shown in the selector
    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Standard => "4:3",
        }
    }

    /// Ratio value carried by the stream constraint
    pub fn value(&self) -> f64 {
        match self {
            AspectRatio::Square => 1.0,
            AspectRatio::Portrait => 0.75,
            AspectRatio::Widescreen => 1.7777777778,
            AspectRatio::Standard => 1.3333333333,
        }
    }

    /// Exact ratio as (width, height), used for GStreamer fractions
    pub fn fraction(&self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (1, 1),
            AspectRatio::Portrait => (3, 4),
            AspectRatio::Widescreen => (16, 9),
            AspectRatio::Standard => (4, 3),
        }
    }

    /// Position in the selector
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|r| r == self).unwrap_or(0)
    }

    /// Ratio at a selector position
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parse a selector label such as "16:9"
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|r| r.label() == label)
    }

    /// Next ratio in selector order, wrapping around
    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Labels for all ratios, in selector order
pub fn aspect_ratio_labels() -> Vec<String> {
    AspectRatio::ALL
        .iter()
        .map(|r| r.label().to_string())
        .collect()
}

/// Persisted preference keys and defaults
pub mod preferences {
    /// Selected camera identifier (empty = default-facing camera)
    pub const PREFERRED_CAMERA_KEY: &str = "preferred-camera";

    /// Whether the mirrored view is shown
    pub const IS_MIRRORED_KEY: &str = "is-mirrored";

    pub const DEFAULT_PREFERRED_CAMERA: &str = "";

    pub const DEFAULT_IS_MIRRORED: bool = true;
}

/// Device selector
pub mod devices {
    /// First selector entry, meaning "let the platform pick"
    pub const DEFAULT_CAMERA_LABEL: &str = "Default Camera";

    /// Facing mode requested when no device is selected
    pub const DEFAULT_FACING_MODE: &str = "user";

    /// Our own PipeWire nodes, never offered as inputs
    pub const SELF_NODE_MARKERS: &[&str] = &["Tiny Mirror", "Camera (Virtual)"];

    /// Framerates assumed when a device does not report any
    pub const COMMON_FRAMERATES: &[u32] = &[30, 60, 15, 24];

    /// Resolutions assumed when format enumeration fails
    pub const FALLBACK_RESOLUTIONS: &[(u32, u32)] = &[(1920, 1080), (1280, 720), (640, 480)];
}

/// Mirror pipeline
pub mod mirror {
    use super::Duration;

    /// Frame rate of the mirrored output stream
    pub const TARGET_FPS: u32 = 60;

    /// Redraw interval when no per-frame callback is available (60 Hz display)
    pub const REFRESH_INTERVAL: Duration = Duration::from_micros(16_667);

    /// How long the per-frame scheduler waits before re-checking for cancellation
    pub const FRAME_WAIT: Duration = Duration::from_millis(100);

    /// Bytes per RGBA pixel
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Output channel depth; frames beyond this are dropped
    pub const OUTPUT_QUEUE: usize = 4;
}

/// GStreamer pipeline tuning
pub mod pipeline {
    /// Maximum buffers held by the appsink
    pub const MAX_BUFFERS: u32 = 2;

    /// Frame channel depth between the appsink and the mirror loop
    pub const FRAME_QUEUE: usize = 10;

    /// Pixel format delivered to the application
    pub const OUTPUT_FORMAT: &str = "RGBA";
}

/// Timing constants
pub mod timing {
    /// Log frame statistics every N frames
    pub const FRAME_LOG_INTERVAL: u64 = 60;

    /// Timeout for pipeline stop (seconds)
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Timeout for pipeline start (seconds)
    pub const START_TIMEOUT_SECS: u64 = 5;
}

/// Picture-in-Picture window
///
/// The overlay asks for `AlwaysOnTop`. X11 window managers honour it; on
/// Wayland the compositor decides stacking and winit ignores the request,
/// so there the overlay is an ordinary window the user can raise or pin.
pub mod pip {
    /// Initial overlay width in logical pixels
    pub const WINDOW_WIDTH: f32 = 320.0;

    /// Initial overlay height in logical pixels
    pub const WINDOW_HEIGHT: f32 = 240.0;

    pub const MIN_WINDOW_SIZE: f32 = 120.0;
}

/// Application information utilities
pub mod app_info {
    /// Unique identifier in RDNN format; also names the config directory
    pub const APP_ID: &str = "xyz.tinymirror.TinyMirror";

    pub const APP_NAME: &str = "Tiny Mirror";

    /// Application version stamped at build time
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ratio_is_first_option() {
        assert_eq!(AspectRatio::default(), AspectRatio::ALL[0]);
        assert_eq!(AspectRatio::default().value(), 1.0);
    }

    #[test]
    fn test_ratio_values_match_fractions() {
        for ratio in AspectRatio::ALL {
            let (w, h) = ratio.fraction();
            assert!((ratio.value() - w as f64 / h as f64).abs() < 1e-9, "{}", ratio);
        }
    }

    #[test]
    fn test_next_wraps() {
        assert_eq!(AspectRatio::Standard.next(), AspectRatio::Square);
        assert_eq!(AspectRatio::Square.next(), AspectRatio::Portrait);
    }
}
