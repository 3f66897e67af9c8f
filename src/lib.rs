// SPDX-License-Identifier: GPL-3.0-only

//! Tiny Mirror - a webcam mirror with a floating Picture-in-Picture overlay
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: COSMIC application, views and message handlers
//! - [`backends`]: Camera device enumeration and capture
//! - [`pipelines`]: Frame mirroring between capture and display
//! - [`config`]: Persisted preferences
//! - [`selection`]: The current camera, aspect ratio and mirror state
//! - [`pip`]: Picture-in-Picture state machine
//! - [`terminal`]: Terminal renderer
//!
//! # Example
//!
//! ```ignore
//! // This is a GUI application, typically run via:
//! // tiny-mirror
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pip;
pub mod pipelines;
pub mod selection;
pub mod terminal;

// Re-export commonly used types
pub use app::{AppModel, Message};
pub use config::Preferences;
pub use constants::AspectRatio;
pub use errors::{AppError, AppResult};
pub use pip::{PipController, VideoSurface};
pub use selection::Selection;
