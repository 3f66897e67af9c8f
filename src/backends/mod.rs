// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           App Layer / Terminal               │
//! └────────────────────┬────────────────────────┘
//!                      │ StreamManager
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │            ┌──────────────────┐              │
//! │            │     Camera       │              │
//! │            │    (PipeWire)    │              │
//! │            └──────────────────┘              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Device enumeration, capture sessions and stream replacement

pub mod camera;
