// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines between capture and display
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │ Camera Frame │ ──▶ │  Mirror Pipeline  │ ──▶ │ primary output   │
//! │   (RGBA)     │     │  - row reversal   │ ──▶ │ mirrored output  │
//! └──────────────┘     └───────────────────┘     └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`mirror`]: Horizontal flip loop feeding both display surfaces

pub mod mirror;
