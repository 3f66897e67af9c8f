// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera enumeration and format detection
//!
//! Devices come from `pw-cli ls Node`, formats from
//! `pw-cli enum-params <id> EnumFormat`. Both outputs are parsed as text.

use super::super::types::{BackendError, BackendResult, CameraDevice, CameraFormat, Framerate};
use crate::constants::devices::{COMMON_FRAMERATES, FALLBACK_RESOLUTIONS, SELF_NODE_MARKERS};
use std::process::Command;
use tracing::{debug, info, warn};

/// Enumerate cameras using PipeWire
pub fn enumerate_pipewire_cameras() -> BackendResult<Vec<CameraDevice>> {
    debug!("Enumerating cameras via pw-cli");

    let output = Command::new("pw-cli")
        .args(["ls", "Node"])
        .output()
        .map_err(|e| BackendError::NotAvailable(format!("pw-cli: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BackendError::PermissionDenied(stderr.trim().to_string()));
    }

    let cameras = parse_node_list(&String::from_utf8_lossy(&output.stdout));
    info!(count = cameras.len(), "Enumerated cameras via pw-cli");
    Ok(cameras)
}

/// Get supported formats for a PipeWire camera
pub fn get_pipewire_formats(device: &CameraDevice) -> Vec<CameraFormat> {
    let Some(node_id) = device.node_id.as_deref() else {
        warn!(device = %device.id, "No node ID for format enumeration, using fallback");
        return fallback_formats();
    };

    let output = Command::new("pw-cli")
        .args(["enum-params", node_id, "EnumFormat"])
        .output();

    match output {
        Ok(output) if output.status.success() => {
            let formats = parse_enum_formats(&String::from_utf8_lossy(&output.stdout));
            if formats.is_empty() {
                warn!(node_id, "Node reported no formats, using fallback");
                fallback_formats()
            } else {
                info!(count = formats.len(), node_id, "Enumerated formats via pw-cli");
                formats
            }
        }
        Ok(_) | Err(_) => {
            warn!(node_id, "pw-cli enum-params failed, using fallback");
            fallback_formats()
        }
    }
}

/// Formats assumed when the node cannot be queried
pub fn fallback_formats() -> Vec<CameraFormat> {
    FALLBACK_RESOLUTIONS
        .iter()
        .flat_map(|&(width, height)| {
            COMMON_FRAMERATES.iter().map(move |&fps| CameraFormat {
                width,
                height,
                framerate: Some(Framerate::from_int(fps)),
                pixel_format: "MJPG".to_string(),
            })
        })
        .collect()
}

/// Properties collected for one node of `pw-cli ls Node`
#[derive(Default)]
struct NodeBlock {
    id: Option<String>,
    serial: Option<String>,
    description: Option<String>,
    nick: Option<String>,
    is_video_source: bool,
}

impl NodeBlock {
    fn into_device(self) -> Option<CameraDevice> {
        if !self.is_video_source {
            return None;
        }
        let id = self.id?;
        let label = self.description.or(self.nick)?;

        if SELF_NODE_MARKERS.iter().any(|m| label.contains(m)) {
            debug!(label = %label, "Skipping our own node");
            return None;
        }

        // object.serial is what pipewiresrc's target-object expects
        let device_id = match &self.serial {
            Some(serial) => format!("pipewire-serial-{}", serial),
            None => format!("pipewire-{}", id),
        };

        debug!(id = %id, device_id = %device_id, label = %label, "Found video source");
        Some(CameraDevice {
            id: device_id,
            label,
            node_id: Some(id),
        })
    }
}

/// Parse `pw-cli ls Node` output into video sources
pub fn parse_node_list(output: &str) -> Vec<CameraDevice> {
    let mut cameras = Vec::new();
    let mut block = NodeBlock::default();

    for line in output.lines() {
        let trimmed = line.trim();

        // "id 76, type PipeWire:Interface:Node/3" starts a new node
        if let Some(rest) = trimmed.strip_prefix("id ")
            && trimmed.contains("type PipeWire:Interface:Node")
        {
            cameras.extend(std::mem::take(&mut block).into_device());
            block.id = rest.split(',').next().map(|id| id.trim().to_string());
            continue;
        }

        let Some((key, value)) = property(trimmed) else {
            continue;
        };
        match key {
            "media.class" => block.is_video_source = value == "Video/Source",
            "object.serial" => block.serial = Some(value),
            "node.description" => block.description = Some(value),
            "node.nick" => block.nick = Some(value),
            _ => {}
        }
    }

    cameras.extend(block.into_device());
    cameras
}

/// Split `key = "value"` (the value may be unquoted)
fn property(line: &str) -> Option<(&str, String)> {
    let (key, value) = line.split_once(" = ")?;
    let key = key.trim().trim_start_matches('*').trim();
    let value = value.trim().trim_matches('"').to_string();
    Some((key, value))
}

/// Fields collected for one `Object:` of `pw-cli enum-params`
#[derive(Default)]
struct FormatBlock {
    subtype: Option<String>,
    video_format: Option<String>,
    size: Option<(u32, u32)>,
    framerates: Vec<Framerate>,
}

impl FormatBlock {
    fn into_formats(self) -> Vec<CameraFormat> {
        let (Some((width, height)), Some(subtype)) = (self.size, self.subtype) else {
            return Vec::new();
        };

        // Raw formats name their pixel layout; compressed ones their codec
        let pixel_format = if subtype == "raw" {
            self.video_format.unwrap_or_else(|| "YUY2".to_string())
        } else {
            subtype.to_uppercase()
        };

        // libcamera nodes do not list framerates and negotiate them instead
        if self.framerates.is_empty() {
            return vec![CameraFormat {
                width,
                height,
                framerate: None,
                pixel_format,
            }];
        }

        self.framerates
            .into_iter()
            .map(|fps| CameraFormat {
                width,
                height,
                framerate: Some(fps),
                pixel_format: pixel_format.clone(),
            })
            .collect()
    }
}

/// Parse `pw-cli enum-params <id> EnumFormat` output
pub fn parse_enum_formats(output: &str) -> Vec<CameraFormat> {
    let mut formats = Vec::new();
    let mut block = FormatBlock::default();

    for line in output.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("Object:") {
            formats.extend(std::mem::take(&mut block).into_formats());
        } else if let Some(subtype) = enum_value(trimmed, "Spa:Enum:MediaSubtype:") {
            block.subtype = Some(subtype.to_lowercase());
        } else if let Some(video_format) = enum_value(trimmed, "Spa:Enum:VideoFormat:") {
            block.video_format = Some(video_format.to_uppercase());
        } else if let Some(size) = trimmed.strip_prefix("Rectangle ")
            && let Some((w, h)) = size.split_once('x')
        {
            block.size = w.trim().parse().ok().zip(h.trim().parse().ok());
        } else if let Some(fraction) = trimmed.strip_prefix("Fraction ")
            && let Some((num, denom)) = fraction.split_once('/')
            && let (Ok(num), Ok(denom)) = (num.trim().parse::<u32>(), denom.trim().parse::<u32>())
            && denom > 0
        {
            let fps = Framerate::new(num, denom);
            // Enum choices repeat the default value first
            if !block.framerates.iter().any(|f| f.as_int() == fps.as_int()) {
                block.framerates.push(fps);
            }
        }
    }

    formats.extend(block.into_formats());
    formats
}

/// Value after `prefix` in lines like `Id 1   (Spa:Enum:MediaSubtype:raw)`
fn enum_value<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let start = line.find(prefix)? + prefix.len();
    Some(line[start..].trim_end_matches(')'))
}

/// Check that pipewiresrc can be created
pub fn is_pipewire_available() -> bool {
    if gstreamer::init().is_err() {
        return false;
    }
    gstreamer::ElementFactory::find("pipewiresrc").is_some()
}
