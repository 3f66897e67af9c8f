// SPDX-License-Identifier: GPL-3.0-only

//! Device list handling for the camera selector

use super::types::{BackendResult, CameraDevice};
use crate::constants::devices::DEFAULT_CAMERA_LABEL;
use tracing::{info, warn};

/// Turn an enumeration result into the list shown to the user
///
/// A denied or unsupported enumeration yields an empty list; the selector
/// then only offers the default camera.
pub fn resolve_device_list(result: BackendResult<Vec<CameraDevice>>) -> Vec<CameraDevice> {
    match result {
        Ok(devices) => {
            info!(count = devices.len(), "Enumerated video inputs");
            devices
        }
        Err(err) => {
            warn!(error = %err, "Device enumeration failed, offering default camera only");
            Vec::new()
        }
    }
}

/// Selector entries: "Default Camera" followed by every device label
pub fn selector_options(devices: &[CameraDevice]) -> Vec<String> {
    std::iter::once(DEFAULT_CAMERA_LABEL.to_string())
        .chain(devices.iter().map(|d| {
            if d.label.is_empty() {
                d.id.clone()
            } else {
                d.label.clone()
            }
        }))
        .collect()
}

/// Selector position of the stored preference
///
/// Index 0 is the default camera, used for an empty preference and for a
/// device that is no longer present.
pub fn selected_index(devices: &[CameraDevice], preferred: &str) -> usize {
    if preferred.is_empty() {
        return 0;
    }
    devices
        .iter()
        .position(|d| d.id == preferred)
        .map(|idx| idx + 1)
        .unwrap_or(0)
}

/// Device identifier for a selector position (empty for the default camera)
pub fn device_id_at(devices: &[CameraDevice], index: usize) -> String {
    match index {
        0 => String::new(),
        n => devices
            .get(n - 1)
            .map(|d| d.id.clone())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::BackendError;

    fn device(id: &str, label: &str) -> CameraDevice {
        CameraDevice {
            id: id.into(),
            label: label.into(),
            node_id: None,
        }
    }

    #[test]
    fn test_denied_enumeration_leaves_default_only() {
        let devices = resolve_device_list(Err(BackendError::PermissionDenied("portal".into())));
        assert!(devices.is_empty());
        assert_eq!(selector_options(&devices), vec!["Default Camera".to_string()]);
        assert_eq!(selected_index(&devices, "cam-1"), 0);
        assert_eq!(device_id_at(&devices, 0), "");
    }

    #[test]
    fn test_options_keep_display_order() {
        let devices = vec![device("a", "Front"), device("b", "")];
        assert_eq!(
            selector_options(&devices),
            vec!["Default Camera".to_string(), "Front".into(), "b".into()]
        );
    }

    #[test]
    fn test_selection_round_trip() {
        let devices = vec![device("a", "Front"), device("b", "Back")];
        assert_eq!(selected_index(&devices, "b"), 2);
        assert_eq!(device_id_at(&devices, 2), "b");
        assert_eq!(selected_index(&devices, "gone"), 0);
        assert_eq!(device_id_at(&devices, 9), "");
    }
}
