// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands that run without a window

use serde::Serialize;
use tiny_mirror::backends::camera::devices::selector_options;
use tiny_mirror::backends::camera::get_backend;
use tiny_mirror::backends::camera::types::CameraFormat;

#[derive(Serialize)]
struct ListedCamera {
    index: usize,
    id: String,
    label: String,
    formats: Vec<String>,
}

/// List the cameras the selector would offer, with their best modes
pub fn list_cameras(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    let backend = get_backend();
    if !backend.is_available() {
        eprintln!("{} is not available; only the default camera can be requested.", backend.name());
    }
    let devices = backend.enumerate_devices().unwrap_or_default();
    let labels = selector_options(&devices);

    let listed: Vec<ListedCamera> = devices
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(index, (device, label))| ListedCamera {
            index,
            id: device.id.clone(),
            label,
            formats: summarize_formats(&backend.get_formats(device)),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    if listed.is_empty() {
        println!("No cameras found. The default camera will be requested.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for camera in &listed {
        println!("  [{}] {} ({})", camera.index, camera.label, camera.id);
        if !camera.formats.is_empty() {
            println!("      Formats: {}", camera.formats.join(", "));
        }
        println!();
    }

    Ok(())
}

/// Top three resolutions, each with its best framerate
fn summarize_formats(formats: &[CameraFormat]) -> Vec<String> {
    let mut resolutions: Vec<(u32, u32, u32)> = Vec::new();
    for format in formats {
        let fps = format.framerate.map(|f| f.as_int()).unwrap_or(30);
        if let Some(existing) = resolutions
            .iter_mut()
            .find(|(w, h, _)| *w == format.width && *h == format.height)
        {
            existing.2 = existing.2.max(fps);
        } else {
            resolutions.push((format.width, format.height, fps));
        }
    }

    // Highest resolution first
    resolutions.sort_by(|a, b| (b.0 * b.1).cmp(&(a.0 * a.1)));

    resolutions
        .iter()
        .take(3)
        .map(|(w, h, fps)| format!("{}x{}@{}fps", w, h, fps))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_mirror::backends::camera::types::Framerate;

    fn format(width: u32, height: u32, fps: u32) -> CameraFormat {
        CameraFormat {
            width,
            height,
            framerate: Some(Framerate::from_int(fps)),
            pixel_format: "YUY2".to_string(),
        }
    }

    #[test]
    fn test_summary_keeps_best_rate_per_resolution() {
        let formats = vec![
            format(640, 480, 30),
            format(1920, 1080, 30),
            format(640, 480, 60),
            format(1280, 720, 30),
            format(320, 240, 30),
        ];
        assert_eq!(
            summarize_formats(&formats),
            vec!["1920x1080@30fps", "1280x720@30fps", "640x480@60fps"]
        );
    }
}
