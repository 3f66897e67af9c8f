// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for persisted preferences and the selection built on them

use tiny_mirror::backends::camera::DeviceSelector;
use tiny_mirror::config::{MemoryStore, PreferenceStore, Preferences};
use tiny_mirror::constants::AspectRatio;
use tiny_mirror::{PipController, Selection, VideoSurface};

#[test]
fn test_fresh_store_gives_defaults() {
    let store = MemoryStore::new();
    let prefs = Preferences::load(&store);
    assert_eq!(prefs.preferred_camera, "");
    assert!(prefs.is_mirrored, "Mirroring should be on by default");
}

#[test]
fn test_preferences_survive_reload() {
    let store = MemoryStore::new();
    let mut prefs = Preferences::load(&store);
    prefs
        .set_preferred_camera(&store, "pipewire-serial-42")
        .unwrap();
    prefs.set_mirrored(&store, false).unwrap();

    let reloaded = Preferences::load(&store);
    assert_eq!(reloaded.preferred_camera, "pipewire-serial-42");
    assert!(!reloaded.is_mirrored);
}

#[test]
fn test_garbage_values_fall_back_to_defaults() {
    let store = MemoryStore::new();
    store.write("is-mirrored", "not json").unwrap();
    store.write("preferred-camera", "{").unwrap();

    let prefs = Preferences::load(&store);
    assert!(prefs.is_mirrored);
    // Unparseable text is kept as a raw identifier
    assert_eq!(prefs.preferred_camera, "{");
}

#[test]
fn test_default_camera_requests_user_facing() {
    let selection = Selection::from_preferences(&Preferences::default());
    let constraints = selection.constraints();

    assert_eq!(
        constraints.video.device,
        DeviceSelector::Facing {
            facing_mode: "user".to_string()
        }
    );
    assert_eq!(constraints.video.aspect_ratio, 1.0);
    assert!(!constraints.audio);
    assert!(!constraints.to_json().contains("deviceId"));
}

#[test]
fn test_widescreen_ratio_in_constraints() {
    let mut selection = Selection::from_preferences(&Preferences {
        preferred_camera: "cam-1".to_string(),
        is_mirrored: true,
    });
    let constraints = selection.select_ratio(AspectRatio::Widescreen).unwrap();

    assert!((constraints.video.aspect_ratio - 1.7777777778).abs() < 1e-9);
    assert_eq!(constraints.video.device.device_id(), Some("cam-1"));
    assert!(constraints.to_json().contains("\"deviceId\":\"cam-1\""));
}

#[test]
fn test_pip_follows_mirror_flag_and_alternates() {
    let mut selection = Selection::from_preferences(&Preferences::default());
    let mut pip = PipController::new(true);

    let action = pip.toggle(selection.is_mirrored());
    assert_eq!(action, tiny_mirror::pip::PipAction::Enter(VideoSurface::Mirrored));
    pip.entered(VideoSurface::Mirrored);

    assert_eq!(pip.toggle(selection.is_mirrored()), tiny_mirror::pip::PipAction::Exit);
    pip.exited();

    selection.set_mirrored(false);
    assert_eq!(
        pip.toggle(selection.is_mirrored()),
        tiny_mirror::pip::PipAction::Enter(VideoSurface::Primary)
    );
}
