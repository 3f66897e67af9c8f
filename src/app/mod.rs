// SPDX-License-Identifier: GPL-3.0-only

//! Main application module for Tiny Mirror
//!
//! # Architecture
//!
//! - `state`: `AppModel` and `Message`
//! - `handlers`: message handlers grouped by domain
//! - `update`: message dispatch
//! - `view`: main window and Picture-in-Picture window

mod handlers;
mod state;
mod update;
mod view;

use crate::backends::camera::StreamManager;
use crate::backends::camera::devices::selector_options;
use crate::config::{self, Preferences};
use crate::constants::{app_info, aspect_ratio_labels, mirror};
use crate::pip::{PipController, VideoSurface};
use crate::selection::Selection;
use cosmic::iced::{Subscription, window};
use cosmic::{ApplicationExt, Element, Task};
pub use state::{AppModel, Message, SurfaceImages};
use std::sync::Arc;
use tracing::{error, info};

impl cosmic::Application for AppModel {
    /// The async executor that will be used to run your application's commands.
    type Executor = cosmic::executor::Default;

    /// Data that your application receives to its init method.
    type Flags = ();

    /// Messages which the application and its widgets will emit.
    type Message = Message;

    /// Unique identifier in RDNN (reverse domain name notation) format.
    const APP_ID: &'static str = app_info::APP_ID;

    fn core(&self) -> &cosmic::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut cosmic::Core {
        &mut self.core
    }

    /// Load preferences, then enumerate devices and open the first stream.
    fn init(
        core: cosmic::Core,
        _flags: Self::Flags,
    ) -> (Self, Task<cosmic::Action<Self::Message>>) {
        let store = config::open_store(Self::APP_ID);
        let preferences = Preferences::load(store.as_ref());
        let selection = Selection::from_preferences(&preferences);

        // Required before any GStreamer call
        if let Err(e) = gstreamer::init() {
            error!(error = %e, "Failed to initialize GStreamer");
        }

        let stream_manager = StreamManager::new(crate::backends::camera::get_backend());

        let mut app = AppModel {
            core,
            store,
            preferences,
            selection,
            devices: Vec::new(),
            camera_dropdown_options: selector_options(&[]),
            ratio_dropdown_options: aspect_ratio_labels(),
            stream_manager,
            stream_generation: 0,
            images: SurfaceImages::default(),
            // Stacking is up to the compositor, see constants::pip
            pip: PipController::new(true),
            pip_window: None,
        };
        app.set_header_title(app_info::APP_NAME.to_string());

        info!(
            camera = %app.selection.device_id(),
            mirrored = app.selection.is_mirrored(),
            "Starting with saved preferences"
        );

        let enumerate = app.enumerate_devices_task();
        let acquire = app.acquire_stream(app.selection.constraints());
        (app, Task::batch([enumerate, acquire]))
    }

    fn view(&self) -> Element<'_, Self::Message> {
        self.view()
    }

    fn view_window(&self, id: window::Id) -> Element<'_, Self::Message> {
        self.view_window(id)
    }

    fn on_close_requested(&self, id: window::Id) -> Option<Self::Message> {
        Some(Message::WindowCloseRequested(id))
    }

    /// Forward the frames of the current stream generation.
    ///
    /// The subscription is keyed by generation: a new stream restarts it,
    /// and it takes that stream's outputs exactly once.
    fn subscription(&self) -> Subscription<Self::Message> {
        use cosmic::iced::futures::StreamExt;

        if self.stream_generation == 0 {
            return Subscription::none();
        }

        let manager = self.stream_manager.clone();
        let generation = self.stream_generation;

        Subscription::run_with_id(
            ("camera-frames", generation),
            cosmic::iced::stream::channel(mirror::OUTPUT_QUEUE * 2, move |mut output| async move {
                let Some(outputs) = manager.take_outputs(generation) else {
                    info!(generation, "Stream outputs already taken or replaced");
                    return;
                };
                info!(generation, "Frame subscription started");

                let primary = outputs
                    .primary
                    .map(|frame| Message::Frame(VideoSurface::Primary, Arc::new(frame)));
                let mirrored = outputs
                    .mirrored
                    .map(|frame| Message::Frame(VideoSurface::Mirrored, Arc::new(frame)));
                let mut frames = futures::stream::select(primary, mirrored);

                while let Some(message) = frames.next().await {
                    // Dropping frames is fine for a live preview
                    if let Err(e) = output.try_send(message) {
                        if e.is_disconnected() {
                            break;
                        }
                    }
                }
                info!(generation, "Frame subscription ended");
            }),
        )
    }

    /// Handles messages emitted by the application and its widgets.
    fn update(&mut self, message: Self::Message) -> Task<cosmic::Action<Self::Message>> {
        self.update(message)
    }
}
