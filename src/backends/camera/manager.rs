// SPDX-License-Identifier: GPL-3.0-only

//! Stream lifecycle manager
//!
//! The manager owns at most one [`CaptureSession`]. Replacing it stops the
//! running session before the new stream is requested, so the camera is
//! never opened twice. Each successful replacement starts a new generation;
//! the display side takes that generation's outputs exactly once.
//!
//! Requests are numbered when they are made, not when they run. A request
//! that reaches the lock after a newer one was applied is dropped, so the
//! newest selection always ends up on the camera.

use super::devices::resolve_device_list;
use super::session::{CaptureSession, SessionOutputs};
use super::types::CameraDevice;
use super::{CameraBackend, StreamConstraints};
use crate::errors::{AppError, AppResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

struct ManagerState {
    session: Option<CaptureSession>,
    /// Outputs of the current session, until someone takes them
    outputs: Option<SessionOutputs>,
    generation: u64,
    /// Ticket of the newest request that reached the camera
    applied: u64,
}

/// Constraints stamped with the order they were asked for in
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub ticket: u64,
    pub constraints: StreamConstraints,
}

/// Stream manager
///
/// Cheap to clone and safe to share across threads; clones drive the same
/// session. Concurrent replacements are serialized and the last one wins.
#[derive(Clone)]
pub struct StreamManager {
    backend: Arc<dyn CameraBackend>,
    state: Arc<Mutex<ManagerState>>,
    tickets: Arc<AtomicU64>,
}

impl StreamManager {
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        info!(backend = backend.name(), "Creating stream manager");
        if !backend.is_available() {
            warn!(backend = backend.name(), "Camera backend not available, streams will fail");
        }
        Self {
            backend,
            state: Arc::new(Mutex::new(ManagerState {
                session: None,
                outputs: None,
                generation: 0,
                applied: 0,
            })),
            tickets: Arc::new(AtomicU64::new(0)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current device list; empty when enumeration is refused
    pub fn enumerate_devices(&self) -> Vec<CameraDevice> {
        resolve_device_list(self.backend.enumerate_devices())
    }

    /// Number a request; call this where the selection changes
    pub fn request(&self, constraints: StreamConstraints) -> StreamRequest {
        StreamRequest {
            ticket: self.tickets.fetch_add(1, Ordering::SeqCst) + 1,
            constraints,
        }
    }

    /// Replace the running stream with one matching `request`
    ///
    /// Returns the new generation, or `None` when a newer request already
    /// ran. On failure the old stream is already gone and nothing replaces
    /// it; the caller is expected to log and move on, there is no retry.
    pub fn apply(&self, request: &StreamRequest) -> AppResult<Option<u64>> {
        let mut state = self.lock();

        if request.ticket < state.applied {
            debug!(
                ticket = request.ticket,
                applied = state.applied,
                "Skipping superseded stream request"
            );
            return Ok(None);
        }
        state.applied = request.ticket;

        state.outputs = None;
        if let Some(mut old) = state.session.take() {
            old.stop();
        }

        let constraints = &request.constraints;
        match CaptureSession::open(self.backend.as_ref(), constraints) {
            Ok((session, outputs)) => {
                state.generation += 1;
                info!(
                    generation = state.generation,
                    ticket = request.ticket,
                    constraints = %constraints.to_json(),
                    "Stream replaced"
                );
                state.session = Some(session);
                state.outputs = Some(outputs);
                Ok(Some(state.generation))
            }
            Err(err) => {
                error!(error = %err, constraints = %constraints.to_json(), "Failed to acquire camera stream");
                Err(err)
            }
        }
    }

    /// Number and apply a request in one go, for single-threaded callers
    pub fn replace(&self, constraints: &StreamConstraints) -> AppResult<u64> {
        self.apply(&self.request(constraints.clone()))?
            .ok_or_else(|| AppError::Other("Stream request superseded".to_string()))
    }

    /// Take the outputs of `generation`, if it is still current
    pub fn take_outputs(&self, generation: u64) -> Option<SessionOutputs> {
        let mut state = self.lock();
        if state.generation != generation {
            return None;
        }
        state.outputs.take()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn is_active(&self) -> bool {
        self.lock()
            .session
            .as_ref()
            .is_some_and(CaptureSession::is_active)
    }

    /// Constraints of the running session
    pub fn current_constraints(&self) -> Option<StreamConstraints> {
        self.lock()
            .session
            .as_ref()
            .map(|s| s.constraints().clone())
    }

    /// Stop the running stream, if any
    pub fn stop(&self) {
        let mut state = self.lock();
        state.outputs = None;
        if let Some(mut session) = state.session.take() {
            session.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::*;
    use crate::backends::camera::CaptureHandle;
    use crate::constants::AspectRatio;
    use crate::errors::{AppError, CameraError};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Records open/stop events in order
    #[derive(Default)]
    struct FakeBackend {
        events: Arc<Mutex<Vec<String>>>,
        fail: AtomicBool,
    }

    struct FakeHandle {
        name: String,
        events: Arc<Mutex<Vec<String>>>,
        // Holding the sender keeps the mirror loop alive
        sender: Option<FrameSender>,
    }

    impl CaptureHandle for FakeHandle {
        fn describe(&self) -> String {
            self.name.clone()
        }

        fn stop(&mut self) -> BackendResult<()> {
            if self.sender.take().is_some() {
                self.events.lock().unwrap().push(format!("stop {}", self.name));
            }
            Ok(())
        }

        fn is_active(&self) -> bool {
            self.sender.is_some()
        }
    }

    impl CameraBackend for FakeBackend {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn enumerate_devices(&self) -> BackendResult<Vec<CameraDevice>> {
            Ok(Vec::new())
        }

        fn get_formats(&self, _device: &CameraDevice) -> Vec<CameraFormat> {
            Vec::new()
        }

        fn open_stream(
            &self,
            constraints: &StreamConstraints,
            sender: FrameSender,
        ) -> BackendResult<Box<dyn CaptureHandle>> {
            let name = constraints
                .video
                .device
                .device_id()
                .unwrap_or("default")
                .to_string();
            self.events.lock().unwrap().push(format!("open {}", name));
            if self.fail.load(Ordering::SeqCst) {
                return Err(BackendError::DeviceBusy(name));
            }
            Ok(Box::new(FakeHandle {
                name,
                events: Arc::clone(&self.events),
                sender: Some(sender),
            }))
        }

        fn supports_frame_callbacks(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_replace_stops_old_stream_first() {
        let backend = Arc::new(FakeBackend::default());
        let events = Arc::clone(&backend.events);
        let manager = StreamManager::new(backend);

        let first = manager
            .replace(&StreamConstraints::for_selection("", AspectRatio::Square))
            .unwrap();
        let second = manager
            .replace(&StreamConstraints::for_selection("cam-2", AspectRatio::Square))
            .unwrap();

        assert_eq!(second, first + 1);
        assert_eq!(
            *events.lock().unwrap(),
            vec!["open default", "stop default", "open cam-2"]
        );
        assert!(manager.is_active());
    }

    #[test]
    fn test_outputs_are_taken_once_per_generation() {
        let manager = StreamManager::new(Arc::new(FakeBackend::default()));
        let generation = manager
            .replace(&StreamConstraints::for_selection("", AspectRatio::Widescreen))
            .unwrap();

        assert!(manager.take_outputs(generation + 1).is_none());
        assert!(manager.take_outputs(generation).is_some());
        assert!(manager.take_outputs(generation).is_none());
    }

    #[test]
    fn test_failed_acquisition_leaves_no_session() {
        let backend = Arc::new(FakeBackend::default());
        let events = Arc::clone(&backend.events);
        backend.fail.store(true, Ordering::SeqCst);
        let manager = StreamManager::new(backend);

        let result = manager.replace(&StreamConstraints::for_selection("cam-1", AspectRatio::Square));
        assert!(matches!(result, Err(AppError::Camera(CameraError::Busy))));
        assert!(!manager.is_active());
        assert!(manager.current_constraints().is_none());
        // One attempt, no retry
        assert_eq!(*events.lock().unwrap(), vec!["open cam-1"]);
    }

    #[test]
    fn test_stop_releases_camera() {
        let backend = Arc::new(FakeBackend::default());
        let events = Arc::clone(&backend.events);
        let manager = StreamManager::new(backend);

        manager
            .replace(&StreamConstraints::for_selection("", AspectRatio::Portrait))
            .unwrap();
        manager.stop();

        assert!(!manager.is_active());
        assert_eq!(
            events.lock().unwrap().last().map(String::as_str),
            Some("stop default")
        );
    }

    #[test]
    fn test_older_request_never_replaces_newer() {
        let backend = Arc::new(FakeBackend::default());
        let events = Arc::clone(&backend.events);
        let manager = StreamManager::new(backend);

        let older = manager.request(StreamConstraints::for_selection("cam-1", AspectRatio::Widescreen));
        let newer = manager.request(StreamConstraints::for_selection("cam-1", AspectRatio::Standard));
        assert!(newer.ticket > older.ticket);

        // The newer request wins the race to the lock
        let worker = manager.clone();
        let first = std::thread::spawn(move || worker.apply(&newer)).join().unwrap();
        let worker = manager.clone();
        let second = std::thread::spawn(move || worker.apply(&older)).join().unwrap();

        let generation = first.unwrap().unwrap();
        assert!(second.unwrap().is_none());
        assert_eq!(manager.generation(), generation);
        assert_eq!(manager.current_constraints().map(|c| c.ratio()), Some(AspectRatio::Standard));
        assert_eq!(*events.lock().unwrap(), vec!["open cam-1"]);
        assert!(manager.take_outputs(generation).is_some());
    }

    #[test]
    fn test_requests_in_order_both_apply() {
        let manager = StreamManager::new(Arc::new(FakeBackend::default()));
        let older = manager.request(StreamConstraints::for_selection("", AspectRatio::Square));
        let newer = manager.request(StreamConstraints::for_selection("", AspectRatio::Portrait));

        let first = manager.apply(&older).unwrap().unwrap();
        let second = manager.apply(&newer).unwrap().unwrap();
        assert_eq!(second, first + 1);
        assert_eq!(manager.current_constraints().map(|c| c.ratio()), Some(AspectRatio::Portrait));
    }
}
