// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the mirror application
//!
//! None of these ever reach the user as text: acquisition failures are
//! logged and swallowed, and an unsupported Picture-in-Picture request is a
//! no-op. They exist so the layers in between can propagate with `?`.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Picture-in-Picture errors
    Pip(PipError),
    /// Preference storage errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Access to the camera was refused
    PermissionDenied,
    /// Camera is busy or in use
    Busy,
    /// No device matches the requested constraints
    ConstraintUnsatisfiable(String),
    /// Camera initialization failed
    InitializationFailed(String),
    /// Backend error (e.g., PipeWire)
    BackendError(String),
}

/// Picture-in-Picture errors
#[derive(Debug, Clone)]
pub enum PipError {
    /// The platform cannot show a floating overlay
    Unsupported,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Pip(e) => write!(f, "Picture-in-Picture error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(f, "Camera access denied"),
            CameraError::Busy => write!(f, "Camera is busy"),
            CameraError::ConstraintUnsatisfiable(msg) => {
                write!(f, "Constraints cannot be satisfied: {}", msg)
            }
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CameraError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for PipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipError::Unsupported => write!(f, "Picture-in-Picture is not available"),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PipError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PipError> for AppError {
    fn from(err: PipError) -> Self {
        AppError::Pip(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_error_wraps_into_app_error() {
        let err: AppError = CameraError::Busy.into();
        assert!(matches!(err, AppError::Camera(CameraError::Busy)));
        assert_eq!(err.to_string(), "Camera error: Camera is busy");
    }

    #[test]
    fn test_pip_error_display() {
        let err: AppError = PipError::Unsupported.into();
        assert_eq!(
            err.to_string(),
            "Picture-in-Picture error: Picture-in-Picture is not available"
        );
    }
}
