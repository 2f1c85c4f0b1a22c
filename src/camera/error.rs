use thiserror::Error;

/// Capture subsystem errors.
///
/// None of these are fatal to the host: every failure degrades to
/// "pipeline not running" and the controller awaits a new open call.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("no capture device available")]
    DeviceUnavailable,

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("device enumeration failed: {0}")]
    Enumeration(String),

    #[error("capture configuration rejected: {0}")]
    Configuration(String),

    #[error("capture request submission failed: {0}")]
    RequestSubmission(String),

    #[error("device disconnected: {0}")]
    Disconnected(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CameraError>;
