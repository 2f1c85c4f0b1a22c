use serde::Serialize;
use std::fmt;

/// Stable camera identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a new `DeviceId` from a raw string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the inner string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which way the camera points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Facing {
    Front,
    Back,
}

impl Facing {
    /// Whether this is a front (user-facing, mirrored) camera.
    pub fn is_front(self) -> bool {
        self == Self::Front
    }
}

/// Discovered capture device.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDevice {
    pub id: DeviceId,
    pub name: String,
    /// Fixed physical rotation of the sensor relative to the device's
    /// natural orientation, one of 0/90/180/270.
    pub sensor_mount_angle: u32,
    pub facing: Facing,
}

/// Autofocus mode requested for the repeating capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Autofocus {
    Off,
    ContinuousPicture,
}

/// Configuration of the repeating capture request.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target resolution, fixed for the life of the session.
    pub width: u32,
    pub height: u32,
    pub autofocus: Autofocus,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            autofocus: Autofocus::ContinuousPicture,
        }
    }
}

/// Capture session lifecycle, held as a single atomically-swapped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Opening = 1,
    Configuring = 2,
    Active = 3,
    Closed = 4,
}

impl SessionState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Opening,
            2 => Self::Configuring,
            3 => Self::Active,
            4 => Self::Closed,
            _ => Self::Idle,
        }
    }
}
