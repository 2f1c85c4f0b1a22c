use crate::camera::error::Result;
use crate::camera::types::{CameraDevice, CaptureConfig, DeviceId};
use crate::render::surface::FrameSurface;
use std::sync::Arc;

/// Asynchronous device state notification, delivered on the backend's own
/// context.
pub enum DeviceEvent {
    /// The device finished opening; the handle is transferred to the caller.
    Opened(Box<dyn CaptureDevice>),
    /// The device went away; the caller must release its resources.
    Disconnected,
    /// The device failed; the caller must release its resources.
    Error(String),
}

/// Callback receiving [`DeviceEvent`]s for one open request.
pub type DeviceEventCallback = Box<dyn FnMut(DeviceEvent) + Send>;

/// Platform-agnostic camera backend trait.
///
/// Provides device enumeration and asynchronous device open. Opening never
/// blocks: the handle arrives later through [`DeviceEvent::Opened`], and the
/// same callback later carries disconnect and error notifications.
pub trait CameraBackend: Send + Sync {
    /// Enumerate all currently connected capture devices.
    fn enumerate_devices(&self) -> Result<Vec<CameraDevice>>;

    /// Begin opening a device. The callback fires on the backend's internal
    /// thread, first with `Opened`, later with `Disconnected` or `Error`.
    fn open_device(&self, id: &DeviceId, events: DeviceEventCallback) -> Result<()>;
}

/// An opened capture device, owned exclusively by the capture controller.
pub trait CaptureDevice: Send {
    /// The device this handle belongs to.
    fn id(&self) -> &DeviceId;

    /// Start a repeating capture request writing into the target surface at
    /// the configured resolution. Frames keep flowing until
    /// [`stop_capture`](CaptureDevice::stop_capture) or
    /// [`close`](CaptureDevice::close).
    fn start_capture(&mut self, config: &CaptureConfig, target: Arc<FrameSurface>) -> Result<()>;

    /// Stop the repeating capture request. Safe to call when none is active.
    fn stop_capture(&mut self);

    /// Release the device handle. The handle is unusable afterwards.
    fn close(&mut self);
}
