use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::camera::backend::{CameraBackend, CaptureDevice, DeviceEvent, DeviceEventCallback};
use crate::camera::error::{CameraError, Result};
use crate::camera::types::{CameraDevice, CaptureConfig, DeviceId, Facing};
use crate::render::surface::{Frame, FrameSurface};

const DUMMY_DEVICE_ID: &str = "dummy:test:camera-001";
const DUMMY_DEVICE_NAME: &str = "Dummy Test Camera";

/// A fake camera backend for running the pipeline without real hardware.
///
/// Enumerates a single back camera mounted at 90 degrees and, once opened,
/// produces synthetic RGBA frames on its own thread at a fixed rate. The
/// open completes asynchronously after a configurable delay, mimicking a
/// real device-open callback.
pub struct DummyBackend {
    open_delay: Duration,
    frame_interval: Duration,
    /// Callback of the most recent open, kept so tests can inject
    /// disconnect and error events.
    events: Mutex<Option<Arc<Mutex<DeviceEventCallback>>>>,
}

impl DummyBackend {
    /// Create a backend producing frames at roughly 30 fps with a short
    /// open delay.
    pub fn new() -> Self {
        Self::with_timing(Duration::from_millis(10), Duration::from_millis(33))
    }

    /// Create a backend with explicit open delay and frame interval.
    pub fn with_timing(open_delay: Duration, frame_interval: Duration) -> Self {
        Self {
            open_delay,
            frame_interval,
            events: Mutex::new(None),
        }
    }

    /// The stable device ID for the dummy camera.
    pub fn device_id() -> DeviceId {
        DeviceId::new(DUMMY_DEVICE_ID)
    }

    /// Deliver a disconnect through the open callback, as a lost device
    /// would.
    pub fn simulate_disconnect(&self) {
        if let Some(events) = self.events.lock().as_ref() {
            (events.lock())(DeviceEvent::Disconnected);
        }
    }

    /// Deliver a device error through the open callback.
    pub fn simulate_error(&self, message: impl Into<String>) {
        if let Some(events) = self.events.lock().as_ref() {
            (events.lock())(DeviceEvent::Error(message.into()));
        }
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for DummyBackend {
    fn enumerate_devices(&self) -> Result<Vec<CameraDevice>> {
        Ok(vec![CameraDevice {
            id: Self::device_id(),
            name: DUMMY_DEVICE_NAME.to_string(),
            sensor_mount_angle: 90,
            facing: Facing::Back,
        }])
    }

    fn open_device(&self, id: &DeviceId, events: DeviceEventCallback) -> Result<()> {
        if id != &Self::device_id() {
            return Err(CameraError::DeviceNotFound(id.to_string()));
        }
        let events = Arc::new(Mutex::new(events));
        *self.events.lock() = Some(Arc::clone(&events));

        let open_delay = self.open_delay;
        let frame_interval = self.frame_interval;
        let device_id = id.clone();
        std::thread::Builder::new()
            .name("dummy-camera-open".to_string())
            .spawn(move || {
                std::thread::sleep(open_delay);
                info!("dummy camera {device_id} opened");
                let device = DummyDevice::new(device_id, frame_interval);
                (events.lock())(DeviceEvent::Opened(Box::new(device)));
            })
            .expect("failed to spawn dummy camera open thread");
        Ok(())
    }
}

/// Opened handle to the dummy camera.
struct DummyDevice {
    id: DeviceId,
    frame_interval: Duration,
    running: Arc<AtomicBool>,
    producer: Option<JoinHandle<()>>,
    closed: bool,
}

impl DummyDevice {
    fn new(id: DeviceId, frame_interval: Duration) -> Self {
        Self {
            id,
            frame_interval,
            running: Arc::new(AtomicBool::new(false)),
            producer: None,
            closed: false,
        }
    }
}

impl CaptureDevice for DummyDevice {
    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn start_capture(&mut self, config: &CaptureConfig, target: Arc<FrameSurface>) -> Result<()> {
        if self.closed {
            return Err(CameraError::Configuration("device is closed".to_string()));
        }
        if self.producer.is_some() {
            return Err(CameraError::RequestSubmission(
                "repeating capture already running".to_string(),
            ));
        }
        debug!(
            "starting dummy capture at {}x{}, af {:?}",
            config.width, config.height, config.autofocus
        );
        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let (width, height) = (config.width, config.height);
        let frame_interval = self.frame_interval;
        let producer = std::thread::Builder::new()
            .name("dummy-capture".to_string())
            .spawn(move || {
                let mut index: u64 = 0;
                while running.load(Ordering::Acquire) {
                    target.push(synthetic_frame(width, height, index));
                    index += 1;
                    std::thread::sleep(frame_interval);
                }
            })
            .expect("failed to spawn dummy capture thread");
        self.producer = Some(producer);
        Ok(())
    }

    fn stop_capture(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.producer.take() {
            let _ = handle.join();
        }
    }

    fn close(&mut self) {
        self.stop_capture();
        self.closed = true;
    }
}

impl Drop for DummyDevice {
    fn drop(&mut self) {
        self.stop_capture();
    }
}

/// A moving RGBA gradient, deterministic in the frame index.
fn synthetic_frame(width: u32, height: u32, index: u64) -> Frame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    let shift = (index % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            data.push((x % 256) as u8);
            data.push((y % 256) as u8);
            data.push(shift);
            data.push(0xFF);
        }
    }
    Frame {
        data,
        width,
        height,
        timestamp_us: epoch_micros(),
    }
}

fn epoch_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
