use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::camera::backend::{CameraBackend, CaptureDevice, DeviceEvent};
use crate::camera::types::{CaptureConfig, SessionState};
use crate::orientation;
use crate::render::surface::FrameSurface;

/// Receives the resolved rotation transform when a device is selected.
pub type OrientationCallback = Arc<dyn Fn(u32, bool) + Send + Sync>;

/// Retry policy for opens that arrive before the target surface is
/// realized. The surface becomes ready asynchronously and there is no
/// synchronous readiness signal, so the open is re-attempted on a short
/// delay — with a ceiling, so a surface that never materializes cannot
/// retry forever.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            max_attempts: 50,
        }
    }
}

enum Event {
    Open {
        display_rotation: i32,
        on_orientation: OrientationCallback,
        attempt: u32,
    },
    Device(DeviceEvent),
    Close,
}

/// Owns the camera device handle and the background capture context.
///
/// `open` starts a dedicated worker thread whose FIFO event loop performs
/// device selection, orientation resolution, the asynchronous device open,
/// and capture configuration. `close` drains it and joins the thread. All
/// capture failures are logged and leave the controller closed; none
/// propagate.
pub struct CaptureController {
    backend: Arc<dyn CameraBackend>,
    surface: Arc<FrameSurface>,
    config: CaptureConfig,
    retry: RetryPolicy,
    state: Arc<AtomicU8>,
    worker: Option<Worker>,
}

struct Worker {
    tx: Sender<Event>,
    handle: JoinHandle<()>,
}

impl CaptureController {
    /// Create a controller targeting the given hand-off surface.
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        surface: Arc<FrameSurface>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            backend,
            surface,
            config,
            retry: RetryPolicy::default(),
            state: Arc::new(AtomicU8::new(SessionState::Idle as u8)),
            worker: None,
        }
    }

    /// Override the surface-not-ready retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Open the first available capture device and start a repeating
    /// capture into the target surface.
    ///
    /// Resolves the rotation transform for the selected device and pushes
    /// it through `on_orientation` before the device open begins. If the
    /// surface is not yet realized the open defers and retries per the
    /// retry policy. Ignored while a previous open is still in effect; a
    /// session that ended in failure can be reopened directly, no `close`
    /// required.
    pub fn open(&mut self, display_rotation: i32, on_orientation: OrientationCallback) {
        if let Some(worker) = &self.worker {
            if self.state() != SessionState::Closed {
                debug!("open ignored: capture session already in progress");
                return;
            }
            // The worker outlives a failed session; feed it a fresh open
            self.state
                .store(SessionState::Idle as u8, Ordering::Release);
            let _ = worker.tx.send(Event::Open {
                display_rotation,
                on_orientation,
                attempt: 0,
            });
            return;
        }
        self.state
            .store(SessionState::Idle as u8, Ordering::Release);

        let (tx, rx) = mpsc::channel();
        let handle = {
            let backend = Arc::clone(&self.backend);
            let surface = Arc::clone(&self.surface);
            let config = self.config.clone();
            let retry = self.retry.clone();
            let state = Arc::clone(&self.state);
            let tx = tx.clone();
            std::thread::Builder::new()
                .name("camera-background".to_string())
                .spawn(move || run_worker(rx, tx, backend, surface, config, retry, state))
                .expect("failed to spawn camera background thread")
        };
        let _ = tx.send(Event::Open {
            display_rotation,
            on_orientation,
            attempt: 0,
        });
        self.worker = Some(Worker { tx, handle });
    }

    /// Stop any active capture, close the device, and join the background
    /// worker. Idempotent, and safe to call before an `open` completed.
    pub fn close(&mut self) {
        let Some(worker) = self.worker.take() else {
            self.state
                .store(SessionState::Closed as u8, Ordering::Release);
            return;
        };
        let _ = worker.tx.send(Event::Close);
        let _ = worker.handle.join();
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_worker(
    rx: Receiver<Event>,
    tx: Sender<Event>,
    backend: Arc<dyn CameraBackend>,
    surface: Arc<FrameSurface>,
    config: CaptureConfig,
    retry: RetryPolicy,
    state: Arc<AtomicU8>,
) {
    let set_state = |s: SessionState| state.store(s as u8, Ordering::Release);
    let current = |state: &AtomicU8| SessionState::from_u8(state.load(Ordering::Acquire));
    let mut device: Option<Box<dyn CaptureDevice>> = None;

    for event in rx.iter() {
        match event {
            Event::Open { .. } if device.is_some() => {
                debug!("open ignored: device already active");
            }
            Event::Open {
                display_rotation,
                on_orientation,
                attempt,
            } => {
                if !surface.is_ready() {
                    if attempt >= retry.max_attempts {
                        warn!(
                            "target surface never became ready, giving up after {attempt} attempts"
                        );
                        set_state(SessionState::Closed);
                        continue;
                    }
                    debug!("target surface not ready, retrying open (attempt {attempt})");
                    schedule_retry(&tx, display_rotation, on_orientation, attempt, retry.delay);
                    continue;
                }

                let descriptor = match backend.enumerate_devices() {
                    Ok(devices) => match devices.into_iter().next() {
                        Some(d) => d,
                        None => {
                            warn!("no capture device available");
                            set_state(SessionState::Closed);
                            continue;
                        }
                    },
                    Err(e) => {
                        error!("device enumeration failed: {e}");
                        set_state(SessionState::Closed);
                        continue;
                    }
                };

                let transform = orientation::resolve(
                    descriptor.sensor_mount_angle,
                    orientation::normalize_rotation(display_rotation),
                    descriptor.facing.is_front(),
                );
                on_orientation(transform.rotation_degrees, transform.mirrored);

                set_state(SessionState::Opening);
                let events = {
                    let tx = tx.clone();
                    Box::new(move |event: DeviceEvent| {
                        let _ = tx.send(Event::Device(event));
                    })
                };
                if let Err(e) = backend.open_device(&descriptor.id, events) {
                    error!("failed to open device {}: {e}", descriptor.id);
                    set_state(SessionState::Closed);
                }
            }
            Event::Device(DeviceEvent::Opened(mut opened)) => {
                if current(&state) != SessionState::Opening {
                    debug!("late device open in state {:?}, discarding", current(&state));
                    opened.close();
                    continue;
                }
                set_state(SessionState::Configuring);
                match opened.start_capture(&config, Arc::clone(&surface)) {
                    Ok(()) => {
                        info!("repeating capture started on {}", opened.id());
                        set_state(SessionState::Active);
                        device = Some(opened);
                    }
                    Err(e) => {
                        error!("capture configuration failed: {e}");
                        opened.close();
                        set_state(SessionState::Closed);
                    }
                }
            }
            Event::Device(DeviceEvent::Disconnected) => {
                warn!("capture device disconnected");
                if let Some(mut d) = device.take() {
                    d.close();
                }
                set_state(SessionState::Closed);
            }
            Event::Device(DeviceEvent::Error(message)) => {
                error!("capture device error: {message}");
                if let Some(mut d) = device.take() {
                    d.close();
                }
                set_state(SessionState::Closed);
            }
            Event::Close => {
                if let Some(mut d) = device.take() {
                    d.stop_capture();
                    d.close();
                }
                set_state(SessionState::Closed);
                break;
            }
        }
    }
}

/// Re-deliver the open after a short delay, like a posted message.
fn schedule_retry(
    tx: &Sender<Event>,
    display_rotation: i32,
    on_orientation: OrientationCallback,
    attempt: u32,
    delay: Duration,
) {
    let tx = tx.clone();
    std::thread::Builder::new()
        .name("camera-open-retry".to_string())
        .spawn(move || {
            std::thread::sleep(delay);
            // Send fails harmlessly if the controller closed in the meantime
            let _ = tx.send(Event::Open {
                display_rotation,
                on_orientation,
                attempt: attempt + 1,
            });
        })
        .expect("failed to spawn open retry thread");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::dummy::DummyBackend;
    use crate::camera::error::{CameraError, Result};
    use crate::camera::types::CameraDevice;
    use parking_lot::Mutex;
    use std::time::Instant;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            delay: Duration::from_millis(5),
            max_attempts: 5,
        }
    }

    fn fast_backend() -> Arc<DummyBackend> {
        Arc::new(DummyBackend::with_timing(
            Duration::from_millis(1),
            Duration::from_millis(2),
        ))
    }

    fn ready_surface() -> Arc<FrameSurface> {
        let surface = Arc::new(FrameSurface::new(8, 8));
        surface.bind_texture(1);
        surface
    }

    fn small_config() -> CaptureConfig {
        CaptureConfig {
            width: 8,
            height: 8,
            ..CaptureConfig::default()
        }
    }

    fn no_orientation() -> OrientationCallback {
        Arc::new(|_, _| {})
    }

    /// Poll until the controller reaches the wanted state or time runs out.
    fn wait_for_state(controller: &CaptureController, wanted: SessionState) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if controller.state() == wanted {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn open_reaches_active_and_frames_flow() {
        let surface = ready_surface();
        let mut controller =
            CaptureController::new(fast_backend(), Arc::clone(&surface), small_config());
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Active));
        let deadline = Instant::now() + Duration::from_secs(2);
        while surface.sequence() < 10 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(surface.sequence() >= 10, "expected frames to flow");
        controller.close();
        assert_eq!(controller.state(), SessionState::Closed);
    }

    #[test]
    fn orientation_is_resolved_and_pushed_before_open() {
        let surface = ready_surface();
        let mut controller =
            CaptureController::new(fast_backend(), Arc::clone(&surface), small_config());
        let seen: Arc<Mutex<Option<(u32, bool)>>> = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        controller.open(
            0,
            Arc::new(move |degrees, mirrored| {
                *seen_clone.lock() = Some((degrees, mirrored));
            }),
        );
        assert!(wait_for_state(&controller, SessionState::Active));
        // Dummy camera: back facing, mount 90, display 0 -> 90 unmirrored
        assert_eq!(*seen.lock(), Some((90, false)));
        controller.close();
    }

    #[test]
    fn display_rotation_is_normalized_before_resolving() {
        let surface = ready_surface();
        let mut controller =
            CaptureController::new(fast_backend(), Arc::clone(&surface), small_config());
        let seen: Arc<Mutex<Option<(u32, bool)>>> = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        // 85 snaps to 90: back camera (90 - 90 + 360) % 360 = 0
        controller.open(
            85,
            Arc::new(move |degrees, mirrored| {
                *seen_clone.lock() = Some((degrees, mirrored));
            }),
        );
        assert!(wait_for_state(&controller, SessionState::Active));
        assert_eq!(*seen.lock(), Some((0, false)));
        controller.close();
    }

    #[test]
    fn close_before_open_completes_leaves_closed() {
        let backend = Arc::new(DummyBackend::with_timing(
            Duration::from_millis(200),
            Duration::from_millis(2),
        ));
        let mut controller = CaptureController::new(backend, ready_surface(), small_config());
        controller.open(0, no_orientation());
        controller.close();
        assert_eq!(controller.state(), SessionState::Closed);
    }

    #[test]
    fn close_without_open_is_safe() {
        let mut controller = CaptureController::new(fast_backend(), ready_surface(), small_config());
        controller.close();
        controller.close();
        assert_eq!(controller.state(), SessionState::Closed);
    }

    #[test]
    fn open_defers_until_surface_becomes_ready() {
        let surface = Arc::new(FrameSurface::new(8, 8));
        let mut controller =
            CaptureController::new(fast_backend(), Arc::clone(&surface), small_config())
                .with_retry_policy(RetryPolicy {
                    delay: Duration::from_millis(5),
                    max_attempts: 100,
                });
        controller.open(0, no_orientation());
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(controller.state(), SessionState::Idle, "must defer, not fail");
        surface.bind_texture(1);
        assert!(wait_for_state(&controller, SessionState::Active));
        controller.close();
    }

    #[test]
    fn open_gives_up_after_retry_ceiling() {
        let surface = Arc::new(FrameSurface::new(8, 8));
        let mut controller = CaptureController::new(fast_backend(), surface, small_config())
            .with_retry_policy(fast_retry());
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Closed));
        controller.close();
    }

    #[test]
    fn reopen_after_close_works() {
        let surface = ready_surface();
        let mut controller =
            CaptureController::new(fast_backend(), Arc::clone(&surface), small_config());
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Active));
        controller.close();
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Active));
        controller.close();
    }

    #[test]
    fn device_disconnect_transitions_to_closed() {
        let backend = fast_backend();
        let surface = ready_surface();
        let mut controller =
            CaptureController::new(Arc::clone(&backend) as Arc<dyn CameraBackend>, surface, small_config());
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Active));
        backend.simulate_disconnect();
        assert!(wait_for_state(&controller, SessionState::Closed));
        controller.close();
    }

    #[test]
    fn device_error_transitions_to_closed() {
        let backend = fast_backend();
        let surface = ready_surface();
        let mut controller =
            CaptureController::new(Arc::clone(&backend) as Arc<dyn CameraBackend>, surface, small_config());
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Active));
        backend.simulate_error("sensor fault");
        assert!(wait_for_state(&controller, SessionState::Closed));
        controller.close();
    }

    #[test]
    fn open_after_device_error_recovers_without_close() {
        let backend = fast_backend();
        let surface = ready_surface();
        let mut controller = CaptureController::new(
            Arc::clone(&backend) as Arc<dyn CameraBackend>,
            Arc::clone(&surface),
            small_config(),
        );
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Active));
        backend.simulate_error("sensor fault");
        assert!(wait_for_state(&controller, SessionState::Closed));
        // A failed session must accept a new open directly
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Active));
        let resumed_from = surface.sequence();
        let deadline = Instant::now() + Duration::from_secs(2);
        while surface.sequence() <= resumed_from && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(surface.sequence() > resumed_from, "frames flow after reopen");
        controller.close();
    }

    #[test]
    fn open_after_disconnect_recovers_without_close() {
        let backend = fast_backend();
        let mut controller = CaptureController::new(
            Arc::clone(&backend) as Arc<dyn CameraBackend>,
            ready_surface(),
            small_config(),
        );
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Active));
        backend.simulate_disconnect();
        assert!(wait_for_state(&controller, SessionState::Closed));
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Active));
        controller.close();
    }

    #[test]
    fn open_after_retry_ceiling_recovers_once_surface_is_ready() {
        let surface = Arc::new(FrameSurface::new(8, 8));
        let mut controller =
            CaptureController::new(fast_backend(), Arc::clone(&surface), small_config())
                .with_retry_policy(fast_retry());
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Closed));
        surface.bind_texture(1);
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Active));
        controller.close();
    }

    #[test]
    fn open_while_session_active_is_ignored() {
        let surface = ready_surface();
        let mut controller =
            CaptureController::new(fast_backend(), Arc::clone(&surface), small_config());
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Active));
        let called = Arc::new(Mutex::new(false));
        let called_clone = Arc::clone(&called);
        controller.open(
            0,
            Arc::new(move |_, _| {
                *called_clone.lock() = true;
            }),
        );
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(controller.state(), SessionState::Active);
        assert!(!*called.lock(), "second open must not re-resolve orientation");
        controller.close();
    }

    /// Backend that never finds a device.
    struct EmptyBackend;

    impl CameraBackend for EmptyBackend {
        fn enumerate_devices(&self) -> Result<Vec<CameraDevice>> {
            Ok(vec![])
        }

        fn open_device(
            &self,
            id: &crate::camera::types::DeviceId,
            _events: crate::camera::backend::DeviceEventCallback,
        ) -> Result<()> {
            Err(CameraError::DeviceNotFound(id.to_string()))
        }
    }

    #[test]
    fn no_device_available_leaves_controller_closed() {
        let mut controller =
            CaptureController::new(Arc::new(EmptyBackend), ready_surface(), small_config());
        controller.open(0, no_orientation());
        assert!(wait_for_state(&controller, SessionState::Closed));
        controller.close();
    }
}
