use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

use crate::render::renderer::RenderLoop;
use crate::render::surface::FrameListener;

/// Continuous draw driver — the vsync stand-in.
///
/// Ticks the render loop at a fixed refresh interval regardless of frame
/// arrival, so a stalled camera still yields redraws of the last frame.
/// The frame-available listener only shortens the wait; it is never a
/// correctness dependency.
pub struct RenderDriver {
    shutdown: Arc<AtomicBool>,
    wake: Arc<(Mutex<bool>, Condvar)>,
    thread: Option<JoinHandle<()>>,
}

impl RenderDriver {
    /// Spawn the draw thread over the given render loop.
    pub fn start(render: Arc<RenderLoop>, refresh_interval: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let wake: Arc<(Mutex<bool>, Condvar)> = Arc::new((Mutex::new(false), Condvar::new()));

        let thread = {
            let shutdown = Arc::clone(&shutdown);
            let wake = Arc::clone(&wake);
            std::thread::Builder::new()
                .name("render-loop".to_string())
                .spawn(move || {
                    debug!("render loop thread starting");
                    loop {
                        if shutdown.load(Ordering::Relaxed) {
                            break;
                        }
                        render.on_draw_frame();
                        let (lock, condvar) = &*wake;
                        let mut signaled = lock.lock();
                        if !*signaled {
                            condvar.wait_for(&mut signaled, refresh_interval);
                        }
                        *signaled = false;
                    }
                    debug!("render loop thread exiting");
                })
                .expect("failed to spawn render loop thread")
        };

        Self {
            shutdown,
            wake,
            thread: Some(thread),
        }
    }

    /// A frame-available listener that wakes the draw thread early.
    pub fn frame_listener(&self) -> FrameListener {
        let wake = Arc::clone(&self.wake);
        Arc::new(move || {
            let (lock, condvar) = &*wake;
            *lock.lock() = true;
            condvar.notify_one();
        })
    }

    /// Stop the draw thread. Idempotent — calling stop twice does not panic.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let (lock, condvar) = &*self.wake;
        *lock.lock() = true;
        condvar.notify_one();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RenderDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
