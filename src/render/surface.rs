use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Callback invoked whenever a new frame lands in the surface.
///
/// A scheduling hint only — consumers that miss it still see the newest
/// frame on their next pull.
pub type FrameListener = Arc<dyn Fn() + Send + Sync>;

/// A single captured frame from the camera.
pub struct Frame {
    /// Raw pixel data (RGBA).
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Capture timestamp in microseconds.
    pub timestamp_us: u64,
}

/// GPU-texture-backed hand-off buffer between capture and render.
///
/// Single-slot with latest-wins semantics: a push unconditionally replaces
/// any unconsumed frame, so there is never a queue or a backlog. Frames are
/// wrapped in `Arc` so the consumer gets a cheap reference-counted pointer
/// instead of cloning multi-megabyte pixel buffers.
///
/// The producer writes on the camera context, the consumer pulls on the
/// render context; the slot mutex plus the pending flag are the only
/// synchronization between them.
pub struct FrameSurface {
    width: u32,
    height: u32,
    slot: Mutex<Option<Arc<Frame>>>,
    /// Set on push, cleared by the consumer's pull.
    pending: AtomicBool,
    /// Monotonic counter incremented on each push — lets observers detect
    /// frame arrival even when frames carry unreliable timestamps.
    sequence: AtomicU64,
    /// GPU texture the consumer bound this surface to; 0 = not yet realized.
    texture: AtomicU32,
    listener: Mutex<Option<FrameListener>>,
    released: AtomicBool,
}

impl FrameSurface {
    /// Create a surface with a fixed target resolution. The resolution does
    /// not change for the life of the session.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            slot: Mutex::new(None),
            pending: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
            texture: AtomicU32::new(0),
            listener: Mutex::new(None),
            released: AtomicBool::new(false),
        }
    }

    /// Target width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Target height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Push a new frame, overwriting any unconsumed one, and raise the
    /// frame-available notification. Pushes after release are dropped.
    pub fn push(&self, frame: Frame) {
        if self.released.load(Ordering::Acquire) {
            trace!("frame dropped: surface already released");
            return;
        }
        *self.slot.lock() = Some(Arc::new(frame));
        self.pending.store(true, Ordering::Release);
        self.sequence.fetch_add(1, Ordering::Relaxed);
        if let Some(listener) = self.listener.lock().as_ref() {
            listener();
        }
    }

    /// Pull the most recently pushed frame if one arrived since the last
    /// pull. Returns `None` when nothing new is pending — the consumer then
    /// redraws whatever it pulled last.
    pub fn acquire_latest(&self) -> Option<Arc<Frame>> {
        if !self.pending.swap(false, Ordering::AcqRel) {
            return None;
        }
        self.slot.lock().clone()
    }

    /// Number of frames pushed over the surface's lifetime.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Bind the surface to a GPU texture handle. The surface counts as
    /// realized once a non-zero texture is bound.
    pub fn bind_texture(&self, texture_id: u32) {
        self.texture.store(texture_id, Ordering::Release);
    }

    /// The bound texture handle, or 0 when unbound.
    pub fn texture(&self) -> u32 {
        self.texture.load(Ordering::Acquire)
    }

    /// Whether the surface has been realized (a texture is bound) and not
    /// yet released.
    pub fn is_ready(&self) -> bool {
        self.texture() != 0 && !self.released.load(Ordering::Acquire)
    }

    /// Register the frame-available listener, replacing any previous one.
    pub fn set_frame_listener(&self, listener: FrameListener) {
        *self.listener.lock() = Some(listener);
    }

    /// Release the underlying buffer. Guarded so a second call is a no-op;
    /// returns whether this call performed the release.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            debug!("surface release skipped: already released");
            return false;
        }
        *self.slot.lock() = None;
        *self.listener.lock() = None;
        self.pending.store(false, Ordering::Release);
        self.texture.store(0, Ordering::Release);
        true
    }
}
