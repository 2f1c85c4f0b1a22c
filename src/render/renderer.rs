use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::metrics::channel::FpsCallback;
use crate::render::engine::{ProcessingEngine, ProcessingMode};
use crate::render::surface::FrameSurface;

/// Render loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RenderPhase {
    Uninitialized = 0,
    SurfaceCreated = 1,
    Running = 2,
    Released = 3,
}

impl RenderPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::SurfaceCreated,
            2 => Self::Running,
            3 => Self::Released,
            _ => Self::Uninitialized,
        }
    }
}

// Rotation packed into one atomic: degrees in the low 9 bits, mirror above.
const MIRROR_BIT: u32 = 1 << 9;
const DEGREES_MASK: u32 = MIRROR_BIT - 1;

// Stand-in for glGenTextures; the engine owns the actual GPU object.
static NEXT_TEXTURE_ID: AtomicU32 = AtomicU32::new(1);

fn alloc_texture_id() -> u32 {
    NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Consumer side of the frame pipeline.
///
/// Pulls the latest frame from the hand-off surface and asks the processing
/// engine to draw it with the current mode and rotation transform. Mode and
/// rotation are plain atomics so any thread can update them without
/// blocking; they take effect on the next draw. Draws and release share the
/// engine mutex, so a release can never interleave with an in-flight draw.
pub struct RenderLoop {
    surface: Arc<FrameSurface>,
    engine: Mutex<Option<Box<dyn ProcessingEngine>>>,
    phase: AtomicU8,
    /// Owned GPU texture handle; 0 after release.
    texture: AtomicU32,
    edge_detect: AtomicBool,
    rotation: AtomicU32,
    rotation_dirty: AtomicBool,
}

impl RenderLoop {
    /// Create a render loop over the given hand-off surface and engine.
    /// Edge detection starts enabled, matching the host's default mode.
    pub fn new(surface: Arc<FrameSurface>, engine: Box<dyn ProcessingEngine>) -> Self {
        Self {
            surface,
            engine: Mutex::new(Some(engine)),
            phase: AtomicU8::new(RenderPhase::Uninitialized as u8),
            texture: AtomicU32::new(0),
            edge_detect: AtomicBool::new(true),
            rotation: AtomicU32::new(0),
            rotation_dirty: AtomicBool::new(false),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RenderPhase {
        RenderPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    fn set_phase(&self, phase: RenderPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// The output surface was created: allocate the GPU texture, bind the
    /// hand-off surface to it, and initialize the engine.
    pub fn on_surface_created(&self) {
        let mut guard = self.engine.lock();
        let Some(engine) = guard.as_mut() else {
            return;
        };
        if self.phase() != RenderPhase::Uninitialized {
            warn!("surface created in phase {:?}, ignoring", self.phase());
            return;
        }
        let texture = alloc_texture_id();
        self.texture.store(texture, Ordering::Release);
        self.surface.bind_texture(texture);
        engine.on_surface_created(texture);
        self.set_phase(RenderPhase::SurfaceCreated);
    }

    /// The output viewport changed size.
    pub fn on_surface_changed(&self, width: u32, height: u32) {
        let mut guard = self.engine.lock();
        let Some(engine) = guard.as_mut() else {
            return;
        };
        engine.on_surface_changed(width, height);
        if self.phase() == RenderPhase::SurfaceCreated {
            self.set_phase(RenderPhase::Running);
        }
    }

    /// Draw one frame: pull the latest camera frame if one is pending (the
    /// previous frame is redrawn otherwise), apply any rotation update, and
    /// invoke the engine with the mode in effect when the draw started.
    pub fn on_draw_frame(&self) {
        let mut guard = self.engine.lock();
        let Some(engine) = guard.as_mut() else {
            return;
        };
        if !matches!(self.phase(), RenderPhase::SurfaceCreated | RenderPhase::Running) {
            return;
        }
        // Mode is sampled once here; a toggle during the draw waits for the next one
        let mode = if self.edge_detect.load(Ordering::Acquire) {
            ProcessingMode::EdgeDetect
        } else {
            ProcessingMode::Raw
        };
        // Latest image lands in the bound texture; None means redraw previous
        let _frame = self.surface.acquire_latest();
        if self.rotation_dirty.swap(false, Ordering::AcqRel) {
            let packed = self.rotation.load(Ordering::Acquire);
            engine.set_rotation(packed & DEGREES_MASK, packed & MIRROR_BIT != 0);
        }
        engine.on_draw_frame(mode);
    }

    /// Swap the processing mode consulted by the next draw. Callable from
    /// any thread; never blocks.
    pub fn set_processing_mode(&self, mode: ProcessingMode) {
        self.edge_detect
            .store(mode == ProcessingMode::EdgeDetect, Ordering::Release);
    }

    /// Update the rotation transform consulted by the next draw. Callable
    /// from any thread; never blocks.
    pub fn set_rotation(&self, degrees: u32, mirrored: bool) {
        let packed = (degrees % 360) | if mirrored { MIRROR_BIT } else { 0 };
        self.rotation.store(packed, Ordering::Release);
        self.rotation_dirty.store(true, Ordering::Release);
    }

    /// Register the FPS callback on the engine.
    pub fn set_fps_callback(&self, callback: FpsCallback) {
        if let Some(engine) = self.engine.lock().as_mut() {
            engine.set_fps_callback(callback);
        }
    }

    /// Release the GPU texture, the hand-off surface, and the engine handle,
    /// in that order. Holds the engine mutex, so it mutually excludes any
    /// in-flight draw. Idempotent.
    pub fn release(&self) {
        let mut guard = self.engine.lock();
        if self.phase() == RenderPhase::Released {
            debug!("render loop already released");
            return;
        }
        self.set_phase(RenderPhase::Released);
        self.texture.store(0, Ordering::Release);
        self.surface.release();
        if let Some(mut engine) = guard.take() {
            engine.release();
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.release();
    }
}
