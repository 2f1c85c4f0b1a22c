use crate::metrics::channel::FpsCallback;
use crate::metrics::stats::FpsCounter;
use std::time::Duration;
use tracing::trace;

/// Selects between raw pass-through and edge-detection rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Draw the camera frame untouched.
    Raw,
    /// Draw the edge-detected transform of the frame.
    EdgeDetect,
}

/// Opaque native processing component.
///
/// The engine owns the actual GPU drawing: it receives the texture the
/// camera frames land in, draws either the raw or the edge-detected image
/// straight to the visible output surface, and reports an integer frame
/// rate through the registered callback on its own cadence. The pixel-level
/// algorithm never crosses this boundary.
///
/// All methods are invoked from the render context only, except
/// [`process_frame`](ProcessingEngine::process_frame) which is a standalone
/// byte-buffer entry point unused by the steady-state pipeline.
pub trait ProcessingEngine: Send {
    /// The output texture was created; the engine binds its drawing to it.
    fn on_surface_created(&mut self, texture_id: u32);

    /// The output viewport changed size.
    fn on_surface_changed(&mut self, width: u32, height: u32);

    /// Draw the latest frame in the given mode to the output surface.
    fn on_draw_frame(&mut self, mode: ProcessingMode);

    /// Update the rotation/mirroring transform used by subsequent draws.
    fn set_rotation(&mut self, degrees: u32, mirrored: bool);

    /// Register the FPS reporting callback.
    fn set_fps_callback(&mut self, callback: FpsCallback);

    /// Process a raw pixel buffer in place, returning the processing time.
    /// Not part of the steady-state pipeline.
    fn process_frame(&mut self, _data: &mut [u8], _width: u32, _height: u32) -> Duration {
        Duration::ZERO
    }

    /// Release the engine's resources. Called at most once.
    fn release(&mut self);
}

/// A processing engine without a GPU: draws nothing but keeps the exact
/// FPS-reporting contract of the native engine.
///
/// Used by the demo binary and by tests that exercise the pipeline without
/// real rendering hardware.
pub struct DummyEngine {
    counter: FpsCounter,
    fps_callback: Option<FpsCallback>,
    texture: u32,
    viewport: (u32, u32),
    rotation: (u32, bool),
    released: bool,
}

impl DummyEngine {
    /// Create an engine reporting FPS once per second.
    pub fn new() -> Self {
        Self::with_report_interval(crate::metrics::stats::REPORT_INTERVAL)
    }

    /// Create an engine with a custom FPS reporting interval.
    pub fn with_report_interval(interval: Duration) -> Self {
        Self {
            counter: FpsCounter::with_interval(interval),
            fps_callback: None,
            texture: 0,
            viewport: (0, 0),
            rotation: (0, false),
            released: false,
        }
    }

    /// The texture handle the engine was bound to.
    pub fn texture(&self) -> u32 {
        self.texture
    }

    /// The current output viewport.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// The current rotation transform.
    pub fn rotation(&self) -> (u32, bool) {
        self.rotation
    }
}

impl Default for DummyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingEngine for DummyEngine {
    fn on_surface_created(&mut self, texture_id: u32) {
        trace!("dummy engine bound to texture {texture_id}");
        self.texture = texture_id;
    }

    fn on_surface_changed(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn on_draw_frame(&mut self, _mode: ProcessingMode) {
        if self.released {
            return;
        }
        if let Some(fps) = self.counter.tick() {
            if let Some(callback) = &self.fps_callback {
                callback(fps);
            }
        }
    }

    fn set_rotation(&mut self, degrees: u32, mirrored: bool) {
        self.rotation = (degrees, mirrored);
    }

    fn set_fps_callback(&mut self, callback: FpsCallback) {
        self.fps_callback = Some(callback);
    }

    fn release(&mut self) {
        self.released = true;
        self.fps_callback = None;
    }
}
