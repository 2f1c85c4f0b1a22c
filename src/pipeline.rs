use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::camera::backend::CameraBackend;
use crate::camera::controller::{CaptureController, RetryPolicy};
use crate::camera::types::{CaptureConfig, SessionState};
use crate::metrics::channel::FpsChannel;
use crate::render::driver::RenderDriver;
use crate::render::engine::{ProcessingEngine, ProcessingMode};
use crate::render::renderer::RenderLoop;
use crate::render::surface::FrameSurface;

/// Tunables for assembling a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub capture: CaptureConfig,
    /// Raw display rotation; normalized before orientation resolution.
    pub display_rotation: i32,
    /// Draw cadence of the render loop (vsync stand-in).
    pub refresh_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            display_rotation: 0,
            refresh_interval: Duration::from_millis(16),
            retry: RetryPolicy::default(),
        }
    }
}

/// The assembled frame pipeline: capture controller, hand-off surface,
/// render loop, draw driver, and the FPS channel, wired together.
///
/// Teardown order on `stop` is capture first, then the draw driver, then
/// the render resources; either side can also be torn down independently
/// without crashing the other.
pub struct Pipeline {
    controller: CaptureController,
    render: Arc<RenderLoop>,
    surface: Arc<FrameSurface>,
    driver: RenderDriver,
    fps: Arc<FpsChannel>,
}

impl Pipeline {
    /// Build and start the full pipeline over the given backend and engine.
    pub fn start(
        backend: Arc<dyn CameraBackend>,
        engine: Box<dyn ProcessingEngine>,
        options: PipelineOptions,
    ) -> Self {
        let surface = Arc::new(FrameSurface::new(options.capture.width, options.capture.height));
        let render = Arc::new(RenderLoop::new(Arc::clone(&surface), engine));

        let fps = Arc::new(FpsChannel::new());
        render.set_fps_callback(fps.publisher());

        // Realize the render surface before the camera looks for it
        render.on_surface_created();
        render.on_surface_changed(options.capture.width, options.capture.height);

        let driver = RenderDriver::start(Arc::clone(&render), options.refresh_interval);
        surface.set_frame_listener(driver.frame_listener());

        let mut controller =
            CaptureController::new(backend, Arc::clone(&surface), options.capture.clone())
                .with_retry_policy(options.retry.clone());
        let rotation_sink = {
            let render = Arc::clone(&render);
            Arc::new(move |degrees, mirrored| render.set_rotation(degrees, mirrored))
        };
        controller.open(options.display_rotation, rotation_sink);

        info!(
            "pipeline started at {}x{}",
            options.capture.width, options.capture.height
        );
        Self {
            controller,
            render,
            surface,
            driver,
            fps,
        }
    }

    /// Swap the processing mode used by the next draw.
    pub fn set_processing_mode(&self, mode: ProcessingMode) {
        self.render.set_processing_mode(mode);
    }

    /// The FPS channel fed by the processing engine.
    pub fn fps(&self) -> &Arc<FpsChannel> {
        &self.fps
    }

    /// Current capture session state.
    pub fn session_state(&self) -> SessionState {
        self.controller.state()
    }

    /// Frames the camera has pushed so far.
    pub fn frame_sequence(&self) -> u64 {
        self.surface.sequence()
    }

    /// Tear the pipeline down: capture, draw driver, render resources.
    /// Idempotent.
    pub fn stop(&mut self) {
        self.controller.close();
        self.driver.stop();
        self.render.release();
        info!("pipeline stopped");
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
