use std::sync::Arc;
use std::time::Duration;

use edgeview::camera::dummy::DummyBackend;
use edgeview::pipeline::{Pipeline, PipelineOptions};
use edgeview::render::engine::{DummyEngine, ProcessingMode};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Demo: run the pipeline on the simulated camera for a few seconds,
/// toggling the processing mode halfway through.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let backend = Arc::new(DummyBackend::new());
    let engine = Box::new(DummyEngine::new());
    let mut pipeline = Pipeline::start(backend, engine, PipelineOptions::default());

    let mut edge_detect = true;
    for tick in 0..50 {
        std::thread::sleep(Duration::from_millis(100));
        if let Some(fps) = pipeline.fps().take_update() {
            info!("fps: {fps} ({} frames captured)", pipeline.frame_sequence());
        }
        if tick == 25 {
            edge_detect = !edge_detect;
            let mode = if edge_detect {
                ProcessingMode::EdgeDetect
            } else {
                ProcessingMode::Raw
            };
            info!("switching mode to {mode:?}");
            pipeline.set_processing_mode(mode);
        }
    }

    pipeline.stop();
}
