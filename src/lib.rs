//! Real-time camera preview pipeline with switchable edge-detection
//! rendering.
//!
//! A capture controller streams camera frames into a single-slot,
//! latest-wins hand-off surface; a continuously running render loop pulls
//! the newest frame and hands it to an opaque processing engine that draws
//! it either raw or edge-detected. Orientation correction, mode toggling,
//! and FPS reporting cross thread boundaries through atomic single-value
//! channels — there are no queues anywhere in the pipeline.

pub mod camera;
pub mod metrics;
pub mod orientation;
pub mod pipeline;
pub mod render;
pub mod viewer;
