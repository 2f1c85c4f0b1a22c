// Payload shapes for the detached demo viewer. Interface only — nothing
// here is wired to the live pipeline.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, Rgba};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Per-frame statistics displayed alongside the image.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    pub fps: u32,
    /// Formatted as `WIDTHxHEIGHT`.
    pub resolution: String,
    pub processing_time_ms: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl FrameStats {
    /// Build stats for a frame of the given size, stamped now.
    pub fn new(fps: u32, width: u32, height: u32, processing_time_ms: u64) -> Self {
        Self {
            fps,
            resolution: format!("{width}x{height}"),
            processing_time_ms,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        }
    }
}

/// A processed frame plus its stats, as the viewer accepts them.
pub struct ViewerFrame {
    /// JPEG-encoded image.
    pub image: Vec<u8>,
    pub stats: FrameStats,
}

impl ViewerFrame {
    /// Encode raw RGBA pixels into a viewer payload.
    pub fn from_rgba(data: &[u8], width: u32, height: u32, stats: FrameStats) -> Self {
        Self {
            image: compress_jpeg(data, width, height, 85),
            stats,
        }
    }

    /// The image as a `data:` URL, the form the viewer's canvas consumes.
    pub fn to_data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", BASE64.encode(&self.image))
    }
}

/// Compress raw RGBA pixel data to JPEG at the given quality (1-100).
pub fn compress_jpeg(data: &[u8], width: u32, height: u32, quality: u8) -> Vec<u8> {
    let img: ImageBuffer<Rgba<u8>, _> =
        ImageBuffer::from_raw(width, height, data).expect("invalid buffer dimensions");

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)
        .expect("JPEG encoding failed");
    buf
}
