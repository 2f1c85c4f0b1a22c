// Metrics — cross-thread FPS delivery and per-interval frame counting.

pub mod channel;
pub mod stats;
