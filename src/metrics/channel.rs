use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Callback through which the processing engine reports its periodic FPS.
pub type FpsCallback = Arc<dyn Fn(u32) + Send + Sync>;

/// Lock-free single-value channel carrying FPS updates from the render
/// context to a UI-observing context.
///
/// Fire-and-forget, last-value-wins: publishing never blocks, and an update
/// that is overwritten before the observer reads it is simply lost. There is
/// no queue and no backpressure in either direction.
pub struct FpsChannel {
    fps: AtomicU32,
    updated: AtomicBool,
}

impl FpsChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self {
            fps: AtomicU32::new(0),
            updated: AtomicBool::new(false),
        }
    }

    /// Publish a new FPS value, overwriting any unread one.
    pub fn publish(&self, fps: u32) {
        self.fps.store(fps, Ordering::Release);
        self.updated.store(true, Ordering::Release);
    }

    /// Take the pending update if one arrived since the last take.
    pub fn take_update(&self) -> Option<u32> {
        if !self.updated.swap(false, Ordering::AcqRel) {
            return None;
        }
        Some(self.fps.load(Ordering::Acquire))
    }

    /// The most recently published value, whether or not it was taken.
    pub fn latest(&self) -> u32 {
        self.fps.load(Ordering::Acquire)
    }

    /// A callback handle that publishes into this channel — the shape the
    /// processing engine expects for its FPS reporting.
    pub fn publisher(self: &Arc<Self>) -> FpsCallback {
        let channel = Arc::clone(self);
        Arc::new(move |fps| channel.publish(fps))
    }
}

impl Default for FpsChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_channel_has_no_update() {
        let channel = FpsChannel::new();
        assert!(channel.take_update().is_none());
        assert_eq!(channel.latest(), 0);
    }

    #[test]
    fn publish_then_take_delivers_once() {
        let channel = FpsChannel::new();
        channel.publish(30);
        assert_eq!(channel.take_update(), Some(30));
        assert!(channel.take_update().is_none());
        assert_eq!(channel.latest(), 30);
    }

    #[test]
    fn later_publish_overwrites_unread_value() {
        let channel = FpsChannel::new();
        channel.publish(30);
        channel.publish(15);
        assert_eq!(channel.take_update(), Some(15));
    }

    #[test]
    fn publisher_callback_feeds_channel() {
        let channel = Arc::new(FpsChannel::new());
        let publisher = channel.publisher();
        publisher(24);
        assert_eq!(channel.take_update(), Some(24));
    }

    #[test]
    fn channel_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FpsChannel>();
    }
}
