//! Newest-wins preview slot.
//!
//! A single `tokio::sync::watch` value holds the most recent decoded
//! frame. The worker overwrites it; any number of consumers copy it
//! out with [`LatestFrameCache::peek`] from sync or async code, at any
//! cadence. The slot lock is only held long enough to clone an `Arc`,
//! so a reader never stalls the writer on a pixel copy and never sees
//! a half-written frame.

use std::sync::Arc;

use tokio::sync::watch;

use crate::frame::types::DecodedFrame;

type Slot = Option<Arc<DecodedFrame>>;

#[derive(Debug, Clone)]
pub struct LatestFrameCache {
    slot: Arc<watch::Sender<Slot>>,
}

impl LatestFrameCache {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { slot: Arc::new(tx) }
    }

    /// Replace the held frame.
    pub fn publish(&self, frame: DecodedFrame) {
        self.slot.send_replace(Some(Arc::new(frame)));
    }

    /// A copy of the held frame, or `None` when empty or cleared.
    pub fn peek(&self) -> Option<DecodedFrame> {
        let held = self.slot.borrow().clone();
        held.map(|frame| (*frame).clone())
    }

    /// Drop the held frame so consumers read "no signal".
    pub fn clear(&self) {
        self.slot.send_if_modified(|slot| slot.take().is_some());
    }

    pub fn is_empty(&self) -> bool {
        self.slot.borrow().is_none()
    }

    /// Sequence number of the held frame without copying pixels.
    pub fn latest_sequence(&self) -> Option<u64> {
        self.slot.borrow().as_ref().map(|frame| frame.sequence)
    }

    /// Change notifications for consumers that would rather await than poll.
    pub fn subscribe(&self) -> watch::Receiver<Slot> {
        self.slot.subscribe()
    }
}

impl Default for LatestFrameCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::types::Rotation;
    use image::{Rgb, RgbImage};
    use std::time::{Duration, Instant};

    fn frame(sequence: u64, width: u32, height: u32) -> DecodedFrame {
        DecodedFrame {
            image: RgbImage::from_pixel(width, height, Rgb([1, 2, 3])),
            rotation: Rotation::None,
            sequence,
            decoded_at: Instant::now(),
        }
    }

    #[test]
    fn starts_empty() {
        let cache = LatestFrameCache::new();
        assert!(cache.peek().is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.latest_sequence(), None);
    }

    #[test]
    fn newest_wins() {
        let cache = LatestFrameCache::new();
        cache.publish(frame(1, 4, 4));
        cache.publish(frame(2, 8, 2));

        let got = cache.peek().unwrap();
        assert_eq!(got.sequence, 2);
        assert_eq!((got.width(), got.height()), (8, 2));
    }

    #[test]
    fn clear_empties_slot() {
        let cache = LatestFrameCache::new();
        cache.publish(frame(1, 2, 2));
        cache.clear();
        assert!(cache.peek().is_none());
        // Clearing twice is harmless.
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn peek_returns_independent_copy() {
        let cache = LatestFrameCache::new();
        cache.publish(frame(1, 2, 2));

        let mut copy = cache.peek().unwrap();
        copy.image.put_pixel(0, 0, Rgb([9, 9, 9]));

        assert_eq!(cache.peek().unwrap().image.get_pixel(0, 0).0, [1, 2, 3]);
    }

    #[test]
    fn clones_share_the_slot() {
        let writer = LatestFrameCache::new();
        let reader = writer.clone();
        writer.publish(frame(7, 1, 1));
        assert_eq!(reader.latest_sequence(), Some(7));
    }

    #[test]
    fn concurrent_reader_never_sees_torn_frame() {
        let cache = LatestFrameCache::new();
        let reader = cache.clone();

        let handle = std::thread::spawn(move || {
            let mut seen = 0;
            for _ in 0..2_000 {
                if let Some(f) = reader.peek() {
                    let first = f.image.get_pixel(0, 0).0;
                    assert!(f.image.pixels().all(|p| p.0 == first));
                    seen += 1;
                }
            }
            seen
        });

        for i in 0..500u64 {
            let v = (i % 255) as u8;
            cache.publish(DecodedFrame {
                image: RgbImage::from_pixel(32, 32, Rgb([v, v, v])),
                rotation: Rotation::None,
                sequence: i,
                decoded_at: Instant::now(),
            });
        }

        handle.join().unwrap();
    }

    #[tokio::test]
    async fn subscribers_are_notified() {
        let cache = LatestFrameCache::new();
        let mut rx = cache.subscribe();

        cache.publish(frame(3, 1, 1));
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().sequence, 3);

        cache.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
