//! Per-consumer outgoing frame queue (spec.md §3 Consumer `outgoing`,
//! §4.D Fan-out, invariant #6, E2E scenario #6).
//!
//! A plain bounded `mpsc` channel can only drop or block on overflow; it has
//! no way to look at what's already queued. The spec's overflow policy is
//! keyframe-aligned drop: on overflow, trim the queue back to its most
//! recently buffered keyframe instead of dropping whichever frame happens
//! not to fit, so a slow consumer that catches up always resumes on a
//! decodable boundary (SHs + a keyframe + its following frames) rather than
//! an undecodable gap. This module is a small bounded `VecDeque` channel
//! with that trim built into the enqueue path, offered behind the same
//! `send`/`try_send`/`recv` surface `tokio::sync::mpsc` offers so it drops
//! into the existing `FrameDataSender`/`FrameDataReceiver` call sites.
//!
//! The queue is bounded by frame count, not wall-clock duration — the
//! duration high-water-mark spec.md §3 describes would need per-frame
//! duration bookkeeping this crate doesn't carry on `FrameData` yet.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::flv::define::frame_type;

use super::define::FrameData;

struct Inner {
    queue: VecDeque<FrameData>,
    capacity: usize,
}

struct Shared {
    inner: Mutex<Inner>,
    notify: Notify,
    closed: AtomicBool,
    sender_count: AtomicUsize,
}

pub struct FrameQueueSender {
    shared: Arc<Shared>,
}

pub struct FrameQueueReceiver {
    shared: Arc<Shared>,
}

pub struct SendError<T>(pub T);

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SendError(..)")
    }
}

pub enum TrySendError<T> {
    /// Still full after trimming to the last buffered keyframe: either
    /// there's no keyframe to trim to yet (audio-only, or no keyframe seen
    /// since subscribing), or a single GOP already fills the whole queue.
    Full(T),
    Closed(T),
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => write!(f, "TrySendError::Full(..)"),
            Self::Closed(_) => write!(f, "TrySendError::Closed(..)"),
        }
    }
}

#[must_use]
pub fn channel(capacity: usize) -> (FrameQueueSender, FrameQueueReceiver) {
    let shared = Arc::new(Shared {
        inner: Mutex::new(Inner {
            queue: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }),
        notify: Notify::new(),
        closed: AtomicBool::new(false),
        sender_count: AtomicUsize::new(1),
    });
    (
        FrameQueueSender {
            shared: Arc::clone(&shared),
        },
        FrameQueueReceiver { shared },
    )
}

impl FrameQueueSender {
    /// Enqueues `frame`. If the queue is at capacity, trims back to the
    /// most recent buffered keyframe first (spec.md §4.D Fan-out) and only
    /// reports `Full` if that still leaves no room.
    pub fn try_send(&self, frame: FrameData) -> Result<(), TrySendError<FrameData>> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(TrySendError::Closed(frame));
        }

        let mut inner = self.shared.inner.lock();
        if inner.queue.len() >= inner.capacity {
            trim_to_last_keyframe(&mut inner.queue);
        }
        if inner.queue.len() >= inner.capacity {
            return Err(TrySendError::Full(frame));
        }
        inner.queue.push_back(frame);
        drop(inner);
        self.shared.notify.notify_one();
        Ok(())
    }

    /// Blocking send for single-consumer producer paths (publisher
    /// ingestion, relay forwarding) that want backpressure instead of
    /// keyframe-aligned drop. Mirrors `tokio::sync::mpsc::Sender::send`.
    pub async fn send(&self, mut frame: FrameData) -> Result<(), SendError<FrameData>> {
        loop {
            match self.try_send(frame) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Closed(f)) => return Err(SendError(f)),
                Err(TrySendError::Full(f)) => {
                    frame = f;
                    self.shared.notify.notified().await;
                }
            }
        }
    }
}

impl Clone for FrameQueueSender {
    fn clone(&self) -> Self {
        self.shared.sender_count.fetch_add(1, Ordering::AcqRel);
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for FrameQueueSender {
    fn drop(&mut self) {
        if self.shared.sender_count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.closed.store(true, Ordering::Release);
            self.shared.notify.notify_waiters();
        }
    }
}

impl fmt::Debug for FrameQueueSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameQueueSender").finish()
    }
}

impl FrameQueueReceiver {
    /// Mirrors `tokio::sync::mpsc::Receiver::recv`: returns `None` once
    /// every sender has dropped and the queue has drained. Cancel-safe —
    /// the only suspension point is `Notify::notified()`, dropping it loses
    /// no state.
    pub async fn recv(&mut self) -> Option<FrameData> {
        loop {
            {
                let mut inner = self.shared.inner.lock();
                if let Some(frame) = inner.queue.pop_front() {
                    return Some(frame);
                }
            }
            if self.shared.closed.load(Ordering::Acquire) {
                return None;
            }
            self.shared.notify.notified().await;
        }
    }
}

fn trim_to_last_keyframe(queue: &mut VecDeque<FrameData>) {
    let mut last_keyframe_idx = None;
    for (i, frame) in queue.iter().enumerate() {
        if is_video_keyframe(frame) {
            last_keyframe_idx = Some(i);
        }
    }
    if let Some(idx) = last_keyframe_idx {
        queue.drain(..idx);
    }
}

fn is_video_keyframe(frame: &FrameData) -> bool {
    match frame {
        FrameData::Video { data, .. } => {
            data.first().is_some_and(|b| (b >> 4) == frame_type::KEY_FRAME)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn video(keyframe: bool, n: u8) -> FrameData {
        let mut data = BytesMut::new();
        let nibble = if keyframe { frame_type::KEY_FRAME } else { frame_type::INTER_FRAME };
        data.extend_from_slice(&[(nibble << 4) | 0x07, n]);
        FrameData::Video { timestamp: i64::from(n), data }
    }

    #[test]
    fn overflow_trims_back_to_last_keyframe() {
        let (tx, _rx) = channel(4);
        assert!(tx.try_send(video(true, 1)).is_ok());
        assert!(tx.try_send(video(false, 2)).is_ok());
        assert!(tx.try_send(video(false, 3)).is_ok());
        assert!(tx.try_send(video(true, 4)).is_ok());
        // Queue is now full (capacity 4). The next push must trim back to
        // the last keyframe (frame 4) before making room, not drop frame 4
        // while keeping the older inter frames.
        assert!(tx.try_send(video(false, 5)).is_ok());

        let mut inner = tx.shared.inner.lock();
        let remaining: Vec<u8> = inner
            .queue
            .drain(..)
            .map(|f| match f {
                FrameData::Video { data, .. } => data[1],
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(remaining, vec![4, 5]);
    }

    #[test]
    fn full_with_no_keyframe_reports_full() {
        let (tx, _rx) = channel(2);
        assert!(tx.try_send(video(false, 1)).is_ok());
        assert!(tx.try_send(video(false, 2)).is_ok());
        match tx.try_send(video(false, 3)) {
            Err(TrySendError::Full(_)) => {}
            _ => panic!("expected Full: no keyframe buffered to trim to"),
        }
    }

    #[tokio::test]
    async fn recv_drains_in_order_and_closes_on_sender_drop() {
        let (tx, mut rx) = channel(8);
        tx.try_send(video(true, 1)).unwrap();
        tx.try_send(video(false, 2)).unwrap();
        drop(tx);

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, FrameData::Video { .. }));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, FrameData::Video { .. }));
        assert!(rx.recv().await.is_none());
    }
}
