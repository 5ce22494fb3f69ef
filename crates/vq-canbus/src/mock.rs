//! Mock CAN interface for testing.
//!
//! Supports scripted batch queues and frame recording. All tests use this
//! instead of real CAN hardware so the suite runs in CI on any platform.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::CanResult;
use crate::interface::{FrameSink, FrameSource};
use crate::safety;
use crate::types::{CanFrame, OutboundMessage};

/// Mock CAN interface with scripted batches and transmit recording.
pub struct MockCanInterface {
    /// Batches returned by `poll` (FIFO order); empty once exhausted.
    batches: Mutex<VecDeque<Vec<CanFrame>>>,
    /// Every `send` call, one entry per burst.
    sent: Mutex<Vec<Vec<OutboundMessage>>>,
    polls: AtomicUsize,
    /// Whether to enforce the transmit guard (default: true).
    enforce_safety: bool,
}

impl MockCanInterface {
    /// Create a new mock with nothing queued: a silent bus.
    pub fn new() -> Self {
        Self::with_batches(Vec::new())
    }

    /// Create a mock pre-loaded with one batch per poll.
    pub fn with_batches(batches: Vec<Vec<CanFrame>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            sent: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
            enforce_safety: true,
        }
    }

    /// Disable the transmit guard, for tests that probe what the caller sends.
    pub fn without_safety(mut self) -> Self {
        self.enforce_safety = false;
        self
    }

    /// Queue an additional batch.
    pub fn queue_batch(&self, frames: Vec<CanFrame>) {
        self.batches.lock().unwrap().push_back(frames);
    }

    /// Queue a poll that returns nothing.
    pub fn queue_silence(&self, polls: usize) {
        let mut batches = self.batches.lock().unwrap();
        batches.extend(std::iter::repeat_with(Vec::new).take(polls));
    }

    /// Every burst passed to `send`, in order.
    pub fn sent_bursts(&self) -> Vec<Vec<OutboundMessage>> {
        self.sent.lock().unwrap().clone()
    }

    /// All sent messages, flattened.
    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().iter().flatten().copied().collect()
    }

    /// Get the last sent burst, if any.
    pub fn last_sent(&self) -> Option<Vec<OutboundMessage>> {
        self.sent.lock().unwrap().last().cloned()
    }

    /// How many times `poll` was called.
    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::Relaxed)
    }
}

impl Default for MockCanInterface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameSource for MockCanInterface {
    async fn poll(&self, _timeout: Duration) -> CanResult<Vec<CanFrame>> {
        self.polls.fetch_add(1, Ordering::Relaxed);
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }
}

#[async_trait]
impl FrameSink for MockCanInterface {
    async fn send(&self, messages: &[OutboundMessage]) -> CanResult<()> {
        if self.enforce_safety {
            for msg in messages {
                safety::check_outbound(msg)?;
            }
        }

        self.sent.lock().unwrap().push(messages.to_vec());
        Ok(())
    }
}
