use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::protocol::ServerMessage;

/// Whether a message may be dropped to make room for another, or must be
/// delivered even if it means disconnecting the participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Critical,
    Droppable,
}

impl ServerMessage {
    pub fn priority(&self) -> Priority {
        match self {
            ServerMessage::Joined { .. }
            | ServerMessage::ParticipantJoined { .. }
            | ServerMessage::ParticipantLeft { .. }
            | ServerMessage::Error { .. } => Priority::Critical,
            ServerMessage::Translation { .. } | ServerMessage::Pong => Priority::Droppable,
        }
    }
}

/// Raised when a `Critical` message cannot be enqueued because the queue is
/// full of other critical messages — the caller must forcibly disconnect
/// the participant, since silently dropping it would violate delivery.
#[derive(Debug)]
pub struct QueueSaturated;

/// Bounded per-participant outbound queue with a drop-oldest-droppable
/// overflow policy.
///
/// Single-producer (the Room task) / single-consumer (the WS writer task).
/// Grounded on the teacher's per-user connection registry, reshaped from a
/// plain `Vec<WsSender>` into a priority-aware bounded buffer.
pub struct SendQueue {
    inner: Mutex<VecDeque<ServerMessage>>,
    notify: Notify,
    capacity: usize,
    dropped: Mutex<u64>,
}

impl SendQueue {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity,
            dropped: Mutex::new(0),
        })
    }

    /// Enqueues a message, applying the overflow policy when full.
    ///
    /// Returns `Err(QueueSaturated)` only when `msg` is `Critical` and no
    /// droppable entry exists to evict in its place.
    pub fn enqueue(&self, msg: ServerMessage) -> Result<(), QueueSaturated> {
        {
            let mut queue = self.inner.lock();
            if queue.len() >= self.capacity {
                let oldest_droppable = queue
                    .iter()
                    .position(|m| m.priority() == Priority::Droppable);

                match oldest_droppable {
                    Some(idx) => {
                        queue.remove(idx);
                        *self.dropped.lock() += 1;
                    }
                    None if msg.priority() == Priority::Droppable => {
                        // Nothing to evict and the incoming message is itself
                        // droppable: drop it instead of growing the queue.
                        *self.dropped.lock() += 1;
                        return Ok(());
                    }
                    None => return Err(QueueSaturated),
                }
            }
            queue.push_back(msg);
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Waits for and removes the next message, in FIFO order.
    pub async fn recv(&self) -> ServerMessage {
        loop {
            if let Some(msg) = self.inner.lock().pop_front() {
                return msg;
            }
            self.notify.notified().await;
        }
    }

    pub fn dropped_count(&self) -> u64 {
        *self.dropped.lock()
    }
}
