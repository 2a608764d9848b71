//! Hand-off of decoded network events to the simulation tick
//!
//! The receive task is the only producer; the simulation drains everything
//! once per tick. The queue is bounded: when it is full the producer waits,
//! which in turn stops reading from the socket and lets TCP flow control push
//! back on the server. Nothing is dropped or reordered, and the consumer side
//! never waits.

use shared::WireMessage;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Room for large bursts such as a full monster roster on login.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// Items moved from the receive task to the simulation
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    Message(WireMessage),
    Disconnected { reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("dispatch queue is full")]
    Full,
    #[error("dispatch queue consumer is gone")]
    Closed,
}

/// Producer half, cloneable so a reconnect can reuse the same queue.
#[derive(Debug)]
pub struct DispatchSender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> Clone for DispatchSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> DispatchSender<T> {
    /// Enqueues from async code, waiting while the queue is full.
    pub async fn enqueue(&self, item: T) -> Result<(), EnqueueError> {
        self.tx.send(item).await.map_err(|_| EnqueueError::Closed)
    }

    /// Enqueues from a plain OS thread. Must not be called from inside an
    /// async runtime.
    pub fn blocking_enqueue(&self, item: T) -> Result<(), EnqueueError> {
        self.tx.blocking_send(item).map_err(|_| EnqueueError::Closed)
    }

    pub fn try_enqueue(&self, item: T) -> Result<(), EnqueueError> {
        self.tx.try_send(item).map_err(|e| match e {
            TrySendError::Full(_) => EnqueueError::Full,
            TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the simulation.
#[derive(Debug)]
pub struct DispatchQueue<T> {
    rx: mpsc::Receiver<T>,
    capacity: usize,
}

impl<T> DispatchQueue<T> {
    pub fn bounded(capacity: usize) -> (DispatchSender<T>, DispatchQueue<T>) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        (DispatchSender { tx }, DispatchQueue { rx, capacity })
    }

    /// Takes every queued item in receive order without waiting.
    pub fn drain_all(&mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            items.push(item);
        }
        items
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
