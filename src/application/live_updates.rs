// Live update broadcaster - Fan-out of refresh signals to open browser streams
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::AbortHandle;

/// Per-stream buffer. One pending refresh is as good as many.
const STREAM_BUFFER: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSignal {
    /// Dashboard config changed; the page should re-fetch
    Update,
    /// Keep-alive, also used to notice dead connections
    Heartbeat,
}

pub type HandleId = u64;

struct StreamHandle {
    sender: mpsc::Sender<StreamSignal>,
    heartbeat: AbortHandle,
}

pub struct LiveUpdateBroadcaster {
    handles: Mutex<HashMap<HandleId, StreamHandle>>,
    next_id: AtomicU64,
    heartbeat_interval: Duration,
}

impl LiveUpdateBroadcaster {
    pub fn new(heartbeat_interval: Duration) -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            heartbeat_interval,
        }
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<HandleId, StreamHandle>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a stream handle and start its heartbeat.
    pub fn register(self: &Arc<Self>, sender: mpsc::Sender<StreamSignal>) -> HandleId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let heartbeat = tokio::spawn(heartbeat(
            Arc::downgrade(self),
            id,
            sender.clone(),
            self.heartbeat_interval,
        ))
        .abort_handle();

        self.handles().insert(id, StreamHandle { sender, heartbeat });
        tracing::debug!("Stream {} registered ({} open)", id, self.connected());
        id
    }

    pub fn unregister(&self, id: HandleId) {
        let removed = self.handles().remove(&id);
        if let Some(handle) = removed {
            handle.heartbeat.abort();
            tracing::debug!("Stream {} unregistered", id);
        }
    }

    /// Register a fresh channel and return a receiver that unregisters on drop.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (sender, receiver) = mpsc::channel(STREAM_BUFFER);
        let id = self.register(sender);
        Subscription {
            id,
            receiver,
            broadcaster: Arc::downgrade(self),
        }
    }

    /// Push an update marker to every open stream; returns how many accepted it.
    pub fn notify_all(&self) -> usize {
        let mut delivered = 0;
        self.handles().retain(|id, handle| {
            match handle.sender.try_send(StreamSignal::Update) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                // Heartbeats take at most one slot, so a refresh is already queued
                Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!("Stream {} closed, dropping it", id);
                    handle.heartbeat.abort();
                    false
                }
            }
        });
        tracing::info!("Notified {} open stream(s)", delivered);
        delivered
    }

    /// Drop every handle so open streams end (used on shutdown).
    pub fn close_all(&self) {
        let drained: Vec<_> = self.handles().drain().collect();
        for (_, handle) in drained {
            handle.heartbeat.abort();
        }
    }

    pub fn connected(&self) -> usize {
        self.handles().len()
    }
}

async fn heartbeat(
    broadcaster: Weak<LiveUpdateBroadcaster>,
    id: HandleId,
    sender: mpsc::Sender<StreamSignal>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        ticker.tick().await;
        if sender.is_closed() {
            break;
        }
        // Only ping an idle stream, so heartbeats never hold more than one slot
        if sender.capacity() < sender.max_capacity() {
            continue;
        }
        if let Err(TrySendError::Closed(_)) = sender.try_send(StreamSignal::Heartbeat) {
            break;
        }
    }
    if let Some(broadcaster) = broadcaster.upgrade() {
        broadcaster.unregister(id);
    }
}

/// Receiving end of one registered stream.
pub struct Subscription {
    id: HandleId,
    receiver: mpsc::Receiver<StreamSignal>,
    broadcaster: Weak<LiveUpdateBroadcaster>,
}

impl Subscription {
    pub fn id(&self) -> HandleId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<StreamSignal> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(broadcaster) = self.broadcaster.upgrade() {
            broadcaster.unregister(self.id);
        }
    }
}
