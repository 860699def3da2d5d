//! The process-wide event bus (C1): topic pub/sub with bounded
//! per-subscriber queues and drop-oldest overflow.
//!
//! Grounded on the writer-task idiom in `gateway/src/nodes/ws.rs` (a bounded
//! channel drained by a dedicated task) and the `Mutex<HashMap<...>>`
//! subscriber-registry idiom in `gateway/src/runtime/cancel.rs`. The teacher
//! itself has no real pub/sub mechanism — only a log-emit `TraceEvent::emit`
//! — so this module is new construction built from those two idioms.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use pryx_domain::{EventKind, TraceEvent};
use tokio::sync::Notify;
use uuid::Uuid;

/// Per-subscriber bound; publishing past this drops the oldest queued event.
pub const QUEUE_CAPACITY: usize = 100;

struct SubscriberQueue {
    kind: EventKind,
    queue: Mutex<VecDeque<TraceEvent>>,
    notify: Notify,
    closed: std::sync::atomic::AtomicBool,
    dropped: AtomicU64,
}

struct BusInner {
    subscribers: Mutex<HashMap<Uuid, Arc<SubscriberQueue>>>,
}

/// The event bus. Cheap to clone; all clones share the same subscriber
/// table.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Publish an event. Non-blocking: enqueues onto every subscriber whose
    /// `kind` matches, dropping the oldest queued event for any subscriber
    /// whose queue is already at capacity.
    pub fn publish(&self, event: TraceEvent) {
        let subs = self.inner.subscribers.lock();
        for sub in subs.values() {
            if sub.kind != event.kind {
                continue;
            }
            if sub.closed.load(Ordering::Acquire) {
                continue;
            }
            let mut q = sub.queue.lock();
            if q.len() >= QUEUE_CAPACITY {
                q.pop_front();
                sub.dropped.fetch_add(1, Ordering::Relaxed);
            }
            q.push_back(event.clone());
            drop(q);
            sub.notify.notify_waiters();
        }
    }

    /// Subscribe to events of the given kind. Only events published after
    /// this call are delivered (subscribing after publish is intentional).
    pub fn subscribe(&self, kind: EventKind) -> (Subscription, Cancel) {
        let id = Uuid::new_v4();
        let q = Arc::new(SubscriberQueue {
            kind,
            queue: Mutex::new(VecDeque::with_capacity(QUEUE_CAPACITY)),
            notify: Notify::new(),
            closed: std::sync::atomic::AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        });
        self.inner.subscribers.lock().insert(id, q.clone());
        let sub = Subscription { queue: q.clone() };
        let cancel = Cancel {
            id,
            bus: Arc::downgrade(&self.inner),
            queue: q,
        };
        (sub, cancel)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

/// A readable stream of events matching a subscription's kind.
pub struct Subscription {
    queue: Arc<SubscriberQueue>,
}

impl Subscription {
    /// Await the next event. Returns `None` once the subscription has been
    /// cancelled and the queue has drained.
    pub async fn recv(&mut self) -> Option<TraceEvent> {
        loop {
            {
                let mut q = self.queue.queue.lock();
                if let Some(ev) = q.pop_front() {
                    return Some(ev);
                }
            }
            if self.queue.closed.load(Ordering::Acquire) {
                // One last drain in case an event landed between the check
                // above and the closed flag being observed.
                let mut q = self.queue.queue.lock();
                if let Some(ev) = q.pop_front() {
                    return Some(ev);
                }
                return None;
            }
            self.queue.notify.notified().await;
        }
    }

    /// Number of events dropped for this subscriber due to queue overflow.
    pub fn dropped_count(&self) -> u64 {
        self.queue.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.queue.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cancels a subscription: removes it from the bus and closes its stream.
pub struct Cancel {
    id: Uuid,
    bus: Weak<BusInner>,
    queue: Arc<SubscriberQueue>,
}

impl Cancel {
    pub fn cancel(&self) {
        self.queue.closed.store(true, Ordering::Release);
        if let Some(bus) = self.bus.upgrade() {
            bus.subscribers.lock().remove(&self.id);
        }
        self.queue.notify.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind) -> TraceEvent {
        TraceEvent::new(kind, None)
    }

    #[tokio::test]
    async fn subscriber_receives_events_of_matching_kind_only() {
        let bus = Bus::new();
        let (mut sub, _cancel) = bus.subscribe(EventKind::Message);

        bus.publish(event(EventKind::Message));
        bus.publish(event(EventKind::Error));

        let first = sub.recv().await.unwrap();
        assert_eq!(first.kind, EventKind::Message);
        assert_eq!(sub.len(), 0);
    }

    #[tokio::test]
    async fn subscribing_after_publish_misses_earlier_events() {
        let bus = Bus::new();
        bus.publish(event(EventKind::Message));
        let (sub, _cancel) = bus.subscribe(EventKind::Message);
        assert!(sub.is_empty());
    }

    #[tokio::test]
    async fn overflow_drops_oldest_and_counts_drops() {
        let bus = Bus::new();
        let (mut sub, _cancel) = bus.subscribe(EventKind::Message);

        for _ in 0..(QUEUE_CAPACITY + 50) {
            bus.publish(event(EventKind::Message));
        }

        assert_eq!(sub.len(), QUEUE_CAPACITY);
        assert_eq!(sub.dropped_count(), 50);

        let mut received = 0;
        while let Ok(Some(_)) =
            tokio::time::timeout(std::time::Duration::from_millis(10), sub.recv()).await
        {
            received += 1;
        }
        assert_eq!(received, QUEUE_CAPACITY);
    }

    #[tokio::test]
    async fn cancel_closes_the_stream() {
        let bus = Bus::new();
        let (mut sub, cancel) = bus.subscribe(EventKind::Message);
        cancel.cancel();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn slow_subscriber_does_not_block_other_subscribers() {
        let bus = Bus::new();
        let (mut slow, _c1) = bus.subscribe(EventKind::Message);
        let (mut fast, _c2) = bus.subscribe(EventKind::Message);

        for _ in 0..(QUEUE_CAPACITY + 10) {
            bus.publish(event(EventKind::Message));
        }

        // The fast subscriber can still drain its own (equally overflowed,
        // since neither has read yet) queue without waiting on the slow one.
        assert!(fast.recv().await.is_some());
        assert_eq!(slow.dropped_count(), 10);
    }
}
