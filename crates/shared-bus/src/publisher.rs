//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{EventFilter, GatewayEvent};
use crate::subscriber::{EventStream, EventSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// Waits while a matching subscriber's channel is full.
    ///
    /// # Returns
    ///
    /// The number of subscribers that received the event.
    async fn publish(&self, event: GatewayEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

struct SubscriberSlot {
    filter: EventFilter,
    sender: mpsc::Sender<GatewayEvent>,
}

/// In-memory implementation of the event bus.
///
/// Every subscription owns a bounded `tokio::sync::mpsc` channel, so each
/// subscriber sees events in publication order and a slow subscriber applies
/// backpressure to publishers instead of silently losing events.
pub struct InMemoryEventBus {
    /// Open subscriptions.
    subscribers: RwLock<Vec<SubscriberSlot>>,

    /// Total events published.
    events_published: AtomicU64,

    /// Per-subscriber channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            events_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        debug!(topics = ?filter.topics, "New subscription created");

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|slot| !slot.sender.is_closed());
        subscribers.push(SubscriberSlot {
            filter: filter.clone(),
            sender,
        });

        Subscription::new(receiver, filter)
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Get the number of open subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .iter()
            .filter(|slot| !slot.sender.is_closed())
            .count()
    }

    /// Get the per-subscriber channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        InMemoryEventBus::subscribe(self, filter)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: GatewayEvent) -> usize {
        let topic = event.topic();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        // Snapshot the matching senders; the lock is never held across a send.
        let targets: Vec<mpsc::Sender<GatewayEvent>> = self
            .subscribers
            .read()
            .iter()
            .filter(|slot| slot.filter.matches(&event))
            .map(|slot| slot.sender.clone())
            .collect();

        let mut delivered = 0;
        for sender in targets {
            if sender.send(event.clone()).await.is_ok() {
                delivered += 1;
            }
        }

        if delivered == 0 {
            warn!(topic = ?topic, "Event dropped (no receivers)");
        } else {
            debug!(topic = ?topic, receivers = delivered, "Event published");
        }
        delivered
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventTopic;
    use shared_types::BlockId;

    fn parse_event(id: u64) -> GatewayEvent {
        GatewayEvent::BlockAvailableForParsing {
            block_id: BlockId(id),
            block_hash: [id as u8; 32],
        }
    }

    #[tokio::test]
    async fn test_publish_no_subscribers() {
        let bus = InMemoryEventBus::new();
        let receivers = bus.publish(parse_event(1)).await;
        assert_eq!(receivers, 0);
        assert_eq!(bus.events_published(), 1);
    }

    #[tokio::test]
    async fn test_publish_respects_filters() {
        let bus = InMemoryEventBus::new();

        let _all = bus.subscribe(EventFilter::all());
        let _parsing = bus.subscribe(EventFilter::topic(EventTopic::BlockParsing));
        let _conflicts = bus.subscribe(EventFilter::topic(EventTopic::PoolConflict));

        let receivers = bus.publish(parse_event(1)).await;
        assert_eq!(receivers, 2);
        assert_eq!(bus.subscriber_count(), 3);
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let bus = InMemoryEventBus::new();
        {
            let _sub = bus.subscribe(EventFilter::all());
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(parse_event(1)).await, 0);
    }

    #[test]
    fn test_default_bus() {
        let bus = InMemoryEventBus::default();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.events_published(), 0);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        assert_eq!(InMemoryEventBus::with_capacity(0).capacity(), 1);
    }
}
