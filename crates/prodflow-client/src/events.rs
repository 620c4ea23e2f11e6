//! Change notifications for cached collections.
//!
//! Readers that render a collection subscribe here and re-read the kind when an event
//! for it arrives. Built on tokio's broadcast channel, so every subscriber sees every
//! event sent after it subscribed.

use tokio::sync::broadcast;

use crate::model::ResourceKind;

/// Default buffer size for the broadcast channel.
/// Slow receivers lag and lose the oldest events beyond this limit.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheChange {
    /// A fetch completed and its collection was stored.
    Refreshed { count: usize },
    /// The collection was marked stale by a successful mutation or an explicit call.
    Invalidated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEvent {
    pub kind: ResourceKind,
    pub change: CacheChange,
}

/// Sending half shared by every per-kind cache slot.
#[derive(Clone)]
pub struct CacheEvents {
    sender: broadcast::Sender<CacheEvent>,
}

impl CacheEvents {
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns the number of subscribers that received the event.
    pub fn send(&self, kind: ResourceKind, change: CacheChange) -> usize {
        self.sender
            .send(CacheEvent { kind, change })
            .unwrap_or_default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for CacheEvents {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl std::fmt::Debug for CacheEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEvents")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
