//! Remote resource cache.
//!
//! Holds the last fetched collection of each [`ResourceKind`] and serves reads from it
//! while it is fresh. Mutations go through the cache so that a successful create, update
//! or delete marks the whole collection of that kind stale; the next read refetches.
//!
//! # Freshness
//!
//! A cached collection is fresh when it was fetched less than
//! [`CacheConfig::stale_time`] ago *and* no invalidation happened since the fetch
//! started. Every invalidation bumps a per-kind generation counter, and each fetch is
//! tagged with the generation current when it began, so a fetch that races a mutation
//! is never served as fresh to a read that starts after the mutation completed.
//!
//! # Sharing
//!
//! Concurrent reads of a kind share a single outstanding request. The request runs in
//! its own task: dropping every waiter does not abort it, and its result still lands
//! in the cache.
//!
//! # Example
//!
//! ```ignore
//! use prodflow_client::{ApiClient, CacheConfig, NewRole, ResourceCache, Role};
//!
//! let client = ApiClient::new("http://127.0.0.1:8000", Some(token))?;
//! let cache = ResourceCache::new(client, CacheConfig::default());
//!
//! let roles = cache.read::<Role>().await?;          // network
//! let roles = cache.read::<Role>().await?;          // cached
//! cache.create::<Role>(&NewRole { name: "operators".into(), permissions: vec![] }).await?;
//! let roles = cache.read::<Role>().await?;          // network again
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::{ClientError, Result};
use crate::events::{CacheChange, CacheEvent, CacheEvents, DEFAULT_EVENT_CAPACITY};
use crate::model::{Device, Resource, ResourceKind, Role, User};

/// How long a fetched collection is served without refetching.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// Configuration for [`ResourceCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Age after which a cached collection is refetched (default: 60 seconds).
    pub stale_time: Duration,

    /// Buffer size of the change-notification channel.
    pub event_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

type SharedFetch<T> = Shared<BoxFuture<'static, Result<Arc<Vec<T>>>>>;

struct Entry<T> {
    items: Arc<Vec<T>>,
    fetched_at: Instant,
    /// Generation that was current when the fetch started.
    generation: u64,
}

struct InFlight<T> {
    id: u64,
    generation: u64,
    fetch: SharedFetch<T>,
}

struct SlotState<T> {
    entry: Option<Entry<T>>,
    in_flight: Option<InFlight<T>>,
    generation: u64,
    next_fetch_id: u64,
}

impl<T> SlotState<T> {
    fn fresh(&self, stale_time: Duration) -> Option<Arc<Vec<T>>> {
        self.entry
            .as_ref()
            .filter(|e| e.generation == self.generation && e.fetched_at.elapsed() < stale_time)
            .map(|e| Arc::clone(&e.items))
    }
}

/// Cache slot for one resource kind.
///
/// Obtained through [`CachedResource::slot`]; callers normally go through
/// [`ResourceCache`] instead of using a slot directly.
pub struct KindCache<T> {
    kind: ResourceKind,
    stale_time: Duration,
    state: Arc<Mutex<SlotState<T>>>,
    events: CacheEvents,
}

impl<T: Resource> KindCache<T> {
    fn new(stale_time: Duration, events: CacheEvents) -> Self {
        Self {
            kind: T::KIND,
            stale_time,
            state: Arc::new(Mutex::new(SlotState {
                entry: None,
                in_flight: None,
                generation: 0,
                next_fetch_id: 0,
            })),
            events,
        }
    }

    async fn read(&self, client: &ApiClient) -> Result<Arc<Vec<T>>> {
        let fetch = {
            let mut state = self.state.lock().await;
            if let Some(items) = state.fresh(self.stale_time) {
                tracing::trace!(kind = %self.kind, "cache hit");
                return Ok(items);
            }

            let joinable = state
                .in_flight
                .as_ref()
                .filter(|f| f.generation == state.generation)
                .map(|f| (f.id, f.fetch.clone()));
            match joinable {
                Some((id, fetch)) => {
                    tracing::trace!(kind = %self.kind, fetch = id, "joining in-flight fetch");
                    fetch
                }
                None => self.start_fetch(&mut state, client.clone()),
            }
        };

        fetch.await
    }

    fn start_fetch(&self, state: &mut SlotState<T>, client: ApiClient) -> SharedFetch<T> {
        let id = state.next_fetch_id;
        state.next_fetch_id += 1;
        let generation = state.generation;
        let kind = self.kind;
        tracing::debug!(%kind, fetch = id, generation, "cache miss, fetching collection");

        let slot = Arc::clone(&self.state);
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let result = client.list::<T>().await.map(Arc::new);

            let refreshed = {
                let mut state = slot.lock().await;
                if state.in_flight.as_ref().is_some_and(|f| f.id == id) {
                    state.in_flight = None;
                }
                match &result {
                    Ok(items)
                        if state
                            .entry
                            .as_ref()
                            .is_none_or(|e| e.generation <= generation) =>
                    {
                        state.entry = Some(Entry {
                            items: Arc::clone(items),
                            fetched_at: Instant::now(),
                            generation,
                        });
                        Some(items.len())
                    }
                    _ => None,
                }
            };

            if let Some(count) = refreshed {
                events.send(kind, CacheChange::Refreshed { count });
            }
            result
        });

        let fetch = async move {
            task.await.unwrap_or_else(|e| {
                Err(ClientError::Internal(format!("{kind} fetch task failed: {e}")))
            })
        }
        .boxed()
        .shared();

        state.in_flight = Some(InFlight {
            id,
            generation,
            fetch: fetch.clone(),
        });
        fetch
    }

    async fn invalidate(&self) {
        {
            let mut state = self.state.lock().await;
            state.generation += 1;
        }
        tracing::debug!(kind = %self.kind, "invalidated cached collection");
        self.events.send(self.kind, CacheChange::Invalidated);
    }

    async fn peek(&self) -> Option<Arc<Vec<T>>> {
        let state = self.state.lock().await;
        state.entry.as_ref().map(|e| Arc::clone(&e.items))
    }

    async fn is_fresh(&self) -> bool {
        self.state.lock().await.fresh(self.stale_time).is_some()
    }
}

impl<T> std::fmt::Debug for KindCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindCache")
            .field("kind", &self.kind)
            .field("stale_time", &self.stale_time)
            .finish_non_exhaustive()
    }
}

/// A record type that has a slot in [`ResourceCache`].
pub trait CachedResource: Resource {
    fn slot(cache: &ResourceCache) -> &KindCache<Self>;
}

impl CachedResource for User {
    fn slot(cache: &ResourceCache) -> &KindCache<Self> {
        &cache.users
    }
}

impl CachedResource for Role {
    fn slot(cache: &ResourceCache) -> &KindCache<Self> {
        &cache.roles
    }
}

impl CachedResource for Device {
    fn slot(cache: &ResourceCache) -> &KindCache<Self> {
        &cache.devices
    }
}

/// Session-scoped cache of the users, roles and devices collections.
///
/// Construct one per session and share it by reference; there is no global instance.
pub struct ResourceCache {
    client: ApiClient,
    users: KindCache<User>,
    roles: KindCache<Role>,
    devices: KindCache<Device>,
    events: CacheEvents,
}

impl ResourceCache {
    pub fn new(client: ApiClient, config: CacheConfig) -> Self {
        let events = CacheEvents::with_capacity(config.event_capacity);
        Self {
            client,
            users: KindCache::new(config.stale_time, events.clone()),
            roles: KindCache::new(config.stale_time, events.clone()),
            devices: KindCache::new(config.stale_time, events.clone()),
            events,
        }
    }

    pub fn with_defaults(client: ApiClient) -> Self {
        Self::new(client, CacheConfig::default())
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Returns the collection of `R`, fetching it if nothing fresh is cached.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; a failed fetch leaves any previous entry in place.
    pub async fn read<R: CachedResource>(&self) -> Result<Arc<Vec<R>>> {
        R::slot(self).read(&self.client).await
    }

    /// Looks up one record in the (possibly refetched) collection of `R`.
    pub async fn find<R: CachedResource>(&self, id: Uuid) -> Result<Option<R>> {
        let items = self.read::<R>().await?;
        Ok(items.iter().find(|r| r.id() == id).cloned())
    }

    /// Creates a record and marks the collection of `R` stale.
    ///
    /// The new record is not spliced into the cached collection; the next read
    /// refetches it from the server.
    ///
    /// # Errors
    ///
    /// Validation and server errors are returned as-is and leave the cache untouched.
    pub async fn create<R: CachedResource>(&self, payload: &R::Create) -> Result<R> {
        let created = self.client.create::<R>(payload).await?;
        R::slot(self).invalidate().await;
        Ok(created)
    }

    /// Partially updates a record and marks the collection of `R` stale.
    pub async fn update<R: CachedResource>(&self, id: Uuid, payload: &R::Update) -> Result<R> {
        let updated = self.client.update::<R>(id, payload).await?;
        R::slot(self).invalidate().await;
        Ok(updated)
    }

    /// Deletes a record and marks the collection of `R` stale.
    ///
    /// Only the collection of `R` is touched; users referencing a deleted role keep
    /// their `role_ids` as they are.
    pub async fn delete<R: CachedResource>(&self, id: Uuid) -> Result<()> {
        self.client.delete::<R>(id).await?;
        R::slot(self).invalidate().await;
        Ok(())
    }

    /// Marks the collection of `kind` stale.
    pub async fn invalidate(&self, kind: ResourceKind) {
        match kind {
            ResourceKind::Users => self.users.invalidate().await,
            ResourceKind::Roles => self.roles.invalidate().await,
            ResourceKind::Devices => self.devices.invalidate().await,
        }
    }

    pub async fn invalidate_all(&self) {
        for kind in ResourceKind::ALL {
            self.invalidate(kind).await;
        }
    }

    /// The last stored collection of `R`, fresh or not, without fetching.
    pub async fn peek<R: CachedResource>(&self) -> Option<Arc<Vec<R>>> {
        R::slot(self).peek().await
    }

    pub async fn is_fresh(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Users => self.users.is_fresh().await,
            ResourceKind::Roles => self.roles.is_fresh().await,
            ResourceKind::Devices => self.devices.is_fresh().await,
        }
    }

    /// Subscribes to refresh and invalidation events for every kind.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("base_url", &self.client.base_url().as_str())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
