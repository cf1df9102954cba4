use std::{
    collections::{HashMap, VecDeque},
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context as TaskContext, Poll},
};

use futures::{
    StreamExt,
    channel::oneshot,
    stream::FuturesUnordered,
    task::noop_waker_ref,
};
use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/**
 * This module contains all logic for loading scene assets and background textures from
 * external files and for sharing the loaded results between the entities that use them.
 */
pub mod animation;
pub mod binary;
pub mod gltf;
pub mod texture;

/// Identifier of a cached asset. Models and backgrounds use separate id spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u32);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AssetId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// The future a [`Loader`] hands back. Loads are polled on the frame thread, so
/// the future does not need to be `Send`.
pub type LoadFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>>>>;

/// Raw asset loading backend.
///
/// The cache treats the returned future as opaque and only reacts to its completion.
pub trait Loader {
    type Source;
    type Output;

    fn load(&self, source: &Self::Source) -> LoadFuture<Self::Output>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    Unloaded,
    Loading,
    Loaded,
}

/// A completion the cache observed during [`AssetCache::poll`].
#[derive(Clone, Debug, PartialEq)]
pub enum AssetEvent {
    Loaded(AssetId),
    Failed(AssetId, AssetError),
}

impl AssetEvent {
    pub fn id(&self) -> AssetId {
        match self {
            AssetEvent::Loaded(id) | AssetEvent::Failed(id, _) => *id,
        }
    }
}

/// Requester-scoped completion channel returned by [`AssetCache::request`].
///
/// Dropping the ticket unsubscribes the requester: the cache silently skips it
/// once the load completes.
#[derive(Debug)]
pub struct AssetTicket {
    id: AssetId,
    receiver: oneshot::Receiver<Result<AssetId, AssetError>>,
    done: bool,
}

impl AssetTicket {
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Returns the outcome exactly once, as soon as it is available.
    pub fn try_resolve(&mut self) -> Option<Result<AssetId, AssetError>> {
        if self.done {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(Some(outcome)) => {
                self.done = true;
                Some(outcome)
            }
            Ok(None) => None,
            Err(oneshot::Canceled) => {
                self.done = true;
                Some(Err(AssetError::Abandoned(self.id)))
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.done
    }
}

struct Entry<S, T> {
    source: S,
    status: LoadStatus,
    payload: Option<Arc<T>>,
    subscribers: Vec<oneshot::Sender<Result<AssetId, AssetError>>>,
}

type InFlight<T> = Pin<Box<dyn Future<Output = (AssetId, anyhow::Result<T>)>>>;

/// Loads assets by id, deduplicates concurrent requests and keeps the results.
///
/// Every id moves `Unloaded -> Loading -> Loaded`. A failed load drops back to
/// `Unloaded` so that a later request may retry it. At most one load per id is
/// in flight at any time.
pub struct AssetCache<S: 'static, T: 'static> {
    label: &'static str,
    loader: Box<dyn Loader<Source = S, Output = T>>,
    entries: HashMap<AssetId, Entry<S, T>>,
    in_flight: FuturesUnordered<InFlight<T>>,
    // already loaded ids that were requested again and owe a notification
    replay: VecDeque<AssetId>,
}

impl<S: 'static, T: 'static> AssetCache<S, T> {
    pub fn new(label: &'static str, loader: impl Loader<Source = S, Output = T> + 'static) -> Self {
        Self {
            label,
            loader: Box::new(loader),
            entries: HashMap::new(),
            in_flight: FuturesUnordered::new(),
            replay: VecDeque::new(),
        }
    }

    pub fn register(&mut self, id: AssetId, source: S) -> Result<(), AssetError> {
        if self.entries.contains_key(&id) {
            log::error!("{} cache: asset id {} is already registered", self.label, id);
            return Err(AssetError::Duplicate(id));
        }
        self.entries.insert(
            id,
            Entry {
                source,
                status: LoadStatus::Unloaded,
                payload: None,
                subscribers: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn source(&self, id: AssetId) -> Option<&S> {
        self.entries.get(&id).map(|entry| &entry.source)
    }

    pub fn status(&self, id: AssetId) -> Option<LoadStatus> {
        self.entries.get(&id).map(|entry| entry.status)
    }

    pub fn get(&self, id: AssetId) -> Option<Arc<T>> {
        self.entries.get(&id).and_then(|entry| entry.payload.clone())
    }

    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Subscribes to `id` and starts loading it if nobody did so yet.
    ///
    /// Requests for an id that is already loading or loaded never start a second
    /// load; the returned ticket resolves with the running or finished load.
    pub fn request(&mut self, id: AssetId) -> Result<AssetTicket, AssetError> {
        let Some(entry) = self.entries.get_mut(&id) else {
            log::error!("{} cache: can't load unknown asset {}", self.label, id);
            return Err(AssetError::Unknown(id));
        };
        let (sender, receiver) = oneshot::channel();
        let ticket = AssetTicket {
            id,
            receiver,
            done: false,
        };
        match entry.status {
            LoadStatus::Unloaded => {
                log::info!("{} cache: loading asset {}", self.label, id);
                let load = self.loader.load(&entry.source);
                entry.status = LoadStatus::Loading;
                entry.subscribers.push(sender);
                self.in_flight
                    .push(Box::pin(async move { (id, load.await) }));
            }
            LoadStatus::Loading => {
                log::warn!("{} cache: asset {} already loading. No need to reload.", self.label, id);
                entry.subscribers.push(sender);
            }
            LoadStatus::Loaded => {
                log::warn!("{} cache: asset {} already loaded. No need to reload.", self.label, id);
                // the receiver is kept alive by the ticket, so this cannot fail
                let _ = sender.send(Ok(id));
                if !self.replay.contains(&id) {
                    self.replay.push_back(id);
                }
            }
        }
        Ok(ticket)
    }

    /// Drains every load that finished since the last call without blocking.
    ///
    /// All subscribers of an id are notified before its event is returned.
    pub fn poll(&mut self) -> Vec<AssetEvent> {
        let mut events: Vec<AssetEvent> = self.replay.drain(..).map(AssetEvent::Loaded).collect();
        let mut cx = TaskContext::from_waker(noop_waker_ref());
        while let Poll::Ready(Some((id, result))) = self.in_flight.poll_next_unpin(&mut cx) {
            events.push(self.complete(id, result));
        }
        events
    }

    fn complete(&mut self, id: AssetId, result: anyhow::Result<T>) -> AssetEvent {
        let label = self.label;
        let Some(entry) = self.entries.get_mut(&id) else {
            return AssetEvent::Failed(id, AssetError::Unknown(id));
        };
        let outcome = match result {
            Ok(payload) => {
                entry.payload = Some(Arc::new(payload));
                entry.status = LoadStatus::Loaded;
                Ok(id)
            }
            Err(e) => {
                log::error!("{} cache: asset {} failed to load: {:#}", label, id, e);
                entry.status = LoadStatus::Unloaded;
                Err(AssetError::LoadFailed {
                    id,
                    reason: format!("{:#}", e),
                })
            }
        };
        let notified = entry
            .subscribers
            .drain(..)
            .filter_map(|subscriber| subscriber.send(outcome.clone()).ok())
            .count();
        log::debug!("{} cache: asset {} completed, {} subscriber(s) notified", label, id, notified);
        match outcome {
            Ok(id) => AssetEvent::Loaded(id),
            Err(e) => AssetEvent::Failed(id, e),
        }
    }
}
