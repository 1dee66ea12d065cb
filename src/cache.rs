//! Fetch-once cache for expensive asynchronous reads.
//!
//! Each key owns a single slot holding a shared future. The first request for a
//! key starts the producer; every later request, concurrent or not, awaits the
//! same future and receives a clone of its result. A failed result evicts its
//! slot so the next request tries again.

use crate::error::Result;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Weak};

type Slot<V> = Shared<BoxFuture<'static, Result<V>>>;
type Slots<K, V> = Mutex<FxHashMap<K, Slot<V>>>;

/// First writer wins, every reader replays.
pub struct ResultCache<K, V> {
    slots: Arc<Slots<K, V>>,
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// Return the value recorded under `key`, running `producer` only if no
    /// fetch for that key is finished or in flight.
    ///
    /// `producer` is called at most once per successful key, and never while
    /// the slot table is locked. A started fetch is driven to completion on the
    /// current tokio runtime even if every caller stops waiting for it.
    pub async fn request<F, Fut>(&self, key: K, producer: F) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let (slot, started) = {
            let mut slots = self.slots.lock();
            match slots.get(&key) {
                Some(slot) => (slot.clone(), false),
                None => {
                    let fetch = async move { producer().await };
                    let slot = evicting_on_error(Arc::downgrade(&self.slots), key.clone(), fetch);
                    slots.insert(key.clone(), slot.clone());
                    (slot, true)
                }
            }
        };

        if started {
            log::debug!("Fetching {:?}", key);
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(slot.clone());
                }
                Err(_) => {
                    log::debug!("No tokio runtime, fetch of {:?} runs only while awaited", key)
                }
            }
        } else {
            log::debug!("Replaying {:?}", key);
        }

        slot.await
    }

    /// True when a fetch for `key` has succeeded or is still in flight.
    pub fn contains(&self, key: &K) -> bool {
        self.slots.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl<K, V> Default for ResultCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn evicting_on_error<K, V, Fut>(slots: Weak<Slots<K, V>>, key: K, fetch: Fut) -> Slot<V>
where
    K: Eq + Hash + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<V>> + Send + 'static,
{
    async move {
        let result = fetch.await;
        if let Err(e) = &result {
            log::warn!("Fetch of {:?} failed, not caching: {}", key, e);
            if let Some(slots) = slots.upgrade() {
                slots.lock().remove(&key);
            }
        }
        result
    }
    .boxed()
    .shared()
}
