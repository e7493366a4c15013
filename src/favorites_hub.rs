//! Live, shared view of the stored favorites.
//!
//! The durable store is the source of truth. The hub caches one snapshot
//! of it, drops that cache after every write or foreign change, and re-reads
//! lazily on the next access. Observers are called synchronously after each
//! change, on the thread that made it.

use anyhow::Result;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::cancel::CancelToken;
use crate::db::KeyValueStore;
use crate::favorites::{self, MAX_FAVORITES};
use crate::models::Joke;

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleResult {
    pub did_add: bool,
    pub blocked_by_limit: bool,
    /// The change applies for this session but could not be stored.
    pub save_failed: bool,
}

#[derive(Default)]
struct CacheState {
    snapshot: Option<Arc<Vec<Joke>>>,
    stale: bool,
    last_marker: Option<u64>,
}

pub struct FavoritesHub {
    store: Option<Arc<dyn KeyValueStore>>,
    cache: Mutex<CacheState>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
}

impl FavoritesHub {
    /// `None` means durable storage is unavailable: the hub then starts
    /// empty and never persists.
    pub fn new(store: Option<Arc<dyn KeyValueStore>>) -> Arc<Self> {
        Arc::new(Self {
            store,
            cache: Mutex::new(CacheState::default()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
        })
    }

    fn store(&self) -> Option<&dyn KeyValueStore> {
        self.store.as_deref()
    }

    /// Current favorites. The returned `Arc` is the same allocation until
    /// the contents actually change.
    pub fn snapshot(&self) -> Arc<Vec<Joke>> {
        let mut cache = self.cache.lock();
        if !cache.stale {
            if let Some(snapshot) = &cache.snapshot {
                return snapshot.clone();
            }
        }

        if cache.last_marker.is_none() {
            cache.last_marker = self.read_marker();
        }
        let fresh = favorites::load_favorites(self.store());
        let snapshot = match cache.snapshot.take() {
            Some(previous) if *previous == fresh => previous,
            _ => Arc::new(fresh),
        };
        cache.snapshot = Some(snapshot.clone());
        cache.stale = false;
        snapshot
    }

    pub fn count(&self) -> usize {
        self.snapshot().len()
    }

    pub fn capacity(&self) -> usize {
        MAX_FAVORITES
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        favorites::is_favorite(&self.snapshot(), id)
    }

    pub fn toggle(&self, joke: &Joke) -> ToggleResult {
        let current = self.snapshot();
        let outcome = favorites::toggle_favorite(&current, joke);
        let mut save_failed = false;
        if !outcome.blocked_by_limit {
            save_failed = self.commit(outcome.favorites).is_err();
        }
        ToggleResult {
            did_add: outcome.did_add,
            blocked_by_limit: outcome.blocked_by_limit,
            save_failed,
        }
    }

    /// Removing an id that is not a favorite does nothing.
    pub fn remove(&self, id: &str) -> Result<()> {
        let current = self.snapshot();
        if !favorites::is_favorite(&current, id) {
            return Ok(());
        }
        self.commit(favorites::remove_favorite(&current, id))
    }

    /// Drops every favorite and deletes the stored key.
    pub fn clear(&self) -> Result<()> {
        let result = match self.store() {
            Some(store) => store.remove_item(favorites::STORAGE_KEY),
            None => Ok(()),
        };
        if let Err(e) = &result {
            tracing::warn!(error = %e, "failed to clear favorites");
        }
        self.after_write(Vec::new(), result.is_ok());
        result
    }

    /// Saves `next`. On failure `next` is still kept for this session, so
    /// what callers were told matches what they see.
    fn commit(&self, next: Vec<Joke>) -> Result<()> {
        let result = favorites::save_favorites(self.store(), &next);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "failed to save favorites, keeping them in memory");
        }
        self.after_write(next, result.is_ok());
        result
    }

    fn after_write(&self, next: Vec<Joke>, persisted: bool) {
        {
            let mut cache = self.cache.lock();
            if self.store.is_some() && persisted {
                // Re-read lazily from the store
                cache.stale = true;
            } else {
                let snapshot = match cache.snapshot.take() {
                    Some(previous) if *previous == next => previous,
                    _ => Arc::new(next),
                };
                cache.snapshot = Some(snapshot);
                cache.stale = false;
            }
            // Our own write is not a foreign change
            cache.last_marker = self.read_marker();
        }
        self.notify();
    }

    /// Checks whether another context wrote to the store since we last
    /// looked. If so the cache is dropped and observers are notified.
    pub fn poll_external_changes(&self) -> bool {
        {
            // Read under the lock so a concurrent write can't slip in between
            let mut cache = self.cache.lock();
            let Some(marker) = self.read_marker() else {
                return false;
            };
            match cache.last_marker {
                Some(last) if last == marker => return false,
                None => {
                    cache.last_marker = Some(marker);
                    return false;
                }
                Some(_) => {
                    cache.last_marker = Some(marker);
                    cache.stale = true;
                }
            }
        }
        tracing::info!("favorites changed in another window");
        self.notify();
        true
    }

    fn read_marker(&self) -> Option<u64> {
        let store = self.store()?;
        match store.change_marker() {
            Ok(marker) => Some(marker),
            Err(e) => {
                tracing::debug!(error = %e, "could not read storage change marker");
                None
            }
        }
    }

    /// Registers `listener`; it stays registered until the returned
    /// `Subscription` is dropped.
    pub fn subscribe(self: &Arc<Self>, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(listener)));
        Subscription {
            hub: Arc::downgrade(self),
            id,
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.listeners.lock().retain(|(listener_id, _)| *listener_id != id);
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    fn notify(&self) {
        // Clone out so listeners may read the hub or (un)subscribe
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    hub: Weak<FavoritesHub>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id);
        }
    }
}

/// Polls the store for foreign writes until `cancel` fires.
pub fn spawn_change_watcher(
    runtime: &tokio::runtime::Handle,
    hub: Arc<FavoritesHub>,
    interval: Duration,
    cancel: CancelToken,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    hub.poll_external_changes();
                }
            }
        }
        tracing::debug!("favorites change watcher stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, MemoryStore};
    use std::sync::atomic::AtomicUsize;

    fn joke(id: &str) -> Joke {
        Joke {
            id: id.to_string(),
            value: format!("joke-{}", id),
            url: String::new(),
            icon_url: String::new(),
            categories: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn memory_hub() -> (Arc<MemoryStore>, Arc<FavoritesHub>) {
        let store = Arc::new(MemoryStore::new());
        let hub = FavoritesHub::new(Some(store.clone()));
        (store, hub)
    }

    fn counter(hub: &Arc<FavoritesHub>) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let sub = hub.subscribe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (hits, sub)
    }

    #[test]
    fn test_snapshot_identity_is_stable_without_changes() {
        let (_store, hub) = memory_hub();
        let first = hub.snapshot();
        let second = hub.snapshot();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_toggle_persists_and_notifies() {
        let (store, hub) = memory_hub();
        let (hits, _sub) = counter(&hub);
        let before = hub.snapshot();

        let result = hub.toggle(&joke("a"));
        assert!(result.did_add);
        assert!(!result.blocked_by_limit);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let after = hub.snapshot();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(hub.is_favorite("a"));
        assert_eq!(hub.count(), 1);
        assert_eq!(favorites::load_favorites(Some(store.as_ref())), vec![joke("a")]);
    }

    #[test]
    fn test_listener_sees_new_state_during_notification() {
        let (_store, hub) = memory_hub();
        let observed = Arc::new(AtomicUsize::new(usize::MAX));
        let weak = Arc::downgrade(&hub);
        let slot = observed.clone();
        let _sub = hub.subscribe(move || {
            if let Some(hub) = weak.upgrade() {
                slot.store(hub.count(), Ordering::SeqCst);
            }
        });

        hub.toggle(&joke("a"));
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blocked_toggle_neither_writes_nor_notifies() {
        let (store, hub) = memory_hub();
        for i in 0..MAX_FAVORITES {
            hub.toggle(&joke(&i.to_string()));
        }
        let (hits, _sub) = counter(&hub);
        let marker = store.change_marker().unwrap();
        let before = hub.snapshot();

        let result = hub.toggle(&joke("extra"));
        assert!(result.blocked_by_limit);
        assert!(!result.did_add);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(store.change_marker().unwrap(), marker);
        assert!(Arc::ptr_eq(&before, &hub.snapshot()));
        assert_eq!(hub.count(), hub.capacity());
    }

    #[test]
    fn test_remove_absent_is_silent() {
        let (_store, hub) = memory_hub();
        hub.toggle(&joke("a"));
        let (hits, _sub) = counter(&hub);

        hub.remove("missing").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        hub.remove("a").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(hub.count(), 0);
    }

    #[test]
    fn test_dropping_subscription_unregisters() {
        let (_store, hub) = memory_hub();
        let (hits, sub) = counter(&hub);
        assert_eq!(hub.listener_count(), 1);
        drop(sub);
        assert_eq!(hub.listener_count(), 0);

        hub.toggle(&joke("a"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_external_write_invalidates_and_notifies() {
        let (store, hub) = memory_hub();
        hub.toggle(&joke("a"));
        let (hits, _sub) = counter(&hub);
        assert!(!hub.poll_external_changes());

        // Another window saves its own list
        favorites::save_favorites(Some(store.as_ref()), &[joke("b"), joke("c")]).unwrap();

        assert!(hub.poll_external_changes());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(hub.count(), 2);
        assert!(hub.is_favorite("b"));
        assert!(!hub.poll_external_changes());
    }

    #[test]
    fn test_two_windows_on_one_database_stay_in_sync() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.db");
        let left = FavoritesHub::new(Some(Arc::new(Database::open(&path).unwrap())));
        let right = FavoritesHub::new(Some(Arc::new(Database::open(&path).unwrap())));
        assert_eq!(right.count(), 0);
        let (hits, _sub) = counter(&right);

        left.toggle(&joke("a"));
        assert!(!left.poll_external_changes());
        assert!(right.poll_external_changes());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(right.is_favorite("a"));
    }

    #[test]
    fn test_equal_content_keeps_identity_after_invalidation() {
        let (store, hub) = memory_hub();
        hub.toggle(&joke("a"));
        let before = hub.snapshot();

        // Rewrite the same content from elsewhere
        favorites::save_favorites(Some(store.as_ref()), &[joke("a")]).unwrap();
        assert!(hub.poll_external_changes());
        assert!(Arc::ptr_eq(&before, &hub.snapshot()));
    }

    #[test]
    fn test_without_storage_works_in_memory() {
        let hub = FavoritesHub::new(None);
        let (hits, _sub) = counter(&hub);
        assert_eq!(hub.count(), 0);

        assert!(hub.toggle(&joke("a")).did_add);
        assert!(hub.is_favorite("a"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!hub.poll_external_changes());

        hub.clear().unwrap();
        assert_eq!(hub.count(), 0);
    }

    #[test]
    fn test_clear_removes_stored_key() {
        let (store, hub) = memory_hub();
        hub.toggle(&joke("a"));
        hub.clear().unwrap();
        assert_eq!(hub.count(), 0);
        assert_eq!(store.get_item(favorites::STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_clearing_empty_hub_keeps_identity() {
        let hub = FavoritesHub::new(None);
        let before = hub.snapshot();
        hub.clear().unwrap();
        assert!(Arc::ptr_eq(&before, &hub.snapshot()));
    }

    /// Reads fine but refuses every write.
    struct ReadOnlyStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for ReadOnlyStore {
        fn get_item(&self, key: &str) -> Result<Option<String>> {
            self.inner.get_item(key)
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }

        fn remove_item(&self, _key: &str) -> Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }

        fn change_marker(&self) -> Result<u64> {
            self.inner.change_marker()
        }
    }

    #[test]
    fn test_failed_save_keeps_change_for_session() {
        let store = Arc::new(ReadOnlyStore {
            inner: MemoryStore::new(),
        });
        let hub = FavoritesHub::new(Some(store));
        let (hits, _sub) = counter(&hub);

        let result = hub.toggle(&joke("a"));
        assert!(result.did_add);
        assert!(result.save_failed);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(hub.is_favorite("a"));
        assert_eq!(hub.count(), 1);
        assert!(!hub.poll_external_changes());
        assert!(hub.is_favorite("a"));

        assert!(hub.remove("a").is_err());
        assert_eq!(hub.count(), 0);

        hub.toggle(&joke("b"));
        assert!(hub.clear().is_err());
        assert_eq!(hub.count(), 0);
    }

    #[test]
    fn test_successful_save_is_not_flagged() {
        let (_store, hub) = memory_hub();
        assert!(!hub.toggle(&joke("a")).save_failed);
    }

    #[tokio::test]
    async fn test_watcher_picks_up_foreign_writes() {
        let (store, hub) = memory_hub();
        let _ = hub.snapshot();
        let (hits, _sub) = counter(&hub);
        let cancel = CancelToken::new();
        let handle = spawn_change_watcher(
            &tokio::runtime::Handle::current(),
            hub.clone(),
            Duration::from_millis(10),
            cancel.clone(),
        );

        favorites::save_favorites(Some(store.as_ref()), &[joke("z")]).unwrap();
        for _ in 0..100 {
            if hits.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(hits.load(Ordering::SeqCst) > 0);
        assert!(hub.is_favorite("z"));

        cancel.cancel();
        handle.await.unwrap();
    }
}
