// Stale-while-revalidate feed cache. One slot per (dataset, address, chain)
// key, replaced wholesale on refresh; per-key fetch locks collapse
// concurrent callers onto a single upstream request.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex, RwLock};

use crate::constants::{
    BALANCES_POLL_INTERVAL_SECS, FEED_CACHE_MAX_ENTRIES, FEED_STALE_WINDOW_SECS,
    GAS_POLL_INTERVAL_SECS, NFTS_POLL_INTERVAL_SECS, PRICES_POLL_INTERVAL_SECS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Gas,
    Prices,
    Balances,
    Nfts,
    Transfers,
}

impl Dataset {
    pub fn poll_interval(self) -> Duration {
        let secs = match self {
            Dataset::Gas => GAS_POLL_INTERVAL_SECS,
            Dataset::Prices => PRICES_POLL_INTERVAL_SECS,
            Dataset::Balances | Dataset::Transfers => BALANCES_POLL_INTERVAL_SECS,
            Dataset::Nfts => NFTS_POLL_INTERVAL_SECS,
        };
        Duration::from_secs(secs)
    }

    /// Datasets keyed by a wallet; without an address their feed is
    /// disabled and produces no network activity at all.
    pub fn requires_address(self) -> bool {
        matches!(self, Dataset::Balances | Dataset::Nfts | Dataset::Transfers)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedKey {
    pub dataset: Dataset,
    pub address: Option<String>,
    pub chain_id: u64,
}

impl FeedKey {
    pub fn new(dataset: Dataset, address: Option<&str>, chain_id: u64) -> Self {
        let address = address
            .map(|a| a.trim().to_ascii_lowercase())
            .filter(|a| !a.is_empty());
        Self {
            dataset,
            address,
            chain_id,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.dataset.requires_address() && self.address.is_none()
    }
}

/// Cooperative cancellation. The in-flight request is not aborted at the
/// transport level; a cancelled token only prevents the result from being
/// committed to the cache.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a consumer sees for one key: last-known-good data, an error from
/// the most recent failed refresh, or the initial loading state.
/// `is_loading && data.is_none()` is the only nothing-to-show state.
#[derive(Debug, Clone)]
pub struct FeedSnapshot<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<T> FeedSnapshot<T> {
    fn idle() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    fetched_at: Option<Instant>,
    error: Option<String>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            fetched_at: None,
            error: None,
        }
    }
}

pub struct SwrCache<T> {
    ttl: Duration,
    stale_window: Duration,
    max_entries: usize,
    slots: RwLock<HashMap<FeedKey, Slot<T>>>,
    fetch_locks: RwLock<HashMap<FeedKey, Arc<Mutex<()>>>>,
}

impl<T: Clone + Send + Sync> SwrCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_max_entries(ttl, FEED_CACHE_MAX_ENTRIES)
    }

    fn with_max_entries(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            stale_window: Duration::from_secs(FEED_STALE_WINDOW_SECS),
            max_entries,
            slots: RwLock::new(HashMap::new()),
            fetch_locks: RwLock::new(HashMap::new()),
        }
    }

    pub fn for_dataset(dataset: Dataset) -> Self {
        Self::new(dataset.poll_interval())
    }

    /// Current state without triggering any fetch.
    pub async fn snapshot(&self, key: &FeedKey) -> FeedSnapshot<T> {
        if key.is_disabled() {
            return FeedSnapshot::idle();
        }
        let slots = self.slots.read().await;
        match slots.get(key) {
            Some(slot) => FeedSnapshot {
                data: slot.value.clone(),
                is_loading: slot.value.is_none() && slot.error.is_none(),
                error: slot.error.clone(),
            },
            None => FeedSnapshot {
                data: None,
                is_loading: true,
                error: None,
            },
        }
    }

    /// Serves from cache when fresh, otherwise refreshes through the
    /// per-key fetch lock. Concurrent callers sharing a key ride the same
    /// upstream request: the second caller re-checks freshness after the
    /// lock and finds the first caller's result.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &FeedKey,
        cancel: &CancelToken,
        fetch: F,
    ) -> FeedSnapshot<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        if key.is_disabled() {
            return FeedSnapshot::idle();
        }
        if let Some(value) = self.cached(key, self.ttl).await {
            return FeedSnapshot {
                data: Some(value),
                is_loading: false,
                error: None,
            };
        }

        let lock = self.fetch_lock_for(key).await;
        let _guard = lock.lock().await;
        if let Some(value) = self.cached(key, self.ttl).await {
            return FeedSnapshot {
                data: Some(value),
                is_loading: false,
                error: None,
            };
        }
        self.run_fetch(key, cancel, &fetch).await
    }

    /// Manual revalidation: always fetches, still serialized per key.
    pub async fn refresh<F, Fut>(
        &self,
        key: &FeedKey,
        cancel: &CancelToken,
        fetch: F,
    ) -> FeedSnapshot<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        if key.is_disabled() {
            return FeedSnapshot::idle();
        }
        let lock = self.fetch_lock_for(key).await;
        let _guard = lock.lock().await;
        self.run_fetch(key, cancel, &fetch).await
    }

    async fn run_fetch<F, Fut>(&self, key: &FeedKey, cancel: &CancelToken, fetch: &F) -> FeedSnapshot<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let result = fetch().await;

        // A cancelled owner's result never lands in the cache.
        if cancel.is_cancelled() {
            tracing::debug!("fetch for {:?} cancelled; result discarded", key.dataset);
            return self.snapshot(key).await;
        }

        let mut slots = self.slots.write().await;
        let slot = slots.entry(key.clone()).or_default();
        let snapshot = match result {
            Some(value) => {
                *slot = Slot {
                    value: Some(value.clone()),
                    fetched_at: Some(Instant::now()),
                    error: None,
                };
                FeedSnapshot {
                    data: Some(value),
                    is_loading: false,
                    error: None,
                }
            }
            None => {
                // Keep the stale value while it is within the stale window.
                let stale = slot
                    .fetched_at
                    .filter(|at| at.elapsed() <= self.stale_window)
                    .and_then(|_| slot.value.clone());
                slot.error = Some("upstream fetch failed".to_string());
                if stale.is_none() {
                    slot.value = None;
                    slot.fetched_at = None;
                }
                FeedSnapshot {
                    data: stale,
                    is_loading: false,
                    error: slot.error.clone(),
                }
            }
        };

        // Callers can mint arbitrary keys through the address parameter,
        // so both maps are bounded: past the cap, slots with no value
        // inside the stale window are dropped, along with any lock whose
        // slot is gone.
        if slots.len() > self.max_entries {
            slots.retain(|_, slot| {
                slot.fetched_at
                    .is_some_and(|at| at.elapsed() <= self.stale_window)
            });
            let mut locks = self.fetch_locks.write().await;
            locks.retain(|key, _| slots.contains_key(key));
        }

        snapshot
    }

    async fn cached(&self, key: &FeedKey, max_age: Duration) -> Option<T> {
        let slots = self.slots.read().await;
        let slot = slots.get(key)?;
        let fetched_at = slot.fetched_at?;
        if fetched_at.elapsed() <= max_age {
            return slot.value.clone();
        }
        None
    }

    async fn fetch_lock_for(&self, key: &FeedKey) -> Arc<Mutex<()>> {
        {
            let locks = self.fetch_locks.read().await;
            if let Some(lock) = locks.get(key) {
                return lock.clone();
            }
        }
        let mut locks = self.fetch_locks.write().await;
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Background warmer owning one polling task for one key. The task ticks
/// on the dataset interval and on manual refresh messages; dropping the
/// handle cancels the token and aborts the task, so no timer outlives its
/// owner.
pub struct PollingFeed {
    cancel: CancelToken,
    refresh_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl PollingFeed {
    pub fn spawn<T, F, Fut>(
        cache: Arc<SwrCache<T>>,
        key: FeedKey,
        interval: Duration,
        fetch: F,
    ) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<T>> + Send,
    {
        let cancel = CancelToken::new();
        let (refresh_tx, mut refresh_rx) = mpsc::channel::<()>(1);
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            if key.is_disabled() {
                return;
            }
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    message = refresh_rx.recv() => {
                        if message.is_none() {
                            break;
                        }
                    }
                }
                if task_cancel.is_cancelled() {
                    break;
                }
                let snapshot = cache.refresh(&key, &task_cancel, &fetch).await;
                if let Some(error) = snapshot.error {
                    tracing::debug!("poll for {:?} failed: {}", key.dataset, error);
                }
            }
        });
        Self {
            cancel,
            refresh_tx,
            task,
        }
    }

    pub async fn refresh_now(&self) {
        let _ = self.refresh_tx.send(()).await;
    }
}

impl Drop for PollingFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn balances_key(address: Option<&str>) -> FeedKey {
        FeedKey::new(Dataset::Balances, address, 1)
    }

    #[tokio::test]
    async fn disabled_key_never_fetches() {
        let cache = SwrCache::<Vec<u32>>::for_dataset(Dataset::Balances);
        let calls = AtomicUsize::new(0);

        let snapshot = cache
            .get_or_fetch(&balances_key(None), &CancelToken::new(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(vec![1])
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(snapshot.data.is_none());
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let cache = Arc::new(SwrCache::<u64>::for_dataset(Dataset::Prices));
        let calls = Arc::new(AtomicUsize::new(0));
        let key = FeedKey::new(Dataset::Prices, None, 1);

        let mut handles = Vec::new();
        for _ in 0..2 {
            let cache = cache.clone();
            let calls = calls.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(&key, &CancelToken::new(), || {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(30)).await;
                            Some(42u64)
                        }
                    })
                    .await
            }));
        }
        for handle in handles {
            let snapshot = handle.await.unwrap();
            assert_eq!(snapshot.data, Some(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_value() {
        // Zero TTL forces a refresh on every call.
        let cache = SwrCache::<String>::new(Duration::ZERO);
        let key = FeedKey::new(Dataset::Gas, None, 1);
        let cancel = CancelToken::new();

        let first = cache
            .get_or_fetch(&key, &cancel, || async { Some("0x12".to_string()) })
            .await;
        assert_eq!(first.data.as_deref(), Some("0x12"));

        let second = cache
            .get_or_fetch(&key, &cancel, || async { None })
            .await;
        assert_eq!(second.data.as_deref(), Some("0x12"));
        assert!(second.error.is_some());
    }

    #[tokio::test]
    async fn cancelled_fetch_is_not_committed() {
        let cache = SwrCache::<u64>::for_dataset(Dataset::Gas);
        let key = FeedKey::new(Dataset::Gas, None, 1);
        let cancel = CancelToken::new();

        let snapshot = cache
            .refresh(&key, &cancel, || {
                let cancel = cancel.clone();
                async move {
                    cancel.cancel();
                    Some(7u64)
                }
            })
            .await;

        assert!(snapshot.data.is_none());
        assert!(cache.cached(&key, Duration::from_secs(60)).await.is_none());
    }

    #[tokio::test]
    async fn refetch_after_expiry_is_idempotent() {
        let cache = SwrCache::<Vec<u64>>::new(Duration::ZERO);
        let key = balances_key(Some("0xAbC"));
        let cancel = CancelToken::new();
        let fetch = || async { Some(vec![1, 2, 3]) };

        let first = cache.get_or_fetch(&key, &cancel, fetch).await;
        let second = cache.get_or_fetch(&key, &cancel, fetch).await;
        assert_eq!(first.data, second.data);
    }

    #[tokio::test]
    async fn slot_cap_prunes_dead_entries_and_their_locks() {
        let cache = SwrCache::<u64>::with_max_entries(Duration::ZERO, 2);
        let cancel = CancelToken::new();

        // Three distinct failing keys push the maps past the cap of 2.
        for i in 0..3 {
            let address = format!("0xfeed{}", i);
            let key = FeedKey::new(Dataset::Balances, Some(&address), 1);
            cache.get_or_fetch(&key, &cancel, || async { None }).await;
        }
        assert!(cache.slots.read().await.len() <= 2);
        assert_eq!(
            cache.fetch_locks.read().await.len(),
            cache.slots.read().await.len()
        );

        let live = FeedKey::new(Dataset::Balances, Some("0xlive"), 1);
        let snapshot = cache
            .get_or_fetch(&live, &cancel, || async { Some(7u64) })
            .await;
        assert_eq!(snapshot.data, Some(7));
        assert!(cache.slots.read().await.contains_key(&live));
    }

    #[tokio::test]
    async fn manual_refresh_wakes_the_warmer() {
        let cache = Arc::new(SwrCache::<u64>::new(Duration::from_secs(60)));
        let key = FeedKey::new(Dataset::Gas, None, 1);
        let calls = Arc::new(AtomicUsize::new(0));

        // Hour-long interval: only the immediate first tick and explicit
        // refresh messages can drive fetches within the test.
        let feed = PollingFeed::spawn(cache.clone(), key.clone(), Duration::from_secs(3600), {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Some(1u64)
                }
            }
        });

        wait_for_calls(&calls, 1).await;
        feed.refresh_now().await;
        wait_for_calls(&calls, 2).await;
    }

    async fn wait_for_calls(calls: &AtomicUsize, at_least: usize) {
        for _ in 0..100 {
            if calls.load(Ordering::SeqCst) >= at_least {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("fetch count never reached {}", at_least);
    }

    #[test]
    fn key_normalizes_address() {
        let key = balances_key(Some("  0xAbC  "));
        assert_eq!(key.address.as_deref(), Some("0xabc"));
        assert!(!key.is_disabled());
        assert!(balances_key(Some("  ")).is_disabled());
    }
}
