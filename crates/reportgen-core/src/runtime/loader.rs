//! On-demand step loading with a bounded cache and shared in-flight fetches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reportgen_proto::{ManifestItem, Step};
use tracing::{debug, warn};

use super::cache::StepCache;
use super::error::{FetchError, LoadError, ValidationError};
use super::source::ChunkSource;
use crate::config::ViewerConfig;

type FetchResult = Result<Arc<[Step]>, FetchError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Load state of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotRequested,
    Loading,
    Cached,
    /// The last fetch failed. The next request fetches again.
    Failed(FetchError),
}

struct LoaderState {
    cache: StepCache<usize, Arc<[Step]>>,
    in_flight: HashMap<usize, SharedFetch>,
    failures: HashMap<usize, FetchError>,
}

/// Loads item steps from a [`ChunkSource`] on demand.
///
/// Cloning a loader is cheap and clones share the cache and in-flight set.
pub struct StepLoader<S> {
    items: Arc<[ManifestItem]>,
    source: Arc<S>,
    state: Arc<Mutex<LoaderState>>,
    timeout: Duration,
}

impl<S> Clone for StepLoader<S> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            source: Arc::clone(&self.source),
            state: Arc::clone(&self.state),
            timeout: self.timeout,
        }
    }
}

impl<S: ChunkSource + 'static> StepLoader<S> {
    pub fn new(items: Vec<ManifestItem>, source: S, config: &ViewerConfig) -> Self {
        Self {
            items: items.into(),
            source: Arc::new(source),
            state: Arc::new(Mutex::new(LoaderState {
                cache: StepCache::new(config.cache_capacity),
                in_flight: HashMap::new(),
                failures: HashMap::new(),
            })),
            timeout: config.fetch_timeout(),
        }
    }

    /// Returns the steps of item `index`, fetching its chunk if needed.
    ///
    /// A request for an item that is already loading waits on the fetch in
    /// progress instead of starting another. Items without steps resolve to
    /// an empty sequence without fetching. A caller that stops waiting does
    /// not cancel the fetch; its result still lands in the cache.
    ///
    /// Fetches are spawned, so this must run inside a Tokio runtime.
    pub async fn load_steps(&self, index: usize) -> Result<Arc<[Step]>, LoadError> {
        let item = self.items.get(index).ok_or(ValidationError::UnknownItem {
            index,
            count: self.items.len(),
        })?;
        let Some(chunk_ref) = item.steps_file() else {
            return Ok(Arc::from(Vec::new()));
        };

        let fetch = {
            let mut state = lock(&self.state);
            if let Some(steps) = state.cache.get(&index) {
                debug!("Steps for item {} served from cache", index);
                return Ok(Arc::clone(steps));
            }
            if let Some(fetch) = state.in_flight.get(&index) {
                debug!("Joining in-flight fetch for item {}", index);
                fetch.clone()
            } else {
                let fetch = self.start_fetch(index, chunk_ref);
                state.failures.remove(&index);
                state.in_flight.insert(index, fetch.clone());
                fetch
            }
        };

        Ok(fetch.await?)
    }

    // The fetch runs as its own task and records its outcome there, so it
    // completes and the in-flight entry is cleared even when every caller
    // stops waiting.
    fn start_fetch(&self, index: usize, chunk_ref: &str) -> SharedFetch {
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let chunk_ref = chunk_ref.to_string();
        let timeout = self.timeout;
        debug!("Fetching {} for item {}", chunk_ref, index);

        let task = {
            let state = Arc::clone(&state);
            let chunk_ref = chunk_ref.clone();
            tokio::spawn(async move {
                let fetched = tokio::time::timeout(timeout, source.fetch(&chunk_ref)).await;
                let outcome: FetchResult = match fetched {
                    Ok(Ok(steps)) => Ok(Arc::from(steps)),
                    Ok(Err(err)) => Err(err),
                    Err(_) => Err(FetchError::Timeout {
                        chunk_ref: chunk_ref.clone(),
                        after: timeout,
                    }),
                };
                record_outcome(&state, index, &outcome);
                outcome
            })
        };

        async move {
            match task.await {
                Ok(outcome) => outcome,
                // The task panicked or was cancelled before recording anything.
                Err(join_err) => {
                    let outcome: FetchResult = Err(FetchError::transport(&chunk_ref, join_err));
                    record_outcome(&state, index, &outcome);
                    outcome
                }
            }
        }
        .boxed()
        .shared()
    }

    pub fn state(&self, index: usize) -> LoadState {
        let state = lock(&self.state);
        if state.cache.has(&index) {
            LoadState::Cached
        } else if state.in_flight.contains_key(&index) {
            LoadState::Loading
        } else if let Some(err) = state.failures.get(&index) {
            LoadState::Failed(err.clone())
        } else {
            LoadState::NotRequested
        }
    }

    /// Indices of cached items, oldest insertion first.
    pub fn cached_items(&self) -> Vec<usize> {
        lock(&self.state).cache.keys().copied().collect()
    }
}

fn record_outcome(state: &Mutex<LoaderState>, index: usize, outcome: &FetchResult) {
    let mut state = lock(state);
    state.in_flight.remove(&index);
    match outcome {
        Ok(steps) => {
            state.failures.remove(&index);
            if let Some(evicted) = state.cache.put(index, Arc::clone(steps)) {
                debug!("Evicted steps of item {} from cache", evicted);
            }
            debug!("Loaded {} steps for item {}", steps.len(), index);
        }
        Err(err) => {
            warn!("Loading steps for item {} failed: {}", index, err);
            state.failures.insert(index, err.clone());
        }
    }
}

fn lock(state: &Mutex<LoaderState>) -> MutexGuard<'_, LoaderState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
