//! Read-through loader with an explicit loading/error/data state machine.
//!
//! ```text
//! idle ──activate──▶ loading ──ok──▶ ready
//!                       ▲   └─err──▶ failed
//!                       └──refetch── ready | failed
//! ```
//!
//! Every `refetch` issues a new fetch; nothing in flight is cancelled. With
//! [`ResolutionOrder::LastResolved`] the response that *arrives* last wins,
//! even if it was issued first. [`ResolutionOrder::LatestIssued`] tags each
//! fetch with a generation and drops responses from superseded fetches.

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;

type BoxedFetch<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;
type FetchFn<T> = dyn Fn() -> BoxedFetch<T> + Send + Sync;

/// Snapshot of a loader.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> ResourceState<T> {
    pub fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        if self.loading {
            LoadPhase::Loading
        } else if self.error.is_some() {
            LoadPhase::Failed
        } else if self.data.is_some() {
            LoadPhase::Ready
        } else {
            LoadPhase::Idle
        }
    }
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Not activated yet.
    Idle,
    Loading,
    /// Settled with data.
    Ready,
    /// Settled with an error; `data` still holds the last good value, if any.
    Failed,
}

/// Which of several overlapping fetches determines the final state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionOrder {
    /// Apply every response as it arrives; the last to resolve wins.
    #[default]
    LastResolved,
    /// Only apply the response of the most recently issued fetch.
    LatestIssued,
}

struct Inner<T> {
    fetch: Box<FetchFn<T>>,
    state: watch::Sender<ResourceState<T>>,
    order: ResolutionOrder,
    issued: AtomicU64,
    activated: AtomicBool,
}

impl<T> Inner<T> {
    fn settle(&self, generation: u64, result: Result<T, String>) {
        if self.order == ResolutionOrder::LatestIssued
            && generation != self.issued.load(Ordering::SeqCst)
        {
            tracing::debug!(generation, "discarding response from superseded fetch");
            return;
        }

        self.state.send_modify(|state| {
            state.loading = false;
            match result {
                Ok(data) => {
                    state.data = Some(data);
                    state.error = None;
                }
                Err(message) => {
                    tracing::warn!(generation, error = %message, "resource fetch failed");
                    state.error = Some(message);
                }
            }
        });
    }
}

/// Generic read-through loader around a fetch operation.
///
/// Cheap to clone; clones share state. Fetches run as Tokio tasks, so
/// `activate` and `refetch` must be called from within a Tokio runtime.
pub struct ResourceLoader<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ResourceLoader<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> ResourceLoader<T>
where
    T: Send + Sync + 'static,
{
    pub fn new<F, Fut, E>(fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + 'static,
    {
        Self::with_order(ResolutionOrder::default(), fetch)
    }

    pub fn with_order<F, Fut, E>(order: ResolutionOrder, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + 'static,
    {
        let fetch: Box<FetchFn<T>> = Box::new(move || {
            let fut = fetch();
            Box::pin(async move { fut.await.map_err(|e| e.to_string()) })
        });
        let (state, _) = watch::channel(ResourceState::idle());

        Self {
            inner: Arc::new(Inner {
                fetch,
                state,
                order,
                issued: AtomicU64::new(0),
                activated: AtomicBool::new(false),
            }),
        }
    }

    /// Issue the initial fetch. Only the first call does anything.
    pub fn activate(&self) -> Option<JoinHandle<()>> {
        if self.inner.activated.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.start_fetch())
    }

    /// Enter `loading` and issue a new fetch, regardless of any in flight.
    pub fn refetch(&self) -> JoinHandle<()> {
        self.inner.activated.store(true, Ordering::SeqCst);
        self.start_fetch()
    }

    fn start_fetch(&self) -> JoinHandle<()> {
        let generation = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_modify(|state| state.loading = true);

        let fut = (self.inner.fetch)();
        let inner: Weak<Inner<T>> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            let result = fut.await;
            match inner.upgrade() {
                Some(inner) => inner.settle(generation, result),
                None => tracing::debug!(generation, "loader dropped before fetch resolved"),
            }
        })
    }

    pub fn is_activated(&self) -> bool {
        self.inner.activated.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> LoadPhase {
        self.inner.state.borrow().phase()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.inner.state.subscribe()
    }
}

impl<T> ResourceLoader<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Current state snapshot.
    pub fn state(&self) -> ResourceState<T> {
        self.inner.state.borrow().clone()
    }
}
