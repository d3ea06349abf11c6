//! Keeps the dashboard snapshot in step with the record store.
//!
//! Every fetch reads the whole table and rebuilds all derived statistics;
//! store change notifications are batched over a short window and turned
//! into a single refetch.

use crate::errors::DashboardError;
use crate::models::{DashboardData, DashboardPayload, DashboardResponse, DashboardView};
use crate::stats::build_dashboard;
use crate::store::RecordStore;
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::{RwLock, broadcast::error::RecvError},
    task::JoinHandle,
    time::{Instant, timeout_at},
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct FetchState {
    /// Fetches started but not yet finished.
    pub in_flight: usize,
    pub error: Option<String>,
    pub data: Option<Arc<DashboardData>>,
}

impl FetchState {
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Error wins over data. A refetch in progress keeps serving the last
    /// snapshot; `Loading` only shows while nothing has completed yet.
    pub fn view(&self) -> DashboardView {
        match (&self.error, &self.data) {
            (Some(message), _) => DashboardView::Error {
                message: message.clone(),
            },
            (None, Some(data)) => DashboardView::Ready(DashboardPayload::from(data.as_ref())),
            (None, None) => DashboardView::Loading,
        }
    }
}

pub struct Coordinator<S> {
    store: Arc<S>,
    state: RwLock<FetchState>,
    in_flight: AtomicUsize,
}

/// Counts one running fetch; released even when the fetch future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<S: RecordStore> Coordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: RwLock::new(FetchState::default()),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Reads the full table and replaces the snapshot wholesale.
    ///
    /// Overlapping calls are not cancelled; whichever finishes last decides
    /// the final state.
    pub async fn refetch(&self) -> DashboardView {
        let _in_flight = InFlight::enter(&self.in_flight);
        self.state.write().await.error = None;

        let outcome = match self.store.fetch_all().await {
            Ok(records) if records.is_empty() => Err(DashboardError::DataUnavailable),
            Ok(records) => Ok(Arc::new(build_dashboard(records))),
            Err(err) => Err(err),
        };

        let mut state = self.state.write().await;
        match outcome {
            Ok(data) => {
                info!(
                    rows = data.records.len(),
                    categories = data.categories.distinct,
                    "dashboard data refreshed"
                );
                state.error = None;
                state.data = Some(data);
            }
            Err(err) => {
                warn!("dashboard fetch failed: {err}");
                state.error = Some(err.to_string());
                state.data = None;
            }
        }
        state.view()
    }

    pub async fn snapshot(&self) -> FetchState {
        let mut snapshot = self.state.read().await.clone();
        snapshot.in_flight = self.in_flight.load(Ordering::SeqCst);
        snapshot
    }

    /// View plus the in-flight flag, as served on `/api/dashboard`.
    pub async fn status(&self) -> DashboardResponse {
        let snapshot = self.snapshot().await;
        DashboardResponse {
            loading: snapshot.loading(),
            view: snapshot.view(),
        }
    }

    pub async fn view(&self) -> DashboardView {
        self.state.read().await.view()
    }

    /// Latest successful snapshot, or the message explaining why there is none.
    pub async fn data(&self) -> Result<Arc<DashboardData>, String> {
        let state = self.state.read().await;
        match (&state.error, &state.data) {
            (Some(message), _) => Err(message.clone()),
            (None, Some(data)) => Ok(Arc::clone(data)),
            (None, None) => Err("veriler yükleniyor".to_string()),
        }
    }

    /// Subscribes to store changes and refetches after each burst.
    ///
    /// The subscription lives as long as the returned [`Watcher`].
    pub fn watch(self: &Arc<Self>, debounce: Duration) -> Watcher {
        let mut changes = self.store.subscribe();
        let coordinator = Arc::clone(self);

        let handle = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(event) => debug!(kind = ?event.kind, "change notification received"),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "change notifications lagged")
                    }
                    Err(RecvError::Closed) => break,
                }

                let mut closed = false;
                let deadline = Instant::now() + debounce;
                loop {
                    match timeout_at(deadline, changes.recv()).await {
                        Err(_) => break,
                        Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => {}
                        Ok(Err(RecvError::Closed)) => {
                            closed = true;
                            break;
                        }
                    }
                }

                coordinator.refetch().await;
                if closed {
                    break;
                }
            }
            debug!("change watcher stopped");
        });

        Watcher { handle }
    }
}

/// Handle to the change subscription; dropping it unsubscribes.
pub struct Watcher {
    handle: JoinHandle<()>,
}

impl Watcher {
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
