//! Shared, paginated client list
//!
//! [`ClientListStore`] owns the filters and loaded pages of the client list so
//! several views can observe one consistent state. Views subscribe through a
//! [`tokio::sync::watch`] channel. Every fetch takes a request token, and a
//! response is applied only while its token is still the latest, so a slow
//! response can never overwrite the result of a newer search or a reset.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error};

use crate::error::Result;
use crate::models::{Client, ClientFilter, ClientFilterPatch, ClientPage};

/// Where the store loads client pages from. [`crate::Repository`] is the
/// production implementation.
#[async_trait]
pub trait ClientSource: Send + Sync {
    async fn list_clients(&self, filter: &ClientFilter) -> Result<ClientPage>;
}

/// Snapshot of the client list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientListState {
    pub clients: Vec<Client>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub has_more: bool,
    pub is_loading: bool,
    pub is_loading_more: bool,
    pub filters: ClientFilter,
}

impl Default for ClientListState {
    fn default() -> Self {
        Self {
            clients: Vec::new(),
            total: 0,
            page: 1,
            total_pages: 0,
            has_more: false,
            is_loading: false,
            is_loading_more: false,
            filters: ClientFilter::default(),
        }
    }
}

impl ClientListState {
    /// Whether any fetch is in flight
    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_loading_more
    }
}

pub struct ClientListStore {
    source: Arc<dyn ClientSource>,
    state: watch::Sender<ClientListState>,
    latest_request: AtomicU64,
}

impl ClientListStore {
    pub fn new(source: Arc<dyn ClientSource>) -> Self {
        let (state, _) = watch::channel(ClientListState::default());
        Self {
            source,
            state,
            latest_request: AtomicU64::new(0),
        }
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<ClientListState> {
        self.state.subscribe()
    }

    /// Current state
    pub fn snapshot(&self) -> ClientListState {
        self.state.borrow().clone()
    }

    /// Merge `patch` into the filters and load a page. With `reset` the page
    /// replaces the list; otherwise it is appended.
    ///
    /// Failures are logged and leave the loaded clients untouched.
    pub async fn fetch(&self, patch: Option<ClientFilterPatch>, reset: bool) {
        let token = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;

        let mut filters = ClientFilter::default();
        self.state.send_modify(|state| {
            if let Some(patch) = &patch {
                state.filters = state.filters.merge(patch);
            }
            if reset {
                state.is_loading = true;
            } else {
                state.is_loading_more = true;
            }
            filters = state.filters.clone();
        });

        let result = self.source.list_clients(&filters).await;

        if self.latest_request.load(Ordering::SeqCst) != token {
            debug!(token, page = filters.page, "discarding superseded client page");
            return;
        }

        self.state.send_modify(|state| {
            match result {
                Ok(page) => {
                    if reset {
                        state.clients = page.data;
                    } else {
                        state.clients.extend(page.data);
                    }
                    state.total = page.total;
                    state.page = page.page;
                    state.total_pages = page.total_pages;
                    state.has_more = page.has_more;
                }
                Err(e) => {
                    error!(error = %e, page = filters.page, "failed to fetch clients");
                }
            }
            state.is_loading = false;
            state.is_loading_more = false;
        });
    }

    /// Append the next page. Does nothing on the last page or while a fetch
    /// is in flight.
    pub async fn load_more(&self) {
        let (next_page, ready) = {
            let state = self.state.borrow();
            (state.page + 1, state.has_more && !state.is_busy())
        };
        if ready {
            self.fetch(Some(ClientFilterPatch::page(next_page)), false)
                .await;
        }
    }

    /// Search from the first page. A blank term clears the search.
    pub async fn search(&self, term: &str) {
        let patch = ClientFilterPatch {
            search: Some(term.trim().to_string()),
            ..ClientFilterPatch::page(1)
        };
        self.fetch(Some(patch), true).await;
    }

    /// Change filters and reload from the first page
    pub async fn update_filters(&self, patch: ClientFilterPatch) {
        let patch = ClientFilterPatch {
            page: Some(1),
            ..patch
        };
        self.fetch(Some(patch), true).await;
    }

    /// Back to the initial state. Responses to fetches started before the
    /// reset are ignored.
    pub fn reset(&self) {
        self.latest_request.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(ClientListState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pagination::{has_more, page_range, total_pages};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use tokio::sync::Notify;

    fn client(id: &str) -> Client {
        serde_json::from_value(json!({ "id": id, "first_name": id })).unwrap()
    }

    /// Serves `total` numbered clients, or fails while `fail` is set
    struct NumberedSource {
        total: u64,
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl NumberedSource {
        fn new(total: u64) -> Arc<Self> {
            Arc::new(Self {
                total,
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl ClientSource for NumberedSource {
        async fn list_clients(&self, filter: &ClientFilter) -> Result<ClientPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::invalid_input("backend unavailable"));
            }
            let (from, to) = page_range(filter.page, filter.limit);
            let data = (from..=to.min(self.total.saturating_sub(1)))
                .filter(|_| self.total > 0)
                .map(|n| client(&format!("c{}", n)))
                .collect();
            let pages = total_pages(self.total, filter.limit);
            Ok(ClientPage {
                data,
                total: self.total,
                page: filter.page,
                total_pages: pages,
                has_more: has_more(filter.page, pages),
            })
        }
    }

    /// Holds the first call until released; echoes the search term as the client id
    #[derive(Default)]
    struct GatedSource {
        gate: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ClientSource for GatedSource {
        async fn list_clients(&self, filter: &ClientFilter) -> Result<ClientPage> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.gate.notified().await;
            }
            let id = filter.search.clone().unwrap_or_default();
            Ok(ClientPage {
                data: vec![client(&id)],
                total: 1,
                page: filter.page,
                total_pages: 1,
                has_more: false,
            })
        }
    }

    async fn wait_for_calls(calls: &AtomicUsize, n: usize) {
        while calls.load(Ordering::SeqCst) < n {
            tokio::task::yield_now().await;
        }
    }

    fn ids(state: &ClientListState) -> Vec<&str> {
        state.clients.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn pages_are_appended_until_exhausted() {
        let source = NumberedSource::new(5);
        let store = ClientListStore::new(source.clone());

        store
            .update_filters(ClientFilterPatch {
                limit: Some(2),
                ..ClientFilterPatch::default()
            })
            .await;
        let state = store.snapshot();
        assert_eq!(ids(&state), ["c0", "c1"]);
        assert_eq!(state.total_pages, 3);
        assert!(state.has_more);

        store.load_more().await;
        store.load_more().await;
        let state = store.snapshot();
        assert_eq!(ids(&state), ["c0", "c1", "c2", "c3", "c4"]);
        assert_eq!(state.page, 3);
        assert!(!state.has_more);

        store.load_more().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failures_keep_loaded_clients() {
        let source = NumberedSource::new(3);
        let store = ClientListStore::new(source.clone());

        store.fetch(None, true).await;
        assert_eq!(store.snapshot().clients.len(), 3);

        source.fail.store(true, Ordering::SeqCst);
        store.search("ann").await;

        let state = store.snapshot();
        assert_eq!(state.clients.len(), 3);
        assert_eq!(state.filters.search.as_deref(), Some("ann"));
        assert!(!state.is_busy());
    }

    #[tokio::test]
    async fn blank_search_clears_term() {
        let store = ClientListStore::new(NumberedSource::new(0));
        store.search("  ann ").await;
        assert_eq!(store.snapshot().filters.search.as_deref(), Some("ann"));

        store.search("   ").await;
        let state = store.snapshot();
        assert_eq!(state.filters.search, None);
        assert_eq!(state.filters.page, 1);
        assert!(state.clients.is_empty());
    }

    #[tokio::test]
    async fn loading_flag_is_visible_to_subscribers() {
        let source = Arc::new(GatedSource::default());
        let store = Arc::new(ClientListStore::new(source.clone()));
        let mut updates = store.subscribe();

        let pending = {
            let store = store.clone();
            tokio::spawn(async move { store.search("ann").await })
        };
        wait_for_calls(&source.calls, 1).await;

        assert!(updates.has_changed().unwrap());
        assert!(updates.borrow_and_update().is_loading);
        assert!(store.snapshot().is_busy());

        store.load_more().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        source.gate.notify_one();
        pending.await.unwrap();
        let state = store.snapshot();
        assert!(!state.is_loading);
        assert_eq!(ids(&state), ["ann"]);
    }

    #[tokio::test]
    async fn superseded_response_is_discarded() {
        let source = Arc::new(GatedSource::default());
        let store = Arc::new(ClientListStore::new(source.clone()));

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.search("slow").await })
        };
        wait_for_calls(&source.calls, 1).await;

        store.search("fast").await;
        source.gate.notify_one();
        slow.await.unwrap();

        let state = store.snapshot();
        assert_eq!(ids(&state), ["fast"]);
        assert_eq!(state.filters.search.as_deref(), Some("fast"));
        assert!(!state.is_busy());
    }

    #[tokio::test]
    async fn reset_ignores_in_flight_fetch() {
        let source = Arc::new(GatedSource::default());
        let store = Arc::new(ClientListStore::new(source.clone()));

        let pending = {
            let store = store.clone();
            tokio::spawn(async move { store.search("late").await })
        };
        wait_for_calls(&source.calls, 1).await;

        store.reset();
        source.gate.notify_one();
        pending.await.unwrap();

        assert_eq!(store.snapshot(), ClientListState::default());
    }
}
