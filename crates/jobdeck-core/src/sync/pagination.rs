//! Paginated collections with infinite-scroll semantics.
//!
//! A collection aggregates consumed pages into one ordered, id-deduplicated
//! sequence plus cursor state. `load` replaces wholesale, `load_more`
//! appends (a no-op while a fetch is in flight or past the last page), and
//! `refresh` re-issues page 1. A failed fetch leaves previously loaded
//! items untouched; the error is surfaced for display next to whatever was
//! already rendered.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::api::ApiResult;
use crate::api::types::{Application, JobPosting, Message, Paginated};

/// Records that can be deduplicated across pages by a stable integer id.
pub trait HasId {
    fn id(&self) -> i64;
}

impl HasId for JobPosting {
    fn id(&self) -> i64 {
        self.id
    }
}

impl HasId for Application {
    fn id(&self) -> i64 {
        self.id
    }
}

impl HasId for Message {
    fn id(&self) -> i64 {
        self.id
    }
}

/// One server-delivered slice of an ordered collection.
#[derive(Debug, Clone)]
pub struct ResultPage<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub total_pages: u32,
}

impl<T> From<Paginated<T>> for ResultPage<T> {
    fn from(envelope: Paginated<T>) -> Self {
        Self {
            items: envelope.data,
            page_number: envelope.meta.current_page,
            total_pages: envelope.meta.last_page,
        }
    }
}

/// Lifecycle of a collection instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionPhase {
    /// Created on screen mount, nothing fetched yet.
    #[default]
    Idle,
    /// First page in flight.
    Loading,
    /// A further page in flight; existing items stay rendered.
    LoadingMore,
    /// Page 1 re-issued; existing items stay rendered until it lands.
    Refreshing,
    /// At least one page consumed, nothing in flight.
    Loaded,
}

impl CollectionPhase {
    fn is_in_flight(self) -> bool {
        matches!(
            self,
            CollectionPhase::Loading | CollectionPhase::LoadingMore | CollectionPhase::Refreshing
        )
    }
}

struct Inner<T> {
    items: Vec<T>,
    seen: HashSet<i64>,
    phase: CollectionPhase,
    current_page: u32,
    total_pages: u32,
}

impl<T: HasId> Inner<T> {
    fn is_last_page_reached(&self) -> bool {
        self.current_page > 0 && self.current_page >= self.total_pages
    }

    /// Settled phase for the items currently held.
    fn settled_phase(&self) -> CollectionPhase {
        if self.current_page == 0 {
            CollectionPhase::Idle
        } else {
            CollectionPhase::Loaded
        }
    }

    fn replace_with(&mut self, page: ResultPage<T>) {
        self.items.clear();
        self.seen.clear();
        for item in page.items {
            if self.seen.insert(item.id()) {
                self.items.push(item);
            }
        }
        self.current_page = page.page_number;
        self.total_pages = page.total_pages;
        self.phase = CollectionPhase::Loaded;
    }

    fn append(&mut self, page: ResultPage<T>) {
        for item in page.items {
            if self.seen.insert(item.id()) {
                self.items.push(item);
            }
        }
        self.current_page = page.page_number;
        self.total_pages = page.total_pages;
        self.phase = CollectionPhase::Loaded;
    }
}

/// Aggregated pages of a server-sourced collection.
pub struct PaginatedCollection<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> Default for PaginatedCollection<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: Vec::new(),
                seen: HashSet::new(),
                phase: CollectionPhase::Idle,
                current_page: 0,
                total_pages: 0,
            }),
        }
    }
}

impl<T> PaginatedCollection<T>
where
    T: HasId + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the aggregated items, in consumption order.
    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn phase(&self) -> CollectionPhase {
        self.lock().phase
    }

    pub fn current_page(&self) -> u32 {
        self.lock().current_page
    }

    pub fn is_last_page_reached(&self) -> bool {
        self.lock().is_last_page_reached()
    }

    /// Loads page 1, replacing the collection wholesale. A no-op while any
    /// fetch is in flight.
    ///
    /// # Errors
    /// Propagates the fetch error; already-loaded items are untouched.
    pub async fn load<F, Fut>(&self, fetch: F) -> ApiResult<()>
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = ApiResult<ResultPage<T>>>,
    {
        {
            let mut inner = self.lock();
            if inner.phase.is_in_flight() {
                return Ok(());
            }
            inner.phase = CollectionPhase::Loading;
        }

        match fetch(1).await {
            Ok(page) => {
                self.lock().replace_with(page);
                Ok(())
            }
            Err(err) => {
                let mut inner = self.lock();
                inner.phase = inner.settled_phase();
                Err(err)
            }
        }
    }

    /// Fetches the next page and appends items not already present.
    ///
    /// A no-op when nothing is loaded yet, a fetch is already in flight
    /// (fast-scroll duplicate suppression), or the last page was reached.
    ///
    /// # Errors
    /// Propagates the fetch error; already-loaded items are untouched.
    pub async fn load_more<F, Fut>(&self, fetch: F) -> ApiResult<()>
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = ApiResult<ResultPage<T>>>,
    {
        let next_page = {
            let mut inner = self.lock();
            if inner.phase != CollectionPhase::Loaded || inner.is_last_page_reached() {
                return Ok(());
            }
            inner.phase = CollectionPhase::LoadingMore;
            inner.current_page + 1
        };

        match fetch(next_page).await {
            Ok(page) => {
                let mut inner = self.lock();
                let before = inner.items.len();
                inner.append(page);
                tracing::debug!(
                    page = next_page,
                    appended = inner.items.len() - before,
                    total = inner.items.len(),
                    "page appended"
                );
                Ok(())
            }
            Err(err) => {
                self.lock().phase = CollectionPhase::Loaded;
                Err(err)
            }
        }
    }

    /// Re-issues page 1 and replaces the collection, resetting the cursor.
    /// A no-op while any fetch is in flight; from `Idle` it behaves like
    /// `load`.
    ///
    /// # Errors
    /// Propagates the fetch error; already-loaded items are untouched.
    pub async fn refresh<F, Fut>(&self, fetch: F) -> ApiResult<()>
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = ApiResult<ResultPage<T>>>,
    {
        {
            let mut inner = self.lock();
            if inner.phase.is_in_flight() {
                return Ok(());
            }
            inner.phase = if inner.current_page == 0 {
                CollectionPhase::Loading
            } else {
                CollectionPhase::Refreshing
            };
        }

        match fetch(1).await {
            Ok(page) => {
                self.lock().replace_with(page);
                Ok(())
            }
            Err(err) => {
                let mut inner = self.lock();
                inner.phase = inner.settled_phase();
                Err(err)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<T>> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
