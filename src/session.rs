//! Listing sessions: the owners of per-listing load state.
//!
//! A session lives from the first index fetch until completion or until the
//! view that owns it goes away. Nothing here is shared between sessions.

use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

use crate::api::{fetch_index, Fetch, ResourceKind, FULL_INDEX_LIMIT};
use crate::collection::{Accumulated, SeenIdentitySet};
use crate::error::{CatalogError, Result};
use crate::loader::{self, GroupPage};
use crate::models::{GroupedResult, IndexEntry, Pokemon, Record};

/// Progress counters shown by the loading gauge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchState {
    pub in_progress: bool,
    pub fetched: usize,
    pub total: usize,
}

impl FetchState {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.fetched as f64 / self.total as f64).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The index could not be loaded; the session shows no results.
    Failed(String),
}

/// Where a session fetches its index from.
#[derive(Clone)]
pub struct Source {
    pub fetch: Arc<dyn Fetch>,
    pub base_url: String,
    /// Optional cap on the pokemon listing; every other kind is fetched whole.
    pub pokemon_limit: Option<usize>,
}

impl Source {
    pub fn new(fetch: Arc<dyn Fetch>, base_url: impl Into<String>) -> Self {
        Self {
            fetch,
            base_url: base_url.into(),
            pokemon_limit: None,
        }
    }

    pub fn with_pokemon_limit(mut self, limit: Option<usize>) -> Self {
        self.pokemon_limit = limit;
        self
    }

    /// `limit` requested for `kind`'s index.
    pub fn limit_for(&self, kind: ResourceKind) -> usize {
        match (kind, self.pokemon_limit) {
            (ResourceKind::Pokemon, Some(cap)) => cap,
            _ => FULL_INDEX_LIMIT,
        }
    }

    pub async fn index(&self, kind: ResourceKind) -> Result<Vec<IndexEntry>> {
        fetch_index(self.fetch.as_ref(), &self.base_url, kind, self.limit_for(kind))
            .await
            .map_err(|source| CatalogError::Index { kind, source })
    }
}

#[derive(Debug)]
struct Shared<T> {
    items: Accumulated<T>,
    state: FetchState,
    status: SessionStatus,
    /// Bumped on every change so views can skip redundant refilters.
    revision: u64,
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self {
            items: Accumulated::default(),
            state: FetchState::default(),
            status: SessionStatus::Idle,
            revision: 0,
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A flat listing filled in the background by the progressive loader.
pub struct ListingSession<T> {
    source: Source,
    shared: Arc<Mutex<Shared<T>>>,
    cancel: CancellationToken,
    /// Set by the first `start`/`load` of a lifecycle; only `restart` clears it.
    started: bool,
}

impl<T: Record> ListingSession<T> {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            shared: Arc::new(Mutex::new(Shared::default())),
            cancel: CancellationToken::new(),
            started: false,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        T::KIND
    }

    /// Start loading on a background task. Has no effect if already started;
    /// use [`restart`](Self::restart) to begin a new lifecycle.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let cancel = self.cancel.clone();
        let source = self.source.clone();
        let shared = self.shared.clone();
        tokio::spawn(async move {
            // failures are recorded in the session status
            let _ = drive(source, shared, cancel).await;
        });
    }

    /// Load to completion on the current task. A no-op once this lifecycle
    /// has started, even if it was cancelled.
    pub async fn load(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        drive(self.source.clone(), self.shared.clone(), self.cancel.clone()).await
    }

    /// Drop all state and start over with a fresh index fetch.
    pub fn restart(&mut self) {
        self.cancel();
        self.cancel = CancellationToken::new();
        self.shared = Arc::new(Mutex::new(Shared::default()));
        self.started = false;
        self.start();
    }

    /// Stop the background load; collected items stay visible. Only
    /// [`restart`](Self::restart) loads again.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        let mut shared = lock(&self.shared);
        if shared.status == SessionStatus::Loading {
            shared.status = SessionStatus::Ready;
            shared.state.in_progress = false;
            shared.revision += 1;
        }
    }

    pub fn status(&self) -> SessionStatus {
        lock(&self.shared).status.clone()
    }

    pub fn progress(&self) -> FetchState {
        lock(&self.shared).state.clone()
    }

    pub fn revision(&self) -> u64 {
        lock(&self.shared).revision
    }

    /// Read the accumulated collection under the session lock.
    pub fn view<R>(&self, f: impl FnOnce(&Accumulated<T>) -> R) -> R {
        f(&lock(&self.shared).items)
    }

    pub fn len(&self) -> usize {
        lock(&self.shared).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for ListingSession<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn drive<T: Record>(
    source: Source,
    shared: Arc<Mutex<Shared<T>>>,
    cancel: CancellationToken,
) -> Result<()> {
    {
        let mut s = lock(&shared);
        s.status = SessionStatus::Loading;
        s.state.in_progress = true;
        s.revision += 1;
    }

    let index = match source.index(T::KIND).await {
        Ok(index) => index,
        Err(e) => {
            tracing::error!(kind = %T::KIND, error = %e, "index fetch failed");
            if !cancel.is_cancelled() {
                let mut s = lock(&shared);
                s.status = SessionStatus::Failed(e.to_string());
                s.state.in_progress = false;
                s.revision += 1;
            }
            return Err(e);
        }
    };
    lock(&shared).state.total = index.len();
    tracing::info!(kind = %T::KIND, total = index.len(), "streaming details");

    let items = loader::stream::<T>(source.fetch.clone(), index, cancel.clone());
    futures::pin_mut!(items);
    while let Some(item) = items.next().await {
        let mut s = lock(&shared);
        if cancel.is_cancelled() {
            return Ok(());
        }
        if s.items.insert(item) {
            s.state.fetched += 1;
            s.revision += 1;
        }
    }

    if !cancel.is_cancelled() {
        let mut s = lock(&shared);
        s.status = SessionStatus::Ready;
        s.state.in_progress = false;
        s.revision += 1;
        tracing::info!(kind = %T::KIND, loaded = s.items.len(), total = s.state.total, "listing complete");
    }
    Ok(())
}

/// Species → forms listing loaded one batch at a time on demand.
pub struct GroupedSession {
    source: Source,
    batch_size: usize,
    index: Option<Vec<IndexEntry>>,
    /// Set when the index fetch failed; later calls report it without refetching.
    index_error: Option<String>,
    offset: usize,
    seen: SeenIdentitySet,
    groups: Vec<GroupedResult<Pokemon>>,
    cancel: CancellationToken,
}

impl GroupedSession {
    pub fn new(source: Source, batch_size: usize) -> Self {
        Self {
            source,
            batch_size: batch_size.max(1),
            index: None,
            index_error: None,
            offset: 0,
            seen: SeenIdentitySet::new(),
            groups: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Load the next batch, fetching the species index on first use.
    ///
    /// Returns the page just loaded. An empty page does not mean the end; use
    /// [`is_exhausted`](Self::is_exhausted). A failed index fetch is final for
    /// this session: later calls return [`CatalogError::IndexUnavailable`].
    pub async fn load_more(&mut self) -> Result<GroupPage> {
        const KIND: ResourceKind = ResourceKind::PokemonSpecies;
        if let Some(reason) = &self.index_error {
            return Err(CatalogError::IndexUnavailable {
                kind: KIND,
                reason: reason.clone(),
            });
        }
        if self.index.is_none() {
            match self.source.index(KIND).await {
                Ok(index) => self.index = Some(index),
                Err(e) => {
                    self.index_error = Some(e.to_string());
                    return Err(e);
                }
            }
        }
        let index = self.index.as_deref().unwrap_or_default();
        let page = loader::load_groups_until(
            self.source.fetch.as_ref(),
            index,
            self.offset,
            self.batch_size,
            &mut self.seen,
            &self.cancel,
        )
        .await;
        self.offset = page.next_offset;
        self.groups.extend(page.groups.iter().cloned());
        Ok(page)
    }

    /// True once every species in the index has been examined.
    pub fn is_exhausted(&self) -> bool {
        self.index
            .as_ref()
            .is_some_and(|index| self.offset >= index.len())
    }

    pub fn groups(&self) -> &[GroupedResult<Pokemon>] {
        &self.groups
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn total(&self) -> Option<usize> {
        self.index.as_ref().map(Vec::len)
    }

    pub fn seen(&self) -> &SeenIdentitySet {
        &self.seen
    }

    /// Token that stops a running batch before its next species.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Snapshot of a [`GroupedListing`] for rendering.
#[derive(Debug, Clone, Default)]
pub struct GroupedView {
    pub groups: Vec<GroupedResult<Pokemon>>,
    pub loading: bool,
    pub exhausted: bool,
    pub error: Option<String>,
    pub examined: usize,
    pub total: usize,
    /// Bumped after every finished batch.
    pub revision: u64,
}

/// Background driver for a [`GroupedSession`]: the view calls
/// [`request_more`](Self::request_more) whenever it wants another batch.
///
/// Dropping the listing stops a batch in flight before its next species.
pub struct GroupedListing {
    session: Arc<tokio::sync::Mutex<GroupedSession>>,
    view: Arc<Mutex<GroupedView>>,
    cancel: CancellationToken,
}

impl GroupedListing {
    pub fn new(session: GroupedSession) -> Self {
        let cancel = session.cancel_token();
        Self {
            session: Arc::new(tokio::sync::Mutex::new(session)),
            view: Arc::new(Mutex::new(GroupedView::default())),
            cancel,
        }
    }

    /// Spawn the next batch unless one is running or there is nothing left.
    /// Returns whether a batch was started.
    pub fn request_more(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        {
            let mut view = lock(&self.view);
            if view.loading || view.exhausted || view.error.is_some() {
                return false;
            }
            view.loading = true;
        }
        let session = self.session.clone();
        let view = self.view.clone();
        tokio::spawn(async move {
            let mut session = session.lock().await;
            let result = session.load_more().await;
            let mut v = lock(&view);
            v.loading = false;
            v.revision += 1;
            match result {
                Ok(_) => {
                    v.groups = session.groups().to_vec();
                    v.exhausted = session.is_exhausted();
                    v.examined = session.offset();
                    v.total = session.total().unwrap_or(0);
                }
                Err(e) => {
                    tracing::error!(error = %e, "grouped listing failed");
                    v.error = Some(e.to_string());
                }
            }
        });
        true
    }

    pub fn revision(&self) -> u64 {
        lock(&self.view).revision
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.view).loading
    }

    pub fn snapshot(&self) -> GroupedView {
        lock(&self.view).clone()
    }
}

impl Drop for GroupedListing {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
