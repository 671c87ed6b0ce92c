//! Sequential loader that yields detail records in ascending id order.

use futures::stream::{self, Stream, StreamExt};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{fetch_record, Fetch};
use crate::ident::sort_by_extracted_id;
use crate::models::{IndexEntry, Record};

/// Lazily fetch every entry of `index` as a `T`, one request at a time.
///
/// The index is first sorted by the id embedded in each URL, so items come out
/// in ascending id order whatever order the listing arrived in. Repeated URLs
/// are fetched once and entries whose fetch fails are skipped. The stream ends
/// early once `cancel` fires: it is checked before each request and again when
/// a request returns, and a result that lands after cancellation is dropped.
pub fn stream<T: Record>(
    fetch: Arc<dyn Fetch>,
    mut index: Vec<IndexEntry>,
    cancel: CancellationToken,
) -> impl Stream<Item = T> + Send + 'static {
    let mut urls = HashSet::new();
    index.retain(|e| urls.insert(e.url.clone()));
    sort_by_extracted_id(&mut index, T::KIND.segment());
    let queue: VecDeque<IndexEntry> = index.into();

    stream::unfold((fetch, queue, cancel), |(fetch, mut queue, cancel)| async move {
        loop {
            if cancel.is_cancelled() {
                return None;
            }
            let entry = queue.pop_front()?;
            let result = fetch_record::<T, _>(fetch.as_ref(), &entry.url).await;
            if cancel.is_cancelled() {
                tracing::debug!(kind = %T::KIND, name = %entry.name, "discarding result after cancel");
                return None;
            }
            match result {
                Ok(record) => return Some((record, (fetch, queue, cancel))),
                Err(e) => {
                    tracing::warn!(kind = %T::KIND, name = %entry.name, url = %entry.url, error = %e, "skipping item");
                }
            }
        }
    })
}

fn lock(m: &Mutex<()>) -> MutexGuard<'_, ()> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a loader started with [`spawn`]. Dropping it cancels the load.
#[derive(Debug)]
pub struct StreamHandle {
    cancel: CancellationToken,
    /// Held while a callback runs, so cancelling waits for it to finish.
    delivering: Arc<Mutex<()>>,
    task: Option<JoinHandle<()>>,
}

impl StreamHandle {
    /// Stop before the next fetch. Waits for a callback already running, and
    /// none starts after this returns. Must not be called from inside a
    /// callback of the same loader.
    pub fn cancel(&self) {
        let _delivering = lock(&self.delivering);
        self.cancel.cancel();
    }

    /// The loader's token. Cancelling through it stops further fetches but does
    /// not wait for a running callback; use [`cancel`](Self::cancel) for that.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Wait for the loader task to exit.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "loader task failed");
            }
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Push-style wrapper over [`stream`]: drains it on a tokio task, calling
/// `on_item` per record and `on_done` once at the end unless cancelled.
pub fn spawn<T, I, D>(fetch: Arc<dyn Fetch>, index: Vec<IndexEntry>, mut on_item: I, on_done: D) -> StreamHandle
where
    T: Record,
    I: FnMut(T) + Send + 'static,
    D: FnOnce() + Send + 'static,
{
    let cancel = CancellationToken::new();
    let delivering = Arc::new(Mutex::new(()));
    let token = cancel.clone();
    let gate = delivering.clone();
    let task = tokio::spawn(async move {
        let items = stream::<T>(fetch, index, token.clone());
        futures::pin_mut!(items);
        while let Some(item) = items.next().await {
            let _delivering = lock(&gate);
            if token.is_cancelled() {
                return;
            }
            on_item(item);
        }
        let _delivering = lock(&gate);
        if !token.is_cancelled() {
            on_done();
        }
    });

    StreamHandle {
        cancel,
        delivering,
        task: Some(task),
    }
}
