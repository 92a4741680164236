//! Paginated retrieval of whole partitions and tables.

use crate::core::{Entity, Result, StoreError};
use crate::storage::{ContinuationToken, TableHandle};
use futures::Stream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a scan and its caller.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback receiving every entity accumulated so far, once per page.
pub type ProgressFn = Box<dyn FnMut(&[Entity]) + Send>;

/// Parameters of a full scan.
#[derive(Default)]
pub struct ScanOptions {
    pub partition_key: Option<String>,
    /// Stop after the page that reaches this many entities.
    pub take_limit: Option<usize>,
    pub cancel: Option<CancellationToken>,
    pub on_progress: Option<ProgressFn>,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition(mut self, partition_key: &str) -> Self {
        self.partition_key = Some(partition_key.to_string());
        self
    }

    pub fn take_limit(mut self, limit: usize) -> Self {
        self.take_limit = Some(limit);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&[Entity]) + Send + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }
}

pub struct ContinuationScanner;

impl ContinuationScanner {
    /// Fetches pages until the store reports no continuation.
    ///
    /// The first page is always fetched. Cancellation is observed only between
    /// pages, and a take limit ends the scan after the page that reaches it, so
    /// the result may exceed the limit by up to one page.
    pub async fn scan_all(handle: &TableHandle, mut options: ScanOptions) -> Result<Vec<Entity>> {
        tracing::debug!(
            table = %handle.name(),
            partition = ?options.partition_key,
            "scanning table"
        );

        let partition = options.partition_key.as_deref();
        let mut items = Vec::new();
        let mut token: Option<ContinuationToken> = None;

        loop {
            let page = handle.scan_page(partition, token.as_ref()).await?;
            token = page.continuation;
            items.extend(page.entities);

            if let Some(callback) = options.on_progress.as_mut() {
                callback(&items);
            }

            if let Some(limit) = options.take_limit
                && items.len() >= limit
            {
                break;
            }

            let cancelled = options.cancel.as_ref().is_some_and(CancellationToken::is_cancelled);
            if token.is_none() || cancelled {
                break;
            }
        }

        Ok(items)
    }

    /// Lazily yields one page at a time until the scan is exhausted.
    pub fn page_stream<'a>(
        handle: &'a TableHandle,
        partition_key: Option<&'a str>,
    ) -> impl Stream<Item = Result<Vec<Entity>>> + 'a {
        futures::stream::try_unfold(Some(None), move |state: Option<Option<ContinuationToken>>| async move {
            let Some(token) = state else {
                return Ok::<_, StoreError>(None);
            };
            let page = handle.scan_page(partition_key, token.as_ref()).await?;
            let next = page.continuation.map(Some);
            Ok(Some((page.entities, next)))
        })
    }
}
