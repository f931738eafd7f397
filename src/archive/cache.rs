//! Archive resource cache with LRU eviction
//!
//! Owns the ordered page list of one reading session and the live resource
//! handles for a bounded window of it. Handles are created lazily on first
//! access and revoked when evicted, pruned or released.
//!
//! Mutation is confined to the session's thread of control, so the cache is
//! a plain value rather than a lock-wrapped shared structure.

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use lru::LruCache;

use super::error::{ArchiveError, ArchiveResult};
use super::extract::{ArchiveEntry, ArchiveExtractor};
use super::types::{is_page_image, PageEntry, ResourceHandle};

/// Default bound on simultaneously live handles
const DEFAULT_WINDOW_SIZE: usize = 5;

/// Default slack kept on each side of the window before revoking
const DEFAULT_PRUNE_BUFFER: usize = 2;

/// Filter entries down to page images, order them by name and index them
pub fn collect_pages(entries: Vec<ArchiveEntry>) -> Vec<PageEntry> {
    let mut pages: Vec<ArchiveEntry> = entries
        .into_iter()
        .filter(|entry| is_page_image(&entry.name))
        .collect();

    // String ordering is byte-wise over UTF-8
    pages.sort_by(|a, b| a.name.cmp(&b.name));

    pages
        .into_iter()
        .enumerate()
        .map(|(index, entry)| PageEntry {
            index,
            name: entry.name,
            bytes: Arc::from(entry.data),
        })
        .collect()
}

pub struct ArchiveResourceCache {
    /// Pages in reading order (immutable once loaded)
    pages: Vec<PageEntry>,
    /// Live handles keyed by page index, least recently used first out
    handles: LruCache<usize, ResourceHandle>,
    /// Slack on each side of the prune window
    prune_buffer: usize,
}

impl Default for ArchiveResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveResourceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW_SIZE, DEFAULT_PRUNE_BUFFER)
    }

    /// Create an empty cache with the given handle bound and prune slack
    pub fn with_window(window_size: usize, prune_buffer: usize) -> Self {
        let cap = NonZeroUsize::new(window_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            pages: Vec::new(),
            handles: LruCache::new(cap),
            prune_buffer,
        }
    }

    /// Create a cache over an already extracted page list
    pub fn from_pages(pages: Vec<PageEntry>, window_size: usize, prune_buffer: usize) -> Self {
        let mut cache = Self::with_window(window_size, prune_buffer);
        cache.pages = pages;
        cache
    }

    /// Extract and index the pages of a container
    ///
    /// Any previously loaded pages are released first. An archive without
    /// page images yields an empty page list, which is not an error.
    pub async fn load(
        &mut self,
        extractor: Arc<dyn ArchiveExtractor>,
        data: Vec<u8>,
    ) -> ArchiveResult<&[PageEntry]> {
        self.release();

        // Offload decompression to the blocking pool
        let entries = tokio::task::spawn_blocking(move || extractor.extract(&data))
            .await
            .map_err(|e| ArchiveError::Extract(format!("Task join error: {}", e)))??;

        let total = entries.len();
        self.pages = collect_pages(entries);

        tracing::info!(
            pages = self.pages.len(),
            skipped = total - self.pages.len(),
            "Loaded comic archive"
        );

        Ok(&self.pages)
    }

    /// Read a container from disk and load it
    pub async fn open_path(
        &mut self,
        extractor: Arc<dyn ArchiveExtractor>,
        path: impl AsRef<Path>,
    ) -> ArchiveResult<&[PageEntry]> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ArchiveError::Fetch(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "Fetched comic archive");

        self.load(extractor, data).await
    }

    pub fn pages(&self) -> &[PageEntry] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&PageEntry> {
        self.pages.get(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get the handle for a page, creating it on first access
    ///
    /// Returns `None` for an index without a page; callers render a blank
    /// slide in that case.
    pub fn get_handle(&mut self, index: usize) -> Option<ResourceHandle> {
        if let Some(handle) = self.handles.get(&index) {
            return Some(handle.clone());
        }

        let Some(entry) = self.pages.get(index) else {
            tracing::debug!(index, "No page entry for handle request");
            return None;
        };

        let handle = ResourceHandle::new(entry);
        tracing::debug!(index, uri = handle.uri(), "Created resource handle");

        if let Some((evicted_index, evicted)) = self.handles.push(index, handle.clone()) {
            self.revoke(evicted_index, &evicted, "evicted");
        }

        Some(handle)
    }

    /// Set the maximum number of simultaneously live handles
    ///
    /// Should cover prefetch-before + prefetch-after + a safety margin.
    /// Shrinking revokes the least recently used handles first.
    pub fn set_window_size(&mut self, size: usize) {
        let cap = NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN);
        while self.handles.len() > cap.get() {
            if let Some((index, handle)) = self.handles.pop_lru() {
                self.revoke(index, &handle, "window shrink");
            }
        }
        self.handles.resize(cap);
    }

    pub fn window_size(&self) -> usize {
        self.handles.cap().get()
    }

    /// Ensure handles for `[active - before, active + after]` and revoke
    /// those outside the window widened by the prune buffer
    pub fn prune_to_window(&mut self, active: usize, before: usize, after: usize) {
        if self.pages.is_empty() {
            return;
        }

        let last = self.pages.len() - 1;
        let active = active.min(last);
        let start = active.saturating_sub(before);
        let end = active.saturating_add(after).min(last);

        let span = end - start + 1;
        if self.window_size() < span {
            tracing::debug!(
                window = self.window_size(),
                span,
                "Growing handle window to cover prefetch range"
            );
            self.set_window_size(span);
        }

        for index in start..=end {
            self.get_handle(index);
        }
        // Active page ends up most recently used
        self.get_handle(active);

        let keep_start = start.saturating_sub(self.prune_buffer);
        let keep_end = end.saturating_add(self.prune_buffer);

        let stale: Vec<usize> = self
            .handles
            .iter()
            .map(|(index, _)| *index)
            .filter(|index| *index < keep_start || *index > keep_end)
            .collect();

        for index in stale {
            if let Some(handle) = self.handles.pop(&index) {
                self.revoke(index, &handle, "outside window");
            }
        }
    }

    /// Indices with a live handle, ascending
    pub fn live_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.handles.iter().map(|(index, _)| *index).collect();
        indices.sort_unstable();
        indices
    }

    /// Live handle count and capacity
    pub fn handle_stats(&self) -> (usize, usize) {
        (self.handles.len(), self.handles.cap().get())
    }

    /// Revoke every live handle and drop the page list
    pub fn release(&mut self) {
        let count = self.handles.len();
        for (_, handle) in self.handles.iter() {
            handle.revoke();
        }
        self.handles.clear();
        self.pages.clear();

        if count > 0 {
            tracing::debug!(count, "Released resource handles");
        }
    }

    fn revoke(&self, index: usize, handle: &ResourceHandle, reason: &'static str) {
        handle.revoke();
        tracing::debug!(index, reason, "Revoked resource handle");
    }
}

impl Drop for ArchiveResourceCache {
    fn drop(&mut self) {
        self.release();
    }
}
