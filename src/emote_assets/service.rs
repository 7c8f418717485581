//! Emote archival service
//!
//! For each catalog entry the archiver selects one image variant, derives a
//! deterministic object key from the entry id, and uploads the bytes unless
//! the key already exists. Every failure drops the entry from the result and
//! is reported through tracing only; nothing is retried.

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use super::fetcher::AssetFetcher;
use super::naming::archive_file_name;
use super::storage::BlobStore;
use super::variant::select_best_variant;
use crate::models::{ArchivedEmote, CatalogEntry, StorageFolder};

/// Archives catalog entries into object storage with bounded parallelism
#[derive(Clone)]
pub struct EmoteArchiver {
    storage: Option<Arc<dyn BlobStore>>,
    fetcher: Arc<dyn AssetFetcher>,
    concurrency: usize,
}

impl EmoteArchiver {
    pub fn new(
        storage: Option<Arc<dyn BlobStore>>,
        fetcher: Arc<dyn AssetFetcher>,
        concurrency: usize,
    ) -> Self {
        Self {
            storage,
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    pub fn storage(&self) -> Option<&Arc<dyn BlobStore>> {
        self.storage.as_ref()
    }

    /// Archive a single entry, returning `None` when anything goes wrong
    pub async fn archive(&self, entry: &CatalogEntry, folder: StorageFolder) -> Option<ArchivedEmote> {
        let storage = self.storage.as_ref()?;
        archive_entry(storage.as_ref(), self.fetcher.as_ref(), entry, folder).await
    }

    /// Archive a batch of entries with at most `concurrency` workers in flight
    ///
    /// Entries sharing an id are archived once. The returned records are in
    /// completion order. Workers that already started finish even if the
    /// caller goes away; cancelling `cancel` only stops new workers starting.
    pub async fn archive_batch(
        &self,
        entries: Vec<CatalogEntry>,
        folder: StorageFolder,
        cancel: CancellationToken,
    ) -> Vec<ArchivedEmote> {
        if entries.is_empty() {
            return Vec::new();
        }
        let Some(storage) = self.storage.clone() else {
            warn!(
                %folder,
                count = entries.len(),
                "Object storage not configured, dropping batch"
            );
            return Vec::new();
        };

        let started = Instant::now();
        let entries = dedupe_by_id(entries);
        let submitted = entries.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = FuturesUnordered::new();

        for entry in entries {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(%folder, "Batch cancelled, not starting remaining workers");
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let storage = storage.clone();
            let fetcher = self.fetcher.clone();
            workers.push(tokio::spawn(async move {
                let _permit = permit;
                archive_entry(storage.as_ref(), fetcher.as_ref(), &entry, folder).await
            }));
        }

        let mut archived = Vec::with_capacity(submitted);
        while let Some(joined) = workers.next().await {
            match joined {
                Ok(Some(record)) => archived.push(record),
                Ok(None) => {}
                Err(e) => error!(%folder, "Archival worker aborted: {}", e),
            }
        }

        debug!(
            %folder,
            submitted,
            archived = archived.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Batch archival completed"
        );
        archived
    }
}

/// Keep the first occurrence of every id, preserving order
fn dedupe_by_id(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.id.clone()))
        .collect()
}

async fn archive_entry(
    storage: &dyn BlobStore,
    fetcher: &dyn AssetFetcher,
    entry: &CatalogEntry,
    folder: StorageFolder,
) -> Option<ArchivedEmote> {
    let Some(variant) = select_best_variant(&entry.variants) else {
        debug!(emote_id = %entry.id, "No usable image variant, skipping");
        return None;
    };

    let animated = variant.is_animated();
    let file_name = archive_file_name(&entry.id, animated, &variant.mime);
    let key = folder.key_for(&file_name);

    let url = match storage.exists(&key).await {
        Ok(true) => {
            trace!(emote_id = %entry.id, key = %key, "Already archived");
            storage.public_url(&key)
        }
        Ok(false) => {
            let data = match fetcher.fetch(&variant.url).await {
                Ok(data) => data,
                Err(e) => {
                    warn!(emote_id = %entry.id, "Image download failed: {}", e);
                    return None;
                }
            };
            match storage.upload(&key, data, variant.mime.as_str()).await {
                Ok(url) => url,
                Err(e) => {
                    warn!(emote_id = %entry.id, key = %key, "Upload failed: {}", e);
                    return None;
                }
            }
        }
        Err(e) => {
            warn!(emote_id = %entry.id, key = %key, "Existence check failed: {}", e);
            return None;
        }
    };

    Some(ArchivedEmote {
        file_name,
        url,
        emote_id: entry.id.clone(),
        emote_name: entry.name.clone(),
        owner: entry.owner.clone(),
        animated,
        scale: Some(variant.scale).filter(|s| *s > 0),
        mime: Some(variant.mime.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emote_assets::storage::ObjectBlobStore;
    use crate::errors::{FetchError, StorageResult};
    use crate::models::{ImageVariant, MimeType};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves fixed bytes for any URL except those containing "broken"
    struct StubFetcher {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
    }

    impl StubFetcher {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl AssetFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.contains("broken") {
                return Err(FetchError::Status {
                    status: 404,
                    url: url.to_string(),
                });
            }
            Ok(Bytes::from_static(b"image-bytes"))
        }
    }

    /// Counts uploads on top of an in-memory store
    struct CountingStore {
        inner: ObjectBlobStore,
        uploads: AtomicUsize,
    }

    #[async_trait]
    impl BlobStore for CountingStore {
        async fn exists(&self, key: &str) -> StorageResult<bool> {
            self.inner.exists(key).await
        }

        async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            self.inner.upload(key, data, content_type).await
        }

        async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
            self.inner.list(prefix).await
        }

        fn public_url(&self, key: &str) -> String {
            self.inner.public_url(key)
        }

        fn backend_name(&self) -> &str {
            "counting"
        }
    }

    fn entry(id: &str, url: &str, frames: u32) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: format!("name-{id}"),
            owner: None,
            variants: vec![ImageVariant::new(url, MimeType::Webp, 4, 128, frames)],
            ranking: None,
        }
    }

    fn setup(delay: Duration, concurrency: usize) -> (EmoteArchiver, Arc<CountingStore>, Arc<StubFetcher>) {
        let store = Arc::new(CountingStore {
            inner: ObjectBlobStore::in_memory("https://cdn.test"),
            uploads: AtomicUsize::new(0),
        });
        let fetcher = Arc::new(StubFetcher::new(delay));
        let archiver = EmoteArchiver::new(
            Some(store.clone() as Arc<dyn BlobStore>),
            fetcher.clone(),
            concurrency,
        );
        (archiver, store, fetcher)
    }

    #[tokio::test]
    async fn test_archive_is_idempotent() {
        let (archiver, store, fetcher) = setup(Duration::ZERO, 4);
        let kappa = entry("60ae/958e", "https://cdn.7tv.app/kappa/4x.webp", 1);

        let first = archiver.archive(&kappa, StorageFolder::EmoteApi).await.unwrap();
        let second = archiver.archive(&kappa, StorageFolder::EmoteApi).await.unwrap();

        assert_eq!(first.file_name, "60ae_958e-8d42269a_static.webp");
        assert_eq!(first.url, "https://cdn.test/emote_api/60ae_958e-8d42269a_static.webp");
        assert_eq!(first.url, second.url);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entry_without_variants_is_dropped() {
        let (archiver, store, _) = setup(Duration::ZERO, 4);
        let mut bare = entry("bare", "unused", 1);
        bare.variants.clear();

        assert!(archiver.archive(&bare, StorageFolder::EmoteApi).await.is_none());
        assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_download_is_dropped() {
        let (archiver, store, _) = setup(Duration::ZERO, 4);
        let broken = entry("x", "https://cdn.7tv.app/broken/4x.webp", 1);

        assert!(archiver.archive(&broken, StorageFolder::TrendingEmotes).await.is_none());
        assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_without_storage_everything_is_dropped() {
        let archiver = EmoteArchiver::new(None, Arc::new(StubFetcher::new(Duration::ZERO)), 4);
        let result = archiver
            .archive_batch(
                vec![entry("a", "u", 1)],
                StorageFolder::EmoteApi,
                CancellationToken::new(),
            )
            .await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_batch_dedupes_ids_and_drops_failures() {
        let (archiver, store, _) = setup(Duration::from_millis(5), 3);
        let entries = vec![
            entry("a", "https://cdn/a.webp", 2),
            entry("b", "https://cdn/broken.webp", 1),
            entry("a", "https://cdn/a-dupe.webp", 1),
            entry("c", "https://cdn/c.webp", 1),
        ];
        let input_ids: HashSet<_> = entries.iter().map(|e| e.id.clone()).collect();

        let archived = archiver
            .archive_batch(entries, StorageFolder::TrendingEmotes, CancellationToken::new())
            .await;

        let ids: Vec<_> = archived.iter().map(|e| e.emote_id.clone()).collect();
        let unique: HashSet<_> = ids.iter().cloned().collect();
        assert_eq!(ids.len(), unique.len());
        assert!(unique.is_subset(&input_ids));
        assert_eq!(unique, HashSet::from(["a".to_string(), "c".to_string()]));
        assert_eq!(store.uploads.load(Ordering::SeqCst), 2);

        let a = archived.iter().find(|e| e.emote_id == "a").unwrap();
        assert!(a.animated);
        assert_eq!(a.file_name, "a_animated.webp");
    }

    #[tokio::test]
    async fn test_batch_respects_concurrency_bound() {
        let (archiver, _, fetcher) = setup(Duration::from_millis(20), 2);
        let entries: Vec<_> = (0..8)
            .map(|i| entry(&format!("e{i}"), &format!("https://cdn/e{i}.webp"), 1))
            .collect();

        let archived = archiver
            .archive_batch(entries, StorageFolder::EmoteApi, CancellationToken::new())
            .await;

        assert_eq!(archived.len(), 8);
        assert!(fetcher.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_cancelled_batch_starts_nothing() {
        let (archiver, store, fetcher) = setup(Duration::ZERO, 2);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let archived = archiver
            .archive_batch(
                vec![entry("a", "https://cdn/a.webp", 1)],
                StorageFolder::EmoteApi,
                cancel,
            )
            .await;

        assert!(archived.is_empty());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_started_workers_outlive_dropped_batch() {
        let delay = Duration::from_millis(100);
        let (archiver, store, fetcher) = setup(delay, 2);
        let entries: Vec<_> = (0..6)
            .map(|i| entry(&format!("e{i}"), &format!("https://cdn/e{i}.webp"), 1))
            .collect();

        // Same shape as a request handler: the guard cancels on drop
        let batch = tokio::spawn(async move {
            let cancel = CancellationToken::new();
            let _guard = cancel.clone().drop_guard();
            archiver
                .archive_batch(entries, StorageFolder::EmoteApi, cancel)
                .await
        });

        tokio::time::timeout(Duration::from_secs(5), async {
            while fetcher.calls.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
        batch.abort();
        assert!(batch.await.unwrap_err().is_cancelled());

        tokio::time::sleep(delay * 3).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 2);
        let keys = store.inner.list("emote_api/").await.unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_drops_are_logged() {
        let (archiver, _, _) = setup(Duration::ZERO, 1);
        let broken = entry("x", "https://cdn/broken.webp", 1);
        assert!(archiver.archive(&broken, StorageFolder::EmoteApi).await.is_none());
        assert!(logs_contain("Image download failed"));
    }
}
