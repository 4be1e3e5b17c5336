//! Upload store: the registry of uploaders and their file records
//!
//! The store is an explicit context object. Construct one per process (or
//! per test) and clone it freely; clones share the same state.
//!
//! Every change to a record goes through [`UploadStore::update`] under a
//! single write guard, so readers never see a half-applied transition, and
//! mutations address records by key so concurrent updates to different
//! records never overwrite each other.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::task::TaskTracker;
use uplift_core::{
    DispatchSettings, FileUploadRecord, LocalFile, StorageConfiguration, StorageCredentials,
    TransitionError,
};

#[cfg(feature = "storage-s3")]
use crate::client_cache::RemoteClientCache;
#[cfg(feature = "dimensions")]
use crate::dimensions::DimensionResolver;
use crate::dispatcher::{self, DispatchJob};
use crate::error::{UploadError, UploadResult};
use crate::keys::{generate_upload_key, MonotonicClock};
use crate::strategy::{DispatchContext, UploadStrategy};
use crate::token::TokenSource;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Record change notification, sent after every applied update
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// A record was added or changed
    Updated {
        uploader_key: String,
        record: FileUploadRecord,
    },
    /// Records left the uploader
    Removed {
        uploader_key: String,
        keys: Vec<String>,
    },
}

impl UploadEvent {
    pub fn uploader_key(&self) -> &str {
        match self {
            UploadEvent::Updated { uploader_key, .. } | UploadEvent::Removed { uploader_key, .. } => {
                uploader_key
            }
        }
    }
}

/// Events describing how `after` differs from `before`.
fn diff_events(
    uploader_key: &str,
    before: &BTreeMap<String, FileUploadRecord>,
    after: &BTreeMap<String, FileUploadRecord>,
) -> Vec<UploadEvent> {
    let mut events: Vec<UploadEvent> = after
        .iter()
        .filter(|(key, record)| before.get(*key) != Some(*record))
        .map(|(_, record)| UploadEvent::Updated {
            uploader_key: uploader_key.to_string(),
            record: record.clone(),
        })
        .collect();

    let removed: Vec<String> = before
        .keys()
        .filter(|key| !after.contains_key(*key))
        .cloned()
        .collect();
    if !removed.is_empty() {
        events.push(UploadEvent::Removed {
            uploader_key: uploader_key.to_string(),
            keys: removed,
        });
    }

    events
}

/// A named destination owning the records of its transfers.
///
/// Values handed out by the store are snapshots; the configuration is fixed
/// for the uploader's lifetime.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Uploader {
    key: String,
    configuration: StorageConfiguration,
    files: BTreeMap<String, FileUploadRecord>,
    created_at: DateTime<Utc>,
    #[serde(skip)]
    strategy: Arc<UploadStrategy>,
}

impl Uploader {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn configuration(&self) -> &StorageConfiguration {
        &self.configuration
    }

    pub fn files(&self) -> &BTreeMap<String, FileUploadRecord> {
        &self.files
    }

    /// Record with the greatest key, i.e. the most recently submitted file.
    pub fn most_recent(&self) -> Option<&FileUploadRecord> {
        self.files.values().next_back()
    }
}

struct StoreInner {
    owner_id: String,
    uploaders: RwLock<HashMap<String, Uploader>>,
    credentials: RwLock<Option<StorageCredentials>>,
    #[cfg(feature = "storage-s3")]
    clients: RemoteClientCache,
    clock: MonotonicClock,
    http: reqwest::Client,
    token_source: Option<Arc<dyn TokenSource>>,
    #[cfg(feature = "dimensions")]
    dimensions: DimensionResolver,
    events: broadcast::Sender<UploadEvent>,
    tasks: TaskTracker,
}

/// Builder for [`UploadStore`]
pub struct UploadStoreBuilder {
    owner_id: String,
    credentials: Option<StorageCredentials>,
    token_source: Option<Arc<dyn TokenSource>>,
    settings: DispatchSettings,
}

impl UploadStoreBuilder {
    pub fn credentials(mut self, credentials: Option<StorageCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn token_source(mut self, token_source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(token_source);
        self
    }

    pub fn settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> UploadResult<UploadStore> {
        let http = reqwest::Client::builder()
            .timeout(self.settings.http_timeout)
            .build()
            .map_err(|e| UploadError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(UploadStore {
            inner: Arc::new(StoreInner {
                owner_id: self.owner_id,
                uploaders: RwLock::new(HashMap::new()),
                credentials: RwLock::new(self.credentials),
                #[cfg(feature = "storage-s3")]
                clients: RemoteClientCache::new(),
                clock: MonotonicClock::new(),
                #[cfg(feature = "dimensions")]
                dimensions: DimensionResolver::new(
                    http.clone(),
                    self.settings.max_dimension_fetch_bytes,
                ),
                http,
                token_source: self.token_source,
                events,
                tasks: TaskTracker::new(),
            }),
        })
    }
}

/// Process-wide registry of uploaders
#[derive(Clone)]
pub struct UploadStore {
    inner: Arc<StoreInner>,
}

impl UploadStore {
    /// Empty store whose keys are namespaced under `owner_id`.
    pub fn new(owner_id: impl Into<String>) -> UploadResult<Self> {
        Self::builder(owner_id).build()
    }

    pub fn builder(owner_id: impl Into<String>) -> UploadStoreBuilder {
        UploadStoreBuilder {
            owner_id: owner_id.into(),
            credentials: None,
            token_source: None,
            settings: DispatchSettings::default(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.inner.owner_id
    }

    /// Replace the credential set used by future credentialed dispatches.
    ///
    /// Transfers already in flight keep the client they started with.
    pub async fn set_credentials(&self, credentials: Option<StorageCredentials>) {
        *self.inner.credentials.write().await = credentials;
    }

    pub async fn credentials(&self) -> Option<StorageCredentials> {
        self.inner.credentials.read().await.clone()
    }

    /// Number of S3 clients constructed by this store's cache.
    #[cfg(feature = "storage-s3")]
    pub fn client_constructions(&self) -> usize {
        self.inner.clients.constructions()
    }

    /// Receive an [`UploadEvent`] for every record change.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.inner.events.subscribe()
    }

    /// Return the uploader for `key`, creating it bound to `configuration`.
    ///
    /// Returns `None` while prerequisites are missing (no usable credentials
    /// for the credentials service, or an empty proxy URL); callers poll
    /// again once configuration becomes available. An existing uploader is
    /// returned as-is, whatever `configuration` is passed.
    pub async fn get_or_create(
        &self,
        key: &str,
        configuration: &StorageConfiguration,
    ) -> Option<Uploader> {
        if let Some(uploader) = self.inner.uploaders.read().await.get(key) {
            return Some(uploader.clone());
        }

        if !self.prerequisites_met(configuration).await {
            tracing::debug!(
                uploader_key = %key,
                service = %configuration.service(),
                "Uploader prerequisites not met"
            );
            return None;
        }

        let mut uploaders = self.inner.uploaders.write().await;
        let uploader = uploaders.entry(key.to_string()).or_insert_with(|| {
            tracing::info!(
                uploader_key = %key,
                service = %configuration.service(),
                "Uploader created"
            );
            Uploader {
                key: key.to_string(),
                configuration: configuration.clone(),
                files: BTreeMap::new(),
                created_at: Utc::now(),
                strategy: Arc::new(UploadStrategy::from_configuration(
                    configuration,
                    self.inner.http.clone(),
                    self.inner.token_source.clone(),
                )),
            }
        });

        Some(uploader.clone())
    }

    async fn prerequisites_met(&self, configuration: &StorageConfiguration) -> bool {
        match configuration {
            StorageConfiguration::PresignedUrl { proxy_base_url } => {
                !proxy_base_url.trim().is_empty()
            }
            StorageConfiguration::Credentials { bucket, .. } => {
                !bucket.trim().is_empty()
                    && self
                        .inner
                        .credentials
                        .read()
                        .await
                        .as_ref()
                        .is_some_and(StorageCredentials::is_complete)
            }
        }
    }

    /// Snapshot of one uploader.
    pub async fn uploader(&self, key: &str) -> Option<Uploader> {
        self.inner.uploaders.read().await.get(key).cloned()
    }

    /// Snapshot of one uploader's records, ordered by key.
    pub async fn files(&self, uploader_key: &str) -> Option<Vec<FileUploadRecord>> {
        self.inner
            .uploaders
            .read()
            .await
            .get(uploader_key)
            .map(|uploader| uploader.files.values().cloned().collect())
    }

    /// Apply `mutation` to an uploader's record map as one atomic update.
    ///
    /// Every added, changed or removed record is announced to subscribers
    /// once the write guard is released.
    pub async fn update<F, T>(&self, uploader_key: &str, mutation: F) -> UploadResult<T>
    where
        F: FnOnce(&mut BTreeMap<String, FileUploadRecord>) -> T,
    {
        let (result, events) = {
            let mut uploaders = self.inner.uploaders.write().await;
            let uploader = uploaders
                .get_mut(uploader_key)
                .ok_or_else(|| UploadError::UploaderNotFound(uploader_key.to_string()))?;
            let before = uploader.files.clone();
            let result = mutation(&mut uploader.files);
            (result, diff_events(uploader_key, &before, &uploader.files))
        };

        for event in events {
            self.publish(event);
        }
        Ok(result)
    }

    /// Mutate a single record and announce the result.
    pub async fn update_record<F>(
        &self,
        uploader_key: &str,
        record_key: &str,
        mutation: F,
    ) -> UploadResult<FileUploadRecord>
    where
        F: FnOnce(&mut FileUploadRecord) -> Result<(), TransitionError>,
    {
        let record = self
            .update(uploader_key, |files| {
                let record = files
                    .get_mut(record_key)
                    .ok_or_else(|| UploadError::RecordNotFound(record_key.to_string()))?;
                mutation(record)?;
                Ok::<_, UploadError>(record.clone())
            })
            .await??;

        Ok(record)
    }

    fn publish(&self, event: UploadEvent) {
        // No receivers is fine
        let _ = self.inner.events.send(event);
    }

    /// Seed a record per file and start one independent transfer for each.
    ///
    /// Returns the generated keys once every record is `loading`; transfer
    /// outcomes land on the records later and never fail this call.
    pub async fn upload_files(
        &self,
        uploader_key: &str,
        files: Vec<LocalFile>,
    ) -> UploadResult<Vec<String>> {
        let credentials = self.credentials().await;

        let (strategy, seeded) = {
            let mut uploaders = self.inner.uploaders.write().await;
            let uploader = uploaders
                .get_mut(uploader_key)
                .ok_or_else(|| UploadError::UploaderNotFound(uploader_key.to_string()))?;

            let mut seeded = Vec::with_capacity(files.len());
            for file in files {
                let key = generate_upload_key(
                    &self.inner.owner_id,
                    self.inner.clock.next(),
                    &file.name,
                );
                let record = FileUploadRecord::new(key.clone(), file.source());
                uploader.files.insert(key.clone(), record.clone());
                seeded.push((record, file));
            }

            (Arc::clone(&uploader.strategy), seeded)
        };

        for (record, _) in &seeded {
            self.publish(UploadEvent::Updated {
                uploader_key: uploader_key.to_string(),
                record: record.clone(),
            });
        }

        let context = self.dispatch_context(&strategy, credentials.as_ref());

        let mut keys = Vec::with_capacity(seeded.len());
        for (record, file) in seeded {
            let key = record.key().to_string();
            match self
                .update_record(uploader_key, &key, FileUploadRecord::start)
                .await
            {
                Ok(_) => {}
                Err(UploadError::RecordNotFound(_)) => {
                    // Cleared before hand-off; nothing to dispatch
                    continue;
                }
                Err(e) => return Err(e),
            }

            let job = DispatchJob {
                store: self.clone(),
                uploader_key: uploader_key.to_string(),
                key: key.clone(),
                file,
                strategy: Arc::clone(&strategy),
                context: context.clone(),
            };
            self.inner.tasks.spawn(dispatcher::dispatch(job));
            keys.push(key);
        }

        tracing::info!(
            uploader_key = %uploader_key,
            service = %strategy.service(),
            file_count = keys.len(),
            "Upload batch dispatched"
        );

        Ok(keys)
    }

    #[cfg(feature = "storage-s3")]
    fn dispatch_context(
        &self,
        strategy: &UploadStrategy,
        credentials: Option<&StorageCredentials>,
    ) -> DispatchContext {
        let client = match (strategy, credentials) {
            (UploadStrategy::Credentialed(credentialed), Some(credentials))
                if credentials.is_complete() =>
            {
                Some(self.inner.clients.acquire(credentials, credentialed.region()))
            }
            _ => None,
        };
        DispatchContext { client }
    }

    #[cfg(not(feature = "storage-s3"))]
    fn dispatch_context(
        &self,
        _strategy: &UploadStrategy,
        _credentials: Option<&StorageCredentials>,
    ) -> DispatchContext {
        DispatchContext::default()
    }

    /// Spawn the dimension lookup for a successful image upload.
    #[cfg(feature = "dimensions")]
    pub(crate) fn spawn_dimension_lookup(&self, uploader_key: String, key: String, url: String) {
        let store = self.clone();
        self.inner.tasks.spawn(async move {
            match store.inner.dimensions.resolve(&url).await {
                Ok(dimensions) => {
                    match store
                        .update_record(&uploader_key, &key, |record| {
                            record.set_dimensions(dimensions)
                        })
                        .await
                    {
                        Ok(_) => tracing::debug!(
                            uploader_key = %uploader_key,
                            key = %key,
                            width = dimensions.width,
                            height = dimensions.height,
                            "Image dimensions resolved"
                        ),
                        Err(e) => tracing::debug!(
                            uploader_key = %uploader_key,
                            key = %key,
                            error = %e,
                            "Dropping image dimensions"
                        ),
                    }
                }
                Err(e) => tracing::warn!(
                    uploader_key = %uploader_key,
                    key = %key,
                    url = %url,
                    error = %e,
                    "Failed to resolve image dimensions"
                ),
            }
        });
    }

    #[cfg(not(feature = "dimensions"))]
    pub(crate) fn spawn_dimension_lookup(&self, _uploader_key: String, _key: String, _url: String) {}

    /// Empty an uploader's records; the uploader itself stays.
    pub async fn clear(&self, uploader_key: &str) -> UploadResult<()> {
        let removed = self
            .update(uploader_key, |files| {
                let count = files.len();
                files.clear();
                count
            })
            .await?;

        tracing::info!(uploader_key = %uploader_key, removed, "Uploader cleared");
        Ok(())
    }

    /// Remove every record whose remote URL equals `url`.
    ///
    /// Records without a URL (not yet successful) are never removed.
    pub async fn remove_by_url(&self, uploader_key: &str, url: &str) -> UploadResult<usize> {
        let removed = self
            .update(uploader_key, |files| {
                let before = files.len();
                files.retain(|_, record| record.remote_url() != Some(url));
                before - files.len()
            })
            .await?;

        tracing::debug!(uploader_key = %uploader_key, url = %url, removed, "Removed records by URL");
        Ok(removed)
    }

    /// Most recently submitted record, if any.
    pub async fn get_most_recent(&self, uploader_key: &str) -> UploadResult<Option<FileUploadRecord>> {
        let uploaders = self.inner.uploaders.read().await;
        let uploader = uploaders
            .get(uploader_key)
            .ok_or_else(|| UploadError::UploaderNotFound(uploader_key.to_string()))?;
        Ok(uploader.most_recent().cloned())
    }

    /// Wait until every transfer and dimension lookup spawned so far is done.
    pub async fn idle(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.inner.tasks.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;
    use uplift_core::UploadStatus;

    fn presigned() -> StorageConfiguration {
        StorageConfiguration::presigned_url("http://127.0.0.1:9")
    }

    async fn seed(store: &UploadStore, uploader_key: &str, records: &[(&str, Option<&str>)]) {
        store
            .update(uploader_key, |files| {
                for (key, url) in records {
                    let mut record = FileUploadRecord::new(
                        key.to_string(),
                        LocalFile::new("f.png", "image/png", Vec::<u8>::new()).source(),
                    );
                    if let Some(url) = url {
                        record.start().unwrap();
                        record.succeed(url.to_string()).unwrap();
                    }
                    files.insert(key.to_string(), record);
                }
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = UploadStore::new("owner").unwrap();
        let first = store.get_or_create("chat", &presigned()).await.unwrap();

        let other = StorageConfiguration::presigned_url("https://other.example");
        let second = store.get_or_create("chat", &other).await.unwrap();

        assert_eq!(first.configuration(), second.configuration());
        assert_eq!(second.configuration(), &presigned());
    }

    #[tokio::test]
    async fn test_prerequisites_gate_creation() {
        let store = UploadStore::new("owner").unwrap();

        let empty_proxy = StorageConfiguration::presigned_url("  ");
        assert!(store.get_or_create("a", &empty_proxy).await.is_none());

        let direct = StorageConfiguration::credentials("att", None);
        assert!(store.get_or_create("b", &direct).await.is_none());

        store
            .set_credentials(Some(StorageCredentials::new("id", "secret", None)))
            .await;
        assert!(store.get_or_create("b", &direct).await.is_some());
        assert!(store.uploader("a").await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_uploader_errors() {
        let store = UploadStore::new("owner").unwrap();

        let result = store.upload_files("missing", Vec::new()).await;
        assert!(matches!(result, Err(UploadError::UploaderNotFound(_))));
        assert!(store.clear("missing").await.is_err());
        assert!(store.get_most_recent("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_most_recent_follows_key_order() {
        let store = UploadStore::new("owner").unwrap();
        store.get_or_create("chat", &presigned()).await.unwrap();
        assert!(store.get_most_recent("chat").await.unwrap().is_none());

        seed(
            &store,
            "chat",
            &[
                ("owner/0000000000002-b.png", None),
                ("owner/0000000000001-a.png", None),
            ],
        )
        .await;

        let recent = store.get_most_recent("chat").await.unwrap().unwrap();
        assert_eq!(recent.key(), "owner/0000000000002-b.png");
    }

    #[tokio::test]
    async fn test_remove_by_url_only_matching_records() {
        let store = UploadStore::new("owner").unwrap();
        store.get_or_create("chat", &presigned()).await.unwrap();
        seed(
            &store,
            "chat",
            &[
                ("owner/0000000000001-a.png", Some("https://cdn.example/x")),
                ("owner/0000000000002-b.png", Some("https://cdn.example/x")),
                ("owner/0000000000003-c.png", Some("https://cdn.example/y")),
                ("owner/0000000000004-d.png", None),
            ],
        )
        .await;

        let removed = store
            .remove_by_url("chat", "https://cdn.example/x")
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let keys: Vec<String> = store
            .files("chat")
            .await
            .unwrap()
            .iter()
            .map(|r| r.key().to_string())
            .collect();
        assert_eq!(
            keys,
            vec!["owner/0000000000003-c.png", "owner/0000000000004-d.png"]
        );
    }

    #[tokio::test]
    async fn test_clear_keeps_uploader() {
        let store = UploadStore::new("owner").unwrap();
        store.get_or_create("chat", &presigned()).await.unwrap();
        seed(&store, "chat", &[("owner/0000000000001-a.png", None)]).await;

        store.clear("chat").await.unwrap();

        assert!(store.files("chat").await.unwrap().is_empty());
        assert!(store.uploader("chat").await.is_some());
    }

    #[tokio::test]
    async fn test_update_record_rejects_invalid_transition() {
        let store = UploadStore::new("owner").unwrap();
        store.get_or_create("chat", &presigned()).await.unwrap();
        seed(&store, "chat", &[("owner/0000000000001-a.png", None)]).await;

        let result = store
            .update_record("chat", "owner/0000000000001-a.png", |record| {
                record.succeed("https://cdn.example/a")
            })
            .await;
        assert!(matches!(result, Err(UploadError::Transition(_))));

        let files = store.files("chat").await.unwrap();
        assert_eq!(files[0].status(), UploadStatus::Initial);
    }

    #[tokio::test]
    async fn test_concurrent_updates_to_different_keys_are_kept() {
        let store = UploadStore::new("owner").unwrap();
        store.get_or_create("chat", &presigned()).await.unwrap();
        let keys: Vec<String> = (0..20)
            .map(|i| format!("owner/{:013}-f.png", i))
            .collect();
        let seeded: Vec<(&str, Option<&str>)> = keys.iter().map(|k| (k.as_str(), None)).collect();
        seed(&store, "chat", &seeded).await;

        let mut handles = Vec::new();
        for key in keys.clone() {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update_record("chat", &key, FileUploadRecord::start)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let files = store.files("chat").await.unwrap();
        assert_eq!(files.len(), 20);
        assert!(files.iter().all(|r| r.status() == UploadStatus::Loading));
    }

    fn removed_keys(event: UploadEvent) -> Vec<String> {
        match event {
            UploadEvent::Removed { uploader_key, keys } => {
                assert_eq!(uploader_key, "chat");
                keys
            }
            other => panic!("expected removal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_announces_added_records() {
        let store = UploadStore::new("owner").unwrap();
        store.get_or_create("chat", &presigned()).await.unwrap();
        let mut events = store.subscribe();

        seed(&store, "chat", &[("owner/0000000000001-a.png", None)]).await;

        match events.try_recv().unwrap() {
            UploadEvent::Updated { uploader_key, record } => {
                assert_eq!(uploader_key, "chat");
                assert_eq!(record.key(), "owner/0000000000001-a.png");
            }
            other => panic!("expected update, got {:?}", other),
        }
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_clear_announces_removed_keys() {
        let store = UploadStore::new("owner").unwrap();
        store.get_or_create("chat", &presigned()).await.unwrap();
        seed(
            &store,
            "chat",
            &[
                ("owner/0000000000001-a.png", None),
                ("owner/0000000000002-b.png", None),
            ],
        )
        .await;
        let mut events = store.subscribe();

        store.clear("chat").await.unwrap();

        let event = events.try_recv().unwrap();
        assert_eq!(event.uploader_key(), "chat");
        assert_eq!(
            removed_keys(event),
            vec!["owner/0000000000001-a.png", "owner/0000000000002-b.png"]
        );
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_remove_by_url_announces_removed_keys() {
        let store = UploadStore::new("owner").unwrap();
        store.get_or_create("chat", &presigned()).await.unwrap();
        seed(
            &store,
            "chat",
            &[
                ("owner/0000000000001-a.png", Some("https://cdn.example/x")),
                ("owner/0000000000002-b.png", Some("https://cdn.example/y")),
            ],
        )
        .await;
        let mut events = store.subscribe();

        store
            .remove_by_url("chat", "https://cdn.example/x")
            .await
            .unwrap();
        assert_eq!(
            removed_keys(events.try_recv().unwrap()),
            vec!["owner/0000000000001-a.png"]
        );

        // Nothing matched, nothing announced
        store
            .remove_by_url("chat", "https://cdn.example/none")
            .await
            .unwrap();
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }
}
