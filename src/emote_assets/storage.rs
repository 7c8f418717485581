//! Durable object storage for archived emote images
//!
//! [`BlobStore`] is the narrow surface the archiver and the storage listing
//! endpoints need. [`ObjectBlobStore`] implements it over the `object_store`
//! crate so the same code runs against Azure Blob Storage in production, a
//! local directory in development and memory in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload,
    azure::MicrosoftAzureBuilder, local::LocalFileSystem, memory::InMemory, path::Path,
};
use std::path::Path as FsPath;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::{StorageError, StorageResult};
use crate::utils::url::UrlUtils;

/// Key-addressed durable storage with public URLs
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Store `data` under `key` and return its public URL
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String>;

    /// Keys of every object under `prefix`, sorted
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    fn public_url(&self, key: &str) -> String;

    /// Backend label for logs and health output
    fn backend_name(&self) -> &str;
}

/// Parsed pieces of an Azure storage connection string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AzureConnectionInfo {
    pub account_name: String,
    pub account_key: String,
    pub blob_endpoint: Option<String>,
    pub endpoint_suffix: Option<String>,
}

impl AzureConnectionInfo {
    /// Parse `Key=Value;Key=Value` connection strings
    ///
    /// Values may themselves contain `=` (base64 account keys), so only the
    /// first `=` of each part separates key and value.
    pub fn parse(connection_string: &str) -> StorageResult<Self> {
        let mut info = Self::default();
        for part in connection_string.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "accountname" => info.account_name = value.to_string(),
                "accountkey" => info.account_key = value.to_string(),
                "blobendpoint" => info.blob_endpoint = Some(value.trim_end_matches('/').to_string()),
                "endpointsuffix" => info.endpoint_suffix = Some(value.to_string()),
                _ => {}
            }
        }

        if info.account_name.is_empty() || info.account_key.is_empty() {
            return Err(StorageError::InvalidConfig {
                message: "connection string must contain AccountName and AccountKey".to_string(),
            });
        }
        Ok(info)
    }

    /// Base URL of the blob service, without the container
    pub fn blob_service_url(&self) -> String {
        match &self.blob_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!(
                "https://{}.blob.{}",
                self.account_name,
                self.endpoint_suffix.as_deref().unwrap_or("core.windows.net")
            ),
        }
    }
}

/// [`BlobStore`] over any `object_store` backend
pub struct ObjectBlobStore {
    store: Arc<dyn ObjectStore>,
    /// URL prefix that, joined with an object key, gives the public URL
    public_base_url: String,
    backend: &'static str,
    /// Local filesystem backends reject object attributes
    supports_content_type: bool,
}

impl ObjectBlobStore {
    /// Build the configured backend; `None` when storage is disabled
    pub fn from_config(config: &StorageConfig) -> StorageResult<Option<Self>> {
        let store = match config.backend {
            StorageBackend::Disabled => None,
            StorageBackend::Azure => match config
                .azure_connection_string
                .as_deref()
                .filter(|s| !s.trim().is_empty())
            {
                Some(conn) => Some(Self::azure(
                    conn,
                    &config.container_name,
                    config.public_base_url.as_deref(),
                )?),
                None => {
                    warn!("AZURE_CONNECTION_STRING not set, object storage disabled");
                    None
                }
            },
            StorageBackend::Local => Some(Self::local(
                &config.local_path,
                config.public_base_url.as_deref(),
            )?),
            StorageBackend::Memory => Some(Self::in_memory(
                config.public_base_url.as_deref().unwrap_or("memory://"),
            )),
        };

        if let Some(store) = &store {
            info!(
                "Object storage backend '{}' ready, public URL base {}",
                store.backend,
                UrlUtils::obfuscate_credentials(&store.public_base_url)
            );
        }
        Ok(store)
    }

    pub fn azure(
        connection_string: &str,
        container: &str,
        public_base_url: Option<&str>,
    ) -> StorageResult<Self> {
        let info = AzureConnectionInfo::parse(connection_string)?;

        let mut builder = MicrosoftAzureBuilder::new()
            .with_account(&info.account_name)
            .with_access_key(&info.account_key)
            .with_container_name(container);
        if let Some(endpoint) = &info.blob_endpoint {
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(endpoint.starts_with("http://"));
        }
        let store = builder.build().map_err(|e| StorageError::InvalidConfig {
            message: format!("failed to initialise Azure Blob client: {e}"),
        })?;

        let public_base_url = public_base_url
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}/{}", info.blob_service_url(), container));

        Ok(Self {
            store: Arc::new(store),
            public_base_url,
            backend: "azure",
            supports_content_type: true,
        })
    }

    pub fn local(root: &FsPath, public_base_url: Option<&str>) -> StorageResult<Self> {
        std::fs::create_dir_all(root).map_err(|e| StorageError::InvalidConfig {
            message: format!("cannot create {}: {e}", root.display()),
        })?;
        let store = LocalFileSystem::new_with_prefix(root).map_err(|e| StorageError::InvalidConfig {
            message: format!("cannot open {}: {e}", root.display()),
        })?;

        let public_base_url = match public_base_url {
            Some(url) => url.to_string(),
            None => {
                let absolute = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
                format!("file://{}", absolute.display())
            }
        };

        Ok(Self {
            store: Arc::new(store),
            public_base_url,
            backend: "local",
            supports_content_type: false,
        })
    }

    pub fn in_memory(public_base_url: &str) -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            public_base_url: public_base_url.to_string(),
            backend: "memory",
            supports_content_type: true,
        }
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self.store.head(&Path::from(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::backend("head", key, e)),
        }
    }

    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String> {
        let size = data.len();
        let mut opts = PutOptions::default();
        if self.supports_content_type {
            let mut attributes = Attributes::new();
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(content_type.to_string()),
            );
            opts.attributes = attributes;
        }

        self.store
            .put_opts(&Path::from(key), PutPayload::from(data), opts)
            .await
            .map_err(|e| StorageError::backend("put", key, e))?;

        debug!(key, size, content_type, "Uploaded object");
        Ok(self.public_url(key))
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let prefix_path = Path::from(prefix);
        let metas: Vec<_> = self
            .store
            .list(Some(&prefix_path))
            .try_collect()
            .await
            .map_err(|e| StorageError::backend("list", prefix, e))?;

        let mut keys: Vec<String> = metas
            .into_iter()
            .map(|meta| meta.location.to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn public_url(&self, key: &str) -> String {
        UrlUtils::join_path(&self.public_base_url, key)
    }

    fn backend_name(&self) -> &str {
        self.backend
    }
}
