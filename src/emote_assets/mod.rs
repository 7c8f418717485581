//! Archival of emote images into durable object storage

pub mod fetcher;
pub mod naming;
pub mod service;
pub mod storage;
pub mod variant;

pub use fetcher::{AssetFetcher, HttpAssetFetcher};
pub use service::EmoteArchiver;
pub use storage::{BlobStore, ObjectBlobStore};
pub use variant::select_best_variant;
