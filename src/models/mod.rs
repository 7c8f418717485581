//! Domain records shared by the upstream client, the archival pipeline and
//! the web layer.

pub mod emote;
pub mod filters;
pub mod search;

pub use emote::{ArchivedEmote, CatalogEntry, ImageVariant, MimeType};
pub use filters::{AnimationFilter, CacheClass, StorageFolder, TrendingPeriod};
pub use search::SearchResult;
