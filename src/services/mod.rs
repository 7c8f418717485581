//! Request-level services: pagination, the response cache and the emote
//! service that ties catalog, archiver and cache together.

pub mod emote_search;
pub mod pagination;
pub mod response_cache;

pub use emote_search::EmoteService;
pub use pagination::PageWindow;
pub use response_cache::ResponseCache;
