//! Upstream emote catalogs

pub mod seventv;
pub mod traits;

pub use seventv::SevenTvClient;
pub use traits::CatalogSource;
