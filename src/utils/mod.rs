//! Small helpers shared across the crate

pub mod human_format;
pub mod url;

pub use human_format::format_memory;
pub use url::UrlUtils;
