//! emote-proxy library
//!
//! A caching and archival proxy in front of the 7TV emote catalog. Search and
//! trending queries are answered from the upstream catalog, the best image of
//! every hit is copied into object storage, and the resulting listing is
//! cached so repeated queries never reach the catalog.

pub mod config;
pub mod emote_assets;
pub mod errors;
pub mod models;
pub mod services;
pub mod sources;
pub mod utils;
pub mod web;
