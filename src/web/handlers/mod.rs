//! HTTP request handlers
//!
//! Handlers validate parameters, log the call and delegate to
//! [`EmoteService`](crate::services::EmoteService). None of them touch a
//! backend directly.

pub mod cache;
pub mod emotes;
pub mod health;
pub mod index;
pub mod storage;
pub mod trending;
