use serde::{Deserialize, Serialize};
use std::time::Instant;
use utoipa::ToSchema;

use super::emote::ArchivedEmote;

/// Response envelope of every emote listing endpoint
///
/// The pagination fields are only present on paginated endpoints. `cached`
/// and `processing_time` describe the request being answered, never the one
/// that populated the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub success: bool,
    pub total_found: usize,
    pub emotes: Vec<ArchivedEmote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub cached: bool,
    /// Seconds spent serving this request
    #[serde(default)]
    pub processing_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_next_page: Option<bool>,
}

impl SearchResult {
    pub fn found(total_found: usize, emotes: Vec<ArchivedEmote>) -> Self {
        Self {
            success: true,
            total_found,
            emotes,
            message: None,
            cached: false,
            processing_time: 0.0,
            page: None,
            total_pages: None,
            results_per_page: None,
            has_next_page: None,
        }
    }

    /// Successful answer with nothing in it
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::found(0, Vec::new())
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::empty(message)
        }
    }

    pub fn with_total_found(mut self, total_found: usize) -> Self {
        self.total_found = total_found;
        self
    }

    /// Record the time spent since `started`
    pub fn timed(mut self, started: Instant) -> Self {
        self.processing_time = started.elapsed().as_secs_f64();
        self
    }
}
