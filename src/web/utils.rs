//! Web utility functions

use axum::http::Method;
use tracing::debug;

use super::extractors::RequestContext;

/// Log an incoming API call with its client context
pub fn log_request(method: &Method, path: &str, context: &RequestContext) {
    debug!(
        method = %method,
        path,
        request_id = %context.request_id,
        user_agent = ?context.user_agent,
        real_ip = ?context.real_ip,
        "API request"
    );
}
