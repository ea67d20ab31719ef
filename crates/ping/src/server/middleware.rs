//! Axum middleware layers applied to the router.

use std::time::Duration;

/// Per-request timeout applied to all routes.
///
/// Kept below the function's configured Lambda timeout so a stuck request
/// returns 408 instead of being killed by the runtime.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
