//! Response body returned by the ping endpoint.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Body of a `GET /v1/ping` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    /// Always `"pong"`.
    pub ping: String,
    /// Always `true`.
    pub success: bool,
    /// Milliseconds since the Unix epoch at which the response was built.
    pub timestamp: u64,
}

impl PingResponse {
    /// Construct a pong carrying the given epoch-millisecond timestamp.
    pub fn pong(timestamp: u64) -> Self {
        Self {
            ping: "pong".into(),
            success: true,
            timestamp,
        }
    }

    /// Construct a pong stamped with the current wall-clock time.
    pub fn now() -> Self {
        Self::pong(epoch_millis())
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// A clock set before 1970 yields 0 rather than an error.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
