//! Axum request handlers.

use axum::Json;
use common::protocol::PingResponse;
use tracing::debug;

/// `/v1/ping` for any method, and the fallback for every other path.
pub async fn ping() -> Json<PingResponse> {
    let resp = PingResponse::now();
    debug!(timestamp = resp.timestamp, "pong");
    Json(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::protocol::epoch_millis;

    #[tokio::test]
    async fn ping_returns_pong() {
        let before = epoch_millis();
        let Json(resp) = ping().await;
        let after = epoch_millis();

        assert_eq!(resp.ping, "pong");
        assert!(resp.success);
        assert!(resp.timestamp >= before && resp.timestamp <= after);
    }
}
