//! Axum routing and handlers for the ping function.
//!
//! The same router is served by the Lambda runtime in production and by a
//! plain TCP listener when `LOCAL_PORT` is set.

pub mod handlers;
pub mod middleware;
pub mod router;
