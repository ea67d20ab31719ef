//! Tracing setup for the ping function.
//!
//! Logs are JSON lines on stdout, which Lambda forwards to CloudWatch. Spans
//! are additionally exported over OTLP/gRPC when an endpoint is configured.
//!
//! # Telemetry invariants
//!
//! - No request bodies or headers appear in any span attribute or log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`).

pub mod init;

pub use init::{init_telemetry, shutdown};
