//! Configuration loading and validation for the ping function.
//!
//! All values are read from environment variables at cold start.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated ping function configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// OTLP collector endpoint. Spans are only exported when set.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Serve over plain HTTP on this port instead of the Lambda runtime API.
    #[serde(default)]
    pub local_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or validation fails.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build ping configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise ping configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            anyhow::bail!("LOG_LEVEL must not be empty");
        }
        if let Some(endpoint) = &self.otel_exporter_otlp_endpoint {
            if endpoint.trim().is_empty() {
                anyhow::bail!("OTEL_EXPORTER_OTLP_ENDPOINT must not be empty when set");
            }
        }
        if self.local_port == Some(0) {
            anyhow::bail!("LOCAL_PORT must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            log_level: default_log_level(),
            otel_exporter_otlp_endpoint: None,
            local_port: None,
        }
    }

    #[test]
    fn defaults() {
        assert_eq!(default_log_level(), "info");
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_endpoint() {
        let cfg = Config {
            otel_exporter_otlp_endpoint: Some("  ".into()),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_port_zero() {
        let cfg = Config {
            local_port: Some(0),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_accepts_local_server() {
        let cfg = Config {
            otel_exporter_otlp_endpoint: Some("http://localhost:4317".into()),
            local_port: Some(9000),
            ..valid()
        };
        assert!(cfg.validate().is_ok());
    }
}
