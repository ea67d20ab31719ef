//! Configuration loading and validation for the stack compiler.
//!
//! Values come from an optional YAML file overlaid by environment variables
//! (`HOSTED_ZONE_NAME`, `API_DOMAIN`, `STACK`, ...). Domain keys are optional
//! at load time; each unit demands the ones it reads via [`Config::require`].

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use common::StackError;
use serde::Deserialize;

/// Domain configuration keys a unit may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    HostedZoneName,
    SubDomain,
    SubDomainMtls,
    ApiDomain,
    ApiDomainMtls,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::HostedZoneName,
        ConfigKey::SubDomain,
        ConfigKey::SubDomainMtls,
        ConfigKey::ApiDomain,
        ConfigKey::ApiDomainMtls,
    ];

    /// Environment variable / documented name of the key.
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::HostedZoneName => "HOSTED_ZONE_NAME",
            ConfigKey::SubDomain => "SUB_DOMAIN",
            ConfigKey::SubDomainMtls => "SUB_DOMAIN_MTLS",
            ConfigKey::ApiDomain => "API_DOMAIN",
            ConfigKey::ApiDomainMtls => "API_DOMAIN_MTLS",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stack compiler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Route53 hosted zone the API records live in.
    #[serde(default)]
    pub hosted_zone_name: Option<String>,

    #[serde(default)]
    pub sub_domain: Option<String>,

    #[serde(default)]
    pub sub_domain_mtls: Option<String>,

    /// Hostname of the plain-TLS API.
    #[serde(default)]
    pub api_domain: Option<String>,

    /// Hostname of the mutual-TLS API.
    #[serde(default)]
    pub api_domain_mtls: Option<String>,

    /// Organisation that owns the stacks; first part of stack references.
    #[serde(default = "default_organization")]
    pub organization: String,

    /// Environment name shared by all four units (e.g. `dev`, `prod`).
    #[serde(default = "default_stack")]
    pub stack: String,

    /// PEM bundle uploaded as the mTLS trust store.
    #[serde(default = "default_truststore_pem_path")]
    pub truststore_pem_path: PathBuf,

    /// Directory holding the packaged ping Lambda (`bootstrap` binary).
    #[serde(default = "default_ping_code_path")]
    pub ping_code_path: PathBuf,

    #[serde(default = "default_lambda_runtime")]
    pub lambda_runtime: String,

    #[serde(default = "default_lambda_handler")]
    pub lambda_handler: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable text.
    #[serde(default)]
    pub log_json: bool,
}

fn default_organization() -> String {
    "organization".into()
}
fn default_stack() -> String {
    "dev".into()
}
fn default_truststore_pem_path() -> PathBuf {
    PathBuf::from("ca.pem")
}
fn default_ping_code_path() -> PathBuf {
    PathBuf::from("target/lambda/ping")
}
fn default_lambda_runtime() -> String {
    "provided.al2023".into()
}
fn default_lambda_handler() -> String {
    "bootstrap".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from `file` (if given) and the environment.
    ///
    /// Environment variables take precedence over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a value cannot be parsed,
    /// or validation fails.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }
        let cfg = builder
            .add_source(config::Environment::default())
            .build()
            .context("failed to build stack configuration")?;

        let mut c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise stack configuration")?;

        let cwd = std::env::current_dir().context("failed to read the working directory")?;
        c.resolve_paths(&cwd);
        c.validate()?;
        Ok(c)
    }

    /// Anchor relative asset paths at `base`.
    ///
    /// The engine resolves asset paths against the program's directory, not the
    /// directory the compiler ran in, and the trust store is hashed here.
    pub(crate) fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.truststore_pem_path, &mut self.ping_code_path] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Validate the always-required fields.
    fn validate(&self) -> Result<()> {
        ensure_name(&self.organization, "ORGANIZATION")?;
        ensure_name(&self.stack, "STACK")?;
        if self.lambda_runtime.trim().is_empty() {
            anyhow::bail!("LAMBDA_RUNTIME must not be empty");
        }
        if self.lambda_handler.trim().is_empty() {
            anyhow::bail!("LAMBDA_HANDLER must not be empty");
        }
        Ok(())
    }

    /// Value of a domain key, failing if it is absent or blank.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::MissingConfig`] naming the key.
    pub fn require(&self, key: ConfigKey) -> Result<&str, StackError> {
        let value = match key {
            ConfigKey::HostedZoneName => &self.hosted_zone_name,
            ConfigKey::SubDomain => &self.sub_domain,
            ConfigKey::SubDomainMtls => &self.sub_domain_mtls,
            ConfigKey::ApiDomain => &self.api_domain,
            ConfigKey::ApiDomainMtls => &self.api_domain_mtls,
        };
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| StackError::MissingConfig(key.as_str().to_owned()))
    }
}

/// Organisation and stack names end up in stack references, so keep them to
/// the characters the engine accepts there.
fn ensure_name(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        anyhow::bail!("{name} may only contain ASCII letters, digits, '-', '_' and '.': {value:?}");
    }
    Ok(())
}

#[cfg(test)]
impl Config {
    /// A configuration with defaults and no domain keys set.
    pub(crate) fn for_stack(organization: &str, stack: &str) -> Self {
        Self {
            hosted_zone_name: None,
            sub_domain: None,
            sub_domain_mtls: None,
            api_domain: None,
            api_domain_mtls: None,
            organization: organization.into(),
            stack: stack.into(),
            truststore_pem_path: default_truststore_pem_path(),
            ping_code_path: default_ping_code_path(),
            lambda_runtime: default_lambda_runtime(),
            lambda_handler: default_lambda_handler(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_organization(), "organization");
        assert_eq!(default_stack(), "dev");
        assert_eq!(default_truststore_pem_path(), PathBuf::from("ca.pem"));
        assert_eq!(default_lambda_runtime(), "provided.al2023");
        assert_eq!(default_lambda_handler(), "bootstrap");
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn require_rejects_missing_and_blank() {
        let mut cfg = Config::for_stack("acme", "dev");
        match cfg.require(ConfigKey::HostedZoneName) {
            Err(StackError::MissingConfig(key)) => assert_eq!(key, "HOSTED_ZONE_NAME"),
            other => panic!("expected missing config, got {other:?}"),
        }
        cfg.api_domain = Some("   ".into());
        assert!(cfg.require(ConfigKey::ApiDomain).is_err());
        cfg.api_domain = Some(" api.example.com ".into());
        assert_eq!(cfg.require(ConfigKey::ApiDomain).unwrap(), "api.example.com");
    }

    #[test]
    fn validate_rejects_bad_stack_name() {
        let mut cfg = Config::for_stack("acme", "dev");
        assert!(cfg.validate().is_ok());
        cfg.stack = "dev/prod".into();
        assert!(cfg.validate().is_err());
        cfg.stack = "".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_reads_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "hosted_zone_name: example.com\napi_domain: api.example.com\norganization: acme\nstack: staging\n"
        )
        .unwrap();

        let cfg = Config::load(Some(file.path())).unwrap();
        assert_eq!(cfg.require(ConfigKey::HostedZoneName).unwrap(), "example.com");
        assert_eq!(cfg.require(ConfigKey::ApiDomain).unwrap(), "api.example.com");
        assert_eq!(cfg.organization, "acme");
        assert_eq!(cfg.stack, "staging");
        assert!(cfg.truststore_pem_path.is_absolute());
        assert!(cfg.ping_code_path.is_absolute());
    }

    #[test]
    fn relative_asset_paths_are_anchored() {
        let mut cfg = Config::for_stack("acme", "dev");
        cfg.truststore_pem_path = PathBuf::from("/etc/pki/ca.pem");
        cfg.resolve_paths(Path::new("/work"));
        assert_eq!(cfg.truststore_pem_path, PathBuf::from("/etc/pki/ca.pem"));
        assert_eq!(cfg.ping_code_path, PathBuf::from("/work/target/lambda/ping"));
    }

    #[test]
    fn load_fails_for_missing_file() {
        assert!(Config::load(Some(Path::new("/nonexistent/stacks.yaml"))).is_err());
    }
}
