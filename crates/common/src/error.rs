//! Common error types shared across crates.

use thiserror::Error;

/// Top-level error type for building and rendering stack programs.
///
/// Variants map to process exit codes returned by the `stacks` CLI:
/// - [`StackError::MissingConfig`] → 2
/// - [`StackError::DuplicateResource`], [`StackError::UnresolvedReference`],
///   [`StackError::DependencyCycle`] → 3
/// - [`StackError::InvalidTruststore`] → 4
/// - [`StackError::Lookup`] → 5
/// - [`StackError::Asset`] → 6
#[derive(Debug, Error)]
pub enum StackError {
    /// A configuration key required by the selected unit is absent or empty.
    #[error("missing required configuration key: {0}")]
    MissingConfig(String),

    /// Two resources in one program share a logical name.
    #[error("duplicate resource name: {0}")]
    DuplicateResource(String),

    /// A property reference or `dependsOn` entry names nothing declared in the program.
    #[error("resource {resource} references undeclared name {target}")]
    UnresolvedReference {
        /// The resource holding the dangling reference.
        resource: String,
        /// The name that could not be resolved.
        target: String,
    },

    /// The dependency graph contains a cycle through the listed resources.
    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// The trust-store bundle is unreadable, empty, or carries private keys.
    #[error("invalid truststore: {0}")]
    InvalidTruststore(String),

    /// A live lookup against the cloud provider failed.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// A file asset or archive could not be read.
    #[error("asset error: {0}")]
    Asset(String),
}

impl StackError {
    /// Returns the process exit code that should be used for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            StackError::MissingConfig(_) => 2,
            StackError::DuplicateResource(_)
            | StackError::UnresolvedReference { .. }
            | StackError::DependencyCycle(_) => 3,
            StackError::InvalidTruststore(_) => 4,
            StackError::Lookup(_) => 5,
            StackError::Asset(_) => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(StackError::MissingConfig("API_DOMAIN".into()).exit_code(), 2);
        assert_eq!(StackError::DuplicateResource("x".into()).exit_code(), 3);
        assert_eq!(
            StackError::DependencyCycle(vec!["a".into(), "b".into()]).exit_code(),
            3
        );
        assert_eq!(StackError::InvalidTruststore("x".into()).exit_code(), 4);
        assert_eq!(StackError::Lookup("x".into()).exit_code(), 5);
        assert_eq!(StackError::Asset("x".into()).exit_code(), 6);
    }

    #[test]
    fn cycle_display_joins_path() {
        let e = StackError::DependencyCycle(vec!["route".into(), "stage".into(), "route".into()]);
        assert_eq!(e.to_string(), "dependency cycle: route -> stage -> route");
    }

    #[test]
    fn display_includes_key() {
        let e = StackError::MissingConfig("HOSTED_ZONE_NAME".into());
        assert!(e.to_string().contains("HOSTED_ZONE_NAME"));
    }
}
