//! The four deployable units and the context they are compiled in.
//!
//! Each unit reads the configuration keys it needs up front, so a missing key
//! fails the compile before a single resource is declared. Units only see
//! each other through stack references to exported outputs.

pub mod apis;
pub mod dns;
pub mod functions;
pub mod mtls_infra;

pub use dns::DomainValidationOption;

use std::collections::BTreeMap;
use std::fmt;

use common::StackError;
use tracing::info;

use crate::config::{Config, ConfigKey};
use crate::resource::{DependencyGraph, Handle, Program, Resource, ResourceKind};

/// A deployable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Unit {
    MtlsInfra,
    Functions,
    MtlsApis,
    NonMtlsApis,
}

impl Unit {
    /// Project name of the unit; also the middle part of its stack references.
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::MtlsInfra => "mtls-infra",
            Unit::Functions => "functions",
            Unit::MtlsApis => "mtls-apis",
            Unit::NonMtlsApis => "non-mtls-apis",
        }
    }

    /// Configuration keys the unit cannot be compiled without.
    pub fn required_keys(self) -> &'static [ConfigKey] {
        match self {
            Unit::MtlsInfra | Unit::MtlsApis => &ConfigKey::ALL,
            Unit::NonMtlsApis => &[ConfigKey::HostedZoneName, ConfigKey::ApiDomain],
            Unit::Functions => &[],
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organisation/project/stack triple a unit is compiled for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackContext {
    pub organization: String,
    pub unit: Unit,
    pub stack: String,
}

impl StackContext {
    pub fn new(organization: impl Into<String>, unit: Unit, stack: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            unit,
            stack: stack.into(),
        }
    }

    /// Suffix appended to logical names: `-<project>-<stack>`.
    pub fn suffix(&self) -> String {
        format!("-{}-{}", self.unit, self.stack)
    }

    /// Fully-qualified name of another unit's stack in the same organisation
    /// and environment.
    pub fn stack_reference(&self, unit: Unit) -> String {
        format!("{}/{}/{}", self.organization, unit, self.stack)
    }

    /// Declare a stack reference to `unit` in `program`.
    pub fn reference(&self, program: &mut Program, id: &str, unit: Unit) -> Handle {
        let name = self.stack_reference(unit);
        program.add(
            Resource::new(id, name.clone(), ResourceKind::StackReference).prop("name", name),
        )
    }
}

/// Values gathered before compiling that the engine cannot supply itself.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    /// ACM DNS validation options keyed by certificate domain.
    pub validation_options: BTreeMap<String, Vec<DomainValidationOption>>,
    /// SHA-256 (hex) of the trust-store bundle, used as the object's source hash.
    pub truststore_sha256: Option<String>,
}

impl Inputs {
    /// Validation options for `domain`, empty when none are known yet.
    pub fn options_for(&self, domain: &str) -> &[DomainValidationOption] {
        self.validation_options
            .get(domain)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// A compiled unit: its program plus a validated creation order.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub program: Program,
    pub graph: DependencyGraph,
    pub order: Vec<String>,
}

/// Fail on the first configuration key `unit` needs that is absent or blank.
///
/// # Errors
///
/// Returns [`StackError::MissingConfig`] naming the key.
pub fn ensure_required(unit: Unit, cfg: &Config) -> Result<(), StackError> {
    for key in unit.required_keys() {
        cfg.require(*key)?;
    }
    Ok(())
}

/// Compile `unit` for the configured organisation and stack.
///
/// # Errors
///
/// Returns [`StackError::MissingConfig`] before declaring anything if a
/// required key is absent, or a graph error if the declarations do not form a
/// valid program.
pub fn compile(unit: Unit, cfg: &Config, inputs: &Inputs) -> Result<Compiled, StackError> {
    ensure_required(unit, cfg)?;

    let ctx = StackContext::new(cfg.organization.clone(), unit, cfg.stack.clone());
    let program = match unit {
        Unit::MtlsInfra => {
            let settings = mtls_infra::Settings::from_config(cfg)?;
            mtls_infra::build(&ctx, &settings, inputs)
        }
        Unit::Functions => functions::build(&ctx, &functions::Settings::from_config(cfg)),
        Unit::MtlsApis => {
            let settings = apis::Settings::from_config(cfg, apis::ApiVariant::Mtls)?;
            apis::build(&ctx, &settings)
        }
        Unit::NonMtlsApis => {
            let settings = apis::Settings::from_config(cfg, apis::ApiVariant::Plain)?;
            apis::build(&ctx, &settings)
        }
    };

    let graph = DependencyGraph::build(&program)?;
    let order = graph.order()?;
    info!(
        unit = %unit,
        stack = %ctx.stack,
        resources = program.resources.len(),
        outputs = program.outputs.len(),
        "unit compiled"
    );
    Ok(Compiled {
        program,
        graph,
        order,
    })
}
