//! Typed resource declarations and the program that holds them.
//!
//! # Responsibilities
//! - Describe each resource by an identifier, a logical name, an engine type
//!   token, its properties and its options.
//! - Collect resources, data-source variables and exported outputs into a
//!   [`Program`] for one deployable unit.
//!
//! Nothing here talks to the cloud. Values that only exist after deployment are
//! expressed as [`Reference`]s and left for the engine to resolve.

pub mod graph;
pub mod value;

pub use graph::DependencyGraph;
pub use value::{Reference, Segment, Value};

use std::collections::BTreeMap;

use common::OutputKey;

/// The resource types declared by the units in this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    AcmCertificate,
    Route53Record,
    S3Bucket,
    S3BucketObject,
    IamRole,
    IamRolePolicyAttachment,
    LambdaFunction,
    LambdaPermission,
    ApiGatewayApi,
    ApiGatewayDomainName,
    ApiGatewayIntegration,
    ApiGatewayRoute,
    ApiGatewayStage,
    ApiGatewayApiMapping,
    StackReference,
}

impl ResourceKind {
    /// The engine's type token for this kind.
    pub fn type_token(self) -> &'static str {
        match self {
            ResourceKind::AcmCertificate => "aws:acm:Certificate",
            ResourceKind::Route53Record => "aws:route53:Record",
            ResourceKind::S3Bucket => "aws:s3:Bucket",
            ResourceKind::S3BucketObject => "aws:s3:BucketObject",
            ResourceKind::IamRole => "aws:iam:Role",
            ResourceKind::IamRolePolicyAttachment => "aws:iam:RolePolicyAttachment",
            ResourceKind::LambdaFunction => "aws:lambda:Function",
            ResourceKind::LambdaPermission => "aws:lambda:Permission",
            ResourceKind::ApiGatewayApi => "aws:apigatewayv2:Api",
            ResourceKind::ApiGatewayDomainName => "aws:apigatewayv2:DomainName",
            ResourceKind::ApiGatewayIntegration => "aws:apigatewayv2:Integration",
            ResourceKind::ApiGatewayRoute => "aws:apigatewayv2:Route",
            ResourceKind::ApiGatewayStage => "aws:apigatewayv2:Stage",
            ResourceKind::ApiGatewayApiMapping => "aws:apigatewayv2:ApiMapping",
            ResourceKind::StackReference => "pulumi:pulumi:StackReference",
        }
    }
}

/// Per-resource engine options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Identifiers of resources that must exist before this one.
    pub depends_on: Vec<String>,
    /// Leave the cloud resource in place when it is removed from the program.
    pub retain_on_delete: bool,
}

/// A single resource declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Identifier used by references inside the program.
    pub id: String,
    /// Logical name the engine tracks the resource under.
    pub name: String,
    pub kind: ResourceKind,
    pub properties: BTreeMap<String, Value>,
    pub options: ResourceOptions,
}

impl Resource {
    /// Start a declaration with no properties.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            properties: BTreeMap::new(),
            options: ResourceOptions::default(),
        }
    }

    /// Set a property.
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Add an explicit ordering dependency on `handle`.
    pub fn depends_on(mut self, handle: &Handle) -> Self {
        self.options.depends_on.push(handle.id().to_owned());
        self
    }

    /// Keep the cloud resource when the declaration is deleted.
    pub fn retain_on_delete(mut self) -> Self {
        self.options.retain_on_delete = true;
        self
    }

    /// Look up a property by key.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// A data-source call evaluated by the engine, e.g. a hosted-zone lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoke {
    pub function: String,
    pub arguments: BTreeMap<String, Value>,
}

impl Invoke {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

/// Identifier of something already added to a [`Program`].
///
/// Used to build references and dependency edges without borrowing the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle(String);

impl Handle {
    pub fn id(&self) -> &str {
        &self.0
    }

    /// Reference the whole declaration.
    pub fn reference(&self) -> Reference {
        Reference::new(self.0.clone())
    }

    /// Reference one of the declaration's attributes.
    pub fn attr(&self, field: &str) -> Reference {
        Reference::new(self.0.clone()).field(field)
    }

    /// Reference an output exported by the stack this handle points at.
    pub fn output(&self, key: OutputKey) -> Reference {
        Reference::new(self.0.clone()).output(key)
    }
}

/// Everything one deployable unit declares.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Project name of the unit, e.g. `mtls-infra`.
    pub name: String,
    pub description: String,
    pub variables: BTreeMap<String, Invoke>,
    /// Resources in declaration order.
    pub resources: Vec<Resource>,
    pub outputs: BTreeMap<OutputKey, Value>,
}

impl Program {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            variables: BTreeMap::new(),
            resources: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Append a resource and return a handle to it.
    pub fn add(&mut self, resource: Resource) -> Handle {
        let handle = Handle(resource.id.clone());
        self.resources.push(resource);
        handle
    }

    /// Declare a data-source variable and return a handle to it.
    pub fn invoke(&mut self, id: impl Into<String>, invoke: Invoke) -> Handle {
        let id = id.into();
        self.variables.insert(id.clone(), invoke);
        Handle(id)
    }

    /// Export a value under `key`.
    pub fn export(&mut self, key: OutputKey, value: impl Into<Value>) {
        self.outputs.insert(key, value.into());
    }

    /// Find a resource by identifier.
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// All resources of the given kind, in declaration order.
    pub fn resources_of(&self, kind: ResourceKind) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(move |r| r.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tokens() {
        assert_eq!(ResourceKind::ApiGatewayApiMapping.type_token(), "aws:apigatewayv2:ApiMapping");
        assert_eq!(ResourceKind::StackReference.type_token(), "pulumi:pulumi:StackReference");
    }

    #[test]
    fn handles_build_references_and_edges() {
        let mut program = Program::new("demo", "demo program");
        let api = program.add(
            Resource::new("pingApi", "Ping-Api", ResourceKind::ApiGatewayApi)
                .prop("protocolType", "HTTP"),
        );
        let route = program.add(
            Resource::new("pingRoute", "Ping-Route", ResourceKind::ApiGatewayRoute)
                .prop("apiId", api.attr("id"))
                .depends_on(&api),
        );

        let r = program.resource(route.id()).unwrap();
        assert_eq!(r.options.depends_on, vec!["pingApi".to_string()]);
        assert_eq!(
            r.property("apiId").and_then(Value::as_reference).map(Reference::expr),
            Some("${pingApi.id}".to_string())
        );
        assert_eq!(program.resources_of(ResourceKind::ApiGatewayApi).count(), 1);
    }

    #[test]
    fn export_overwrites_same_key() {
        let mut program = Program::new("demo", "");
        program.export(OutputKey::ApiDomain, "a.example.com");
        program.export(OutputKey::ApiDomain, "b.example.com");
        assert_eq!(program.outputs.len(), 1);
        assert_eq!(program.outputs[&OutputKey::ApiDomain].as_str(), Some("b.example.com"));
    }
}
