//! Render a [`Program`] as an engine program document (YAML or JSON).
//!
//! Top-level keys are written in a fixed order and resources keep their
//! declaration order, so two compiles of the same unit produce the same bytes.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::resource::{Invoke, Program, Resource};

/// Output document format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

#[derive(Serialize)]
struct Document<'a> {
    name: &'a str,
    runtime: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    variables: BTreeMap<&'a str, serde_json::Value>,
    resources: Resources<'a>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    outputs: BTreeMap<&'static str, serde_json::Value>,
}

/// Resources serialised as a map in declaration order.
struct Resources<'a>(&'a [Resource]);

impl Serialize for Resources<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for resource in self.0 {
            map.serialize_entry(&resource.id, &RenderedResource::from(resource))?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct RenderedResource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    properties: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<RenderedOptions>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderedOptions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retain_on_delete: bool,
}

impl<'a> From<&'a Resource> for RenderedResource<'a> {
    fn from(resource: &'a Resource) -> Self {
        let options = &resource.options;
        let options = (!options.depends_on.is_empty() || options.retain_on_delete).then(|| {
            RenderedOptions {
                depends_on: options
                    .depends_on
                    .iter()
                    .map(|id| format!("${{{id}}}"))
                    .collect(),
                retain_on_delete: options.retain_on_delete,
            }
        });
        Self {
            kind: resource.kind.type_token(),
            name: &resource.name,
            properties: resource
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
            options,
        }
    }
}

fn invoke_json(invoke: &Invoke) -> serde_json::Value {
    let arguments: serde_json::Map<_, _> = invoke
        .arguments
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    serde_json::json!({
        "fn::invoke": {
            "function": invoke.function,
            "arguments": arguments,
        }
    })
}

/// Render `program` in `format`.
///
/// # Errors
///
/// Returns an error if serialisation fails.
pub fn render(program: &Program, format: Format) -> Result<String> {
    let doc = Document {
        name: &program.name,
        runtime: "yaml",
        description: Some(program.description.as_str()).filter(|d| !d.is_empty()),
        variables: program
            .variables
            .iter()
            .map(|(id, invoke)| (id.as_str(), invoke_json(invoke)))
            .collect(),
        resources: Resources(&program.resources),
        outputs: program
            .outputs
            .iter()
            .map(|(key, value)| (key.as_str(), value.to_json()))
            .collect(),
    };

    match format {
        Format::Yaml => serde_yaml::to_string(&doc).context("failed to render program as YAML"),
        Format::Json => {
            let mut out =
                serde_json::to_string_pretty(&doc).context("failed to render program as JSON")?;
            out.push('\n');
            Ok(out)
        }
    }
}
