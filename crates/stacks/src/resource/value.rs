//! Property values: literals, references to other declarations, and templates.
//!
//! References are resolved by the engine at deploy time. Here they are only
//! recorded so the dependency graph can be checked and the program rendered.

use std::collections::BTreeMap;
use std::path::PathBuf;

use common::OutputKey;
use serde_json::json;

/// One step of a property path below a referenced declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// `.field`
    Field(String),
    /// `["key"]`
    Key(String),
}

/// A reference to a declared resource or variable, optionally drilling into
/// one of its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Identifier of the resource or variable being referenced.
    pub target: String,
    /// Attribute path below the target.
    pub path: Vec<Accessor>,
}

impl Reference {
    /// Reference the whole declaration named `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            path: Vec::new(),
        }
    }

    /// Descend into a named attribute.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.path.push(Accessor::Field(name.into()));
        self
    }

    /// Descend into a map entry.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.path.push(Accessor::Key(key.into()));
        self
    }

    /// Reference an exported output of a stack reference.
    pub fn output(self, key: OutputKey) -> Self {
        self.field("outputs").key(key.as_str())
    }

    /// The `${...}` expression the engine evaluates for this reference.
    pub fn expr(&self) -> String {
        let mut out = format!("${{{}", self.target);
        for step in &self.path {
            match step {
                Accessor::Field(name) => {
                    out.push('.');
                    out.push_str(name);
                }
                Accessor::Key(key) => {
                    out.push_str("[\"");
                    out.push_str(key);
                    out.push_str("\"]");
                }
            }
        }
        out.push('}');
        out
    }
}

/// A piece of an interpolated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Ref(Reference),
}

/// A resource property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Bool(bool),
    Integer(i64),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Ref(Reference),
    /// String built from literal text and references, e.g. `s3://${bucket}/${key}`.
    Interpolate(Vec<Segment>),
    /// A single file shipped with the program.
    FileAsset(PathBuf),
    /// A directory packaged as an archive.
    FileArchive(PathBuf),
}

impl Value {
    /// Build a [`Value::Map`] from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the literal string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the reference, if this is one.
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Look up a map entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Every reference contained in this value, depth first.
    pub fn references(&self) -> Vec<&Reference> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a Reference>) {
        match self {
            Value::Ref(r) => out.push(r),
            Value::Interpolate(segments) => {
                for segment in segments {
                    if let Segment::Ref(r) = segment {
                        out.push(r);
                    }
                }
            }
            Value::List(items) => items.iter().for_each(|v| v.collect_references(out)),
            Value::Map(map) => map.values().for_each(|v| v.collect_references(out)),
            Value::String(_)
            | Value::Bool(_)
            | Value::Integer(_)
            | Value::FileAsset(_)
            | Value::FileArchive(_) => {}
        }
    }

    /// Render to the engine's JSON/YAML representation.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => json!(escape(s)),
            Value::Bool(b) => json!(b),
            Value::Integer(i) => json!(i),
            Value::List(items) => items.iter().map(Value::to_json).collect(),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Ref(r) => json!(r.expr()),
            Value::Interpolate(segments) => {
                let mut out = String::new();
                for segment in segments {
                    match segment {
                        Segment::Text(t) => out.push_str(&escape(t)),
                        Segment::Ref(r) => out.push_str(&r.expr()),
                    }
                }
                json!(out)
            }
            Value::FileAsset(path) => json!({ "fn::fileAsset": path.display().to_string() }),
            Value::FileArchive(path) => json!({ "fn::fileArchive": path.display().to_string() }),
        }
    }
}

/// Literal text must not be read back as an interpolation.
fn escape(s: &str) -> String {
    s.replace("${", "$${")
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<Reference> for Value {
    fn from(r: Reference) -> Self {
        Value::Ref(r)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_expr_fields_and_keys() {
        let r = Reference::new("apiGatewayDomain")
            .field("domainNameConfiguration")
            .field("targetDomainName");
        assert_eq!(
            r.expr(),
            "${apiGatewayDomain.domainNameConfiguration.targetDomainName}"
        );

        let out = Reference::new("infraRef").output(OutputKey::ApiCertArnMtls);
        assert_eq!(out.expr(), "${infraRef.outputs[\"apiCertArnMtls\"]}");
    }

    #[test]
    fn interpolation_renders_template() {
        let v = Value::Interpolate(vec![
            Segment::Text("s3://".into()),
            Segment::Ref(Reference::new("infraRef").output(OutputKey::TruststoreBucketName)),
            Segment::Text("/".into()),
            Segment::Ref(Reference::new("infraRef").output(OutputKey::TruststoreObjectKey)),
        ]);
        assert_eq!(
            v.to_json(),
            json!("s3://${infraRef.outputs[\"truststoreBucketName\"]}/${infraRef.outputs[\"truststoreObjectKey\"]}")
        );
        assert_eq!(v.references().len(), 2);
    }

    #[test]
    fn literal_dollar_brace_is_escaped() {
        assert_eq!(Value::from("cost ${x}").to_json(), json!("cost $${x}"));
    }

    #[test]
    fn nested_references_are_collected() {
        let v = Value::map([(
            "aliases",
            Value::List(vec![Value::map([
                ("zoneId", Value::from(Reference::new("dom").field("zone"))),
                ("evaluateTargetHealth", Value::from(false)),
            ])]),
        )]);
        let refs = v.references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].target, "dom");
    }

    #[test]
    fn assets_render_as_functions() {
        assert_eq!(
            Value::FileAsset("ca.pem".into()).to_json(),
            json!({"fn::fileAsset": "ca.pem"})
        );
        assert_eq!(
            Value::FileArchive("./ping".into()).to_json(),
            json!({"fn::fileArchive": "./ping"})
        );
    }
}
