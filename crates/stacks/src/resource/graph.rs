//! Dependency graph of a [`Program`] and its validation.
//!
//! Edges come from two places: explicit `dependsOn` options and references
//! inside property values. A program is renderable only when every edge points
//! at a declared name and the resource edges form a DAG.

use std::collections::{BTreeMap, BTreeSet};

use common::StackError;
use tracing::debug;

use super::Program;

/// Name used for the program's outputs when reporting a dangling reference.
const OUTPUTS: &str = "<outputs>";

/// Resource-to-resource dependency edges of one program.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Resource id → ids of the resources it depends on.
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Build and validate the graph for `program`.
    ///
    /// # Errors
    ///
    /// - [`StackError::DuplicateResource`] if two resources share an id or a
    ///   logical name, or a resource id shadows a variable.
    /// - [`StackError::UnresolvedReference`] if a property, option, variable
    ///   argument or output names nothing declared in the program.
    /// - [`StackError::DependencyCycle`] if the resources depend on each other
    ///   in a loop.
    pub fn build(program: &Program) -> Result<Self, StackError> {
        let mut ids = BTreeSet::new();
        let mut names = BTreeSet::new();
        for resource in &program.resources {
            if !ids.insert(resource.id.as_str())
                || program.variables.contains_key(&resource.id)
            {
                return Err(StackError::DuplicateResource(resource.id.clone()));
            }
            if !names.insert(resource.name.as_str()) {
                return Err(StackError::DuplicateResource(resource.name.clone()));
            }
        }

        let resolve = |owner: &str, target: &str| -> Result<bool, StackError> {
            if ids.contains(target) {
                Ok(true)
            } else if program.variables.contains_key(target) {
                Ok(false)
            } else {
                Err(StackError::UnresolvedReference {
                    resource: owner.to_owned(),
                    target: target.to_owned(),
                })
            }
        };

        let mut edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for resource in &program.resources {
            let deps = edges.entry(resource.id.clone()).or_default();

            for dep in &resource.options.depends_on {
                if !ids.contains(dep.as_str()) {
                    return Err(StackError::UnresolvedReference {
                        resource: resource.id.clone(),
                        target: dep.clone(),
                    });
                }
                deps.insert(dep.clone());
            }

            for value in resource.properties.values() {
                for reference in value.references() {
                    if resolve(&resource.id, &reference.target)? {
                        deps.insert(reference.target.clone());
                    }
                }
            }
        }

        for (id, invoke) in &program.variables {
            for value in invoke.arguments.values() {
                for reference in value.references() {
                    resolve(id, &reference.target)?;
                }
            }
        }

        for value in program.outputs.values() {
            for reference in value.references() {
                resolve(OUTPUTS, &reference.target)?;
            }
        }

        let graph = Self { edges };
        graph.order()?;
        Ok(graph)
    }

    /// Direct dependencies of the resource `id`.
    pub fn dependencies(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.edges.get(id)
    }

    /// Returns `true` if `id` depends on `dep`, directly or transitively.
    pub fn depends_on(&self, id: &str, dep: &str) -> bool {
        let mut stack = vec![id];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            let Some(deps) = self.edges.get(current) else {
                continue;
            };
            for d in deps {
                if d == dep {
                    return true;
                }
                if seen.insert(d.as_str()) {
                    stack.push(d.as_str());
                }
            }
        }
        false
    }

    /// A creation order in which every resource follows its dependencies.
    ///
    /// Ties are broken by id so the order is stable across runs.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::DependencyCycle`] with one offending loop.
    pub fn order(&self) -> Result<Vec<String>, StackError> {
        let mut remaining: BTreeMap<&str, usize> = self
            .edges
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (id, deps) in &self.edges {
            for dep in deps {
                dependents.entry(dep.as_str()).or_default().push(id.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.edges.len());

        while let Some(id) = ready.pop_first() {
            remaining.remove(id);
            order.push(id.to_owned());
            for dependent in dependents.get(id).into_iter().flatten() {
                if let Some(n) = remaining.get_mut(dependent) {
                    *n -= 1;
                    if *n == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if !remaining.is_empty() {
            let stuck: BTreeSet<&str> = remaining.keys().copied().collect();
            return Err(StackError::DependencyCycle(self.find_cycle(&stuck)));
        }

        debug!(resources = order.len(), "dependency order computed");
        Ok(order)
    }

    /// Walk unresolved edges from the smallest stuck id until a node repeats.
    ///
    /// Every stuck node still has a stuck dependency, so the walk must loop.
    fn find_cycle(&self, stuck: &BTreeSet<&str>) -> Vec<String> {
        let mut path: Vec<&str> = Vec::new();
        let mut current = match stuck.first() {
            Some(id) => *id,
            None => return Vec::new(),
        };
        loop {
            if let Some(pos) = path.iter().position(|id| *id == current) {
                let mut cycle: Vec<String> = path[pos..].iter().map(|s| (*s).to_owned()).collect();
                cycle.push(current.to_owned());
                return cycle;
            }
            path.push(current);
            let next = self
                .edges
                .get(current)
                .and_then(|deps| deps.iter().find(|d| stuck.contains(d.as_str())));
            match next {
                Some(dep) => current = dep.as_str(),
                None => return path.iter().map(|s| (*s).to_owned()).collect(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Invoke, Reference, Resource, ResourceKind};
    use common::OutputKey;

    fn chain() -> Program {
        let mut p = Program::new("chain", "");
        let api = p.add(Resource::new("api", "Api", ResourceKind::ApiGatewayApi));
        let integration = p.add(
            Resource::new("integration", "Integration", ResourceKind::ApiGatewayIntegration)
                .prop("apiId", api.attr("id")),
        );
        let route = p.add(
            Resource::new("route", "Route", ResourceKind::ApiGatewayRoute)
                .prop("apiId", api.attr("id"))
                .prop("target", integration.attr("id")),
        );
        let stage = p.add(
            Resource::new("stage", "Stage", ResourceKind::ApiGatewayStage)
                .prop("apiId", api.attr("id"))
                .depends_on(&route),
        );
        p.add(
            Resource::new("mapping", "Mapping", ResourceKind::ApiGatewayApiMapping)
                .prop("stage", stage.attr("id")),
        );
        p
    }

    #[test]
    fn order_respects_dependencies() {
        let graph = DependencyGraph::build(&chain()).unwrap();
        let order = graph.order().unwrap();
        let pos = |id: &str| order.iter().position(|o| o == id).unwrap();
        assert!(pos("api") < pos("integration"));
        assert!(pos("integration") < pos("route"));
        assert!(pos("route") < pos("stage"));
        assert!(pos("stage") < pos("mapping"));
        assert!(graph.depends_on("mapping", "api"));
        assert!(!graph.depends_on("api", "mapping"));
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let mut p = chain();
        p.add(
            Resource::new("dangling", "Dangling", ResourceKind::ApiGatewayRoute)
                .prop("apiId", Reference::new("missingApi").field("id")),
        );
        match DependencyGraph::build(&p) {
            Err(StackError::UnresolvedReference { resource, target }) => {
                assert_eq!(resource, "dangling");
                assert_eq!(target, "missingApi");
            }
            other => panic!("expected unresolved reference, got {other:?}"),
        }
    }

    #[test]
    fn unknown_output_reference_is_rejected() {
        let mut p = chain();
        p.export(OutputKey::ApiDomain, Reference::new("nowhere").field("domainName"));
        assert!(matches!(
            DependencyGraph::build(&p),
            Err(StackError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn variable_references_are_not_edges() {
        let mut p = Program::new("zone", "");
        let zone = p.invoke("apiZone", Invoke::new("aws:route53:getZone").arg("name", "example.com"));
        p.add(
            Resource::new("record", "Record", ResourceKind::Route53Record)
                .prop("zoneId", zone.attr("zoneId")),
        );
        let graph = DependencyGraph::build(&p).unwrap();
        assert!(graph.dependencies("record").unwrap().is_empty());
    }

    #[test]
    fn duplicate_logical_name_is_rejected() {
        let mut p = Program::new("dup", "");
        p.add(Resource::new("a", "Same", ResourceKind::S3Bucket));
        p.add(Resource::new("b", "Same", ResourceKind::S3Bucket));
        assert!(matches!(
            DependencyGraph::build(&p),
            Err(StackError::DuplicateResource(name)) if name == "Same"
        ));
    }

    #[test]
    fn cycle_is_reported_with_path() {
        let mut p = Program::new("cycle", "");
        p.add(
            Resource::new("a", "A", ResourceKind::S3Bucket).prop("x", Reference::new("b").field("id")),
        );
        p.add(
            Resource::new("b", "B", ResourceKind::S3Bucket).prop("x", Reference::new("a").field("id")),
        );
        match DependencyGraph::build(&p) {
            Err(StackError::DependencyCycle(path)) => {
                assert_eq!(path, vec!["a".to_string(), "b".to_string(), "a".to_string()]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut p = Program::new("self", "");
        p.add(
            Resource::new("a", "A", ResourceKind::S3Bucket).prop("x", Reference::new("a").field("id")),
        );
        assert!(matches!(
            DependencyGraph::build(&p),
            Err(StackError::DependencyCycle(_))
        ));
    }
}
