//! Policy → ordered gate list.

use reelgate_core::config::QualityPolicy;
use reelgate_core::types::ArtifactKind;

use crate::catalog::{BoxedGate, GateCatalog, GateContext, GateResources};

/// A policy name that did not become a gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedGate {
    pub name: String,
    pub reason: String,
}

/// Gates for one artifact kind, in policy order. Built once per checker.
pub struct GateRegistry {
    kind: ArtifactKind,
    gates: Vec<BoxedGate>,
    unresolved: Vec<UnresolvedGate>,
}

impl GateRegistry {
    /// Resolve `policy.ordering.<kind>` against `catalog`.
    ///
    /// Unknown names, names registered for the other artifact kind and
    /// constructor failures are logged and left out; they are listed by
    /// [`resolution_report`](Self::resolution_report). A disabled policy
    /// yields no gates.
    pub fn from_policy(
        policy: &QualityPolicy,
        kind: ArtifactKind,
        catalog: &GateCatalog,
        resources: &GateResources,
    ) -> Self {
        let mut registry = Self {
            kind,
            gates: Vec::new(),
            unresolved: Vec::new(),
        };
        if !policy.enabled {
            tracing::info!(artifact_kind = kind.as_str(), "quality gates disabled by policy");
            return registry;
        }

        for name in policy.ordering_for(kind) {
            let Some(descriptor) = catalog.get(name) else {
                registry.omit(name, "unknown gate");
                continue;
            };
            if descriptor.kind() != kind {
                registry.omit(
                    name,
                    &format!("registered for {} artifacts", descriptor.kind().as_str()),
                );
                continue;
            }
            let ctx = GateContext {
                name,
                policy,
                resources,
            };
            match descriptor.construct(&ctx, policy.severity_of(name)) {
                Ok(gate) => registry.gates.push(gate),
                Err(e) => registry.omit(name, &e.to_string()),
            }
        }

        tracing::debug!(
            artifact_kind = kind.as_str(),
            gates = registry.gates.len(),
            omitted = registry.unresolved.len(),
            "built gate registry"
        );
        registry
    }

    fn omit(&mut self, name: &str, reason: &str) {
        tracing::warn!(gate = name, artifact_kind = self.kind.as_str(), reason, "gate omitted");
        self.unresolved.push(UnresolvedGate {
            name: name.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn gates(&self) -> &[BoxedGate] {
        &self.gates
    }

    pub fn names(&self) -> Vec<&str> {
        self.gates.iter().map(|g| g.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn resolution_report(&self) -> &[UnresolvedGate] {
        &self.unresolved
    }
}
