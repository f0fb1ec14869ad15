//! Structural conformance of the raw script document.

use reelgate_core::codes;
use reelgate_core::errors::GateError;
use reelgate_core::schema::StructuralSchema;
use reelgate_core::types::{Artifact, ArtifactKind, GateOutcome, Severity};
use serde_json::Value;

use crate::gate::{Gate, GateMeta};

pub struct SchemaGate {
    meta: GateMeta,
    schema: StructuralSchema,
    /// Where the schema came from, for reports; `None` for the built-in one.
    schema_path: Option<String>,
}

impl SchemaGate {
    pub fn new(name: &str, severity: Severity, schema: StructuralSchema, schema_path: Option<String>) -> Self {
        Self {
            meta: GateMeta::new(name, severity),
            schema,
            schema_path,
        }
    }
}

impl Gate for SchemaGate {
    fn name(&self) -> &str {
        self.meta.name()
    }

    fn severity(&self) -> Severity {
        self.meta.severity()
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Script
    }

    fn check(&self, artifact: &Artifact) -> Result<GateOutcome, GateError> {
        let script = self.meta.expect_script(artifact)?;
        let errors = self.schema.validate(&script.raw);

        if errors.is_empty() {
            return Ok(self
                .meta
                .pass("Script structure is valid", codes::SCHEMA_OK)
                .with_detail("schema_version", self.schema.title()));
        }

        let outcome = self
            .meta
            .fail(
                format!("Schema validation failed with {} error(s)", errors.len()),
                codes::SCHEMA_INVALID,
            )
            .with_detail("schema_version", self.schema.title())
            .with_detail(
                "errors",
                Value::Array(errors.into_iter().map(Value::String).collect()),
            );
        Ok(match &self.schema_path {
            Some(p) => outcome.with_detail("schema_path", p.as_str()),
            None => outcome,
        })
    }
}
