//! Shared domain types: closed status enums, gate outcomes, artifacts.

pub mod artifact;
pub mod outcome;
pub mod status;

pub use artifact::{
    Artifact, AudioArtifact, ScriptArtifact, ScriptDocument, ScriptMetadata, word_count,
};
pub use outcome::GateOutcome;
pub use status::{ArtifactKind, GateStatus, Severity};
