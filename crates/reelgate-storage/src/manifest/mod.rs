//! Run manifest: the durable per-run ledger of artifact outcomes.

pub mod entries;
pub mod location;
pub mod run_manifest;

pub use entries::{AudioEntry, EntryStatus, GateSummary, QualityDetails, ScriptEntry};
pub use location::ManifestLocation;
pub use run_manifest::{ManifestDocument, RunManifest};
