//! # reelgate-storage
//!
//! File-backed shared state for reelgate: the run manifest and the content
//! dedup index. Both follow the same discipline: one in-process mutex plus an
//! advisory lock file around every read-merge-write, and temp-file + rename
//! for every replacement.

pub mod atomic;
pub mod dedup;
pub mod lock;
pub mod manifest;

pub use atomic::{atomic_write, atomic_write_json};
pub use dedup::DedupIndex;
pub use lock::FileMutex;
pub use manifest::{
    AudioEntry, EntryStatus, GateSummary, ManifestDocument, ManifestLocation, QualityDetails,
    RunManifest, ScriptEntry,
};
