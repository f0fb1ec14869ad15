//! # reelgate-gates
//!
//! The [`Gate`] contract, the built-in script and audio gates, the
//! string-keyed [`GateCatalog`], the policy-driven [`GateRegistry`] and the
//! [`GateRunner`] that executes an ordered gate list against one artifact.

// Error enums carry path context.
#![allow(clippy::result_large_err)]

pub mod audio;
pub mod catalog;
pub mod gate;
pub mod registry;
pub mod runner;
pub mod script;

pub use audio::{AudioProbe, CacheStats, DecodeCache};
pub use catalog::{BoxedGate, GateCatalog, GateContext, GateDescriptor, GatePlugin, GateResources};
pub use gate::{Gate, GateMeta};
pub use registry::{GateRegistry, UnresolvedGate};
pub use runner::{GateObserver, GateRunner, RunOutcome};
