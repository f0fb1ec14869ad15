//! # reelgate-checker
//!
//! Wires gates, reports, quarantine, the run manifest and metrics into a
//! per-kind [`Checker`] with sequential or parallel batch execution.

// Error enums carry path context.
#![allow(clippy::result_large_err)]

pub mod checker;
pub mod load;
pub mod metrics;
pub mod report;
pub mod summary;

pub use checker::{BatchSummary, CheckResult, Checker, CheckerOptions};
pub use metrics::{MetricsAggregator, MetricsSink, TextfileSink};
pub use report::{QualityReport, QualityReporter};
pub use summary::{Summary, SummaryReporter};
