//! Ordered gate execution for one artifact.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use reelgate_core::errors::GateError;
use reelgate_core::tracing::fields;
use reelgate_core::types::{Artifact, ArtifactKind, GateOutcome, GateStatus};

use crate::catalog::BoxedGate;
use crate::gate::Gate;

/// Notified after every gate execution, skipped gates included.
pub trait GateObserver: Send + Sync {
    fn on_gate(&self, kind: ArtifactKind, outcome: &GateOutcome);
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// One entry per configured gate, in order.
    pub outcomes: Vec<GateOutcome>,
    pub status: GateStatus,
    pub critical_failures: usize,
    pub duration_ms: u64,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.status != GateStatus::Fail
    }

    pub fn has_critical_failure(&self) -> bool {
        self.critical_failures > 0
    }

    /// Gates that actually executed.
    pub fn gates_run(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status() != GateStatus::Skipped)
            .count()
    }
}

#[derive(Clone, Default)]
pub struct GateRunner {
    lazy: bool,
    observer: Option<Arc<dyn GateObserver>>,
}

impl GateRunner {
    /// In lazy mode the first critical failure (or gate error) stops the run
    /// and every remaining gate is reported as skipped.
    pub fn new(lazy: bool) -> Self {
        Self {
            lazy,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn GateObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn run(&self, gates: &[BoxedGate], artifact: &Artifact) -> RunOutcome {
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(gates.len());
        let mut halted_by: Option<&str> = None;

        for gate in gates {
            let outcome = match halted_by {
                Some(culprit) => GateOutcome::skipped(
                    gate.name(),
                    gate.severity(),
                    format!("Skipped due to critical failure in {culprit}"),
                ),
                None => {
                    let (outcome, errored) = self.execute(&**gate, artifact);
                    if self.lazy && (errored || outcome.is_critical_failure()) {
                        halted_by = Some(gate.name());
                    }
                    outcome
                }
            };
            if let Some(observer) = &self.observer {
                observer.on_gate(artifact.kind(), &outcome);
            }
            outcomes.push(outcome);
        }

        let status = GateStatus::aggregate(outcomes.iter().map(|o| (o.status(), o.severity())));
        let critical_failures = outcomes.iter().filter(|o| o.is_critical_failure()).count();
        RunOutcome {
            outcomes,
            status,
            critical_failures,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Run one gate, timing it and containing errors and panics.
    fn execute(&self, gate: &dyn Gate, artifact: &Artifact) -> (GateOutcome, bool) {
        let start = Instant::now();
        let result = catch_unwind(AssertUnwindSafe(|| gate.check(artifact)))
            .unwrap_or_else(|payload| Err(GateError::Panicked(panic_message(payload.as_ref()))));
        let elapsed = start.elapsed().as_millis() as u64;

        match result {
            Ok(outcome) => {
                tracing::debug!(
                    { fields::GATE } = gate.name(),
                    { fields::ARTIFACT_ID } = artifact.id(),
                    { fields::GATE_DURATION_MS } = elapsed,
                    status = outcome.status().as_str(),
                    "gate finished"
                );
                (outcome.with_duration_ms(elapsed), false)
            }
            Err(e) => {
                tracing::error!(
                    { fields::GATE } = gate.name(),
                    { fields::ARTIFACT_ID } = artifact.id(),
                    error = %e,
                    "gate execution error"
                );
                let outcome = GateOutcome::errored(gate.name(), gate.severity(), &e.to_string())
                    .with_duration_ms(elapsed);
                (outcome, true)
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
