//! Edge-weight sensitivity analysis.
//!
//! Measures how changing one edge's weight moves a shortest-path cost. Each
//! perturbation is applied to the store, measured, and reverted before the
//! next one, so results are independent of each other and of input order.
//!
//! The caller must hold exclusive access to the store for the whole run; the
//! store is mutated while a perturbation is being measured and is back in its
//! original state when [`analyze`] returns, whether it succeeds or not.

use crate::domain::{EdgeSpec, NodeId};
use crate::error::Result;
use crate::store::GraphStore;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Which cost is recomputed after each perturbation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensitivityTarget {
    /// Shortest `origin -> destination` cost, with a baseline measured once
    /// before any perturbation.
    Route {
        /// Start of the measured route.
        origin: NodeId,
        /// End of the measured route.
        destination: NodeId,
    },

    /// Shortest cost between the perturbed edge's own endpoints. There is no
    /// shared baseline; each entry carries the edge's original weight.
    EdgeLocal,
}

/// One line of a sensitivity report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensitivityEntry {
    /// Unperturbed route cost. Only emitted for [`SensitivityTarget::Route`].
    Baseline {
        /// Route start.
        origin: NodeId,
        /// Route end.
        destination: NodeId,
        /// Shortest cost before any change.
        cost: i64,
    },

    /// Cost measured with one edge set to a trial weight.
    Perturbed {
        /// The edge that was changed.
        edge: (NodeId, NodeId),
        /// Weight before and after the trial.
        original_weight: i64,
        /// Trial weight.
        new_weight: i64,
        /// Target cost under the trial weight.
        cost: i64,
    },

    /// The perturbation could not be evaluated.
    Failed {
        /// The requested edge.
        edge: (NodeId, NodeId),
        /// Human-readable cause.
        reason: String,
    },
}

/// Ordered results of one analysis run.
///
/// For a route target the baseline comes first; then exactly one entry per
/// requested perturbation, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SensitivityReport {
    /// Report lines.
    pub entries: Vec<SensitivityEntry>,
}

impl SensitivityReport {
    /// Baseline cost, if the target had one.
    #[must_use]
    pub fn baseline(&self) -> Option<i64> {
        self.entries.iter().find_map(|entry| match entry {
            SensitivityEntry::Baseline { cost, .. } => Some(*cost),
            _ => None,
        })
    }

    /// Number of perturbations that could not be evaluated.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, SensitivityEntry::Failed { .. }))
            .count()
    }
}

/// Run a sensitivity analysis against `store`.
///
/// # Errors
///
/// For a route target, fails if the baseline cannot be computed (unknown node
/// or no path). Per-edge problems never fail the run; they become
/// [`SensitivityEntry::Failed`] entries.
pub fn analyze(
    store: &mut GraphStore,
    target: &SensitivityTarget,
    perturbations: &[EdgeSpec],
) -> Result<SensitivityReport> {
    let mut entries = Vec::with_capacity(perturbations.len() + 1);

    if let SensitivityTarget::Route {
        origin,
        destination,
    } = target
    {
        let cost = store.shortest_path_cost(origin, destination)?;
        entries.push(SensitivityEntry::Baseline {
            origin: origin.clone(),
            destination: destination.clone(),
            cost,
        });
    }

    for spec in perturbations {
        let entry = evaluate(store, target, spec);
        debug!(a = %spec.a, b = %spec.b, new_weight = spec.weight, ?entry, "Perturbation evaluated");
        entries.push(entry);
    }

    let report = SensitivityReport { entries };
    info!(
        perturbations = perturbations.len(),
        failures = report.failure_count(),
        "Sensitivity analysis complete"
    );
    Ok(report)
}

/// Apply one perturbation, measure, and put the original weight back.
fn evaluate(store: &mut GraphStore, target: &SensitivityTarget, spec: &EdgeSpec) -> SensitivityEntry {
    let edge = (spec.a.clone(), spec.b.clone());

    let original_weight = match store.set_edge_weight(&spec.a, &spec.b, spec.weight) {
        Ok(previous) => previous,
        Err(e) => {
            return SensitivityEntry::Failed {
                edge,
                reason: e.to_string(),
            };
        }
    };

    let trial = TrialWeight {
        store,
        a: &spec.a,
        b: &spec.b,
        original: original_weight,
    };
    let measured = match target {
        SensitivityTarget::Route {
            origin,
            destination,
        } => trial.store.shortest_path_cost(origin, destination),
        SensitivityTarget::EdgeLocal => trial.store.shortest_path_cost(&spec.a, &spec.b),
    };
    drop(trial);

    match measured {
        Ok(cost) => SensitivityEntry::Perturbed {
            edge,
            original_weight,
            new_weight: spec.weight,
            cost,
        },
        Err(e) => SensitivityEntry::Failed {
            edge,
            reason: e.to_string(),
        },
    }
}

/// Edge carrying a trial weight. Dropping it puts `original` back, also
/// when the measurement unwinds.
struct TrialWeight<'a> {
    store: &'a mut GraphStore,
    a: &'a NodeId,
    b: &'a NodeId,
    original: i64,
}

impl Drop for TrialWeight<'_> {
    fn drop(&mut self) {
        // The edge exists and `original` was accepted before, so this holds.
        if let Err(e) = self.store.set_edge_weight(self.a, self.b, self.original) {
            warn!(a = %self.a, b = %self.b, error = %e, "Failed to restore edge weight");
        }
    }
}
