//! Certification of the convergence bound.
//!
//! The certifier is the only component that renders a pass/fail verdict.
//! It compares the observed deviation |S_N − C_GUE| against either the
//! theoretical bound A/√N + B·ln N/N or a caller-supplied explicit bound,
//! requires the subset solution's optimality gap to be certified, and
//! requires all representations to have agreed. Every failure is
//! enumerated; the margin is reported whether the run passes or not.

use serde::{Deserialize, Serialize};

use crate::bootstrap::ConfidenceInterval;
use crate::controller::{Aggregate, Stage};
use crate::error::PipelineError;
use crate::representation::DivergenceRecord;
use crate::selector::SolverStatus;
use crate::statistic::{convergence_bound, C_GUE};
use crate::{BoundType, PipelineConfig, RepresentationKind};

/// Why a run failed certification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The deviation exceeded the convergence bound.
    BoundExceeded { deviation: f64, bound: f64 },
    /// The subset solver could not prove its gap below tolerance.
    SubsetNotCertified { gap: f64, tolerance: f64 },
    /// Two representations disagreed beyond the cross tolerance.
    RepresentationDivergence {
        first: RepresentationKind,
        second: RepresentationKind,
        delta: f64,
    },
}

/// One representation's statistic and its deviation from C_GUE.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepresentationSummary {
    pub kind: RepresentationKind,
    pub value: f64,
    pub deviation: f64,
}

/// Subset solver outcome carried into the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsetSummary {
    pub status: SolverStatus,
    pub gap: f64,
    pub objective: f64,
    pub selected_blocks: usize,
    pub covered_terms: usize,
    pub nodes_explored: u64,
}

/// The full certification verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificationReport {
    /// Number of zero ordinates.
    pub n: usize,
    /// Number of normalized gaps the bound is evaluated at.
    pub gap_count: usize,
    pub bound_type: BoundType,
    /// The bound value the deviation was compared against.
    pub bound: f64,
    /// The deviation that drove the verdict.
    pub deviation: f64,
    /// bound − deviation; negative when the bound is violated.
    pub margin: f64,
    pub pass: bool,
    pub reasons: Vec<FailureReason>,
    pub representations: Vec<RepresentationSummary>,
    pub subset: SubsetSummary,
    pub interval: ConfidenceInterval,
    pub divergences: Vec<DivergenceRecord>,
    pub stages: Vec<Stage>,
}

/// Render the verdict for a completed aggregate.
///
/// The comparison is inclusive: a deviation exactly on the bound passes.
pub fn certify(
    agg: &Aggregate,
    config: &PipelineConfig,
) -> Result<CertificationReport, PipelineError> {
    let bound = match config.bound_type {
        BoundType::Theoretical => {
            convergence_bound(agg.gap_count, config.bound_a, config.bound_b)
        }
        BoundType::Explicit(value) => {
            if !value.is_finite() || value <= 0.0 {
                return Err(PipelineError::InvalidInput(format!(
                    "explicit bound must be a positive finite number, got {}",
                    value
                )));
            }
            value
        }
    };

    let representations: Vec<RepresentationSummary> = agg
        .representations
        .iter()
        .map(|rep| {
            let value = rep.statistic().value;
            RepresentationSummary {
                kind: rep.kind(),
                value,
                deviation: (value - C_GUE).abs(),
            }
        })
        .collect();

    let deviation = match config.representation {
        Some(kind) => {
            representations
                .iter()
                .find(|r| r.kind == kind)
                .ok_or_else(|| {
                    PipelineError::InvalidInput(format!(
                        "requested representation {} was not computed",
                        kind
                    ))
                })?
                .deviation
        }
        // Worst case across representations.
        None => representations
            .iter()
            .map(|r| r.deviation)
            .fold(0.0, f64::max),
    };

    let mut reasons = Vec::new();
    if deviation > bound {
        reasons.push(FailureReason::BoundExceeded { deviation, bound });
    }
    if !agg.subset.certified(config.gap_tolerance) {
        reasons.push(FailureReason::SubsetNotCertified {
            gap: agg.subset.gap,
            tolerance: config.gap_tolerance,
        });
    }
    for d in &agg.divergences {
        reasons.push(FailureReason::RepresentationDivergence {
            first: d.first,
            second: d.second,
            delta: d.delta,
        });
    }

    let mut stages = agg.stages.clone();
    stages.push(Stage::Certified);

    Ok(CertificationReport {
        n: agg.n,
        gap_count: agg.gap_count,
        bound_type: config.bound_type,
        bound,
        deviation,
        margin: bound - deviation,
        pass: reasons.is_empty(),
        reasons,
        representations,
        subset: SubsetSummary {
            status: agg.subset.status,
            gap: agg.subset.gap,
            objective: agg.subset.objective,
            selected_blocks: agg.subset.selected.len(),
            covered_terms: agg.subset.covered_terms,
            nodes_explored: agg.subset.nodes_explored,
        },
        interval: agg.interval,
        divergences: agg.divergences.clone(),
        stages,
    })
}
