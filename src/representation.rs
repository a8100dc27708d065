//! Alternative representations of the spacing statistic.
//!
//! Three representations of S_N certify each other: the raw engine output,
//! the statistic restricted to the solver-selected subset, and the statistic
//! recomputed from a sparsified spectral reconstruction of the gap sequence.
//! All three must agree within the cross-representation tolerance; a pair
//! that does not is recorded as a divergence and fails certification without
//! aborting the run.
//!
//! The compressed representation takes the DFT of the normalized gaps,
//! soft-thresholds the coefficients at a fraction of the spectral peak, and
//! inverts. The relative L2 reconstruction error is measured against the
//! original gaps; exceeding the compression tolerance is a fatal error
//! because the compressed statistic would then certify nothing.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::selector::{SubsetProblem, SubsetSolution};
use crate::statistic::{statistic_from_gaps, SpacingStatistic};
use crate::RepresentationKind;

/// One materialized representation of the statistic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Representation {
    Raw {
        statistic: SpacingStatistic,
    },
    MilpSubset {
        /// Mean of the product terms over the selected blocks.
        statistic: SpacingStatistic,
        selected_blocks: Vec<usize>,
        covered_terms: usize,
    },
    LieGroupCompressed {
        /// S_N recomputed from the reconstructed gaps.
        statistic: SpacingStatistic,
        sparsity_param: f64,
        /// Absolute soft-threshold applied to the spectral magnitudes.
        threshold: f64,
        /// Relative L2 error ‖γ̃ − γ̂‖ / ‖γ̃‖ of the reconstruction.
        reconstruction_error: f64,
    },
}

impl Representation {
    pub fn kind(&self) -> RepresentationKind {
        match self {
            Representation::Raw { .. } => RepresentationKind::Raw,
            Representation::MilpSubset { .. } => RepresentationKind::MilpSubset,
            Representation::LieGroupCompressed { .. } => RepresentationKind::LieGroupCompressed,
        }
    }

    /// The statistic value this representation reports.
    pub fn statistic(&self) -> SpacingStatistic {
        match self {
            Representation::Raw { statistic }
            | Representation::MilpSubset { statistic, .. }
            | Representation::LieGroupCompressed { statistic, .. } => *statistic,
        }
    }
}

/// The identity representation.
pub fn raw(statistic: SpacingStatistic) -> Representation {
    Representation::Raw { statistic }
}

/// Statistic restricted to the product terms of the selected blocks.
pub fn milp_subset(
    terms: &[f64],
    problem: &SubsetProblem,
    solution: &SubsetSolution,
) -> Result<Representation, PipelineError> {
    let mut sum = 0.0;
    let mut count = 0usize;
    // A maximal run of adjacent product terms spans one more gap than terms.
    let mut runs = 0usize;
    let mut prev_end = usize::MAX;
    for &block in &solution.selected {
        let (start, end) = problem.block_ranges[block];
        sum += terms[start..end].iter().sum::<f64>();
        count += end - start;
        if start != prev_end {
            runs += 1;
        }
        prev_end = end;
    }
    if count == 0 {
        return Err(PipelineError::Infeasible(
            "selected subset covers no product terms".into(),
        ));
    }
    Ok(Representation::MilpSubset {
        statistic: SpacingStatistic {
            value: sum / count as f64,
            terms: count,
            gap_count: count + runs,
        },
        selected_blocks: solution.selected.clone(),
        covered_terms: count,
    })
}

/// Statistic recomputed from the soft-thresholded spectral reconstruction
/// of the normalized gaps.
pub fn lie_group_compressed(
    gaps: &[f64],
    sparsity_param: f64,
    compression_tolerance: f64,
) -> Result<Representation, PipelineError> {
    if gaps.len() < 3 {
        return Err(PipelineError::InvalidInput(format!(
            "need at least 3 gaps to compress, got {}",
            gaps.len()
        )));
    }
    if !(sparsity_param >= 0.0 && sparsity_param < 1.0) {
        return Err(PipelineError::InvalidInput(format!(
            "sparsity parameter must lie in [0, 1), got {}",
            sparsity_param
        )));
    }

    let n = gaps.len();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);

    let mut spectrum: Vec<Complex<f64>> =
        gaps.iter().map(|&g| Complex::new(g, 0.0)).collect();
    fft.process(&mut spectrum);

    let peak = spectrum
        .iter()
        .map(|c| c.norm())
        .fold(0.0f64, f64::max);
    let threshold = sparsity_param * peak;

    // Complex soft-threshold: shrink magnitudes toward zero, keep phases.
    for c in spectrum.iter_mut() {
        let mag = c.norm();
        *c = if mag > threshold {
            *c * ((mag - threshold) / mag)
        } else {
            Complex::new(0.0, 0.0)
        };
    }

    let ifft = planner.plan_fft_inverse(n);
    ifft.process(&mut spectrum);

    let scale = 1.0 / n as f64;
    let reconstructed: Vec<f64> = spectrum.iter().map(|c| c.re * scale).collect();

    let norm_orig: f64 = gaps.iter().map(|g| g * g).sum::<f64>().sqrt();
    let norm_diff: f64 = gaps
        .iter()
        .zip(&reconstructed)
        .map(|(g, r)| (g - r) * (g - r))
        .sum::<f64>()
        .sqrt();
    let reconstruction_error = if norm_orig > 0.0 {
        norm_diff / norm_orig
    } else {
        0.0
    };

    if reconstruction_error > compression_tolerance {
        return Err(PipelineError::CompressionTolerance {
            error: reconstruction_error,
            tolerance: compression_tolerance,
        });
    }

    let statistic = statistic_from_gaps(&reconstructed)?;
    Ok(Representation::LieGroupCompressed {
        statistic,
        sparsity_param,
        threshold,
        reconstruction_error,
    })
}

/// A recorded cross-representation disagreement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivergenceRecord {
    pub first: RepresentationKind,
    pub second: RepresentationKind,
    pub delta: f64,
    pub tolerance: f64,
}

/// Check that two representations agree on the statistic value.
pub fn require_agreement(
    a: &Representation,
    b: &Representation,
    tolerance: f64,
) -> Result<(), PipelineError> {
    let delta = (a.statistic().value - b.statistic().value).abs();
    if delta > tolerance {
        return Err(PipelineError::RepresentationDivergence {
            first: a.kind().to_string(),
            second: b.kind().to_string(),
            delta,
            tolerance,
        });
    }
    Ok(())
}
