//! # Spectral Certify
//!
//! Certified convergence analysis of Riemann zeta zero spacing statistics
//! against the Gaussian Unitary Ensemble (GUE) limit.
//!
//! The pipeline computes the sequential correlation statistic
//! S_N = M⁻¹ Σ γ̃_k γ̃_{k+1} over normalized (unfolded) spacings, derives a
//! bootstrap confidence interval, selects a certified-optimal subset of the
//! data via branch-and-bound with a proven optimality gap, re-expresses the
//! statistic in three representations (raw, subset-restricted, spectrally
//! compressed), and certifies the theoretical convergence bound
//! |S_N − C_GUE| ≤ A/√N + B·ln N/N with an explicit numeric margin.
//!
//! Zero ordinates are supplied by the caller; this crate performs no
//! zero-finding, network access, or file I/O.

pub mod bootstrap;
pub mod certifier;
pub mod controller;
pub mod error;
pub mod representation;
pub mod selector;
pub mod sequence;
pub mod statistic;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use error::PipelineError;

/// Which representation of the statistic a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepresentationKind {
    /// Identity wrapper over the statistic engine output.
    Raw,
    /// Statistic restricted to the solver-selected subset.
    MilpSubset,
    /// Statistic recomputed from the sparsified spectral reconstruction.
    LieGroupCompressed,
}

impl std::fmt::Display for RepresentationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepresentationKind::Raw => write!(f, "raw"),
            RepresentationKind::MilpSubset => write!(f, "milp-subset"),
            RepresentationKind::LieGroupCompressed => write!(f, "lie-group"),
        }
    }
}

/// Which convergence bound the certifier compares against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundType {
    /// A/√N + B·ln N / N with the configured constants.
    Theoretical,
    /// A caller-supplied explicit bound value.
    Explicit(f64),
}

/// Immutable configuration threaded through every component call.
///
/// Carried by value into the controller; no component mutates it or keeps
/// ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Target number of zero ordinates N, for external zero acquisition.
    /// Recorded for provenance only; the core derives N from the supplied
    /// sequence.
    pub count: usize,
    /// Search ceiling used by external zero acquisition. Recorded for
    /// provenance only; the core never reads it.
    pub height: f64,
    /// Representation whose deviation drives the certification decision.
    /// `None` means worst case across all three.
    pub representation: Option<RepresentationKind>,
    /// Bound variant for the certifier.
    pub bound_type: BoundType,
    /// Convergence constant A in A/√N.
    pub bound_a: f64,
    /// Finite-size correction constant B in B·ln N/N.
    pub bound_b: f64,
    /// Optimality gap below which a subset solution counts as certified.
    pub gap_tolerance: f64,
    /// Number of bootstrap resamples.
    pub resamples: usize,
    /// Bootstrap confidence level in (0, 1).
    pub confidence: f64,
    /// Seed for every randomized step (bootstrap resampling).
    pub seed: u64,
    /// Wall-clock budget for the branch-and-bound solver.
    pub time_limit: Duration,
    /// Block resampling (preserves local spacing correlation) vs i.i.d.
    pub block_resampling: bool,
    /// Bootstrap block size; `None` picks ⌈√n⌉.
    pub block_size: Option<usize>,
    /// Sliding window for local-mean unfolding; `None` unfolds by the
    /// global mean spacing.
    pub unfold_window: Option<usize>,
    /// Number of candidate blocks the subset selector decides over.
    pub candidate_blocks: usize,
    /// Minimum fraction of product terms the selected subset must cover.
    pub coverage_frac: f64,
    /// Soft-threshold level relative to the largest spectral coefficient.
    pub sparsity_param: f64,
    /// Maximum admissible relative reconstruction error for the compressed
    /// representation.
    pub compression_tolerance: f64,
    /// Maximum admissible pairwise difference between representations'
    /// statistic values.
    pub cross_tolerance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            height: 1e12,
            representation: None,
            bound_type: BoundType::Theoretical,
            bound_a: statistic::A_CONSTANT,
            bound_b: statistic::B_CONSTANT,
            gap_tolerance: 1e-6,
            resamples: 1000,
            confidence: 0.95,
            seed: 0,
            time_limit: Duration::from_secs(10),
            block_resampling: true,
            block_size: None,
            unfold_window: None,
            candidate_blocks: 24,
            coverage_frac: 0.5,
            sparsity_param: 0.002,
            compression_tolerance: 0.1,
            cross_tolerance: 0.05,
        }
    }
}
