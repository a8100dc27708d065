//! Certified subset selection via branch-and-bound.
//!
//! The adjacent-product terms t_k = γ̃_k γ̃_{k+1} are partitioned into K
//! contiguous candidate blocks. A binary decision per block selects a subset
//! whose restricted statistic Σ s_i / Σ n_i must sit as close to the target
//! constant C⋆ as possible, subject to a minimum coverage of product terms.
//! With d_i = s_i − C⋆·n_i the objective is
//!
//!   minimize |Σ_sel d_i| / Σ_sel n_i   s.t.   Σ_sel n_i ≥ L.
//!
//! The solver is a depth-first branch-and-bound. At every node the
//! reachable values of Σ d_i over all completions form the interval
//! [D + negsuffix, D + possuffix]; the distance from that interval to zero,
//! divided by the largest reachable coverage, is a valid lower bound and
//! prunes the subtree. The objective is nonnegative, so zero is always a
//! valid global lower bound: an incumbent below the gap tolerance certifies
//! itself, and exhausting the tree proves optimality with gap exactly 0.
//! On timeout the best incumbent and its honest gap are returned — never a
//! silently downgraded "optimal".

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Check the wall clock once per this many nodes.
const TIME_CHECK_MASK: u64 = 0x3FF;

/// Terminal state of a solver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// Search tree exhausted; the incumbent is provably optimal.
    Optimal,
    /// Incumbent objective fell below the gap tolerance before exhaustion.
    GapCertified,
    /// No selection satisfies the coverage constraint.
    Infeasible,
    /// Time limit reached; the incumbent carries a nonzero proven gap.
    Timeout,
}

/// A validated subset-selection instance.
#[derive(Debug, Clone)]
pub struct SubsetProblem {
    /// Sum of term values per block.
    pub block_sums: Vec<f64>,
    /// Number of terms per block.
    pub block_lens: Vec<usize>,
    /// Half-open term index range per block.
    pub block_ranges: Vec<(usize, usize)>,
    /// Target constant C⋆ for the restricted statistic.
    pub target: f64,
    /// Minimum number of terms the selection must cover.
    pub min_coverage: usize,
}

impl SubsetProblem {
    /// Partition `terms` into `blocks` near-equal contiguous blocks.
    ///
    /// `coverage_frac` in (0, 1] fixes the coverage lower bound as a
    /// fraction of the term count. Degenerate candidate sets (fewer than
    /// two terms or blocks) are infeasible up front.
    pub fn from_terms(
        terms: &[f64],
        blocks: usize,
        coverage_frac: f64,
        target: f64,
    ) -> Result<Self, PipelineError> {
        if terms.len() < 2 {
            return Err(PipelineError::Infeasible(format!(
                "candidate set has {} term(s); need at least 2",
                terms.len()
            )));
        }
        if blocks < 2 {
            return Err(PipelineError::Infeasible(format!(
                "need at least 2 candidate blocks, got {}",
                blocks
            )));
        }
        if !(coverage_frac > 0.0 && coverage_frac <= 1.0) {
            return Err(PipelineError::Infeasible(format!(
                "coverage fraction must lie in (0, 1], got {}",
                coverage_frac
            )));
        }
        if !target.is_finite() {
            return Err(PipelineError::Infeasible(format!(
                "target statistic {} is not finite",
                target
            )));
        }

        // Selections are tracked in a u64 mask; 64 blocks is already far
        // beyond what the search can exhaust.
        let k = blocks.min(terms.len()).min(64);
        let m = terms.len();
        let mut block_sums = Vec::with_capacity(k);
        let mut block_lens = Vec::with_capacity(k);
        let mut block_ranges = Vec::with_capacity(k);
        for i in 0..k {
            let start = i * m / k;
            let end = (i + 1) * m / k;
            block_sums.push(terms[start..end].iter().sum());
            block_lens.push(end - start);
            block_ranges.push((start, end));
        }

        let min_coverage = ((coverage_frac * m as f64).ceil() as usize).max(1);
        if min_coverage > m {
            return Err(PipelineError::Infeasible(format!(
                "coverage lower bound {} exceeds candidate count {}",
                min_coverage, m
            )));
        }

        Ok(Self {
            block_sums,
            block_lens,
            block_ranges,
            target,
            min_coverage,
        })
    }

    fn block_count(&self) -> usize {
        self.block_sums.len()
    }

    fn total_terms(&self) -> usize {
        self.block_lens.iter().sum()
    }
}

/// Best solution found, with its rigorous optimality gap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsetSolution {
    /// Indices of the selected blocks.
    pub selected: Vec<usize>,
    /// Number of product terms the selection covers.
    pub covered_terms: usize,
    /// Objective value |subset mean − target| of the incumbent.
    pub objective: f64,
    /// Proven bound on the distance to the true optimum. Zero when the
    /// search exhausted the tree.
    pub gap: f64,
    pub status: SolverStatus,
    /// Branch-and-bound nodes expanded.
    pub nodes_explored: u64,
}

impl SubsetSolution {
    /// A solution is certified when its proven gap is below the tolerance.
    pub fn certified(&self, gap_tolerance: f64) -> bool {
        self.gap < gap_tolerance
    }
}

/// A solver that returns provable optimality gaps, not just incumbents.
pub trait CertifiedSolver {
    fn solve(&self, problem: &SubsetProblem, time_limit: Duration) -> SubsetSolution;
}

/// Depth-first branch-and-bound with suffix-interval lower bounds.
#[derive(Debug, Clone)]
pub struct BranchBoundSolver {
    /// Early-stop threshold: an incumbent below this certifies itself
    /// against the trivial global lower bound of zero.
    pub gap_tolerance: f64,
}

struct Search<'a> {
    problem: &'a SubsetProblem,
    // d_i = s_i − target·n_i per block.
    deltas: Vec<f64>,
    // Suffix aggregates over blocks i..K.
    suffix_pos: Vec<f64>,
    suffix_neg: Vec<f64>,
    suffix_len: Vec<usize>,
    best_objective: f64,
    best_mask: u64,
    best_covered: usize,
    nodes: u64,
    deadline: Instant,
    timed_out: bool,
    certified_early: bool,
    gap_tolerance: f64,
}

impl CertifiedSolver for BranchBoundSolver {
    fn solve(&self, problem: &SubsetProblem, time_limit: Duration) -> SubsetSolution {
        let k = problem.block_count();
        let deltas: Vec<f64> = problem
            .block_sums
            .iter()
            .zip(&problem.block_lens)
            .map(|(s, &n)| s - problem.target * n as f64)
            .collect();

        let mut suffix_pos = vec![0.0; k + 1];
        let mut suffix_neg = vec![0.0; k + 1];
        let mut suffix_len = vec![0usize; k + 1];
        for i in (0..k).rev() {
            suffix_pos[i] = suffix_pos[i + 1] + deltas[i].max(0.0);
            suffix_neg[i] = suffix_neg[i + 1] + deltas[i].min(0.0);
            suffix_len[i] = suffix_len[i + 1] + problem.block_lens[i];
        }

        // The full selection is always feasible and seeds the incumbent.
        let total = problem.total_terms();
        let full_delta: f64 = deltas.iter().sum();
        let full_objective = full_delta.abs() / total as f64;
        let full_mask = if k == 64 { u64::MAX } else { (1u64 << k) - 1 };

        let start = Instant::now();
        let mut search = Search {
            problem,
            deltas,
            suffix_pos,
            suffix_neg,
            suffix_len,
            best_objective: full_objective,
            best_mask: full_mask,
            best_covered: total,
            nodes: 0,
            deadline: start + time_limit,
            timed_out: false,
            certified_early: full_objective < self.gap_tolerance,
            gap_tolerance: self.gap_tolerance,
        };

        if Instant::now() >= search.deadline {
            search.timed_out = true;
        } else if !search.certified_early {
            search.descend(0, 0.0, 0, 0);
        }

        let (status, gap) = if search.certified_early {
            (SolverStatus::GapCertified, search.best_objective)
        } else if search.timed_out {
            (SolverStatus::Timeout, search.best_objective)
        } else {
            (SolverStatus::Optimal, 0.0)
        };

        let selected: Vec<usize> = (0..k).filter(|i| search.best_mask >> i & 1 == 1).collect();
        SubsetSolution {
            selected,
            covered_terms: search.best_covered,
            objective: search.best_objective,
            gap,
            status,
            nodes_explored: search.nodes,
        }
    }
}

impl Search<'_> {
    fn descend(&mut self, i: usize, delta_acc: f64, len_acc: usize, mask: u64) {
        if self.timed_out || self.certified_early {
            return;
        }
        self.nodes += 1;
        if self.nodes & TIME_CHECK_MASK == 0 && Instant::now() >= self.deadline {
            self.timed_out = true;
            return;
        }

        let k = self.problem.block_count();
        if i == k {
            if len_acc >= self.problem.min_coverage {
                let objective = delta_acc.abs() / len_acc as f64;
                if objective < self.best_objective {
                    self.best_objective = objective;
                    self.best_mask = mask;
                    self.best_covered = len_acc;
                    if objective < self.gap_tolerance {
                        self.certified_early = true;
                    }
                }
            }
            return;
        }

        // Coverage can no longer be reached: prune.
        if len_acc + self.suffix_len[i] < self.problem.min_coverage {
            return;
        }

        // Interval of reachable Σd over all completions of this node.
        let lo = delta_acc + self.suffix_neg[i];
        let hi = delta_acc + self.suffix_pos[i];
        let numerator_bound = if lo > 0.0 {
            lo
        } else if hi < 0.0 {
            -hi
        } else {
            0.0
        };
        let max_len = (len_acc + self.suffix_len[i]) as f64;
        if numerator_bound / max_len >= self.best_objective {
            return;
        }

        self.descend(
            i + 1,
            delta_acc + self.deltas[i],
            len_acc + self.problem.block_lens[i],
            mask | 1 << i,
        );
        self.descend(i + 1, delta_acc, len_acc, mask);
    }
}

/// Build the instance from product terms and solve it.
pub fn select_subset(
    terms: &[f64],
    blocks: usize,
    coverage_frac: f64,
    target: f64,
    gap_tolerance: f64,
    time_limit: Duration,
) -> Result<(SubsetProblem, SubsetSolution), PipelineError> {
    let problem = SubsetProblem::from_terms(terms, blocks, coverage_frac, target)?;
    let solver = BranchBoundSolver { gap_tolerance };
    let solution = solver.solve(&problem, time_limit);
    Ok((problem, solution))
}
