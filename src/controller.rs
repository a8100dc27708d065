//! Pipeline controller: stage sequencing and representation fan-out.
//!
//! The controller advances a run through a fixed stage order, fans the
//! statistic out to the three representations on scoped worker threads,
//! collects cross-representation divergences without aborting, and hands
//! the aggregate to the certifier exactly once. Fatal errors abort the run
//! at the stage that raised them; divergences and solver timeouts are
//! demoted to report entries.

use serde::{Deserialize, Serialize};

use crate::bootstrap::{bootstrap_ci, BootstrapConfig, ConfidenceInterval, ResampleMethod};
use crate::certifier::{certify, CertificationReport};
use crate::error::PipelineError;
use crate::representation::{
    lie_group_compressed, milp_subset, raw, require_agreement, DivergenceRecord, Representation,
};
use crate::selector::{select_subset, SubsetSolution};
use crate::sequence::ZeroSequence;
use crate::statistic::{adjacent_products, statistic_from_gaps, SpacingStatistic, C_GUE};
use crate::PipelineConfig;

/// Stages a run passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Loaded,
    StatisticComputed,
    BootstrapComputed,
    SubsetSelected,
    Transformed,
    Aggregated,
    Certified,
}

/// Everything the certifier needs, gathered across the stages.
#[derive(Debug, Clone)]
pub struct Aggregate {
    /// Number of zero ordinates.
    pub n: usize,
    /// Number of normalized gaps.
    pub gap_count: usize,
    pub statistic: SpacingStatistic,
    pub interval: ConfidenceInterval,
    pub subset: SubsetSolution,
    pub representations: Vec<Representation>,
    pub divergences: Vec<DivergenceRecord>,
    /// Stage trail, for provenance in the report.
    pub stages: Vec<Stage>,
}

/// Runs the certification pipeline over a zero sequence.
#[derive(Debug, Clone)]
pub struct CalController {
    config: PipelineConfig,
}

impl CalController {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage and produce the certification report.
    pub fn run(&self, zeros: &ZeroSequence) -> Result<CertificationReport, PipelineError> {
        let cfg = &self.config;
        let mut stages = vec![Stage::Loaded];

        let gaps = zeros.normalized_gaps(cfg.unfold_window)?;
        let statistic = statistic_from_gaps(&gaps)?;
        stages.push(Stage::StatisticComputed);

        let interval = bootstrap_ci(
            &gaps,
            |resample| statistic_from_gaps(resample).map(|s| s.value),
            &BootstrapConfig {
                resamples: cfg.resamples,
                confidence: cfg.confidence,
                seed: cfg.seed,
                method: if cfg.block_resampling {
                    ResampleMethod::Block
                } else {
                    ResampleMethod::Iid
                },
                block_size: cfg.block_size,
            },
        )?;
        stages.push(Stage::BootstrapComputed);

        let terms = adjacent_products(&gaps);
        let (problem, solution) = select_subset(
            &terms,
            cfg.candidate_blocks,
            cfg.coverage_frac,
            C_GUE,
            cfg.gap_tolerance,
            cfg.time_limit,
        )?;
        stages.push(Stage::SubsetSelected);

        // Fan out: the subset and compressed representations are
        // independent of each other; raw is trivial and stays inline.
        let (subset_rep, lie_rep) = std::thread::scope(|scope| {
            let subset_handle =
                scope.spawn(|| milp_subset(&terms, &problem, &solution));
            let lie_handle = scope.spawn(|| {
                lie_group_compressed(&gaps, cfg.sparsity_param, cfg.compression_tolerance)
            });
            (
                subset_handle.join().expect("subset worker panicked"),
                lie_handle.join().expect("compression worker panicked"),
            )
        });
        let representations = vec![raw(statistic), subset_rep?, lie_rep?];
        stages.push(Stage::Transformed);

        // Pairwise agreement. Divergence is a certification failure, not a
        // pipeline abort: the aggregate records it and the run completes.
        let mut divergences = Vec::new();
        for i in 0..representations.len() {
            for j in i + 1..representations.len() {
                let (a, b) = (&representations[i], &representations[j]);
                if let Err(PipelineError::RepresentationDivergence {
                    delta, tolerance, ..
                }) = require_agreement(a, b, cfg.cross_tolerance)
                {
                    divergences.push(DivergenceRecord {
                        first: a.kind(),
                        second: b.kind(),
                        delta,
                        tolerance,
                    });
                }
            }
        }
        stages.push(Stage::Aggregated);

        let aggregate = Aggregate {
            n: zeros.len(),
            gap_count: gaps.len(),
            statistic,
            interval,
            subset: solution,
            representations,
            divergences,
            stages,
        };
        certify(&aggregate, cfg)
    }
}

/// Convenience entry point: run the default pipeline over raw ordinates.
pub fn certify_ordinates(
    ordinates: Vec<f64>,
    config: PipelineConfig,
) -> Result<CertificationReport, PipelineError> {
    let zeros = ZeroSequence::new(ordinates)?;
    CalController::new(config).run(&zeros)
}
