//! Bootstrap confidence intervals for the spacing statistic.
//!
//! Resamples the normalized gap sequence, recomputes the statistic on each
//! resample, and takes the empirical percentile interval. Block resampling
//! is the default: it copies contiguous runs of gaps and therefore preserves
//! the local spacing correlation that the statistic measures. The i.i.d.
//! variant is available for comparison.
//!
//! Replicates run in parallel with rayon. Each replicate derives its RNG
//! from the master seed and its own index, so the interval is byte-identical
//! across runs and thread schedules for a fixed seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Odd multiplier decorrelating per-replicate seeds.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// How resamples are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResampleMethod {
    /// Contiguous blocks of gaps, resampled with replacement.
    Block,
    /// Individual gaps, resampled with replacement.
    Iid,
}

/// Bootstrap parameters.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Number of resamples; at least 100.
    pub resamples: usize,
    /// Confidence level in (0, 1).
    pub confidence: f64,
    /// Master seed for all resampling randomness.
    pub seed: u64,
    /// Block vs i.i.d. resampling.
    pub method: ResampleMethod,
    /// Block size for block resampling; `None` picks ⌈√n⌉.
    pub block_size: Option<usize>,
}

/// An empirical percentile confidence interval for the statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    /// The statistic on the original (unresampled) gaps.
    pub point: f64,
    pub upper: f64,
    pub confidence: f64,
    pub resamples: usize,
    pub method: ResampleMethod,
}

/// Compute a bootstrap confidence interval for `statistic_fn` over `gaps`.
///
/// `statistic_fn` receives each resampled gap sequence and must be pure; it
/// is called concurrently from rayon workers. Fails with
/// `InsufficientSample` when the resample count cannot populate both
/// percentile tails at the requested confidence.
pub fn bootstrap_ci<F>(
    gaps: &[f64],
    statistic_fn: F,
    config: &BootstrapConfig,
) -> Result<ConfidenceInterval, PipelineError>
where
    F: Fn(&[f64]) -> Result<f64, PipelineError> + Sync,
{
    if !(config.confidence > 0.0 && config.confidence < 1.0) {
        return Err(PipelineError::InvalidInput(format!(
            "confidence must lie in (0, 1), got {}",
            config.confidence
        )));
    }
    let tail = (1.0 - config.confidence) / 2.0;
    // Both tails need at least one replicate below/above the cut.
    let required = (1.0 / tail).ceil() as usize;
    if config.resamples < 100 || config.resamples < required {
        return Err(PipelineError::InsufficientSample {
            resamples: config.resamples,
            confidence: config.confidence,
            required: required.max(100),
        });
    }
    if gaps.len() < 3 {
        return Err(PipelineError::InvalidInput(format!(
            "need at least 3 gaps to bootstrap, got {}",
            gaps.len()
        )));
    }

    let point = statistic_fn(gaps)?;

    let n = gaps.len();
    let block_size = match config.method {
        ResampleMethod::Block => {
            let b = config
                .block_size
                .unwrap_or_else(|| (n as f64).sqrt().ceil() as usize);
            b.clamp(1, n)
        }
        ResampleMethod::Iid => 1,
    };

    let mut replicates = (0..config.resamples)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed ^ (i as u64).wrapping_mul(SEED_STRIDE);
            let mut rng = StdRng::seed_from_u64(seed);
            let resample = draw_resample(gaps, block_size, &mut rng);
            statistic_fn(&resample)
        })
        .collect::<Result<Vec<f64>, PipelineError>>()?;

    replicates.sort_by(|a, b| a.partial_cmp(b).expect("replicates are finite"));

    let last = replicates.len() - 1;
    let lo_idx = (tail * last as f64).floor() as usize;
    let hi_idx = ((1.0 - tail) * last as f64).ceil() as usize;
    // Percentile intervals can exclude the point estimate on skewed
    // replicate distributions; widen so lower <= point <= upper holds.
    let lower = replicates[lo_idx].min(point);
    let upper = replicates[hi_idx.min(last)].max(point);

    Ok(ConfidenceInterval {
        lower,
        point,
        upper,
        confidence: config.confidence,
        resamples: config.resamples,
        method: config.method,
    })
}

/// One resample: `⌈n/b⌉` blocks of `b` consecutive gaps, concatenated and
/// truncated to length n. Block size 1 degenerates to i.i.d. resampling.
fn draw_resample(gaps: &[f64], block_size: usize, rng: &mut StdRng) -> Vec<f64> {
    let n = gaps.len();
    let n_blocks = n.div_ceil(block_size);
    let mut out = Vec::with_capacity(n_blocks * block_size);
    for _ in 0..n_blocks {
        let start = rng.gen_range(0..=n - block_size);
        out.extend_from_slice(&gaps[start..start + block_size]);
    }
    out.truncate(n);
    out
}
