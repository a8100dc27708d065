//! Error taxonomy for the certification pipeline.
//!
//! Input-validation and degenerate-numeric errors are fatal: the run aborts
//! and the error carries the stage context. Cross-representation divergence
//! and solver timeouts are recoverable at the controller level; they complete
//! the run and surface as enumerated failure reasons in the report instead.

/// Errors that can occur during a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("degenerate input: local mean spacing {mean:.3e} at gap index {index} is below {floor:.1e}")]
    DegenerateInput {
        index: usize,
        mean: f64,
        floor: f64,
    },

    #[error("insufficient bootstrap sample: {resamples} resamples cannot support confidence {confidence} (need >= {required} per tail)")]
    InsufficientSample {
        resamples: usize,
        confidence: f64,
        required: usize,
    },

    #[error("infeasible subset problem: {0}")]
    Infeasible(String),

    #[error("compression reconstruction error {error:.6e} exceeds tolerance {tolerance:.6e}")]
    CompressionTolerance { error: f64, tolerance: f64 },

    #[error("representations {first} and {second} diverge by {delta:.6e} (tolerance {tolerance:.6e})")]
    RepresentationDivergence {
        first: String,
        second: String,
        delta: f64,
        tolerance: f64,
    },
}
