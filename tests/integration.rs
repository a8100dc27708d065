use std::time::Duration;

use spectral_certify::certifier::FailureReason;
use spectral_certify::controller::{certify_ordinates, CalController};
use spectral_certify::selector::{select_subset, SolverStatus};
use spectral_certify::sequence::{synthetic_sequence, SyntheticKind};
use spectral_certify::statistic::{adjacent_products, convergence_bound, C_GUE};
use spectral_certify::{BoundType, PipelineConfig, PipelineError, RepresentationKind};

fn default_config() -> PipelineConfig {
    PipelineConfig {
        time_limit: Duration::from_secs(30),
        ..PipelineConfig::default()
    }
}

#[test]
fn test_end_to_end_gue_surrogate_certifies() {
    // 1001 zeros of the GUE surrogate concentrate S_N near C_GUE with a
    // deviation an order of magnitude below the theoretical bound at
    // N = 1000 gaps (about 0.0998).
    let zeros = synthetic_sequence(SyntheticKind::GueLike, 1001, 42).unwrap();
    let report = CalController::new(default_config()).run(&zeros).unwrap();

    assert!(report.pass, "reasons: {:?}", report.reasons);
    assert!(report.reasons.is_empty());
    assert!(report.margin > 0.0);
    assert_eq!(report.gap_count, 1000);
    assert!((report.bound - convergence_bound(1000, 2.5, 3.0)).abs() < 1e-15);

    // All three representations were computed and agree.
    assert_eq!(report.representations.len(), 3);
    assert!(report.divergences.is_empty());
    for rep in &report.representations {
        assert!(
            rep.deviation <= report.bound,
            "{} deviates by {} > bound {}",
            rep.kind,
            rep.deviation,
            report.bound
        );
    }

    // The bootstrap interval brackets the point estimate.
    assert!(report.interval.lower <= report.interval.point);
    assert!(report.interval.point <= report.interval.upper);

    // The subset solver certified its optimality gap.
    assert!(report.subset.gap < 1e-6);
    assert!(matches!(
        report.subset.status,
        SolverStatus::Optimal | SolverStatus::GapCertified
    ));
}

#[test]
fn test_solver_timeout_degrades_to_failed_certification() {
    // A zero time budget forces a Timeout status. The pipeline must still
    // complete; the report fails with SubsetNotCertified rather than the
    // run aborting.
    let zeros = synthetic_sequence(SyntheticKind::GueLike, 1001, 42).unwrap();
    let config = PipelineConfig {
        gap_tolerance: 1e-12,
        time_limit: Duration::ZERO,
        ..PipelineConfig::default()
    };
    let report = CalController::new(config).run(&zeros).unwrap();

    assert!(!report.pass);
    assert_eq!(report.subset.status, SolverStatus::Timeout);
    assert!(report
        .reasons
        .iter()
        .any(|r| matches!(r, FailureReason::SubsetNotCertified { .. })));
}

#[test]
fn test_poisson_control_violates_bound() {
    // Poisson gaps have adjacent-product mean near 1, a deviation of about
    // 0.4 from C_GUE against a bound of about 0.1. The negative control
    // must fail with BoundExceeded, and the subset representation (pinned
    // to the C_GUE target) must be recorded as diverging from raw.
    let zeros = synthetic_sequence(SyntheticKind::Poisson, 1001, 7).unwrap();
    let report = CalController::new(default_config()).run(&zeros).unwrap();

    assert!(!report.pass);
    assert!(report.deviation > report.bound);
    assert!(report
        .reasons
        .iter()
        .any(|r| matches!(r, FailureReason::BoundExceeded { .. })));
    assert!(
        !report.divergences.is_empty(),
        "expected raw vs milp-subset divergence on Poisson input"
    );
}

#[test]
fn test_uniform_ladder_fails_bound() {
    // Every normalized gap is exactly 1, so S_N = 1 and the deviation is
    // 1 - C_GUE, far above the bound.
    let zeros = synthetic_sequence(SyntheticKind::Deterministic, 1001, 0).unwrap();
    let report = CalController::new(default_config()).run(&zeros).unwrap();
    assert!(!report.pass);
    assert!((report.deviation - (1.0 - C_GUE)).abs() < 1e-6);
}

#[test]
fn test_seed_determinism_across_full_pipeline() {
    let zeros = synthetic_sequence(SyntheticKind::GueLike, 501, 3).unwrap();
    let config = PipelineConfig {
        seed: 77,
        resamples: 300,
        ..default_config()
    };
    let a = CalController::new(config.clone()).run(&zeros).unwrap();
    let b = CalController::new(config).run(&zeros).unwrap();
    assert_eq!(a.deviation, b.deviation);
    assert_eq!(a.interval, b.interval);
    assert_eq!(a.subset.gap, b.subset.gap);
    assert_eq!(a.pass, b.pass);
}

#[test]
fn test_explicit_bound_drives_verdict() {
    let zeros = synthetic_sequence(SyntheticKind::GueLike, 1001, 42).unwrap();

    // A generous explicit bound passes.
    let config = PipelineConfig {
        bound_type: BoundType::Explicit(0.5),
        ..default_config()
    };
    let report = CalController::new(config).run(&zeros).unwrap();
    assert!(report.pass);
    assert_eq!(report.bound, 0.5);

    // An impossible explicit bound fails the same input.
    let config = PipelineConfig {
        bound_type: BoundType::Explicit(1e-9),
        ..default_config()
    };
    let report = CalController::new(config).run(&zeros).unwrap();
    assert!(!report.pass);
}

#[test]
fn test_single_representation_verdict() {
    // Certifying against the raw representation only must ignore the
    // other representations' deviations.
    let zeros = synthetic_sequence(SyntheticKind::GueLike, 1001, 42).unwrap();
    let config = PipelineConfig {
        representation: Some(RepresentationKind::Raw),
        ..default_config()
    };
    let report = CalController::new(config).run(&zeros).unwrap();
    let raw = report
        .representations
        .iter()
        .find(|r| r.kind == RepresentationKind::Raw)
        .unwrap();
    assert_eq!(report.deviation, raw.deviation);
}

#[test]
fn test_known_optimal_selector_instance() {
    // Two blocks straddle the target symmetrically; selecting exactly
    // those two cancels to an objective of zero, provably optimal.
    let c = C_GUE;
    let terms = vec![c + 0.2, c + 0.2, c - 0.2, c - 0.2, c + 0.9, c + 0.9];
    let (_, solution) =
        select_subset(&terms, 3, 0.5, c, 1e-6, Duration::from_secs(60)).unwrap();
    assert_eq!(solution.selected, vec![0, 1]);
    assert!(solution.objective < 1e-9);
    assert!(solution.certified(1e-6));
}

#[test]
fn test_selector_gap_is_honest_under_timeout() {
    let zeros = synthetic_sequence(SyntheticKind::GueLike, 1001, 42).unwrap();
    let gaps = zeros.normalized_gaps(None).unwrap();
    let terms = adjacent_products(&gaps);
    let (_, solution) = select_subset(&terms, 24, 0.5, C_GUE, 1e-12, Duration::ZERO).unwrap();
    assert_eq!(solution.status, SolverStatus::Timeout);
    // The reported gap equals the incumbent objective, never a downgraded
    // zero.
    assert_eq!(solution.gap, solution.objective);
}

#[test]
fn test_invalid_ordinates_rejected_up_front() {
    let err = certify_ordinates(vec![3.0, 2.0, 1.0], default_config()).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));

    let err = certify_ordinates(vec![1.0, 2.0, f64::NAN], default_config()).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}

#[test]
fn test_insufficient_resamples_surface_as_error() {
    let zeros = synthetic_sequence(SyntheticKind::GueLike, 501, 3).unwrap();
    let config = PipelineConfig {
        resamples: 10,
        ..default_config()
    };
    let err = CalController::new(config).run(&zeros).unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientSample { .. }));
}

#[test]
fn test_report_serializes_to_json() {
    let zeros = synthetic_sequence(SyntheticKind::GueLike, 501, 3).unwrap();
    let config = PipelineConfig {
        resamples: 200,
        ..default_config()
    };
    let report = CalController::new(config).run(&zeros).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"pass\":true"));
    assert!(json.contains("\"gap_count\":500"));
}

#[test]
fn test_local_window_unfolding_end_to_end() {
    // Local-mean unfolding on the flat surrogate agrees with the global
    // unfolding verdict.
    let zeros = synthetic_sequence(SyntheticKind::GueLike, 1001, 42).unwrap();
    let config = PipelineConfig {
        unfold_window: Some(51),
        ..default_config()
    };
    let report = CalController::new(config).run(&zeros).unwrap();
    assert!(report.pass, "reasons: {:?}", report.reasons);
}
