use std::time::Duration;

use spectral_certify::controller::CalController;
use spectral_certify::sequence::{synthetic_sequence, SyntheticKind};
use spectral_certify::statistic::{A_CONSTANT, B_CONSTANT, C_GUE};
use spectral_certify::PipelineConfig;

fn main() {
    println!("=================================================");
    println!("  GUE Convergence Certification for Zero Spacings");
    println!("=================================================");
    println!();
    println!("Computes S_N = mean of adjacent normalized-gap products over a");
    println!("zero sequence, and certifies the convergence bound");
    println!("  |S_N - C_GUE| <= A/sqrt(N) + B ln N / N");
    println!("with C_GUE = {}, A = {}, B = {}.", C_GUE, A_CONSTANT, B_CONSTANT);
    println!();

    let count = 1001;
    let seed = 42;
    let config = PipelineConfig {
        count,
        seed,
        time_limit: Duration::from_secs(30),
        ..PipelineConfig::default()
    };

    let cases = [
        ("gue-like", SyntheticKind::GueLike),
        ("poisson", SyntheticKind::Poisson),
        ("uniform", SyntheticKind::Deterministic),
    ];

    println!("--- Certification Table (N = {} zeros, seed = {}) ---", count, seed);
    println!(
        "{:>10} {:>9} {:>9} {:>9} {:>9} {:>12} {:>8}",
        "spectrum", "S_N", "bound", "dev", "margin", "solver gap", "verdict"
    );
    println!(
        "{:-<10} {:-<9} {:-<9} {:-<9} {:-<9} {:-<12} {:-<8}",
        "", "", "", "", "", "", ""
    );

    let controller = CalController::new(config);
    let mut reports = Vec::new();
    for (name, kind) in cases {
        let zeros = match synthetic_sequence(kind, count, seed) {
            Ok(z) => z,
            Err(e) => {
                println!("{:>10}  generation failed: {}", name, e);
                continue;
            }
        };
        match controller.run(&zeros) {
            Ok(report) => {
                println!(
                    "{:>10} {:>9.5} {:>9.5} {:>9.5} {:>+9.5} {:>12.3e} {:>8}",
                    name,
                    report.interval.point,
                    report.bound,
                    report.deviation,
                    report.margin,
                    report.subset.gap,
                    if report.pass { "PASS" } else { "FAIL" }
                );
                reports.push((name, report));
            }
            Err(e) => println!("{:>10}  pipeline error: {}", name, e),
        }
    }
    println!();

    println!("--- Representation Detail ---");
    println!();
    for (name, report) in &reports {
        println!(
            "{} [{} <= S_N <= {} at {}% confidence]",
            name,
            report.interval.lower,
            report.interval.upper,
            report.interval.confidence * 100.0
        );
        for rep in &report.representations {
            println!(
                "  {:<12} value = {:.6}  |value - C_GUE| = {:.6}",
                rep.kind.to_string(),
                rep.value,
                rep.deviation
            );
        }
        for d in &report.divergences {
            println!(
                "  divergence: {} vs {} differ by {:.4} (tolerance {:.4})",
                d.first, d.second, d.delta, d.tolerance
            );
        }
        for reason in &report.reasons {
            println!("  failure: {:?}", reason);
        }
        println!();
    }

    if let Some((_, report)) = reports.first() {
        println!("--- Full Report (JSON) ---");
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => println!("serialization failed: {}", e),
        }
    }
}
