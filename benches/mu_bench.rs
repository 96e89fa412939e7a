use criterion::{criterion_group, criterion_main, Criterion};
use merminforge::backend::ReferenceBackend;
use merminforge::optimizer::perturb::random_packed;
use merminforge::optimizer::{AnalyticObjective, CircuitObjective, Objective};
use merminforge::polynomial::MuKind;
use std::hint::black_box;

fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(1);
    let candidate = random_packed(&mut rng, 5);

    let mut analytic = AnalyticObjective::from_pattern(5, 1, MuKind::SumOfSquares)
        .expect("Failed to build analytic objective");
    c.bench_function("analytic score (5 qubits)", |b| {
        b.iter(|| analytic.score(black_box(&candidate)))
    });

    let mut circuit = CircuitObjective::from_pattern(
        ReferenceBackend::expected(),
        5,
        1,
        1024,
        MuKind::SumOfSquares,
    )
    .expect("Failed to build circuit objective");
    c.bench_function("circuit score (5 qubits, native MCZ)", |b| {
        b.iter(|| circuit.score(black_box(&candidate)))
    });

    let mut lowered = CircuitObjective::from_pattern(
        ReferenceBackend::expected().with_decomposition(true),
        5,
        1,
        1024,
        MuKind::SumOfSquares,
    )
    .expect("Failed to build circuit objective");
    c.bench_function("circuit score (5 qubits, H/CZ/CCX + ancillas)", |b| {
        b.iter(|| lowered.score(black_box(&candidate)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
