use criterion::{criterion_group, BatchSize, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;
use tbls_extended::bls12381::primitives::{identity::Identity, poly::Private, variant::MinSig};

/// Returns the quorum (`2f + 1`, where `f = (n - 1) / 3`) for `n` participants.
fn threshold(n: u32) -> u32 {
    2 * ((n - 1) / 3) + 1
}

fn benchmark_evaluate_point(c: &mut Criterion) {
    for &n in &[5, 10, 20, 50, 100, 250, 500] {
        let t = threshold(n);
        c.bench_function(&format!("{}/n={} t={}", module_path!(), n, t), |b| {
            b.iter_batched(
                || {
                    let mut rng = StdRng::seed_from_u64(0);
                    let polynomial = Private::random(&mut rng, t).unwrap().commit::<MinSig>();
                    let mut seed = [0u8; 32];
                    rng.fill(&mut seed);
                    (Identity::derive(&seed).unwrap(), polynomial)
                },
                |(identity, polynomial)| {
                    black_box(polynomial.evaluate(&identity));
                },
                BatchSize::SmallInput,
            );
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_evaluate_point
}
