use criterion::{criterion_group, BatchSize, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;
use tbls_extended::bls12381::{
    dealer::generate_shares_for,
    primitives::{identity::Identity, ops, variant::MinSig},
    recover::{Config, Recoverer},
};

// Configure contributors based on context
#[cfg(not(full_bench))]
const CONTRIBUTORS: &[u32] = &[5, 10, 20, 50];
#[cfg(full_bench)]
const CONTRIBUTORS: &[u32] = &[5, 10, 20, 50, 100, 250, 500];
const CONCURRENCY: &[usize] = &[1, 4, 8];

/// Returns the quorum (`2f + 1`, where `f = (n - 1) / 3`) for `n` participants.
fn threshold(n: u32) -> u32 {
    2 * ((n - 1) / 3) + 1
}

fn identities(n: u32, derived: bool) -> Vec<Identity> {
    if !derived {
        return Identity::range(n);
    }
    (0..n)
        .map(|i| Identity::derive(&i.to_be_bytes()).unwrap())
        .collect()
}

fn benchmark_threshold_recover(c: &mut Criterion) {
    let namespace = b"benchmark";
    let msg = b"hello";
    for &n in CONTRIBUTORS {
        let t = threshold(n);
        for derived in [false, true] {
            c.bench_function(
                &format!("{}/n={} t={} derived={}", module_path!(), n, t, derived),
                |b| {
                    b.iter_batched(
                        || {
                            let mut rng = StdRng::seed_from_u64(0);
                            let (_, shares) = generate_shares_for::<_, MinSig>(
                                &mut rng,
                                None,
                                &identities(n, derived),
                                t,
                            )
                            .unwrap();
                            ops::partial_sign_messages::<MinSig>(&shares, Some(namespace), msg, 1)
                        },
                        |partials| {
                            black_box(
                                ops::threshold_signature_recover::<MinSig, _>(t, &partials)
                                    .unwrap(),
                            );
                        },
                        BatchSize::SmallInput,
                    );
                },
            );
        }
    }
}

fn benchmark_verified_recover(c: &mut Criterion) {
    let namespace = b"benchmark";
    let msg = b"hello";
    for &n in CONTRIBUTORS {
        let t = threshold(n);
        for &concurrency in CONCURRENCY {
            c.bench_function(
                &format!("{}/n={} t={} conc={}", module_path!(), n, t, concurrency),
                |b| {
                    b.iter_batched(
                        || {
                            let mut rng = StdRng::seed_from_u64(0);
                            let (public, shares) = generate_shares_for::<_, MinSig>(
                                &mut rng,
                                None,
                                &identities(n, true),
                                t,
                            )
                            .unwrap();
                            let partials = ops::partial_sign_messages::<MinSig>(
                                &shares,
                                Some(namespace),
                                msg,
                                1,
                            );
                            let config = Config::new(t, n).unwrap().with_concurrency(concurrency);
                            (Recoverer::<MinSig>::new(public, config).unwrap(), partials)
                        },
                        |(recoverer, partials)| {
                            black_box(
                                recoverer
                                    .recover(Some(namespace), msg, &partials)
                                    .unwrap(),
                            );
                        },
                        BatchSize::SmallInput,
                    );
                },
            );
        }
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_threshold_recover, benchmark_verified_recover
}
