use criterion::{criterion_group, BatchSize, Criterion};
use rand::{thread_rng, Rng};
use std::hint::black_box;
use tbls_extended::bls12381::primitives::{
    ops,
    variant::{MinPk, MinSig, Variant},
};

fn bench_variant<V: Variant>(c: &mut Criterion, variant: &str) {
    let namespace = b"namespace";
    let mut msg = [0u8; 32];
    thread_rng().fill(&mut msg);
    c.bench_function(
        &format!(
            "{}/variant={} ns_len={} msg_len={}",
            module_path!(),
            variant,
            namespace.len(),
            msg.len()
        ),
        |b| {
            b.iter_batched(
                || {
                    let (private, public) = ops::keypair::<_, V>(&mut thread_rng());
                    let signature = ops::sign_message::<V>(&private, Some(namespace), &msg);
                    (public, signature)
                },
                |(public, signature)| {
                    black_box(
                        ops::verify_message::<V>(&public, Some(namespace), &msg, &signature)
                            .unwrap(),
                    );
                },
                BatchSize::SmallInput,
            );
        },
    );
}

fn benchmark_signature_verification(c: &mut Criterion) {
    bench_variant::<MinPk>(c, "min_pk");
    bench_variant::<MinSig>(c, "min_sig");
}

criterion_group!(benches, benchmark_signature_verification);
