use criterion::{criterion_group, Criterion};
use rand::{thread_rng, Rng};
use std::hint::black_box;
use tbls_extended::bls12381::primitives::{
    identity::Identity, ops, poly::Private, variant::MinSig,
};

fn benchmark_partial_sign(c: &mut Criterion) {
    let namespace = b"namespace";
    let mut msg = [0u8; 32];
    thread_rng().fill(&mut msg);
    let private = Private::random(&mut thread_rng(), 3).unwrap();
    let share = private.evaluate(&Identity::derive(b"signer").unwrap());
    c.bench_function(
        &format!(
            "{}/ns_len={} msg_len={}",
            module_path!(),
            namespace.len(),
            msg.len()
        ),
        |b| {
            b.iter(|| {
                black_box(ops::partial_sign_message::<MinSig>(
                    &share,
                    Some(namespace),
                    &msg,
                ));
            });
        },
    );
}

criterion_group!(benches, benchmark_partial_sign);
