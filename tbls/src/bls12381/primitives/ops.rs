//! Digital signatures and threshold signatures over the BLS12-381 curve.
//!
//! # Domain Separation Tag (DST)
//!
//! Messages are hashed to the signature group with the `POP` ciphersuite tags
//! (`BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_POP_` or `BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_`,
//! depending on the [Variant]). You can read more about DSTs [here](https://datatracker.ietf.org/doc/html/draft-irtf-cfrg-bls-signature-05#section-4.2).
//!
//! # Namespaces
//!
//! When a namespace is provided, the signed payload is the namespace (length-prefixed) followed by
//! the message (see [commonware_utils::union_unique]). Without a namespace, the payload is the raw
//! message, so threshold signatures verify under any classic BLS verifier using the same ciphersuite.

use super::{
    group::{self, Element, Point, Scalar, Share, DST},
    identity::Identity,
    poly::{self, compute_weights, prepare_evaluations, Eval, PartialSignature, Poly, Weight},
    variant::Variant,
    Error,
};
use commonware_utils::union_unique;
use rand::{CryptoRng, RngCore};
use rayon::{prelude::*, ThreadPoolBuilder};
use std::{borrow::Cow, collections::BTreeMap};

/// Computes the public key from the private key.
pub fn compute_public<V: Variant>(private: &Scalar) -> V::Public {
    let mut public = V::Public::one();
    public.mul(private);
    public
}

/// Returns a new keypair derived from the provided randomness.
pub fn keypair<R: RngCore + CryptoRng, V: Variant>(rng: &mut R) -> (group::Private, V::Public) {
    let private = group::Private::rand(rng);
    let public = compute_public::<V>(&private);
    (private, public)
}

/// Hashes the provided message with the domain separation tag (DST) to
/// the curve.
pub fn hash_message<V: Variant>(dst: DST, message: &[u8]) -> V::Signature {
    let mut hm = V::Signature::zero();
    hm.map(dst, message);
    hm
}

/// Signs the provided message with the private key.
pub fn sign<V: Variant>(private: &Scalar, dst: DST, message: &[u8]) -> V::Signature {
    let mut hm = hash_message::<V>(dst, message);
    hm.mul(private);
    hm
}

/// Verifies the signature with the provided public key.
pub fn verify<V: Variant>(
    public: &V::Public,
    dst: DST,
    message: &[u8],
    signature: &V::Signature,
) -> Result<(), Error> {
    // Create hashed message `hm`
    let hm = hash_message::<V>(dst, message);

    // Verify the signature
    V::verify(public, &hm, signature)
}

fn payload<'a>(namespace: Option<&[u8]>, message: &'a [u8]) -> Cow<'a, [u8]> {
    match namespace {
        Some(namespace) => Cow::Owned(union_unique(namespace, message)),
        None => Cow::Borrowed(message),
    }
}

/// Signs the provided message with the private key.
///
/// # Determinism
///
/// Signatures produced by this function are deterministic and are safe
/// to use in a consensus-critical context.
pub fn sign_message<V: Variant>(
    private: &group::Private,
    namespace: Option<&[u8]>,
    message: &[u8],
) -> V::Signature {
    sign::<V>(private, V::MESSAGE, &payload(namespace, message))
}

/// Verifies the signature with the provided public key.
///
/// # Warning
///
/// This function assumes a group check was already performed on
/// `public` and `signature`.
pub fn verify_message<V: Variant>(
    public: &V::Public,
    namespace: Option<&[u8]>,
    message: &[u8],
    signature: &V::Signature,
) -> Result<(), Error> {
    verify::<V>(public, V::MESSAGE, &payload(namespace, message), signature)
}

/// Signs the provided message with the key share.
///
/// The result carries the share's identity so it can be routed to a recoverer.
pub fn partial_sign_message<V: Variant>(
    private: &Share,
    namespace: Option<&[u8]>,
    message: &[u8],
) -> PartialSignature<V> {
    let sig = sign_message::<V>(private.private(), namespace, message);
    Eval {
        identity: private.identity,
        value: sig,
    }
}

/// Signs the provided message with each share, using up to `concurrency` threads.
///
/// Partial signatures are returned in the same order as `shares`.
pub fn partial_sign_messages<V: Variant>(
    shares: &[Share],
    namespace: Option<&[u8]>,
    message: &[u8],
    concurrency: usize,
) -> Vec<PartialSignature<V>> {
    let hm = hash_message::<V>(V::MESSAGE, &payload(namespace, message));
    let sign = |share: &Share| {
        let mut sig = hm;
        sig.mul(share.private());
        Eval {
            identity: share.identity,
            value: sig,
        }
    };

    // Avoid pool overhead when concurrency is 1
    let concurrency = std::cmp::min(concurrency, shares.len());
    if concurrency <= 1 {
        return shares.iter().map(sign).collect();
    }
    match ThreadPoolBuilder::new().num_threads(concurrency).build() {
        Ok(pool) => pool.install(|| shares.par_iter().map(sign).collect()),
        Err(_) => shares.iter().map(sign).collect(),
    }
}

/// Verifies the partial signature against the public polynomial.
///
/// The partial signature is checked against the public key of its claimed identity
/// (the public polynomial evaluated at that identity).
///
/// # Warning
///
/// This function assumes a group check was already performed on `signature`.
pub fn partial_verify_message<V: Variant>(
    public: &poly::Public<V>,
    namespace: Option<&[u8]>,
    message: &[u8],
    partial: &PartialSignature<V>,
) -> Result<(), Error> {
    let public = public.evaluate(&partial.identity);
    verify_message::<V>(&public.value, namespace, message, &partial.value)
        .map_err(|_| Error::InvalidPartialSignature(partial.identity))
}

/// Verifies many partial signatures over the same message, using up to `concurrency` threads.
///
/// Returns the identities of all invalid partial signatures (in input order), if any.
pub fn partial_verify_messages<'a, V, I>(
    public: &poly::Public<V>,
    namespace: Option<&[u8]>,
    message: &[u8],
    partials: I,
    concurrency: usize,
) -> Result<(), Vec<Identity>>
where
    V: Variant,
    I: IntoIterator<Item = &'a PartialSignature<V>>,
    V::Signature: 'a,
{
    // Hash once and check each partial against its evaluated public key
    let hm = hash_message::<V>(V::MESSAGE, &payload(namespace, message));
    let partials = partials.into_iter().collect::<Vec<_>>();
    let check = |partial: &&PartialSignature<V>| {
        let public = public.evaluate(&partial.identity).value;
        match V::verify(&public, &hm, &partial.value) {
            Ok(()) => None,
            Err(_) => Some(partial.identity),
        }
    };

    let concurrency = std::cmp::min(concurrency, partials.len());
    let invalid: Vec<Identity> = if concurrency <= 1 {
        partials.iter().filter_map(check).collect()
    } else {
        match ThreadPoolBuilder::new().num_threads(concurrency).build() {
            Ok(pool) => pool.install(|| partials.par_iter().filter_map(check).collect()),
            Err(_) => partials.iter().filter_map(check).collect(),
        }
    };
    if !invalid.is_empty() {
        return Err(invalid);
    }
    Ok(())
}

/// Recovers a signature using precomputed Lagrange weights.
///
/// # Determinism
///
/// Signatures recovered by this function are deterministic and are safe
/// to use in a consensus-critical context.
///
/// # Warning
///
/// This function assumes that there exists exactly one partial signature for each
/// identity in the `weights` map.
pub fn threshold_signature_recover_with_weights<'a, V, I>(
    weights: &BTreeMap<Identity, Weight>,
    partials: I,
) -> Result<V::Signature, Error>
where
    V: Variant,
    I: IntoIterator<Item = &'a PartialSignature<V>>,
    V::Signature: 'a,
{
    Poly::<V::Signature>::recover_with_weights(weights, partials)
}

/// Recovers a signature from at least `threshold` partial signatures.
///
/// The `threshold` partial signatures with the smallest identities are interpolated. Any
/// `threshold` valid partial signatures produce the same signature.
///
/// # Determinism
///
/// Signatures recovered by this function are deterministic and are safe
/// to use in a consensus-critical context.
///
/// # Warning
///
/// This function does not verify partial signatures. A single invalid partial signature
/// produces a signature that fails verification without indicating which partial was at fault.
/// Use [partial_verify_message] (or [crate::bls12381::recover::Recoverer]) to localize faults.
pub fn threshold_signature_recover<'a, V, I>(
    threshold: u32,
    partials: I,
) -> Result<V::Signature, Error>
where
    V: Variant,
    I: IntoIterator<Item = &'a PartialSignature<V>>,
    V::Signature: 'a,
{
    // Prepare evaluations
    let evals = prepare_evaluations(threshold, partials)?;

    // Compute weights
    let identities = evals.iter().map(|e| e.identity).collect::<Vec<_>>();
    let weights = compute_weights(&identities)?;

    // Perform interpolation with the precomputed weights
    threshold_signature_recover_with_weights::<V, _>(&weights, evals)
}

/// Recovers multiple signatures from multiple sets of at least `threshold`
/// partial signatures.
///
/// # Determinism
///
/// Signatures recovered by this function are deterministic and are safe
/// to use in a consensus-critical context.
///
/// # Warning
///
/// This function assumes that each set of partial signatures has the same identities
/// (returns [Error::DomainMismatch] otherwise).
pub fn threshold_signature_recover_multiple<'a, V, I>(
    threshold: u32,
    many_evals: Vec<I>,
    concurrency: usize,
) -> Result<Vec<V::Signature>, Error>
where
    V: Variant,
    I: IntoIterator<Item = &'a PartialSignature<V>>,
    V::Signature: 'a,
{
    // Prepare evaluations
    let mut prepared_evals = Vec::with_capacity(many_evals.len());
    for evals in many_evals {
        prepared_evals.push(prepare_evaluations(threshold, evals)?);
    }
    let Some(first) = prepared_evals.first() else {
        return Ok(Vec::new());
    };

    // Ensure all sets have the same identities
    let identities = first.iter().map(|e| e.identity).collect::<Vec<_>>();
    for evals in &prepared_evals[1..] {
        if evals
            .iter()
            .zip(&identities)
            .any(|(e, identity)| e.identity != *identity)
        {
            return Err(Error::DomainMismatch);
        }
    }

    // Compute weights once for all sets
    let weights = compute_weights(&identities)?;
    let recover = |evals: &Vec<&'a PartialSignature<V>>| {
        threshold_signature_recover_with_weights::<V, _>(&weights, evals.iter().copied())
    };

    // If concurrency is not required, recover signatures sequentially
    let concurrency = std::cmp::min(concurrency, prepared_evals.len());
    if concurrency <= 1 {
        return prepared_evals.iter().map(recover).collect();
    }

    // Build a thread pool with the specified concurrency
    match ThreadPoolBuilder::new().num_threads(concurrency).build() {
        Ok(pool) => pool.install(|| prepared_evals.par_iter().map(recover).collect()),
        Err(_) => prepared_evals.iter().map(recover).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls12381::primitives::{
        group::{G1_MESSAGE, G2_MESSAGE},
        poly::Private,
        variant::{MinPk, MinSig},
    };
    use commonware_codec::{DecodeExt, Encode};
    use rand::{rngs::StdRng, thread_rng, SeedableRng};

    fn derived(n: u32) -> Vec<Identity> {
        (0..n)
            .map(|i| Identity::derive(format!("participant-{i}").as_bytes()).unwrap())
            .collect()
    }

    fn codec<V: Variant>() {
        let (private, public) = keypair::<_, V>(&mut thread_rng());
        let (private_bytes, public_bytes) = (private.encode(), public.encode());

        let private_decoded = group::Private::decode(private_bytes.clone()).unwrap();
        let public_decoded = V::Public::decode(public_bytes.clone()).unwrap();
        assert_eq!(private, private_decoded);
        assert_eq!(public, public_decoded);

        // Signatures round-trip through the same encoding a classic verifier expects
        let signature = sign_message::<V>(&private, None, b"codec");
        let decoded = V::Signature::decode(signature.encode()).unwrap();
        assert_eq!(signature, decoded);
    }

    #[test]
    fn test_codec() {
        codec::<MinPk>();
        codec::<MinSig>();
    }

    // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/b0ef82ff79769d085a5a7d3f4fe690b1c8fe6dc9/crates/threshold-bls/src/sig/bls.rs#L171-L185
    fn single_sign_verify<V: Variant>() {
        let (private, public) = keypair::<_, V>(&mut thread_rng());
        let msg = &[1, 9, 6, 9];
        let sig = sign_message::<V>(&private, None, msg);
        verify_message::<V>(&public, None, msg, &sig).expect("signature should be valid");

        let namespace = Some(&b"test"[..]);
        let sig = sign_message::<V>(&private, namespace, msg);
        verify_message::<V>(&public, namespace, msg, &sig).expect("signature should be valid");

        // Namespace is part of the payload
        assert!(matches!(
            verify_message::<V>(&public, None, msg, &sig),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn test_single_sign_verify() {
        single_sign_verify::<MinPk>();
        single_sign_verify::<MinSig>();
    }

    #[test]
    fn test_bad_sign() {
        let (private, public) = keypair::<_, MinSig>(&mut thread_rng());
        let sig = sign_message::<MinSig>(&private, None, b"hello");
        assert!(matches!(
            verify_message::<MinSig>(&public, None, b"world", &sig),
            Err(Error::InvalidSignature)
        ));

        let (_, other) = keypair::<_, MinSig>(&mut thread_rng());
        assert!(matches!(
            verify_message::<MinSig>(&other, None, b"hello", &sig),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn test_message_dst() {
        assert_eq!(MinSig::MESSAGE, G1_MESSAGE);
        assert_eq!(MinPk::MESSAGE, G2_MESSAGE);

        // Without a namespace, the payload is the raw message
        let (private, _) = keypair::<_, MinSig>(&mut thread_rng());
        let msg = b"interop";
        assert_eq!(
            sign_message::<MinSig>(&private, None, msg),
            sign::<MinSig>(&private, G1_MESSAGE, msg)
        );
    }

    #[test]
    fn test_deterministic_partial_sign() {
        let mut rng = StdRng::seed_from_u64(0);
        let poly = Private::random(&mut rng, 3).unwrap();
        let share = poly.evaluate(&Identity::derive(b"deterministic").unwrap());
        let a = partial_sign_message::<MinSig>(&share, None, b"msg");
        let b = partial_sign_message::<MinSig>(&share, None, b"msg");
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn test_partial_signature_wire_format() {
        let mut rng = StdRng::seed_from_u64(1);
        let poly = Private::random(&mut rng, 2).unwrap();
        let identity = Identity::derive(b"wire").unwrap();
        let share = poly.evaluate(&identity);
        let partial = partial_sign_message::<MinSig>(&share, None, b"msg");
        let encoded = partial.encode();
        assert_eq!(encoded.len(), 32 + 48);
        assert_eq!(&encoded[..32], &identity.as_bytes()[..]);
        assert_eq!(&encoded[32..], &partial.value.encode()[..]);
        assert_eq!(
            PartialSignature::<MinSig>::decode(encoded).unwrap(),
            partial
        );
    }

    fn threshold_sign_verify<V: Variant>(identities: Vec<Identity>, t: u32) {
        let mut rng = StdRng::seed_from_u64(2);
        let poly = Private::random(&mut rng, t).unwrap();
        let public = poly.commit::<V>();
        let shares = poly.shares_for(&identities).unwrap();

        let namespace = Some(&b"test"[..]);
        let msg = b"hello";
        let partials = shares
            .iter()
            .map(|s| partial_sign_message::<V>(s, namespace, msg))
            .collect::<Vec<_>>();
        for p in &partials {
            partial_verify_message::<V>(&public, namespace, msg, p)
                .expect("signature should be valid");
        }

        let threshold_sig = threshold_signature_recover::<V, _>(t, &partials).unwrap();
        let threshold_pub = poly::public::<V>(&public);
        verify_message::<V>(threshold_pub, namespace, msg, &threshold_sig)
            .expect("signature should be valid");

        // Identical to signing with the group secret directly
        assert_eq!(
            threshold_sig,
            sign_message::<V>(poly.secret(), namespace, msg)
        );
    }

    #[test]
    fn test_threshold_sign_verify_classic() {
        threshold_sign_verify::<MinPk>(Identity::range(5), 4);
        threshold_sign_verify::<MinSig>(Identity::range(5), 4);
    }

    #[test]
    fn test_threshold_sign_verify_extended() {
        threshold_sign_verify::<MinPk>(derived(7), 3);
        threshold_sign_verify::<MinSig>(derived(7), 3);
    }

    #[test]
    fn test_threshold_of_one() {
        threshold_sign_verify::<MinSig>(derived(3), 1);
    }

    #[test]
    fn test_threshold_insufficient() {
        let mut rng = StdRng::seed_from_u64(3);
        let (n, t) = (5, 4);
        let poly = Private::random(&mut rng, t).unwrap();
        let shares = poly.shares(n);
        let partials = shares
            .iter()
            .take(t as usize - 1)
            .map(|s| partial_sign_message::<MinSig>(s, None, b"hello"))
            .collect::<Vec<_>>();
        assert!(matches!(
            threshold_signature_recover::<MinSig, _>(t, &partials),
            Err(Error::InsufficientShares(3, 4))
        ));
    }

    #[test]
    fn test_threshold_duplicate() {
        let mut rng = StdRng::seed_from_u64(4);
        let poly = Private::random(&mut rng, 2).unwrap();
        let shares = poly.shares(3);
        let mut partials = shares
            .iter()
            .map(|s| partial_sign_message::<MinSig>(s, None, b"hello"))
            .collect::<Vec<_>>();
        partials.push(partials[0].clone());
        assert!(matches!(
            threshold_signature_recover::<MinSig, _>(2, &partials),
            Err(Error::DuplicateIdentity(id)) if id == shares[0].identity
        ));
    }

    #[test]
    fn test_partial_verify_wrong_identity() {
        let mut rng = StdRng::seed_from_u64(5);
        let poly = Private::random(&mut rng, 2).unwrap();
        let public = poly.commit::<MinPk>();
        let shares = poly.shares(3);
        let mut partial = partial_sign_message::<MinPk>(&shares[0], None, b"hello");
        partial.identity = shares[1].identity;
        assert!(matches!(
            partial_verify_message::<MinPk>(&public, None, b"hello", &partial),
            Err(Error::InvalidPartialSignature(id)) if id == shares[1].identity
        ));
    }

    #[test]
    fn test_partial_sign_messages() {
        let mut rng = StdRng::seed_from_u64(6);
        let poly = Private::random(&mut rng, 3).unwrap();
        let shares = poly.shares_for(&derived(6)).unwrap();
        let expected = shares
            .iter()
            .map(|s| partial_sign_message::<MinSig>(s, None, b"batch"))
            .collect::<Vec<_>>();
        for concurrency in [1, 4] {
            assert_eq!(
                partial_sign_messages::<MinSig>(&shares, None, b"batch", concurrency),
                expected
            );
        }
    }

    #[test]
    fn test_partial_verify_messages() {
        let mut rng = StdRng::seed_from_u64(7);
        let poly = Private::random(&mut rng, 3).unwrap();
        let public = poly.commit::<MinSig>();
        let shares = poly.shares_for(&derived(6)).unwrap();
        let mut partials = partial_sign_messages::<MinSig>(&shares, None, b"batch", 1);
        for concurrency in [1, 4] {
            partial_verify_messages::<MinSig, _>(&public, None, b"batch", &partials, concurrency)
                .expect("signatures should be valid");
        }

        // Corrupt two partials
        partials[1].value = partials[0].value;
        partials[4].value = partials[0].value;
        for concurrency in [1, 4] {
            let invalid = partial_verify_messages::<MinSig, _>(
                &public,
                None,
                b"batch",
                &partials,
                concurrency,
            )
            .unwrap_err();
            assert_eq!(invalid, vec![shares[1].identity, shares[4].identity]);
        }
    }

    #[test]
    fn test_threshold_recover_multiple() {
        let mut rng = StdRng::seed_from_u64(8);
        let poly = Private::random(&mut rng, 3).unwrap();
        let public = poly.commit::<MinPk>();
        let shares = poly.shares_for(&derived(5)).unwrap();
        let messages: [&[u8]; 3] = [b"one", b"two", b"three"];
        let sets = messages
            .iter()
            .map(|msg| partial_sign_messages::<MinPk>(&shares, None, msg, 1))
            .collect::<Vec<_>>();

        for concurrency in [1, 3] {
            let sigs = threshold_signature_recover_multiple::<MinPk, _>(
                3,
                sets.iter().collect(),
                concurrency,
            )
            .unwrap();
            assert_eq!(sigs.len(), 3);
            for (msg, sig) in messages.iter().zip(&sigs) {
                verify_message::<MinPk>(poly::public::<MinPk>(&public), None, msg, sig)
                    .expect("signature should be valid");
            }
        }
    }

    #[test]
    fn test_threshold_recover_multiple_mismatch() {
        let mut rng = StdRng::seed_from_u64(9);
        let poly = Private::random(&mut rng, 2).unwrap();
        let shares = poly.shares(4);
        let first = partial_sign_messages::<MinSig>(&shares[..2], None, b"a", 1);
        let second = partial_sign_messages::<MinSig>(&shares[2..], None, b"b", 1);
        assert!(matches!(
            threshold_signature_recover_multiple::<MinSig, _>(2, vec![&first, &second], 1),
            Err(Error::DomainMismatch)
        ));
    }
}
