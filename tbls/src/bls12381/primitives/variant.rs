//! Different variants of the BLS signature scheme.
//!
//! A [Variant] fixes which group holds public keys and which holds signatures. It is the
//! only place the two groups are chosen, so every polynomial, share, and signature
//! produced under one variant is consistent by construction.

use super::{
    group::{Point, DST, G1, G1_MESSAGE, G2, G2_MESSAGE},
    Error,
};
use blst::{
    blst_p1_affine, blst_p2_affine, Pairing, BLS12_381_NEG_G1, BLS12_381_NEG_G2,
};
use std::fmt::{self, Debug};

/// A specific instance of a signature scheme.
pub trait Variant: Clone + Send + Sync + Eq + Debug + 'static {
    /// The public key type.
    type Public: Point;

    /// The signature type.
    type Signature: Point;

    /// The domain separator tag (DST) for a message.
    const MESSAGE: DST;

    /// Verify the signature from the provided public key and pre-hashed message.
    fn verify(
        public: &Self::Public,
        hm: &Self::Signature,
        signature: &Self::Signature,
    ) -> Result<(), Error>;
}

/// Returns whether `e(p1,q1) * e(p2,q2) == 1`.
///
/// Both pairs share one Miller loop accumulator and a single final exponentiation. The
/// context carries no DST because callers only pass pre-hashed messages.
fn pairing_product_is_one(
    p1: &blst_p1_affine,
    q1: &blst_p2_affine,
    p2: &blst_p1_affine,
    q2: &blst_p2_affine,
) -> bool {
    let mut pairing = Pairing::new(false, &[]);
    pairing.raw_aggregate(q1, p1);
    pairing.raw_aggregate(q2, p2);
    pairing.commit();
    pairing.finalverify(None)
}

/// A [Variant] with a public key of type [G1] and a signature of type [G2].
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct MinPk {}

impl Variant for MinPk {
    type Public = G1;
    type Signature = G2;

    const MESSAGE: DST = G2_MESSAGE;

    /// Checks `e(pk,hm) == e(G1::one(),sig)` as `e(pk,hm) * e(-G1::one(),sig) == 1`.
    fn verify(
        public: &Self::Public,
        hm: &Self::Signature,
        signature: &Self::Signature,
    ) -> Result<(), Error> {
        // SAFETY: the negated generator is an immutable constant exported by blst.
        let neg_g1 = unsafe { &BLS12_381_NEG_G1 };
        let valid = pairing_product_is_one(
            &public.as_blst_p1_affine(),
            &hm.as_blst_p2_affine(),
            neg_g1,
            &signature.as_blst_p2_affine(),
        );
        if !valid {
            return Err(Error::InvalidSignature);
        }
        Ok(())
    }
}

impl Debug for MinPk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MinPk")
    }
}

/// A [Variant] with a public key of type [G2] and a signature of type [G1].
///
/// Signatures are half the size of [MinPk] signatures, which suits deployments where many
/// signatures are transmitted for one long-lived group key.
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct MinSig {}

impl Variant for MinSig {
    type Public = G2;
    type Signature = G1;

    const MESSAGE: DST = G1_MESSAGE;

    /// Checks `e(hm,pk) == e(sig,G2::one())` as `e(hm,pk) * e(sig,-G2::one()) == 1`.
    fn verify(
        public: &Self::Public,
        hm: &Self::Signature,
        signature: &Self::Signature,
    ) -> Result<(), Error> {
        // SAFETY: the negated generator is an immutable constant exported by blst.
        let neg_g2 = unsafe { &BLS12_381_NEG_G2 };
        let valid = pairing_product_is_one(
            &hm.as_blst_p1_affine(),
            &public.as_blst_p2_affine(),
            &signature.as_blst_p1_affine(),
            neg_g2,
        );
        if !valid {
            return Err(Error::InvalidSignature);
        }
        Ok(())
    }
}

impl Debug for MinSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MinSig")
    }
}
