//! Stateless operations performed by a trusted dealer (and by participants checking a dealing).
//!
//! # Example
//!
//! ```rust
//! use tbls_extended::bls12381::{
//!     dealer::{generate_shares_for, verify_share},
//!     primitives::{identity::Identity, variant::MinSig},
//! };
//! use rand::rngs::OsRng;
//!
//! // Derive identities from each participant's public key
//! let identities = [b"alice".as_slice(), b"bob", b"carol"]
//!     .iter()
//!     .map(|pk| Identity::derive(pk).unwrap())
//!     .collect::<Vec<_>>();
//!
//! // Deal shares for a 2-of-3 group
//! let (commitment, shares) =
//!     generate_shares_for::<_, MinSig>(&mut OsRng, None, &identities, 2).unwrap();
//!
//! // Each participant checks the share it received
//! for (identity, share) in identities.iter().zip(&shares) {
//!     verify_share::<MinSig>(&commitment, 2, identity, share).unwrap();
//! }
//! ```

use crate::bls12381::primitives::{
    group::{Private, Scalar, Share},
    identity::Identity,
    poly::{self, Eval, Poly},
    variant::Variant,
    Error,
};
use rand::{CryptoRng, RngCore};
use tracing::debug;
use zeroize::Zeroize;

/// Checks that `t` shares out of `n` is a usable threshold.
pub(crate) fn validate_threshold(t: u32, n: u32) -> Result<(), Error> {
    if t == 0 || t > n {
        return Err(Error::InvalidThreshold(t, n));
    }
    Ok(())
}

fn dealing<R: RngCore + CryptoRng>(
    rng: &mut R,
    secret: Option<Private>,
    t: u32,
) -> Result<poly::Private, Error> {
    match secret {
        Some(secret) => poly::Private::generate(rng, t, secret),
        None => poly::Private::random(rng, t),
    }
}

/// Generates a commitment and shares for the classic identities `1..=n`.
///
/// If `secret` is provided, it becomes the group secret. Otherwise, a random secret is sampled.
pub fn generate_shares<R: RngCore + CryptoRng, V: Variant>(
    rng: &mut R,
    secret: Option<Private>,
    n: u32,
    t: u32,
) -> Result<(poly::Public<V>, Vec<Share>), Error> {
    validate_threshold(t, n)?;

    // Generate a secret polynomial and commit to it
    let private = dealing(rng, secret, t)?;
    let commitment = private.commit::<V>();
    let shares = private.shares(n);
    debug!(n, t, "generated shares");
    Ok((commitment, shares))
}

/// Generates a commitment and one share per provided identity.
///
/// If `secret` is provided, it becomes the group secret. Otherwise, a random secret is sampled.
pub fn generate_shares_for<R: RngCore + CryptoRng, V: Variant>(
    rng: &mut R,
    secret: Option<Private>,
    identities: &[Identity],
    t: u32,
) -> Result<(poly::Public<V>, Vec<Share>), Error> {
    let n = u32::try_from(identities.len()).map_err(|_| Error::InvalidThreshold(t, u32::MAX))?;
    validate_threshold(t, n)?;

    // Generate a secret polynomial and commit to it
    let private = dealing(rng, secret, t)?;
    let commitment = private.commit::<V>();
    let shares = private.shares_for(identities)?;
    debug!(n, t, "generated shares for identities");
    Ok((commitment, shares))
}

/// Evaluates the public polynomial at each identity, returning the public key of each participant.
pub fn evaluate_all<V: Variant>(
    polynomial: &poly::Public<V>,
    identities: &[Identity],
) -> Vec<Eval<V::Public>> {
    identities
        .iter()
        .map(|identity| polynomial.evaluate(identity))
        .collect()
}

/// Verifies that a given share is valid for a specified recipient.
///
/// The commitment must have exactly `t` coefficients and the share must lie on it.
pub fn verify_share<V: Variant>(
    commitment: &poly::Public<V>,
    t: u32,
    recipient: &Identity,
    share: &Share,
) -> Result<(), Error> {
    if commitment.required() != t {
        return Err(Error::DomainMismatch);
    }
    if share.identity != *recipient {
        return Err(Error::InvalidShare(share.identity));
    }
    let expected = share.public::<V>();
    let given = commitment.evaluate(&share.identity);
    if given.value != expected {
        return Err(Error::InvalidShare(share.identity));
    }
    Ok(())
}

/// Recovers the group secret from at least `t` shares.
///
/// # Warning
///
/// The returned scalar is the group secret. It should only be reconstructed when the group
/// is being retired or migrated to a new dealing.
pub fn recover_secret<'a, I>(t: u32, shares: I) -> Result<Private, Error>
where
    I: IntoIterator<Item = &'a Share>,
{
    let mut evals = shares
        .into_iter()
        .map(|share| Eval {
            identity: share.identity,
            value: *share.private(),
        })
        .collect::<Vec<_>>();
    let secret = Poly::<Scalar>::recover(t, &evals);

    // Clear the copied share values before returning
    evals.iter_mut().for_each(|eval| eval.value.zeroize());
    secret
}
