//! Polynomial operations over the BLS12-381 scalar field.
//!
//! A [Private] polynomial of degree `t - 1` is the dealer's secret: its constant term is the
//! group secret and its evaluations at participant [Identity]s are the shares. Committing to
//! it yields a [Public] polynomial whose constant term is the group public key and whose
//! evaluation at an identity is that participant's public key.
//!
//! Interpolation at `x = 0` works over any [Element], so the same routine recovers a secret
//! from scalar shares and a signature from partial signatures (interpolation in the exponent).
//!
//! # Warning
//!
//! The security of the polynomial operations is critical for the overall
//! security of the threshold schemes. Ensure that the scalar field operations
//! are performed over the correct field and that all elements are valid.

use super::{
    group::{Element, Scalar, Share},
    identity::{self, Identity},
    variant::Variant,
    Error,
};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error as CodecError, FixedSize, Read, ReadExt, Write};
use rand::{CryptoRng, RngCore};
use std::{collections::BTreeMap, fmt};
use zeroize::Zeroize;

/// Public polynomials represent commitments to secrets on a private polynomial.
pub type Public<V> = Poly<<V as Variant>::Public>;

/// A partial signature is the evaluation of the "signature polynomial" at a participant's
/// identity.
pub type PartialSignature<V> = Eval<<V as Variant>::Signature>;

/// A polynomial evaluation at a specific identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eval<C: Element> {
    pub identity: Identity,
    pub value: C,
}

impl<C: Element> Write for Eval<C> {
    fn write(&self, buf: &mut impl BufMut) {
        self.identity.write(buf);
        self.value.write(buf);
    }
}

impl<C: Element> Read for Eval<C> {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let identity = Identity::read(buf)?;
        let value = C::read(buf)?;
        Ok(Self { identity, value })
    }
}

impl<C: Element> FixedSize for Eval<C> {
    const SIZE: usize = Identity::SIZE + C::SIZE;
}

/// A polynomial that is using a scalar for the variable x and a generic
/// element for the coefficients.
///
/// The coefficients must be able to multiply the type of the variable,
/// which is always a scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
// Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L24-L28
pub struct Poly<C>(Vec<C>);

impl<C> Poly<C> {
    /// Creates a new polynomial from the given coefficients.
    ///
    /// Returns an error if no coefficients are provided.
    pub fn from(c: Vec<C>) -> Result<Self, Error> {
        if c.is_empty() {
            return Err(Error::EmptyPolynomial);
        }
        Ok(Self(c))
    }

    /// Returns the constant term of the polynomial.
    pub fn constant(&self) -> &C {
        &self.0[0]
    }

    /// Returns the degree of the polynomial
    pub fn degree(&self) -> u32 {
        (self.0.len() - 1) as u32 // check size in deserialize, safe to cast
    }

    /// Returns the number of required shares to reconstruct the polynomial.
    ///
    /// This will be the threshold
    pub fn required(&self) -> u32 {
        self.0.len() as u32 // check size in deserialize, safe to cast
    }

    /// Returns the coefficients of the polynomial (constant term first).
    pub fn coefficients(&self) -> &[C] {
        &self.0
    }
}

impl<C: Element> Poly<C> {
    /// Commits the scalar polynomial to the group and returns a polynomial over
    /// the group.
    ///
    /// This is done by multiplying each coefficient of the polynomial with the
    /// group's generator.
    pub fn commit(private: &Private) -> Self {
        Self::commit_with_base(private, &C::one())
    }

    /// Commits the scalar polynomial using `base` instead of the group's generator.
    pub fn commit_with_base(private: &Private, base: &C) -> Self {
        // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L322-L340
        let commits = private
            .0
             .0
            .iter()
            .map(|c| {
                let mut commitment = base.clone();
                commitment.mul(c);
                commitment
            })
            .collect::<Vec<C>>();
        Self(commits)
    }

    /// Returns a zero polynomial.
    pub fn zero() -> Self {
        Self(vec![C::zero()])
    }

    /// Performs polynomial addition in place
    pub fn add(&mut self, other: &Self) {
        // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L87-L95

        // if we have a smaller degree we should pad with zeros
        if self.0.len() < other.0.len() {
            self.0.resize(other.0.len(), C::zero())
        }

        self.0.iter_mut().zip(&other.0).for_each(|(a, b)| a.add(b))
    }

    /// Evaluates the polynomial at the specified identity.
    pub fn evaluate(&self, identity: &Identity) -> Eval<C> {
        Eval {
            identity: *identity,
            value: horner(&self.0, identity.as_scalar()),
        }
    }

    /// Recovers the constant term of a polynomial of degree less than `t` using at least `t`
    /// evaluations of the polynomial.
    ///
    /// Evaluations are sorted by identity and the first `t` are used, so two invocations
    /// over the same evaluations always select the same subset. Any subset of `t`
    /// evaluations of the same polynomial yields the same constant term.
    pub fn recover<'a, I>(t: u32, evals: I) -> Result<C, Error>
    where
        C: 'a,
        I: IntoIterator<Item = &'a Eval<C>>,
    {
        // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L131-L165
        let evals = prepare_evaluations(t, evals)?;
        let identities = evals.iter().map(|e| e.identity).collect::<Vec<_>>();
        let weights = compute_weights(&identities)?;
        Self::recover_with_weights(&weights, evals)
    }

    /// Recovers the constant term using precomputed Lagrange weights.
    ///
    /// There must be exactly one evaluation per weight.
    pub fn recover_with_weights<'a, I>(
        weights: &BTreeMap<Identity, Weight>,
        evals: I,
    ) -> Result<C, Error>
    where
        C: 'a,
        I: IntoIterator<Item = &'a Eval<C>>,
    {
        let mut result = C::zero();
        let mut used = 0;
        for eval in evals {
            let weight = weights.get(&eval.identity).ok_or(Error::DomainMismatch)?;

            // Scale the y-value by the precomputed weight
            let mut scaled = eval.value.clone();
            scaled.mul(&weight.0);
            result.add(&scaled);
            used += 1;
        }
        if used != weights.len() {
            return Err(Error::DomainMismatch);
        }
        Ok(result)
    }
}

/// Evaluates the polynomial with coefficients `coeffs` at `x` using Horner's method.
fn horner<C: Element>(coeffs: &[C], x: &Scalar) -> C {
    coeffs.iter().rev().fold(C::zero(), |mut sum, coeff| {
        sum.mul(x);
        sum.add(coeff);
        sum
    })
}

impl<C: Element> Write for Poly<C> {
    fn write(&self, buf: &mut impl BufMut) {
        self.required().write(buf);
        for c in &self.0 {
            c.write(buf);
        }
    }
}

impl<C: Element> Read for Poly<C> {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let required = u32::read(buf)? as usize;
        if required == 0 {
            return Err(CodecError::Invalid("Poly", "no coefficients"));
        }

        // Ensure the buffer can hold all coefficients before allocating
        let expected_size = C::SIZE
            .checked_mul(required)
            .ok_or(CodecError::Invalid("Poly", "too many coefficients"))?;
        if buf.remaining() < expected_size {
            return Err(CodecError::EndOfBuffer);
        }
        let mut coeffs = Vec::with_capacity(required);
        for _ in 0..required {
            coeffs.push(C::read(buf)?);
        }
        Ok(Self(coeffs))
    }
}

impl<C: Element> EncodeSize for Poly<C> {
    fn encode_size(&self) -> usize {
        u32::SIZE + C::SIZE * self.0.len()
    }
}

/// The dealer's private polynomial.
///
/// The constant term is the group secret. A [Private] has a single owner: it cannot be
/// cloned or encoded, its `Debug` output is redacted, and its coefficients are zeroized
/// when dropped. Only its evaluations ([Share]s) leave the dealer.
#[derive(PartialEq, Eq)]
pub struct Private(Poly<Scalar>);

impl Private {
    /// Returns a new private polynomial for `threshold` with `secret` as its constant term
    /// and the remaining `threshold - 1` coefficients sampled from `rng`.
    pub fn generate<R: RngCore + CryptoRng>(
        rng: &mut R,
        threshold: u32,
        secret: Scalar,
    ) -> Result<Self, Error> {
        if threshold == 0 {
            return Err(Error::EmptyPolynomial);
        }
        let mut coeffs = Vec::with_capacity(threshold as usize);
        coeffs.push(secret);
        coeffs.extend((1..threshold).map(|_| Scalar::rand(rng)));
        Ok(Self(Poly(coeffs)))
    }

    /// Returns a new private polynomial for `threshold` where every coefficient (including
    /// the secret) is sampled from `rng`.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R, threshold: u32) -> Result<Self, Error> {
        let secret = Scalar::rand(rng);
        Self::generate(rng, threshold, secret)
    }

    /// Creates a private polynomial from explicit coefficients (constant term first).
    ///
    /// The threshold is the number of coefficients.
    pub fn from_coefficients(coeffs: Vec<Scalar>) -> Result<Self, Error> {
        Poly::from(coeffs).map(Self)
    }

    /// Returns the group secret (the constant term).
    pub fn secret(&self) -> &Scalar {
        self.0.constant()
    }

    /// Returns the number of shares required to reconstruct the secret.
    pub fn threshold(&self) -> u32 {
        self.0.required()
    }

    /// Evaluates the polynomial at `identity`, producing that participant's share.
    pub fn evaluate(&self, identity: &Identity) -> Share {
        let eval = self.0.evaluate(identity);
        Share::new(eval.identity, eval.value)
    }

    /// Returns shares for the classic identities `1..=n`.
    pub fn shares(&self, n: u32) -> Vec<Share> {
        Identity::range(n)
            .iter()
            .map(|identity| self.evaluate(identity))
            .collect()
    }

    /// Returns one share per provided identity.
    ///
    /// Fails if any identity is repeated (two participants would hold the same share).
    pub fn shares_for(&self, identities: &[Identity]) -> Result<Vec<Share>, Error> {
        ensure_unique(identities.iter())?;
        Ok(identities
            .iter()
            .map(|identity| self.evaluate(identity))
            .collect())
    }

    /// Commits to the polynomial in the public key group of `V`.
    pub fn commit<V: Variant>(&self) -> Public<V> {
        Public::<V>::commit(self)
    }

    /// Performs polynomial addition in place.
    ///
    /// The sum of two dealings shares the sum of their secrets.
    pub fn add(&mut self, other: &Self) {
        self.0.add(&other.0);
    }
}

impl Drop for Private {
    fn drop(&mut self) {
        self.0 .0.iter_mut().for_each(Zeroize::zeroize);
    }
}

impl fmt::Debug for Private {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Private")
            .field("threshold", &self.threshold())
            .field("coefficients", &"[REDACTED]")
            .finish()
    }
}

/// Returns the public key of the polynomial (constant term).
pub fn public<V: Variant>(public: &Public<V>) -> &V::Public {
    public.constant()
}

/// A Lagrange coefficient for interpolation at `x = 0`.
#[derive(Clone, PartialEq, Eq)]
pub struct Weight(Scalar);

impl Weight {
    /// Returns the weight as a scalar.
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }
}

impl fmt::Debug for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Weight({})", commonware_utils::hex(&self.0.to_bytes()))
    }
}

/// Returns an error naming the first identity that appears more than once.
fn ensure_unique<'a>(identities: impl Iterator<Item = &'a Identity>) -> Result<(), Error> {
    let mut sorted = identities.collect::<Vec<_>>();
    sorted.sort();
    if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(Error::DuplicateIdentity(*pair[0]));
    }
    Ok(())
}

/// Computes the Lagrange coefficient `l_i(0)` for each provided identity.
///
/// The weights for a given set of identities can be reused for every interpolation over
/// that set (for example, recovering signatures over many messages from the same signers).
///
/// `l_i(0) = prod_{j != i} x_j / (x_j - x_i)`
pub fn compute_weights(identities: &[Identity]) -> Result<BTreeMap<Identity, Weight>, Error> {
    if identities.is_empty() {
        return Err(Error::InsufficientShares(0, 1));
    }
    ensure_unique(identities.iter())?;

    let mut weights = BTreeMap::new();
    for xi in identities {
        // Numerator: product of all xj (since we're evaluating at x=0)
        let mut num = identity::product(identities.iter().filter(|xj| *xj != xi));

        // Denominator: product of all (xj - xi)
        let den = identities
            .iter()
            .filter(|xj| *xj != xi)
            .fold(Scalar::one(), |mut den, xj| {
                den.mul(&identity::difference(xj, xi));
                den
            });

        // Distinct identities never yield a zero denominator
        let inv = den.inverse().ok_or(Error::NoInverse)?;
        num.mul(&inv);
        weights.insert(*xi, Weight(num));
    }
    Ok(weights)
}

/// Selects the evaluations used for interpolation.
///
/// Rejects repeated identities, requires at least `threshold` evaluations, sorts by
/// identity, and keeps the first `threshold`.
pub fn prepare_evaluations<'a, C, I>(threshold: u32, evals: I) -> Result<Vec<&'a Eval<C>>, Error>
where
    C: Element + 'a,
    I: IntoIterator<Item = &'a Eval<C>>,
{
    let t = threshold as usize;
    if t == 0 {
        return Err(Error::EmptyPolynomial);
    }
    let mut evals = evals.into_iter().collect::<Vec<_>>();
    evals.sort_by(|a, b| a.identity.cmp(&b.identity));
    if let Some(pair) = evals
        .windows(2)
        .find(|pair| pair[0].identity == pair[1].identity)
    {
        return Err(Error::DuplicateIdentity(pair[0].identity));
    }
    if evals.len() < t {
        return Err(Error::InsufficientShares(evals.len(), t));
    }
    evals.truncate(t);
    Ok(evals)
}
