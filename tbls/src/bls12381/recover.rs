//! Recover threshold signatures from partial signatures collected from participants.
//!
//! A [Recoverer] binds a public polynomial to a recovery policy ([Config]). Partial signatures
//! are checked for duplicates and count, optionally verified one by one against the public key
//! of their claimed identity (localizing faulty participants), and then interpolated in the
//! exponent.
//!
//! # Example
//!
//! ```rust
//! use tbls_extended::bls12381::{
//!     dealer::generate_shares,
//!     primitives::{ops::partial_sign_message, variant::MinPk},
//!     recover::{Config, Recoverer},
//! };
//! use rand::rngs::OsRng;
//!
//! let (n, t) = (4, 3);
//! let (commitment, shares) = generate_shares::<_, MinPk>(&mut OsRng, None, n, t).unwrap();
//! let partials = shares
//!     .iter()
//!     .map(|s| partial_sign_message::<MinPk>(s, None, b"payload"))
//!     .collect::<Vec<_>>();
//!
//! let config = Config::new(t, n).unwrap().with_concurrency(2);
//! let recoverer = Recoverer::<MinPk>::new(commitment, config).unwrap();
//! let signature = recoverer.recover(None, b"payload", &partials).unwrap();
//! recoverer.verify(None, b"payload", &signature).unwrap();
//! ```

use crate::bls12381::{
    dealer::validate_threshold,
    primitives::{
        ops::{partial_verify_messages, threshold_signature_recover_with_weights, verify_message},
        poly::{self, compute_weights, prepare_evaluations, PartialSignature},
        variant::Variant,
        Error,
    },
};
use bytes::Bytes;
use commonware_codec::DecodeExt;
use tracing::{debug, warn};

/// Configuration for a [Recoverer].
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of partial signatures required to recover a signature.
    threshold: u32,
    /// Number of participants holding a share.
    ///
    /// More partial signatures than participants can only come from duplicated or
    /// fabricated shares and are rejected.
    participants: u32,
    /// Whether each partial signature is verified against the public polynomial
    /// before interpolation.
    ///
    /// Without verification, a single invalid partial signature produces a signature that
    /// fails verification with no indication of which participant was at fault. Defaults to `true`.
    verify_partials: bool,
    /// Number of threads used to verify partial signatures (`1` verifies sequentially).
    /// Defaults to `1`.
    concurrency: usize,
}

impl Config {
    /// Returns a configuration requiring `threshold` of `participants` partial signatures.
    pub fn new(threshold: u32, participants: u32) -> Result<Self, Error> {
        validate_threshold(threshold, participants)?;
        Ok(Self {
            threshold,
            participants,
            verify_partials: true,
            concurrency: 1,
        })
    }

    // Setters
    /// See [Config]
    pub fn with_verify_partials(mut self, verify_partials: bool) -> Self {
        self.verify_partials = verify_partials;
        self
    }
    /// See [Config]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    // Getters
    /// See [Config]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }
    /// See [Config]
    pub fn participants(&self) -> u32 {
        self.participants
    }
    /// See [Config]
    pub fn verify_partials(&self) -> bool {
        self.verify_partials
    }
    /// See [Config]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

/// Combines partial signatures into signatures under the group public key.
#[derive(Clone, Debug)]
pub struct Recoverer<V: Variant> {
    public: poly::Public<V>,
    config: Config,
}

impl<V: Variant> Recoverer<V> {
    /// Creates a recoverer for the given public polynomial.
    ///
    /// Fails with [Error::DomainMismatch] if the polynomial does not have exactly
    /// `threshold` coefficients.
    pub fn new(public: poly::Public<V>, config: Config) -> Result<Self, Error> {
        if public.required() != config.threshold {
            return Err(Error::DomainMismatch);
        }
        Ok(Self { public, config })
    }

    /// Returns the public polynomial.
    pub fn polynomial(&self) -> &poly::Public<V> {
        &self.public
    }

    /// Returns the group public key.
    pub fn public(&self) -> &V::Public {
        poly::public::<V>(&self.public)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Recovers the signature over `message` from the provided partial signatures.
    ///
    /// Between `threshold` and `participants` partial signatures with distinct identities
    /// must be provided. If partial verification is enabled, every provided partial signature
    /// must be valid (not only those selected for interpolation).
    pub fn recover<'a, I>(
        &self,
        namespace: Option<&[u8]>,
        message: &[u8],
        partials: I,
    ) -> Result<V::Signature, Error>
    where
        I: IntoIterator<Item = &'a PartialSignature<V>>,
        V::Signature: 'a,
    {
        let partials = partials.into_iter().collect::<Vec<_>>();
        if partials.len() > self.config.participants as usize {
            warn!(
                provided = partials.len(),
                participants = self.config.participants,
                "too many partial signatures"
            );
            return Err(Error::TooManyShares(
                partials.len(),
                self.config.participants,
            ));
        }

        // Reject duplicates and select the first `threshold` partials by identity
        let selected = prepare_evaluations(self.config.threshold, partials.iter().copied())?;

        // Verify all provided partials against the public polynomial
        if self.config.verify_partials {
            if let Err(invalid) = partial_verify_messages::<V, _>(
                &self.public,
                namespace,
                message,
                partials.iter().copied(),
                self.config.concurrency,
            ) {
                for identity in &invalid {
                    warn!(%identity, "invalid partial signature");
                }
                return Err(Error::InvalidPartialSignature(invalid[0]));
            }
        }

        // Interpolate
        let identities = selected.iter().map(|p| p.identity).collect::<Vec<_>>();
        let weights = compute_weights(&identities)?;
        let signature = threshold_signature_recover_with_weights::<V, _>(&weights, selected)?;
        debug!(
            provided = partials.len(),
            threshold = self.config.threshold,
            verified = self.config.verify_partials,
            "recovered threshold signature"
        );
        Ok(signature)
    }

    /// Recovers the signature over `message` from encoded partial signatures.
    ///
    /// Any malformed encoding fails with [Error::Encoding].
    pub fn recover_encoded(
        &self,
        namespace: Option<&[u8]>,
        message: &[u8],
        encoded: &[Bytes],
    ) -> Result<V::Signature, Error> {
        let mut partials = Vec::with_capacity(encoded.len());
        for raw in encoded {
            let partial = PartialSignature::<V>::decode(raw.clone()).inspect_err(|err| {
                warn!(?err, "malformed partial signature");
            })?;
            partials.push(partial);
        }
        self.recover(namespace, message, &partials)
    }

    /// Verifies a (recovered) signature over `message` against the group public key.
    pub fn verify(
        &self,
        namespace: Option<&[u8]>,
        message: &[u8],
        signature: &V::Signature,
    ) -> Result<(), Error> {
        verify_message::<V>(self.public(), namespace, message, signature)
    }
}
