//! Operations over the BLS12-381 scalar field.
//!
//! # Acknowledgements
//!
//! _The following crates were used as a reference when implementing this crate. If code is very similar
//! to the reference, it is accompanied by a comment and link._
//!
//! * <https://github.com/celo-org/celo-threshold-bls-rs>: Operations over the BLS12-381 scalar field and
//!   threshold signature recovery.
//! * <https://github.com/filecoin-project/blstrs> + <https://github.com/MystenLabs/fastcrypto>: Implementing operations over
//!   the BLS12-381 scalar field with <https://github.com/supranational/blst>.
//!
//! # Example
//!
//! ```rust
//! use tbls_extended::bls12381::primitives::{
//!     identity::Identity,
//!     ops::{partial_sign_message, partial_verify_message, threshold_signature_recover, verify_message},
//!     poly::{self, Private},
//!     variant::MinSig,
//! };
//! use rand::rngs::OsRng;
//!
//! // Configure threshold
//! let (n, t) = (5, 4);
//!
//! // Generate the dealer's polynomial, its commitment, and shares for arbitrary identities
//! let private = Private::random(&mut OsRng, t).unwrap();
//! let commitment = private.commit::<MinSig>();
//! let identities = (0..n)
//!     .map(|i| Identity::derive(format!("participant-{i}").as_bytes()).unwrap())
//!     .collect::<Vec<_>>();
//! let shares = private.shares_for(&identities).unwrap();
//!
//! // Generate partial signatures from shares
//! let namespace = Some(&b"demo"[..]);
//! let message = b"hello world";
//! let partials: Vec<_> = shares
//!     .iter()
//!     .map(|s| partial_sign_message::<MinSig>(s, namespace, message))
//!     .collect();
//!
//! // Verify partial signatures
//! for p in &partials {
//!     partial_verify_message::<MinSig>(&commitment, namespace, message, p)
//!         .expect("signature should be valid");
//! }
//!
//! // Recover the threshold signature
//! let threshold_sig = threshold_signature_recover::<MinSig, _>(t, &partials).unwrap();
//!
//! // Verify threshold signature
//! let threshold_pub = poly::public::<MinSig>(&commitment);
//! verify_message::<MinSig>(threshold_pub, namespace, message, &threshold_sig)
//!     .expect("signature should be valid");
//! ```

pub mod group;
pub mod identity;
pub mod ops;
pub mod poly;
pub mod variant;

use identity::Identity;
use thiserror::Error;

/// Errors that can occur when working with BLS12-381 primitives.
#[derive(Error, Debug)]
pub enum Error {
    #[error("insufficient shares: {0}/{1}")]
    InsufficientShares(usize, usize),
    #[error("duplicate identity: {0}")]
    DuplicateIdentity(Identity),
    #[error("too many shares: {0}/{1}")]
    TooManyShares(usize, u32),
    #[error("invalid partial signature: {0}")]
    InvalidPartialSignature(Identity),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("encoding error: {0}")]
    Encoding(#[from] commonware_codec::Error),
    #[error("domain mismatch")]
    DomainMismatch,
    #[error("invalid threshold: {0} of {1}")]
    InvalidThreshold(u32, u32),
    #[error("invalid identity")]
    InvalidIdentity,
    #[error("share not on commitment: {0}")]
    InvalidShare(Identity),
    #[error("polynomial has no coefficients")]
    EmptyPolynomial,
    #[error("no inverse")]
    NoInverse,
}
