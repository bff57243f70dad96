//! Threshold BLS signatures with arbitrary participant identities.
//!
//! A dealer splits a secret key into shares evaluated at participant identities, participants
//! produce partial signatures, and any `t` of them recover a signature that verifies under the
//! group public key exactly like an ordinary BLS signature.
//!
//! # Status
//!
//! `tbls-extended` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

pub mod bls12381;
