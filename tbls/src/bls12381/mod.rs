//! Threshold signatures over the BLS12-381 curve with arbitrary participant identities.
//!
//! A trusted dealer splits a secret into shares evaluated at participant [primitives::identity::Identity]s
//! (the classic integers `1..=n` or any non-zero scalar, such as one derived from a participant's public key).
//! Any `t` partial signatures recover a signature that is byte-for-byte identical to one produced
//! with the group secret and verifies with the classic BLS procedure.
//!
//! # Features
//!
//! This crate has the following features:
//!
//! - `portable`: Enables `portable` feature on `blst` (<https://github.com/supranational/blst?tab=readme-ov-file#platform-and-language-compatibility>).
//!
//! # Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Benchmarks cover partial signing, polynomial evaluation, threshold recovery (classic and
//! derived identities, sequential and parallel verification), and signature verification.

pub mod dealer;
pub mod primitives;
pub mod recover;
