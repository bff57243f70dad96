//! Participant identities.
//!
//! An [Identity] is the x-coordinate at which a participant's share is evaluated. It is
//! any non-zero element of the scalar field: the classic scheme assigns `1..=n`
//! ([Identity::from_index]) while applications may derive identities from arbitrary
//! data, such as a participant's public key ([Identity::derive]).
//!
//! Identity `0` is never valid because the private polynomial evaluated at `0` is the
//! group secret.

use super::{
    group::{Element, Scalar, SCALAR_LENGTH},
    Error,
};
use bytes::{Buf, BufMut};
use commonware_codec::{Error as CodecError, FixedSize, Read, ReadExt, Write};
use commonware_utils::hex;
use sha2::{Digest, Sha256};
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

/// Domain separation tag used when deriving an [Identity] from arbitrary bytes.
pub const IDENTITY_DST: &[u8] = b"TBLS_BLS12381_IDENTITY_SHA-256_";

/// A non-zero scalar identifying a participant.
///
/// Identities are ordered by their canonical big-endian encoding (which coincides with
/// numeric order), so classic identities sort as `1 < 2 < ... < n`.
#[derive(Clone, Copy)]
pub struct Identity {
    scalar: Scalar,
    bytes: [u8; SCALAR_LENGTH],
}

impl Identity {
    /// Creates an identity from an arbitrary non-zero scalar.
    pub fn new(scalar: Scalar) -> Result<Self, Error> {
        if scalar.is_zero() {
            return Err(Error::InvalidIdentity);
        }
        Ok(Self {
            bytes: scalar.to_bytes(),
            scalar,
        })
    }

    /// Returns the classic identity for the participant at (1-indexed) position `index`.
    pub fn from_index(index: u32) -> Result<Self, Error> {
        Self::new(Scalar::from_u32(index))
    }

    /// Derives an identity by hashing `data` (e.g. a participant's public key).
    pub fn derive(data: &[u8]) -> Result<Self, Error> {
        let mut hasher = Sha256::new();
        hasher.update(IDENTITY_DST);
        hasher.update(data);
        let digest = hasher.finalize();
        Self::new(Scalar::from_be_bytes_reduced(&digest))
    }

    /// Returns the classic identities `1..=n`.
    pub fn range(n: u32) -> Vec<Self> {
        (1..=n)
            .map(|i| Self {
                scalar: Scalar::from_u32(i),
                bytes: Scalar::from_u32(i).to_bytes(),
            })
            .collect()
    }

    /// Returns the identity as a scalar.
    pub fn as_scalar(&self) -> &Scalar {
        &self.scalar
    }

    /// Returns the canonical encoding of the identity.
    pub fn as_bytes(&self) -> &[u8; SCALAR_LENGTH] {
        &self.bytes
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Identity {}

impl PartialOrd for Identity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex(&self.bytes))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", hex(&self.bytes))
    }
}

impl Write for Identity {
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_slice(&self.bytes);
    }
}

impl Read for Identity {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let scalar = Scalar::read(buf)?;
        Self::new(scalar).map_err(|_| CodecError::Invalid("Identity", "zero"))
    }
}

impl FixedSize for Identity {
    const SIZE: usize = SCALAR_LENGTH;
}

impl TryFrom<Scalar> for Identity {
    type Error = Error;

    fn try_from(scalar: Scalar) -> Result<Self, Self::Error> {
        Self::new(scalar)
    }
}

/// Returns `x_j - x_i` for two identities.
pub(crate) fn difference(xj: &Identity, xi: &Identity) -> Scalar {
    let mut diff = xj.scalar;
    diff.sub(&xi.scalar);
    diff
}

/// Returns the product of the provided identities.
pub(crate) fn product<'a>(identities: impl IntoIterator<Item = &'a Identity>) -> Scalar {
    identities.into_iter().fold(Scalar::one(), |mut acc, x| {
        acc.mul(&x.scalar);
        acc
    })
}
