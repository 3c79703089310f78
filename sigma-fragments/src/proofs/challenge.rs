//! Functionality for building challenge scalars.
//!
//! In an interactive run the verifier samples a [`Challenge`] uniformly from the scalar field with
//! [`Challenge::random`]. For non-interactive proofs, a [`ChallengeBuilder`] hashes the public
//! statement and the prover's announcement into a challenge, as in the Fiat-Shamir heuristic.

use crate::{common::*, Error};
use ark_ff::BigInteger;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use sha3::{Digest, Sha3_256};

/// A trait implemented by types which can feed their public components into a
/// [`ChallengeBuilder`].
pub trait ChallengeInput {
    /// Incorporate public components of this type into a [`ChallengeBuilder`].
    fn consume(&self, builder: &mut ChallengeBuilder);
}

impl<'a, T: ChallengeInput + ?Sized> ChallengeInput for &'a T {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        (**self).consume(builder);
    }
}

impl ChallengeInput for Scalar {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume_bytes(self.into_bigint().to_bytes_le());
    }
}

impl ChallengeInput for u64 {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume_bytes(self.to_le_bytes());
    }
}

/// A challenge scalar shared by every fragment of one protocol run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge(Scalar);

impl Challenge {
    /// Sample a challenge uniformly at random from the scalar field.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self(Scalar::rand(rng))
    }

    /// Retrieve the internal scalar value.
    pub fn to_scalar(self) -> Scalar {
        self.0
    }

    /// The canonical 32-byte encoding of the challenge.
    pub fn to_bytes(self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.0.compressed_size());
        crate::algebra::write_scalar(&self.0, &mut bytes);
        bytes
    }

    /// Decode a challenge, rejecting non-canonical encodings and trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut reader = bytes;
        let scalar = Scalar::deserialize_compressed(&mut reader)?;
        if !reader.is_empty() {
            return Err(Error::TrailingBytes(reader.len()));
        }
        Ok(Self(scalar))
    }
}

impl From<Scalar> for Challenge {
    fn from(scalar: Scalar) -> Self {
        Self(scalar)
    }
}

/// Holds state used when building a [`Challenge`] using the Fiat-Shamir heuristic, as in a
/// non-interactive Schnorr proof.
#[derive(Debug, Clone)]
pub struct ChallengeBuilder {
    hasher: Sha3_256,
}

impl Default for ChallengeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChallengeBuilder {
    /// Initialize a new, empty challenge.
    pub fn new() -> Self {
        Self {
            hasher: Sha3_256::new(),
        }
    }

    /// Incorporate public data from some given type into the challenge.
    pub fn consume<T: ChallengeInput + ?Sized>(&mut self, object: &T) {
        object.consume(self);
    }

    /// A conveniently chainable variant of [`ChallengeBuilder::consume`].
    pub fn with<T: ChallengeInput + ?Sized>(mut self, object: &T) -> Self {
        object.consume(&mut self);
        self
    }

    /// Incorporate arbitrary bytes into the challenge.
    ///
    /// The bytes are length-prefixed, so consecutive inputs cannot run into each other.
    pub fn consume_bytes(&mut self, bytes: impl AsRef<[u8]>) {
        let bytes = bytes.as_ref();
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    /// A conveniently chainable variant of [`ChallengeBuilder::consume_bytes`].
    pub fn with_bytes(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.consume_bytes(bytes);
        self
    }

    /// Consume the builder and generate a [`Challenge`] from the accumulated data.
    pub fn finish(self) -> Challenge {
        let digested = self.hasher.finalize();
        Challenge(Scalar::from_le_bytes_mod_order(digested.as_ref()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn challenge_depends_on_every_input() {
        let first = ChallengeBuilder::new().with_bytes(b"ab").with_bytes(b"c").finish();
        let second = ChallengeBuilder::new().with_bytes(b"a").with_bytes(b"bc").finish();
        let repeat = ChallengeBuilder::new().with_bytes(b"ab").with_bytes(b"c").finish();
        assert_ne!(first, second);
        assert_eq!(first, repeat);
    }

    #[test]
    fn challenge_encoding_is_checked() {
        let mut rng = crate::test::rng();
        let challenge = Challenge::random(&mut rng);
        let bytes = challenge.to_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(Challenge::from_bytes(&bytes).unwrap(), challenge);

        let mut long = bytes.clone();
        long.push(0);
        assert_eq!(Challenge::from_bytes(&long), Err(Error::TrailingBytes(1)));
        assert!(matches!(
            Challenge::from_bytes(&[0xff; 32]),
            Err(Error::Deserialization(_))
        ));
    }
}
