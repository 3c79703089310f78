//! Weak Boneh-Boyen signatures over BLS12-381.
//!
//! A signature on a scalar `m` under secret key `x` is `sigma = g1 * 1/(x + m)`; it verifies when
//! `e(sigma, w + g2 * m) = e(g1, g2)` for the public key `w = g2 * x`. The scheme is only secure
//! for messages fixed before the key is generated, which is exactly how set membership parameters
//! use it: the key signs every member of a public set once and is then discarded.
//!
//! ## References
//!
//! 1. Dan Boneh and Xavier Boyen. Short signatures without random oracles. In Christian Cachin
//!    and Jan Camenisch, editors, Advances in Cryptology - EUROCRYPT 2004, pages 56–73. Springer
//!    Berlin Heidelberg, 2004.

use crate::{
    common::*,
    proofs::{ChallengeBuilder, ChallengeInput},
    serde::SerializeElement,
};
use serde::*;

/// Boneh-Boyen secret key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SecretKey {
    x: Scalar,
}

/// A Boneh-Boyen public key, with the generators it is defined over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    /// G1 generator.
    #[serde(with = "SerializeElement")]
    pub g1: G1Projective,
    /// G2 generator.
    #[serde(with = "SerializeElement")]
    pub g2: G2Projective,
    /// `w = g2 * x`.
    #[serde(with = "SerializeElement")]
    pub w: G2Projective,
}

/// A signature on a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "SerializeElement")] G1Projective);

/// A keypair formed from a `SecretKey` and a [`PublicKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPair {
    sk: SecretKey,
    pk: PublicKey,
}

impl KeyPair {
    /// Generate a new keypair over fresh generators chosen uniformly at random.
    pub fn new(rng: &mut impl Rng) -> Self {
        let g1: G1Projective = random_non_identity(&mut *rng);
        let g2: G2Projective = random_non_identity(&mut *rng);
        let x = random_non_zero(&mut *rng);
        Self {
            sk: SecretKey { x },
            pk: PublicKey { g1, g2, w: g2 * x },
        }
    }

    /// Get the public portion of the keypair.
    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// Sign a scalar. Fails only for the single message `m = -x`, which has no signature.
    pub fn try_sign(&self, message: &Scalar) -> Option<Signature> {
        (self.sk.x + message)
            .inverse()
            .map(|exponent| Signature(self.pk.g1 * exponent))
    }
}

impl PublicKey {
    /// Verify a signature on a scalar.
    pub fn verify(&self, message: &Scalar, signature: &Signature) -> bool {
        signature.is_well_formed()
            && pairing(signature.0, self.w + self.g2 * message) == pairing(self.g1, self.g2)
    }

    /// Whether the generators are usable: neither may be the identity.
    pub fn is_well_formed(&self) -> bool {
        !self.g1.is_zero() && !self.g2.is_zero()
    }
}

impl ChallengeInput for PublicKey {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&crate::algebra::Element::G1(self.g1));
        builder.consume(&crate::algebra::Element::G2(self.g2));
        builder.consume(&crate::algebra::Element::G2(self.w));
    }
}

impl Signature {
    /// Check that the signature is not the identity element.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_zero()
    }

    /// The signature as a group element.
    pub fn to_element(self) -> G1Projective {
        self.0
    }
}
