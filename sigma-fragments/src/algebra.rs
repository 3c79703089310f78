//! A thin adapter over the BLS12-381 groups, so statements can be written once for any of them.
//!
//! Every element of a statement is an [`Element`] of one of four groups: the scalar field Zp
//! itself, G1, G2, or the pairing target group Gt. All four are written additively. Elements do
//! not describe their own group on the wire; decoding always takes the expected [`GroupKind`].

use crate::{
    common::*,
    proofs::{ChallengeBuilder, ChallengeInput},
    Error,
};
use ark_bls12_381::{g1, g2};
use ark_ec::short_weierstrass::Projective;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use std::fmt;

/// The group an [`Element`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// The scalar field of BLS12-381, viewed as an additive group.
    Scalar,
    /// The first source group of the pairing.
    G1,
    /// The second source group of the pairing.
    G2,
    /// The target group of the pairing.
    Gt,
}

impl GroupKind {
    fn tag(self) -> u8 {
        match self {
            GroupKind::Scalar => 0,
            GroupKind::G1 => 1,
            GroupKind::G2 => 2,
            GroupKind::Gt => 3,
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupKind::Scalar => "Zp",
            GroupKind::G1 => "G1",
            GroupKind::G2 => "G2",
            GroupKind::Gt => "Gt",
        };
        f.write_str(name)
    }
}

/// An element of one of the groups of BLS12-381.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    /// A scalar.
    Scalar(Scalar),
    /// A point in G1.
    G1(G1Projective),
    /// A point in G2.
    G2(G2Projective),
    /// An element of the target group.
    Gt(Gt),
}

impl From<Scalar> for Element {
    fn from(scalar: Scalar) -> Self {
        Element::Scalar(scalar)
    }
}

impl From<Projective<g1::Config>> for Element {
    fn from(g1: Projective<g1::Config>) -> Self {
        Element::G1(g1)
    }
}

impl From<Projective<g2::Config>> for Element {
    fn from(g2: Projective<g2::Config>) -> Self {
        Element::G2(g2)
    }
}

impl From<Gt> for Element {
    fn from(gt: Gt) -> Self {
        Element::Gt(gt)
    }
}

impl Element {
    /// The identity (zero) element of the given group.
    pub fn identity(kind: GroupKind) -> Self {
        match kind {
            GroupKind::Scalar => Element::Scalar(Scalar::zero()),
            GroupKind::G1 => Element::G1(G1Projective::zero()),
            GroupKind::G2 => Element::G2(G2Projective::zero()),
            GroupKind::Gt => Element::Gt(Gt::zero()),
        }
    }

    /// The group this element belongs to.
    pub fn kind(&self) -> GroupKind {
        match self {
            Element::Scalar(_) => GroupKind::Scalar,
            Element::G1(_) => GroupKind::G1,
            Element::G2(_) => GroupKind::G2,
            Element::Gt(_) => GroupKind::Gt,
        }
    }

    /// Whether this is the identity element of its group.
    pub fn is_identity(&self) -> bool {
        match self {
            Element::Scalar(s) => s.is_zero(),
            Element::G1(g) => g.is_zero(),
            Element::G2(g) => g.is_zero(),
            Element::Gt(g) => g.is_zero(),
        }
    }

    /// Add two elements of the same group.
    pub fn add(&self, other: &Element) -> Result<Element, Error> {
        Ok(match (self, other) {
            (Element::Scalar(a), Element::Scalar(b)) => Element::Scalar(*a + b),
            (Element::G1(a), Element::G1(b)) => Element::G1(*a + b),
            (Element::G2(a), Element::G2(b)) => Element::G2(*a + b),
            (Element::Gt(a), Element::Gt(b)) => Element::Gt(*a + b),
            _ => {
                return Err(Error::GroupMismatch {
                    expected: self.kind(),
                    found: other.kind(),
                })
            }
        })
    }

    /// The inverse of this element in its group.
    pub fn neg(&self) -> Element {
        match self {
            Element::Scalar(a) => Element::Scalar(-*a),
            Element::G1(a) => Element::G1(-*a),
            Element::G2(a) => Element::G2(-*a),
            Element::Gt(a) => Element::Gt(-*a),
        }
    }

    /// Multiply this element by a scalar.
    pub fn scale(&self, scalar: &Scalar) -> Element {
        match self {
            Element::Scalar(a) => Element::Scalar(*a * scalar),
            Element::G1(a) => Element::G1(*a * scalar),
            Element::G2(a) => Element::G2(*a * scalar),
            Element::Gt(a) => Element::Gt(*a * scalar),
        }
    }

    /// Pair an element of G1 with an element of G2, in either order.
    pub fn pair(&self, other: &Element) -> Result<Element, Error> {
        match (self, other) {
            (Element::G1(a), Element::G2(b)) | (Element::G2(b), Element::G1(a)) => {
                Ok(Element::Gt(pairing(*a, *b)))
            }
            _ => Err(Error::InvalidPairing(self.kind(), other.kind())),
        }
    }

    /// Compute `sum( base_i * scalar_i )` in the given group.
    pub fn linear_combination<'a>(
        kind: GroupKind,
        terms: impl IntoIterator<Item = (&'a Element, &'a Scalar)>,
    ) -> Result<Element, Error> {
        terms
            .into_iter()
            .try_fold(Element::identity(kind), |acc, (base, scalar)| {
                acc.add(&base.scale(scalar))
            })
    }

    /// Append the canonical compressed encoding of this element to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        let written = match self {
            Element::Scalar(a) => a.serialize_compressed(&mut *out),
            Element::G1(a) => a.serialize_compressed(&mut *out),
            Element::G2(a) => a.serialize_compressed(&mut *out),
            Element::Gt(a) => a.serialize_compressed(&mut *out),
        };
        debug_assert!(written.is_ok(), "writing to a vector cannot fail");
    }

    /// The canonical compressed encoding of this element.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.write(&mut bytes);
        bytes
    }

    /// Decode an element of the given group from the front of `reader`, advancing it.
    pub fn read(kind: GroupKind, reader: &mut &[u8]) -> Result<Element, Error> {
        Ok(match kind {
            GroupKind::Scalar => Element::Scalar(Scalar::deserialize_compressed(&mut *reader)?),
            GroupKind::G1 => Element::G1(G1Projective::deserialize_compressed(&mut *reader)?),
            GroupKind::G2 => Element::G2(G2Projective::deserialize_compressed(&mut *reader)?),
            GroupKind::Gt => Element::Gt(Gt::deserialize_compressed(&mut *reader)?),
        })
    }
}

impl ChallengeInput for Element {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume_bytes([self.kind().tag()]);
        builder.consume_bytes(self.to_bytes());
    }
}

impl ChallengeInput for GroupKind {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume_bytes([self.tag()]);
    }
}

/// Read a scalar from the front of `reader`, advancing it.
pub(crate) fn read_scalar(reader: &mut &[u8]) -> Result<Scalar, Error> {
    Ok(Scalar::deserialize_compressed(&mut *reader)?)
}

/// Append the canonical encoding of a scalar to `out`.
pub(crate) fn write_scalar(scalar: &Scalar, out: &mut Vec<u8>) {
    Element::Scalar(*scalar).write(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bilinearity() {
        let mut rng = crate::test::rng();
        let a = Scalar::rand(&mut rng);
        let g1 = Element::G1(G1Projective::generator());
        let g2 = Element::G2(G2Projective::generator());

        let left = g1.scale(&a).pair(&g2).unwrap();
        let right = g1.pair(&g2).unwrap().scale(&a);
        assert_eq!(left, right);
        assert_eq!(g2.pair(&g1).unwrap(), g1.pair(&g2).unwrap());
    }

    #[test]
    fn cannot_mix_groups() {
        let g1 = Element::G1(G1Projective::generator());
        let g2 = Element::G2(G2Projective::generator());
        assert_eq!(
            g1.add(&g2),
            Err(Error::GroupMismatch {
                expected: GroupKind::G1,
                found: GroupKind::G2
            })
        );
        assert_eq!(
            g1.pair(&g1),
            Err(Error::InvalidPairing(GroupKind::G1, GroupKind::G1))
        );
    }

    #[test]
    fn elements_decode_in_their_own_group() {
        let mut rng = crate::test::rng();
        let gt = Element::Gt(pairing(
            random_non_identity(&mut rng),
            random_non_identity(&mut rng),
        ));
        let bytes = gt.to_bytes();
        assert_eq!(Element::read(GroupKind::Gt, &mut bytes.as_slice()).unwrap(), gt);

        // A G1 encoding is too short to be read as a G2 element.
        let g1 = Element::G1(random_non_identity(&mut rng)).to_bytes();
        assert!(matches!(
            Element::read(GroupKind::G2, &mut g1.as_slice()),
            Err(Error::Deserialization(_))
        ));
    }

    #[test]
    fn identity_is_detected() {
        for kind in [GroupKind::Scalar, GroupKind::G1, GroupKind::G2, GroupKind::Gt] {
            assert!(Element::identity(kind).is_identity());
            assert_eq!(Element::identity(kind).kind(), kind);
        }
        assert!(!Element::G1(G1Projective::generator()).is_identity());
    }

    #[test]
    fn points_convert_into_their_own_group() {
        let from_g1 = Element::from(G1Projective::generator());
        let from_g2 = Element::from(G2Projective::generator());
        assert_eq!(from_g1, Element::G1(G1Projective::generator()));
        assert_eq!(from_g2, Element::G2(G2Projective::generator()));
        assert_eq!(Element::from(Gt::generator()).kind(), GroupKind::Gt);
        assert_eq!(Element::from(Scalar::one()).kind(), GroupKind::Scalar);
    }
}
