//! Utilities for serializing and deserializing arkworks types using Serde.
//!
//! [`SerializeElement`] looks like a "module" to Serde, and can be used with the `#[serde(with =
//! "SerializeElement")]` syntax to add serialization/deserialization functionality to BLS12-381
//! points and scalars, which otherwise do not provide `Serialize` and `Deserialize`
//! implementations.

use ark_bls12_381::{g1, g2};
use ark_ec::short_weierstrass::Projective;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};

/// Serialization/deserialization functionality for external arkworks types.
///
/// Elements are encoded using their canonical compressed encoding. Decoding checks that points
/// lie in the prime-order subgroup and that scalars are canonical.
pub trait SerializeElement: Sized {
    /// Proxy serialization function telling serde how to serialize the implementing type.
    fn serialize<S>(this: &Self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer;

    /// Proxy deserialization function telling serde how to deserialize the implementing type.
    fn deserialize<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>;
}

fn serialize_canonical<T, S>(this: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: CanonicalSerialize,
    S: Serializer,
{
    let mut bytes = Vec::with_capacity(this.compressed_size());
    this.serialize_compressed(&mut bytes)
        .map_err(ser::Error::custom)?;
    Serialize::serialize(&bytes, serializer)
}

fn deserialize_canonical<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: CanonicalDeserialize,
    D: Deserializer<'de>,
{
    let bytes = <Vec<u8> as Deserialize>::deserialize(deserializer)?;
    let mut reader = bytes.as_slice();
    let element = T::deserialize_compressed(&mut reader).map_err(de::Error::custom)?;
    if !reader.is_empty() {
        return Err(de::Error::custom("trailing bytes after element encoding"));
    }
    Ok(element)
}

macro_rules! impl_serialize_element {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SerializeElement for $ty {
                fn serialize<S>(this: &Self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: Serializer,
                {
                    serialize_canonical(this, serializer)
                }

                fn deserialize<'de, D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    deserialize_canonical(deserializer)
                }
            }
        )*
    };
}

impl_serialize_element!(
    ark_bls12_381::Fr,
    Projective<g1::Config>,
    Projective<g2::Config>,
    crate::common::Gt,
);

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "SerializeElement")]
        g1: G1Projective,
        #[serde(with = "SerializeElement")]
        g2: G2Projective,
        #[serde(with = "SerializeElement")]
        gt: Gt,
        #[serde(with = "SerializeElement")]
        scalar: Scalar,
    }

    #[test]
    fn elements_survive_bincode() {
        let mut rng = crate::test::rng();
        let (g1, g2) = (random_non_identity(&mut rng), random_non_identity(&mut rng));
        let wrapper = Wrapper {
            g1,
            g2,
            gt: pairing(g1, g2),
            scalar: Scalar::rand(&mut rng),
        };
        let bytes = bincode::serialize(&wrapper).unwrap();
        let decoded: Wrapper = bincode::deserialize(&bytes).unwrap();
        assert_eq!(wrapper, decoded);
    }

    #[test]
    fn non_canonical_scalar_is_rejected() {
        let wrapper = Wrapper {
            g1: G1Projective::generator(),
            g2: G2Projective::generator(),
            gt: Gt::generator(),
            scalar: Scalar::one(),
        };
        let mut bytes = bincode::serialize(&wrapper).unwrap();
        // The scalar is the last 32 bytes; all-ones exceeds the modulus.
        let len = bytes.len();
        for byte in &mut bytes[len - 32..] {
            *byte = 0xff;
        }
        assert!(bincode::deserialize::<Wrapper>(&bytes).is_err());
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Point(#[serde(with = "SerializeElement")] G1Projective);

    #[test]
    fn trailing_bytes_after_element_are_rejected() {
        let mut encoding = Vec::new();
        G1Projective::generator()
            .serialize_compressed(&mut encoding)
            .unwrap();
        let exact = bincode::serialize(&encoding).unwrap();
        assert_eq!(
            bincode::deserialize::<Point>(&exact).unwrap(),
            Point(G1Projective::generator())
        );

        encoding.push(0);
        let padded = bincode::serialize(&encoding).unwrap();
        assert!(bincode::deserialize::<Point>(&padded).is_err());
    }
}
