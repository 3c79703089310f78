//! This crate implements composable Sigma-protocols instantiated over the pairing-friendly curve
//! BLS12-381:
//! - Generalized Schnorr proofs of knowledge of discrete-log representations in Zp, G1, G2 and Gt,
//!   including pairing equations.
//! - A composition engine that combines such statements into larger proofs, either directly or
//!   after sending a first message that the inner statements depend on.
//! - Set membership proofs built from weak Boneh-Boyen signatures.
//! - Range proofs built by decomposing a value into digits and proving each digit lies in a set.
//!
//! Every proof is a tree of [`Fragment`](fragment::Fragment)s driven through the usual three
//! moves: announcement, challenge, response. See [`protocol`] for drivers that run a whole tree
//! interactively, and [`fiat_shamir`] for non-interactive proofs.

#![warn(missing_docs)]
#![warn(missing_copy_implementations, missing_debug_implementations)]
#![warn(unused_qualifications, unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
#![forbid(rustdoc::broken_intra_doc_links)]

pub mod algebra;
pub mod boneh_boyen;
pub mod expression;
pub mod fiat_shamir;
pub mod fragment;
pub mod proofs;
pub mod protocol;

mod serde;

pub use crate::common::{Gt, Rng, Scalar};
pub use crate::serde::SerializeElement;

use crate::{algebra::GroupKind, expression::Variable};
use thiserror::*;

/// Error types that may arise while constructing, running or decoding a protocol.
///
/// Verification never produces one of these: a proof that does not check out is rejected with
/// `false`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// An expression multiplies two terms that both depend on a secret variable.
    #[error("expression is not linear in its variables: {0}")]
    NonLinearExpression(String),
    /// Two sides of an equation, or two operands of a sum, live in different groups.
    #[error("expected an element of {expected}, found {found}")]
    GroupMismatch {
        /// The group required by the surrounding expression.
        expected: GroupKind,
        /// The group actually found.
        found: GroupKind,
    },
    /// A pairing was applied to something other than an element of G1 and an element of G2.
    #[error("cannot pair an element of {0} with an element of {1}")]
    InvalidPairing(GroupKind, GroupKind),
    /// An equation holds for every witness (or no witness) because no variable has a non-trivial
    /// base.
    #[error("equation does not constrain any variable: {0}")]
    DegenerateEquation(String),
    /// An equation does not have the shape a protocol requires.
    #[error("malformed equation: {0}")]
    MalformedEquation(String),
    /// No value was assigned to a variable that a statement needs.
    #[error("no value assigned to variable {0}")]
    UnassignedVariable(Variable),
    /// A value was assigned to a variable that is not part of the statement.
    #[error("variable {0} is not declared by the statement")]
    UndeclaredVariable(Variable),
    /// A variable was declared by more than one node on the same path of a proof tree.
    #[error("variable {0} is already declared in this scope")]
    RedeclaredVariable(Variable),
    /// The witness does not satisfy the equation at the given index.
    #[error("witness does not satisfy equation {0}")]
    UnsatisfiedEquation(usize),
    /// Tried to prove membership of a value that is not in the public set.
    #[error("value {0} is not a member of the public set")]
    NotInSet(String),
    /// Set membership parameters do not cover the set a construction requires.
    #[error("set membership parameters do not match: {0}")]
    ParameterSetMismatch(String),
    /// Caused by attempting to decompose a value outside the supported range.
    #[error("value {value} lies outside the range [0, {bound})")]
    OutsideRange {
        /// The offending value.
        value: String,
        /// The exclusive upper bound of the range.
        bound: u64,
    },
    /// Base and power do not describe a usable digit decomposition.
    #[error("invalid digit decomposition: {0}")]
    InvalidDecomposition(String),
    /// A signature in a set of public parameters does not verify.
    #[error("signature on {0} does not verify")]
    InvalidSignature(u64),
    /// Two subprotocols of one node share a name.
    #[error("subprotocol {0} is defined twice")]
    DuplicateSubprotocol(String),
    /// A first message does not have the shape its fragment expects.
    #[error("malformed first message")]
    MalformedFirstMessage,
    /// The prover side of a protocol was used on an instance that has no witness.
    #[error("protocol instance has no witness")]
    MissingWitness,
    /// A message does not have the shape of the fragment tree it was given to.
    #[error("message does not match the shape of the proof")]
    ShapeMismatch,
    /// Bytes could not be decoded into the expected group, field or composite type.
    #[error("could not decode message: {0}")]
    Deserialization(String),
    /// Bytes were left over after decoding a complete message.
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
    /// Public parameters could not be encoded.
    #[error("could not encode parameters: {0}")]
    Encoding(String),
}

impl From<ark_serialize::SerializationError> for Error {
    fn from(error: ark_serialize::SerializationError) -> Self {
        Error::Deserialization(error.to_string())
    }
}

mod common {
    //! Common types used internally.

    pub use ark_bls12_381::{Bls12_381, Fr as Scalar, G1Projective, G2Projective};
    pub use ark_ec::{pairing::Pairing, CurveGroup, Group};
    pub use ark_ff::{Field, PrimeField};
    pub use ark_std::{One, UniformRand, Zero};

    /// Elements of the target group of the BLS12-381 pairing, written additively.
    pub type Gt = ark_ec::pairing::PairingOutput<Bls12_381>;

    /// A trait synonym for a cryptographically secure random number generator. This trait is
    /// blanket-implemented for all valid types and will never need to be implemented by-hand.
    pub trait Rng: rand::CryptoRng + rand::RngCore {}
    impl<T: rand::CryptoRng + rand::RngCore> Rng for T {}

    /// Evaluate the BLS12-381 pairing.
    pub fn pairing(g1: G1Projective, g2: G2Projective) -> Gt {
        Bls12_381::pairing(g1.into_affine(), g2.into_affine())
    }

    /// Select a non-zero scalar uniformly at random.
    pub fn random_non_zero(rng: &mut dyn Rng) -> Scalar {
        loop {
            let s = Scalar::rand(&mut *rng);
            if !s.is_zero() {
                return s;
            }
        }
    }

    /// Select a non-identity element from the group uniformly at random.
    pub fn random_non_identity<G>(rng: &mut dyn Rng) -> G
    where
        G: Group<ScalarField = Scalar> + UniformRand,
    {
        loop {
            let g = G::rand(&mut *rng);
            if !g.is_zero() {
                return g;
            }
        }
    }

    /// Interpret a scalar as a machine integer, if it is small enough to be one.
    pub fn scalar_to_u64(scalar: &Scalar) -> Option<u64> {
        let limbs = scalar.into_bigint().0;
        if limbs[1..].iter().all(|&limb| limb == 0) {
            Some(limbs[0])
        } else {
            None
        }
    }
}
