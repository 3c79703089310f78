//! Proof that a secret value lies in a public set.
//!
//! These are Camenisch, Chaabouni, and shelat-style set membership proofs \[1\]. A trusted party
//! (e.g. the verifier) generates a weak Boneh-Boyen key, signs every member of the set, publishes
//! the signatures as [`SetMembershipPublicParameters`] and discards the key.
//!
//! ## Intuition
//! The prover picks the signature `sigma` on their value `m`, blinds it with a random non-zero
//! scalar `r` and sends `V = sigma * r`. They then prove knowledge of `m` and `r` with
//!
//! ```text
//! e(V, pk + g2 * m) = e(g1, g2) * r
//! ```
//!
//! which holds exactly when `V` is a rerandomized signature on `m`. Since signatures exist only
//! on members of the set, so does the proof. The verifier additionally checks that `V` is not the
//! identity, which would satisfy the equation for `r = 0`.
//!
//! ## References
//!
//! 1. Jan Camenisch, Rafik Chaabouni, and abhi shelat. Efficient protocols for set membership and
//!    range proofs. In Josef Pieprzyk, editor, Advances in Cryptology - ASIACRYPT 2008, pages
//!    234–252, Berlin, Heidelberg, 2008. Springer Berlin Heidelberg.

use crate::{
    algebra::{Element, GroupKind},
    boneh_boyen::{KeyPair, PublicKey, Signature},
    common::*,
    expression::{Equation, Exponent, GroupExpr, Variable, Witness},
    fragment::{consume_position, SendFirstValue},
    proofs::{
        ChallengeBuilder, Delegate, LinearStatement, SubprotocolSpec, SubprotocolSpecBuilder,
    },
    Error,
};
use serde::*;
use std::{collections::BTreeMap, convert::TryFrom, sync::Arc};
use tracing::debug;

/// Parameters for use in a [`SetMembershipFragment`].
///
/// These should be generated by a trusted party (e.g. the verifier) and can be shared with any
/// potential provers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawParameters", into = "RawParameters")]
pub struct SetMembershipPublicParameters {
    /// Public key corresponding _exclusively_ with the signatures below.
    public_key: PublicKey,
    /// A signature on every member of the set.
    signatures: BTreeMap<u64, Signature>,
    /// Cached `e(g1, g2)`.
    pairing_g1_g2: Gt,
}

/// The persisted form of [`SetMembershipPublicParameters`]; the cached pairing is recomputed and
/// every signature is checked on decoding.
#[derive(Serialize, Deserialize)]
struct RawParameters {
    public_key: PublicKey,
    signatures: BTreeMap<u64, Signature>,
}

impl TryFrom<RawParameters> for SetMembershipPublicParameters {
    type Error = Error;

    fn try_from(raw: RawParameters) -> Result<Self, Error> {
        if !raw.public_key.is_well_formed() {
            return Err(Error::ParameterSetMismatch(
                "generators must not be the identity".to_string(),
            ));
        }
        for (member, signature) in &raw.signatures {
            if !raw.public_key.verify(&Scalar::from(*member), signature) {
                return Err(Error::InvalidSignature(*member));
            }
        }
        Ok(Self {
            pairing_g1_g2: pairing(raw.public_key.g1, raw.public_key.g2),
            public_key: raw.public_key,
            signatures: raw.signatures,
        })
    }
}

impl From<SetMembershipPublicParameters> for RawParameters {
    fn from(parameters: SetMembershipPublicParameters) -> Self {
        Self {
            public_key: parameters.public_key,
            signatures: parameters.signatures,
        }
    }
}

impl SetMembershipPublicParameters {
    /// Generate parameters for the given set.
    ///
    /// Note that this generates a [`KeyPair`](crate::boneh_boyen::KeyPair) to produce the
    /// signatures, but discards the secret half after use. This is to prevent misuse; it should
    /// never be used again.
    pub fn generate(set: impl IntoIterator<Item = u64>, rng: &mut impl Rng) -> Self {
        let set: Vec<u64> = set.into_iter().collect();
        loop {
            let keypair = KeyPair::new(&mut *rng);
            // A member equal to the negated secret key has no signature; start over with a fresh
            // key in that (negligibly likely) case.
            let signatures: Option<BTreeMap<u64, Signature>> = set
                .iter()
                .map(|&member| {
                    keypair
                        .try_sign(&Scalar::from(member))
                        .map(|signature| (member, signature))
                })
                .collect();
            if let Some(signatures) = signatures {
                let public_key = *keypair.public_key();
                return Self {
                    pairing_g1_g2: pairing(public_key.g1, public_key.g2),
                    public_key,
                    signatures,
                };
            }
        }
    }

    /// Return the public key used to sign the set.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The members of the set, in increasing order.
    pub fn set(&self) -> impl Iterator<Item = u64> + '_ {
        self.signatures.keys().copied()
    }

    /// Whether the set consists of exactly `0, 1, ..., bound - 1`.
    pub fn is_range(&self, bound: u64) -> bool {
        self.signatures.len() as u64 == bound && self.set().eq(0..bound)
    }

    /// The signature on a member of the set.
    pub fn signature(&self, member: u64) -> Option<&Signature> {
        self.signatures.get(&member)
    }

    /// Cached `e(g1, g2)`.
    pub fn pairing_g1_g2(&self) -> &Gt {
        &self.pairing_g1_g2
    }

    /// Encode the parameters with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        bincode::serialize(self).map_err(|e| Error::Encoding(e.to_string()))
    }

    /// Decode parameters encoded with [`SetMembershipPublicParameters::to_bytes`], checking
    /// every signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        bincode::deserialize(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// Proves that the value of an exponent over secret variables lies in the set the parameters
/// were generated for.
///
/// The variables of the member expression must be declared by an enclosing node.
#[derive(Debug, Clone)]
pub struct SetMembershipFragment {
    member: Exponent,
    parameters: Arc<SetMembershipPublicParameters>,
}

impl SetMembershipFragment {
    /// Prove membership of `member` in the set of `parameters`.
    pub fn new(member: impl Into<Exponent>, parameters: Arc<SetMembershipPublicParameters>) -> Self {
        Self {
            member: member.into(),
            parameters,
        }
    }

    /// The public parameters the proof is built against.
    pub fn parameters(&self) -> &Arc<SetMembershipPublicParameters> {
        &self.parameters
    }

    fn blinded_signature(first_value: &SendFirstValue) -> Result<G1Projective, Error> {
        match first_value.elements() {
            [Element::G1(blinded)] => Ok(*blinded),
            _ => Err(Error::MalformedFirstMessage),
        }
    }
}

impl Delegate for SetMembershipFragment {
    /// The blinding factor `r`.
    type Secret = Scalar;

    fn send_first_value(
        &self,
        witness: &Witness,
        rng: &mut dyn Rng,
    ) -> Result<(Scalar, SendFirstValue), Error> {
        let member = self.member.evaluate(witness)?;
        let signature = scalar_to_u64(&member)
            .and_then(|m| self.parameters.signature(m))
            .ok_or_else(|| Error::NotInSet(member.to_string()))?;

        let blinding = random_non_zero(rng);
        let blinded = signature.to_element() * blinding;
        Ok((blinding, SendFirstValue::Elements(vec![Element::G1(blinded)])))
    }

    fn simulate_send_first_value(&self, rng: &mut dyn Rng) -> Result<SendFirstValue, Error> {
        // A blinded signature is a uniformly random non-identity point.
        let blinded: G1Projective = random_non_identity(rng);
        Ok(SendFirstValue::Elements(vec![Element::G1(blinded)]))
    }

    fn recreate_send_first_value(&self, reader: &mut &[u8]) -> Result<SendFirstValue, Error> {
        Ok(SendFirstValue::Elements(vec![Element::read(
            GroupKind::G1,
            reader,
        )?]))
    }

    fn additional_check(&self, first_value: &SendFirstValue) -> bool {
        match Self::blinded_signature(first_value) {
            Ok(blinded) if !blinded.is_zero() => true,
            Ok(_) => {
                debug!("blinded signature is the identity");
                false
            }
            Err(_) => false,
        }
    }

    fn provide_subprotocol_spec(
        &self,
        first_value: &SendFirstValue,
        mut builder: SubprotocolSpecBuilder,
    ) -> Result<SubprotocolSpec, Error> {
        let blinded = Self::blinded_signature(first_value)?;
        let blinding = builder.new_variable("blinding");
        let public_key = self.parameters.public_key();

        // e(V, pk + g2 * member) = e(g1, g2) * blinding
        let equation = Equation::new(
            GroupExpr::pairing(
                blinded,
                GroupExpr::from(public_key.w) + GroupExpr::from(public_key.g2) * self.member.clone(),
            ),
            GroupExpr::from(self.parameters.pairing_g1_g2) * &blinding,
        );
        builder.add_subprotocol("pairing", LinearStatement::new(&equation)?)?;
        Ok(builder.build())
    }

    fn provide_additional_witnesses(
        &self,
        blinding: Scalar,
        _witness: &Witness,
        spec: &SubprotocolSpec,
    ) -> Result<Witness, Error> {
        spec.variables()
            .iter()
            .map(|variable| Ok((variable.clone(), blinding)))
            .collect()
    }

    fn consume_public(&self, scope: &[Variable], builder: &mut ChallengeBuilder) {
        builder.consume(self.parameters.public_key());
        builder.consume(&(self.parameters.signatures.len() as u64));
        for member in self.parameters.set() {
            builder.consume(&member);
        }
        for (variable, coefficient) in self.member.terms() {
            consume_position(scope, variable, builder);
            builder.consume(coefficient);
        }
        builder.consume(&self.member.constant_term());
    }
}
