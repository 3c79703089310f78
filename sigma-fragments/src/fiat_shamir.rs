//! Non-interactive proofs via the Fiat-Shamir heuristic.
//!
//! The challenge is the hash of a caller-chosen domain label, the public statement of the root
//! fragment, and the prover's announcement. A verifier recomputes it from the same data, so a
//! proof made for one label or statement does not verify for another.

use crate::{
    common::*,
    fragment::{ensure_consumed, Announcement, Response},
    proofs::{Challenge, ChallengeBuilder},
    protocol::SigmaProtocol,
    Error,
};
use tracing::debug;

/// An announcement and the response to its Fiat-Shamir challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonInteractiveProof {
    announcement: Announcement,
    response: Response,
}

impl NonInteractiveProof {
    /// The prover's announcement.
    pub fn announcement(&self) -> &Announcement {
        &self.announcement
    }

    /// The prover's response.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// The wire encoding: the announcement followed by the response.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.announcement.to_bytes();
        self.response.write(&mut bytes);
        bytes
    }

    /// Decode a proof for the given protocol.
    pub fn from_bytes(protocol: &impl SigmaProtocol, bytes: &[u8]) -> Result<Self, Error> {
        let mut reader = bytes;
        let announcement = protocol.fragment().recreate_announcement(&mut reader)?;
        let response = protocol
            .fragment()
            .recreate_response(&announcement, &mut reader)?;
        ensure_consumed(reader)?;
        Ok(Self {
            announcement,
            response,
        })
    }
}

/// Compute the Fiat-Shamir challenge for an announcement.
pub fn derive_challenge(
    protocol: &impl SigmaProtocol,
    label: &[u8],
    announcement: &Announcement,
) -> Challenge {
    let mut builder = ChallengeBuilder::new().with_bytes(label);
    protocol.fragment().consume_statement(&[], &mut builder);
    builder.with_bytes(announcement.to_bytes()).finish()
}

/// Produce a non-interactive proof.
pub fn prove_non_interactive(
    protocol: &impl SigmaProtocol,
    label: &[u8],
    rng: &mut impl Rng,
) -> Result<NonInteractiveProof, Error> {
    let (secret, announcement) = protocol.announce(rng)?;
    let challenge = derive_challenge(protocol, label, &announcement);
    let response = protocol.respond(secret, &challenge);
    Ok(NonInteractiveProof {
        announcement,
        response,
    })
}

/// Check a non-interactive proof.
///
/// Bytes that do not decode into a proof for this protocol are an error; a proof that decodes
/// but does not check out is `Ok(false)`.
pub fn verify_non_interactive(
    protocol: &impl SigmaProtocol,
    label: &[u8],
    bytes: &[u8],
) -> Result<bool, Error> {
    let proof = NonInteractiveProof::from_bytes(protocol, bytes)?;
    let challenge = derive_challenge(protocol, label, &proof.announcement);
    let accepted = protocol.verify(&proof.announcement, &challenge, &proof.response);
    if !accepted {
        debug!("non-interactive proof rejected");
    }
    Ok(accepted)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        expression::{Equation, GroupExpr, Variable, Witness},
        proofs::{Conjunction, LinearStatement},
        protocol::ComposedProtocol,
    };

    fn knowledge_of_discrete_log(rng: &mut impl Rng) -> ComposedProtocol {
        let x = Variable::new("x");
        let secret = Scalar::rand(&mut *rng);
        let g: G2Projective = random_non_identity(&mut *rng);
        let statement =
            LinearStatement::new(&Equation::new(GroupExpr::from(g) * &x, g * secret)).unwrap();
        let root = Conjunction::new()
            .declare(&x)
            .unwrap()
            .with("dlog", statement)
            .unwrap();
        ComposedProtocol::prover(root, Witness::new().with(&x, secret))
    }

    #[test]
    fn proof_verifies_under_its_label() {
        let mut rng = crate::test::rng();
        let protocol = knowledge_of_discrete_log(&mut rng);
        let proof = prove_non_interactive(&protocol, b"test", &mut rng).unwrap();
        let verifier = protocol.to_verifier();
        assert!(verify_non_interactive(&verifier, b"test", &proof.to_bytes()).unwrap());
        assert!(!verify_non_interactive(&verifier, b"other", &proof.to_bytes()).unwrap());
    }

    #[test]
    fn proof_does_not_transfer_between_statements() {
        let mut rng = crate::test::rng();
        let protocol = knowledge_of_discrete_log(&mut rng);
        let other = knowledge_of_discrete_log(&mut rng);
        let proof = prove_non_interactive(&protocol, b"test", &mut rng).unwrap();
        assert!(!verify_non_interactive(&other, b"test", &proof.to_bytes()).unwrap());
    }

    #[test]
    fn decoded_proof_matches() {
        let mut rng = crate::test::rng();
        let protocol = knowledge_of_discrete_log(&mut rng);
        let proof = prove_non_interactive(&protocol, b"test", &mut rng).unwrap();
        let bytes = proof.to_bytes();
        assert_eq!(NonInteractiveProof::from_bytes(&protocol, &bytes).unwrap(), proof);
        assert!(NonInteractiveProof::from_bytes(&protocol, &bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn challenge_depends_on_variable_wiring() {
        let mut rng = crate::test::rng();
        let (g, h): (G1Projective, G1Projective) =
            (random_non_identity(&mut rng), random_non_identity(&mut rng));
        let (a, b) = (Scalar::rand(&mut rng), Scalar::rand(&mut rng));
        let (left, right) = (g * a, h * b);

        // The same two leaves, with the shared variables swapped between them.
        let wired = |swap: bool| {
            let x = Variable::new("x");
            let y = Variable::new("y");
            let (first, second) = if swap { (&y, &x) } else { (&x, &y) };
            let root = Conjunction::new()
                .declare(&x)
                .unwrap()
                .declare(&y)
                .unwrap()
                .with(
                    "left",
                    LinearStatement::new(&Equation::new(GroupExpr::from(g) * first, left))
                        .unwrap(),
                )
                .unwrap()
                .with(
                    "right",
                    LinearStatement::new(&Equation::new(GroupExpr::from(h) * second, right))
                        .unwrap(),
                )
                .unwrap();
            let witness = if swap {
                Witness::new().with(&y, a).with(&x, b)
            } else {
                Witness::new().with(&x, a).with(&y, b)
            };
            ComposedProtocol::prover(root, witness)
        };
        let straight = wired(false);
        let swapped = wired(true);

        let (_, announcement) = straight.announce(&mut rng).unwrap();
        assert_ne!(
            derive_challenge(&straight, b"test", &announcement),
            derive_challenge(&swapped, b"test", &announcement)
        );
        assert_eq!(
            derive_challenge(&straight, b"test", &announcement),
            derive_challenge(&wired(false), b"test", &announcement)
        );
    }
}
