mod test_utils;

use ark_bls12_381::{Fr as Scalar, G1Projective};
use ark_std::UniformRand;
use sigma_fragments::{
    expression::{Equation, GroupExpr, Variable, Witness},
    fiat_shamir::{prove_non_interactive, verify_non_interactive, NonInteractiveProof},
    proofs::{
        Conjunction, GeneralizedSchnorrProtocol, LinearStatement, SetMembershipFragment,
        SetMembershipPublicParameters,
    },
    protocol::{ComposedProtocol, SigmaProtocol},
    Error,
};
use std::sync::Arc;

const LABEL: &[u8] = b"fiat-shamir test";

fn opening_protocol(
    rng: &mut (impl rand::CryptoRng + rand::RngCore),
) -> GeneralizedSchnorrProtocol {
    let (g, h) = (G1Projective::rand(&mut *rng), G1Projective::rand(&mut *rng));
    let (m, r) = (Scalar::rand(&mut *rng), Scalar::rand(&mut *rng));
    let (x, y) = (Variable::new("m"), Variable::new("r"));
    GeneralizedSchnorrProtocol::new(
        vec![Equation::new(
            GroupExpr::from(g) * &x + GroupExpr::from(h) * &y,
            g * m + h * r,
        )],
        Some(Witness::new().with(&x, m).with(&y, r)),
    )
    .unwrap()
}

#[test]
fn non_interactive_proof_verifies() {
    let mut rng = test_utils::seeded_rng();
    let protocol = opening_protocol(&mut rng);
    let proof = prove_non_interactive(&protocol, LABEL, &mut rng).unwrap();
    assert!(verify_non_interactive(&protocol, LABEL, &proof.to_bytes()).unwrap());
}

#[test]
fn non_interactive_proof_fails_with_wrong_label() {
    let mut rng = test_utils::seeded_rng();
    let protocol = opening_protocol(&mut rng);
    let proof = prove_non_interactive(&protocol, LABEL, &mut rng).unwrap();
    assert!(!verify_non_interactive(&protocol, b"another label", &proof.to_bytes()).unwrap());
}

#[test]
fn non_interactive_proof_fails_when_tampered() {
    let mut rng = test_utils::seeded_rng();
    let protocol = opening_protocol(&mut rng);
    let bytes = prove_non_interactive(&protocol, LABEL, &mut rng)
        .unwrap()
        .to_bytes();

    // Flipping any bit either breaks the encoding or the proof.
    for index in (0..bytes.len()).step_by(7) {
        let mut tampered = bytes.clone();
        tampered[index] ^= 1;
        assert!(!verify_non_interactive(&protocol, LABEL, &tampered).unwrap_or(false));
    }

    assert!(matches!(
        verify_non_interactive(&protocol, LABEL, &bytes[..bytes.len() - 1]),
        Err(Error::Deserialization(_))
    ));
    let mut extended = bytes;
    extended.push(0);
    assert_eq!(
        verify_non_interactive(&protocol, LABEL, &extended).unwrap_err(),
        Error::TrailingBytes(1)
    );
}

#[test]
fn non_interactive_set_membership_verifies() {
    let mut rng = test_utils::seeded_rng();
    let parameters = Arc::new(SetMembershipPublicParameters::generate(
        vec![2, 3, 5, 7, 11],
        &mut rng,
    ));
    let g = G1Projective::rand(&mut rng);
    let p = Variable::new("p");
    let root = Conjunction::new()
        .declare(&p)
        .unwrap()
        .with(
            "public image",
            LinearStatement::new(&Equation::new(GroupExpr::from(g) * &p, g * Scalar::from(7u64)))
                .unwrap(),
        )
        .unwrap()
        .with(
            "prime",
            SetMembershipFragment::new(&p, Arc::clone(&parameters)),
        )
        .unwrap();
    let prover = ComposedProtocol::prover(root, Witness::new().with(&p, 7u64));

    let proof = prove_non_interactive(&prover, LABEL, &mut rng).unwrap();
    let bytes = proof.to_bytes();
    let verifier = prover.to_verifier();
    assert_eq!(NonInteractiveProof::from_bytes(&verifier, &bytes).unwrap(), proof);
    assert!(verify_non_interactive(&verifier, LABEL, &bytes).unwrap());
    assert!(verifier.witness().is_none());
}
