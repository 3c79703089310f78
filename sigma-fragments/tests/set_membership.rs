mod test_utils;

use ark_bls12_381::G1Projective;
use ark_std::Zero;
use sigma_fragments::{
    algebra::Element,
    expression::{Exponent, Variable, Witness},
    fragment::{Announcement, SendFirstValue},
    proofs::{Challenge, Conjunction, SetMembershipFragment, SetMembershipPublicParameters},
    protocol::{run_interactive, ComposedProtocol, SigmaProtocol},
    Error,
};
use std::sync::Arc;

/// Proves that the secret `m` plus a public offset lies in the set of `parameters`.
fn membership_protocol(
    value: u64,
    offset: u64,
    parameters: &Arc<SetMembershipPublicParameters>,
) -> ComposedProtocol {
    let m = Variable::new("m");
    let root = Conjunction::new()
        .declare(&m)
        .unwrap()
        .with(
            "membership",
            SetMembershipFragment::new(Exponent::from(&m) + offset, Arc::clone(parameters)),
        )
        .unwrap();
    ComposedProtocol::prover(root, Witness::new().with(&m, value))
}

#[test]
fn set_membership_verifies_at_boundaries() {
    let mut rng = test_utils::seeded_rng();
    let parameters = Arc::new(SetMembershipPublicParameters::generate(0..4, &mut rng));

    for value in [0, 3] {
        let prover = membership_protocol(value, 0, &parameters);
        assert!(run_interactive(&prover, &prover.to_verifier(), &mut rng).unwrap());
    }
}

#[test]
fn set_membership_of_an_expression_verifies() {
    let mut rng = test_utils::seeded_rng();
    let parameters = Arc::new(SetMembershipPublicParameters::generate(
        vec![10, 20, 30],
        &mut rng,
    ));
    let prover = membership_protocol(17, 13, &parameters);
    assert!(run_interactive(&prover, &prover.to_verifier(), &mut rng).unwrap());
}

#[test]
#[should_panic(expected = "NotInSet")]
fn set_membership_fails_outside_set() {
    let mut rng = test_utils::seeded_rng();
    let parameters = Arc::new(SetMembershipPublicParameters::generate(0..4, &mut rng));
    let prover = membership_protocol(4, 0, &parameters);
    let _ = prover.announce(&mut rng).unwrap();
}

#[test]
fn set_membership_rejects_identity_first_message() {
    let mut rng = test_utils::seeded_rng();
    let parameters = Arc::new(SetMembershipPublicParameters::generate(0..4, &mut rng));
    let prover = membership_protocol(2, 0, &parameters);

    let (secret, announcement) = prover.announce(&mut rng).unwrap();
    let challenge = Challenge::random(&mut rng);
    let response = prover.respond(secret, &challenge);
    assert!(prover.verify(&announcement, &challenge, &response));

    // Replace the blinded signature with the identity.
    let tampered = match announcement {
        Announcement::Node {
            first_value,
            mut children,
        } => {
            if let Announcement::Node { first_value, .. } = &mut children[0] {
                *first_value = SendFirstValue::Elements(vec![Element::G1(G1Projective::zero())]);
            }
            Announcement::Node {
                first_value,
                children,
            }
        }
        leaf => leaf,
    };
    assert!(!prover.verify(&tampered, &challenge, &response));

    // The identity is not accepted on the wire either.
    let bytes = tampered.to_bytes();
    if let Ok(recreated) = prover.recreate_announcement(&bytes) {
        assert!(!prover.verify(&recreated, &challenge, &response));
    }
}

#[test]
fn set_membership_simulation_verifies() {
    let mut rng = test_utils::real_rng();
    let parameters = Arc::new(SetMembershipPublicParameters::generate(0..4, &mut rng));
    let verifier = membership_protocol(0, 0, &parameters).to_verifier();

    for _ in 0..100 {
        let challenge = Challenge::random(&mut rng);
        let (announcement, response) = verifier.simulate(&challenge, &mut rng).unwrap();
        assert!(verifier.verify(&announcement, &challenge, &response));
    }
}

#[test]
fn set_membership_fails_with_other_parameters() {
    let mut rng = test_utils::seeded_rng();
    let parameters = Arc::new(SetMembershipPublicParameters::generate(0..4, &mut rng));
    let other_parameters = Arc::new(SetMembershipPublicParameters::generate(0..4, &mut rng));

    let prover = membership_protocol(1, 0, &parameters);
    let verifier = membership_protocol(1, 0, &other_parameters).to_verifier();
    assert!(!run_interactive(&prover, &verifier, &mut rng).unwrap());
}

#[test]
fn set_membership_parameters_survive_bincode() {
    let mut rng = test_utils::seeded_rng();
    let parameters = SetMembershipPublicParameters::generate(0..3, &mut rng);
    let bytes = parameters.to_bytes().unwrap();
    let decoded = SetMembershipPublicParameters::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, parameters);
    assert_eq!(decoded.pairing_g1_g2(), parameters.pairing_g1_g2());

    // Each entry is a member, a length prefix, and a compressed G1 point. Relabel the signature
    // on 0 as a signature on 5.
    let entry_len = 8 + 8 + 48;
    let first_member = bytes.len() - 3 * entry_len;
    let mut tampered = bytes.clone();
    tampered[first_member] = 5;
    match SetMembershipPublicParameters::from_bytes(&tampered) {
        Err(Error::Deserialization(message)) => {
            assert!(message.contains(&Error::InvalidSignature(5).to_string()))
        }
        other => panic!("expected a deserialization error, got {:?}", other),
    }

    assert!(SetMembershipPublicParameters::from_bytes(&bytes[..bytes.len() - 1]).is_err());
}

#[test]
fn set_membership_messages_survive_the_wire() {
    let mut rng = test_utils::seeded_rng();
    let parameters = Arc::new(SetMembershipPublicParameters::generate(0..4, &mut rng));
    let prover = membership_protocol(3, 0, &parameters);
    let verifier = prover.to_verifier();

    let (secret, announcement) = prover.announce(&mut rng).unwrap();
    let recreated = verifier
        .recreate_announcement(&announcement.to_bytes())
        .unwrap();
    assert_eq!(recreated, announcement);

    let challenge = Challenge::random(&mut rng);
    let response = prover.respond(secret, &challenge);
    let response = verifier
        .recreate_response(&recreated, &response.to_bytes())
        .unwrap();
    assert!(verifier.verify(&recreated, &challenge, &response));
}
