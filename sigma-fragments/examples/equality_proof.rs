use ark_bls12_381::{Fr as Scalar, G1Projective, G2Projective};
use ark_std::UniformRand;
use rand::thread_rng;
use sigma_fragments::{
    algebra::Element,
    expression::{Equation, GroupExpr, Variable, Witness},
    proofs::GeneralizedSchnorrProtocol,
    protocol::run_interactive,
};

/// Zero knowledge proof that the same secret `x` is the discrete logarithm of a point in G1 and of
/// a point in G2, and that `e(y, g2) = e(g1, g2) * x` in the target group.
fn equations(
    x: &Variable,
    (g1, g2): (G1Projective, G2Projective),
    (y1, y2): (G1Projective, G2Projective),
) -> Vec<Equation> {
    let base = Element::G1(g1)
        .pair(&Element::G2(g2))
        .expect("G1 pairs with G2");
    vec![
        Equation::new(GroupExpr::from(g1) * x, y1),
        Equation::new(GroupExpr::from(g2) * x, y2),
        Equation::new(GroupExpr::from(base) * x, GroupExpr::pairing(y1, g2)),
    ]
}

fn main() {
    tracing_subscriber::fmt::init();
    let mut rng = thread_rng();

    let generators = (G1Projective::rand(&mut rng), G2Projective::rand(&mut rng));
    let secret = Scalar::rand(&mut rng);
    let images = (generators.0 * secret, generators.1 * secret);

    // The prover knows the secret...
    let x = Variable::new("x");
    let prover = GeneralizedSchnorrProtocol::new(
        equations(&x, generators, images),
        Some(Witness::new().with(&x, secret)),
    )
    .expect("the witness satisfies the equations");

    // ...while the verifier only knows the public values.
    let verifier = GeneralizedSchnorrProtocol::verifier(equations(&x, generators, images))
        .expect("the equations are well formed");
    assert_eq!(prover, verifier);

    match run_interactive(&prover, &verifier, &mut rng) {
        Ok(true) => println!("Yay! Proof verified!"),
        Ok(false) => eprintln!("Invalid zk proof!"),
        Err(e) => eprintln!("Could not run the proof: {}", e),
    }

    // A mismatched image does not even make a valid prover.
    let wrong_images = (images.0, generators.1 * (secret + Scalar::from(1u64)));
    match GeneralizedSchnorrProtocol::new(
        equations(&x, generators, wrong_images),
        Some(Witness::new().with(&x, secret)),
    ) {
        Ok(_) => unreachable!("the witness does not satisfy the second equation"),
        Err(e) => println!("Got expected error: {}", e),
    }
}
