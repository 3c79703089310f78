use {
    ark_bls12_381::{Fr as Scalar, G1Projective},
    ark_std::UniformRand,
    std::sync::Arc,
    thiserror::Error,
};

use rand::thread_rng;
use sigma_fragments::{
    expression::{Equation, GroupExpr, Variable, Witness},
    fiat_shamir::{prove_non_interactive, verify_non_interactive},
    proofs::{
        Conjunction, DigitDecompositionFragment, LinearStatement, SetMembershipPublicParameters,
        DEFAULT_BASE,
    },
    protocol::ComposedProtocol,
    Rng,
};

const LABEL: &[u8] = b"sigma-fragments range proof example";

/// A range proof implicitly limits the domain of its input to [0, 2^63).
fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Generate parameters
    let mut rng = thread_rng();
    let generators = (G1Projective::rand(&mut rng), G1Projective::rand(&mut rng));
    let parameters = Arc::new(SetMembershipPublicParameters::generate(
        0..DEFAULT_BASE,
        &mut rng,
    ));

    // Make a proof that your random number is in the range
    let (blinding_factor, proof) = match RangeProof::new(&mut rng, generators, &parameters, 12345)
    {
        Ok(proof) => proof,
        Err(e) => unreachable!("Impossible error while generating proof: {}", e),
    };

    // Anyone can verify the proof without knowing your number
    match proof.verify(generators, &parameters) {
        Ok(()) => println!("Yay! Proof verified!"),
        Err(e) => eprintln!("Invalid zk proof! {}", e),
    };

    // You can't make a proof on a number that isn't in the range...
    match RangeProof::new(&mut rng, generators, &parameters, -100) {
        Ok(_proof) => unreachable!("Impossible error generating range proof on an invalid value!"),
        Err(e) => println!("Got expected error: {}", e),
    };

    // Later, you can reveal the number by sharing it and the blinding factor for the commitment
    assert!(proof.open_commitment(generators, blinding_factor, 12345));

    // You can't pretend to have committed to a different number
    assert!(!proof.open_commitment(generators, blinding_factor, 888));
}

#[derive(Debug, Error)]
pub enum RangeError {
    #[error(transparent)]
    Proof(#[from] sigma_fragments::Error),
    #[error("Range proof is not valid")]
    Rejected,
}

// Zero-knowledge proof of knowledge of the opening of a commitment to a number within the range
// [0, 2^63).
pub struct RangeProof {
    commitment: G1Projective,
    proof: Vec<u8>,
}

impl RangeProof {
    /// Try to create a new `RangeProof`.
    /// This fails if the provided `number` is out of range.
    ///
    /// Returns the blinding factor of the commitment and the proof itself.
    /// **Important**: the blinding factor should only be shared with the verifier when the prover
    /// is ready to open the commitment!
    pub fn new(
        rng: &mut impl Rng,
        generators: (G1Projective, G1Projective),
        parameters: &Arc<SetMembershipPublicParameters>,
        number: i64,
    ) -> Result<(Scalar, Self), RangeError> {
        // Negative numbers wrap around to huge field elements, which the decomposition rejects.
        let value = if number < 0 {
            -Scalar::from(number.unsigned_abs())
        } else {
            Scalar::from(number as u64)
        };
        let blinding_factor = Scalar::rand(&mut *rng);
        let commitment = generators.0 * value + generators.1 * blinding_factor;

        let (protocol, [number, blinding]) = Self::statement(generators, commitment, parameters)?;
        let witness = Witness::new()
            .with(&number, value)
            .with(&blinding, blinding_factor);
        let prover = ComposedProtocol::prover(protocol, witness);
        let proof = prove_non_interactive(&prover, LABEL, rng)?;

        Ok((
            blinding_factor,
            Self {
                commitment,
                proof: proof.to_bytes(),
            },
        ))
    }

    pub fn verify(
        &self,
        generators: (G1Projective, G1Projective),
        parameters: &Arc<SetMembershipPublicParameters>,
    ) -> Result<(), RangeError> {
        let (protocol, _) = Self::statement(generators, self.commitment, parameters)?;
        let verifier = ComposedProtocol::verifier(protocol);
        if verify_non_interactive(&verifier, LABEL, &self.proof)? {
            Ok(())
        } else {
            Err(RangeError::Rejected)
        }
    }

    pub fn open_commitment(
        &self,
        generators: (G1Projective, G1Projective),
        blinding_factor: Scalar,
        number: i64,
    ) -> bool {
        generators.0 * Scalar::from(number as u64) + generators.1 * blinding_factor
            == self.commitment
    }

    // The commitment opening and the range proof share the committed number.
    fn statement(
        (g, h): (G1Projective, G1Projective),
        commitment: G1Projective,
        parameters: &Arc<SetMembershipPublicParameters>,
    ) -> Result<(Conjunction, [Variable; 2]), sigma_fragments::Error> {
        let number = Variable::new("number");
        let blinding = Variable::new("blinding");
        let opening = LinearStatement::new(&Equation::new(
            GroupExpr::from(g) * &number + GroupExpr::from(h) * &blinding,
            commitment,
        ))?;
        let range =
            DigitDecompositionFragment::with_default_range(&number, Arc::clone(parameters))?;
        let conjunction = Conjunction::new()
            .declare(&number)?
            .declare(&blinding)?
            .with("commitment", opening)?
            .with("range", range)?;
        Ok((conjunction, [number, blinding]))
    }
}
