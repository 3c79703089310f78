//! Generalized Schnorr proofs of knowledge for a conjunction of group-element equations.
//!
//! A [`GeneralizedSchnorrProtocol`] is built from a list of [`Equation`]s over shared secret
//! variables, for example an equality of discrete logarithms
//!
//! ```text
//! g * x = y  and  h * x = z
//! ```
//!
//! Every equation must assert the equality of two elements of G1, G2 or Gt, and must be linear in
//! the variables. All variables are declared by the protocol itself, so an equation sharing a
//! variable with another is proven to use the same value.
//!
//! An instance constructed without a witness is verifier-only: it can verify, simulate, and
//! recreate messages and challenges, but cannot announce.

use crate::{
    algebra::GroupKind,
    common::*,
    expression::{Equation, Variable, Witness},
    fragment::{Fragment, SendFirstValue},
    proofs::{
        ChallengeBuilder, Delegate, LinearStatement, SubprotocolSpec, SubprotocolSpecBuilder,
    },
    protocol::SigmaProtocol,
    Error,
};
use ark_ff::BigInteger;

/// Public parameters of a generalized Schnorr proof: the size of the challenge space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchnorrPublicParameters {
    order: <Scalar as PrimeField>::BigInt,
}

impl Default for SchnorrPublicParameters {
    fn default() -> Self {
        Self {
            order: Scalar::MODULUS,
        }
    }
}

impl SchnorrPublicParameters {
    /// The order of the scalar field, which challenges are drawn from.
    pub fn order(&self) -> &<Scalar as PrimeField>::BigInt {
        &self.order
    }

    /// The order in little-endian bytes.
    pub fn order_bytes(&self) -> Vec<u8> {
        self.order.to_bytes_le()
    }
}

/// The statement of a generalized Schnorr proof: well-formed equations over declared variables.
#[derive(Debug, Clone, PartialEq)]
pub struct SchnorrStatement {
    problems: Vec<LinearStatement>,
    variables: Vec<Variable>,
}

impl SchnorrStatement {
    /// Check and normalise the equations.
    pub fn new(problems: &[Equation]) -> Result<Self, Error> {
        let problems = problems
            .iter()
            .map(|equation| {
                let statement = LinearStatement::new(equation)?;
                if statement.kind() == GroupKind::Scalar {
                    return Err(Error::MalformedEquation(
                        "expected an equality of group elements, found an equality in Zp"
                            .to_string(),
                    ));
                }
                Ok(statement)
            })
            .collect::<Result<Vec<_>, _>>()?;
        if problems.is_empty() {
            return Err(Error::MalformedEquation(
                "at least one equation is required".to_string(),
            ));
        }

        let mut variables: Vec<Variable> = Vec::new();
        for variable in problems.iter().flat_map(LinearStatement::variables) {
            if !variables.contains(variable) {
                variables.push(variable.clone());
            }
        }
        Ok(Self {
            problems,
            variables,
        })
    }

    /// The normalised equations.
    pub fn problems(&self) -> &[LinearStatement] {
        &self.problems
    }

    /// The variables, in order of first appearance.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
}

impl Delegate for SchnorrStatement {
    type Secret = ();

    fn provide_subprotocol_spec(
        &self,
        _first_value: &SendFirstValue,
        mut builder: SubprotocolSpecBuilder,
    ) -> Result<SubprotocolSpec, Error> {
        for variable in &self.variables {
            builder.declare(variable.clone())?;
        }
        for (i, problem) in self.problems.iter().enumerate() {
            builder.add_subprotocol(format!("equation_{}", i), problem.clone())?;
        }
        Ok(builder.build())
    }

    fn consume_public(&self, scope: &[Variable], builder: &mut ChallengeBuilder) {
        builder.consume(&(self.variables.len() as u64));
        let inner: Vec<Variable> = scope.iter().chain(&self.variables).cloned().collect();
        for problem in &self.problems {
            problem.consume_statement(&inner, builder);
        }
    }
}

/// A proof of knowledge of a witness satisfying a conjunction of group-element equations.
#[derive(Debug, Clone)]
pub struct GeneralizedSchnorrProtocol {
    statement: SchnorrStatement,
    witness: Option<Witness>,
    parameters: SchnorrPublicParameters,
}

impl GeneralizedSchnorrProtocol {
    /// Build a protocol instance.
    ///
    /// Fails if any equation is not an equality of group elements, is not linear, or does not
    /// constrain a variable. A witness, if given, must assign exactly the variables of the
    /// equations and satisfy all of them.
    pub fn new(problems: Vec<Equation>, witness: Option<Witness>) -> Result<Self, Error> {
        let statement = SchnorrStatement::new(&problems)?;
        if let Some(witness) = &witness {
            if let Some(extra) = witness
                .variables()
                .find(|v| !statement.variables.contains(v))
            {
                return Err(Error::UndeclaredVariable(extra.clone()));
            }
            for (i, problem) in statement.problems.iter().enumerate() {
                if !problem.is_satisfied_by(witness)? {
                    return Err(Error::UnsatisfiedEquation(i));
                }
            }
        }
        Ok(Self {
            statement,
            witness,
            parameters: SchnorrPublicParameters::default(),
        })
    }

    /// Build a verifier-only instance.
    pub fn verifier(problems: Vec<Equation>) -> Result<Self, Error> {
        Self::new(problems, None)
    }

    /// The statement being proven.
    pub fn statement(&self) -> &SchnorrStatement {
        &self.statement
    }

    /// The public parameters of the instance.
    pub fn parameters(&self) -> &SchnorrPublicParameters {
        &self.parameters
    }

    /// Whether the instance can act as a prover.
    pub fn has_witness(&self) -> bool {
        self.witness.is_some()
    }
}

/// Instances are equal when they prove the same statement with the same parameters; witnesses
/// are ignored.
impl PartialEq for GeneralizedSchnorrProtocol {
    fn eq(&self, other: &Self) -> bool {
        self.statement == other.statement && self.parameters == other.parameters
    }
}

impl SigmaProtocol for GeneralizedSchnorrProtocol {
    fn fragment(&self) -> &dyn Fragment {
        &self.statement
    }

    fn witness(&self) -> Option<&Witness> {
        self.witness.as_ref()
    }
}
