//! Leaf statements: knowledge of a discrete-log representation.
//!
//! A [`LinearStatement`] asserts `sum( B_i * x_i ) = Y` for public bases `B_i` and image `Y` in
//! one of Zp, G1, G2 or Gt, over secret variables `x_i`. It is a standard Schnorr proof:
//!
//! 1. The prover announces `A = sum( B_i * r_i )`, where `r_i` is the announcement randomness of
//!    `x_i`.
//! 2. The verifier sends a challenge `c`.
//! 3. For each `x_i`, the node declaring it responds `s_i = r_i + c * x_i`.
//! 4. The verifier checks `sum( B_i * s_i ) = A + c * Y`.
//!
//! The statement never samples randomness or responds on its own: variables are owned by an
//! enclosing [`Delegate`](crate::proofs::Delegate), so two statements sharing a variable are
//! answered with one response and are thereby proven to use the same secret.

use crate::{
    algebra::{Element, GroupKind},
    common::*,
    expression::{Equation, Variable, Witness},
    fragment::{
        consume_position, Announcement, AnnouncementSecret, Fragment, ProverContext, Response,
        ResponseContext,
    },
    proofs::{Challenge, ChallengeBuilder},
    Error,
};
use tracing::debug;

/// Proof of knowledge of a representation `sum( B_i * x_i ) = Y`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearStatement {
    kind: GroupKind,
    terms: Vec<(Variable, Element)>,
    image: Element,
}

impl LinearStatement {
    /// Build a statement from an equation.
    ///
    /// The equation is brought into linear form; bases that are the identity are dropped. An
    /// equation with no remaining variable is degenerate and rejected.
    pub fn new(equation: &Equation) -> Result<Self, Error> {
        let form = equation.linearize()?;
        let terms: Vec<_> = form
            .terms()
            .iter()
            .filter(|(_, base)| !base.is_identity())
            .cloned()
            .collect();
        if terms.is_empty() {
            return Err(Error::DegenerateEquation(format!(
                "no variable has a non-trivial base in {}",
                form.kind()
            )));
        }
        Ok(Self {
            kind: form.kind(),
            terms,
            image: form.constant_term().neg(),
        })
    }

    /// The group the statement lives in.
    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// The variables with their bases, in order of first appearance.
    pub fn terms(&self) -> &[(Variable, Element)] {
        &self.terms
    }

    /// The public image `Y`.
    pub fn image(&self) -> &Element {
        &self.image
    }

    /// The variables the statement uses.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.terms.iter().map(|(variable, _)| variable)
    }

    /// Whether a witness satisfies the statement.
    pub fn is_satisfied_by(&self, witness: &Witness) -> Result<bool, Error> {
        let values = self
            .variables()
            .map(|variable| {
                witness
                    .get(variable)
                    .ok_or_else(|| Error::UnassignedVariable(variable.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.combine(&values)? == self.image)
    }

    /// Compute `sum( B_i * s_i )`.
    fn combine(&self, scalars: &[Scalar]) -> Result<Element, Error> {
        Element::linear_combination(
            self.kind,
            self.terms.iter().map(|(_, base)| base).zip(scalars.iter()),
        )
    }

    fn responses(&self, context: &ResponseContext) -> Result<Vec<Scalar>, Error> {
        self.variables()
            .map(|variable| {
                context
                    .response(variable)
                    .ok_or_else(|| Error::UnassignedVariable(variable.clone()))
            })
            .collect()
    }
}

impl Fragment for LinearStatement {
    fn announce(
        &self,
        context: &ProverContext,
        _rng: &mut dyn Rng,
    ) -> Result<(AnnouncementSecret, Announcement), Error> {
        let randomness = self
            .variables()
            .map(|variable| {
                context
                    .randomness(variable)
                    .ok_or_else(|| Error::UndeclaredVariable(variable.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let commitment = self.combine(&randomness)?;
        Ok((AnnouncementSecret::Leaf, Announcement::Leaf(commitment)))
    }

    fn simulate(
        &self,
        context: &ResponseContext,
        challenge: &Challenge,
        _rng: &mut dyn Rng,
    ) -> Result<(Announcement, Response), Error> {
        // A = sum( B_i * s_i ) - c * Y
        let responses = self.responses(context)?;
        let commitment = self
            .combine(&responses)?
            .add(&self.image.scale(&challenge.to_scalar()).neg())?;
        Ok((Announcement::Leaf(commitment), Response::Empty))
    }

    fn verify(
        &self,
        context: &ResponseContext,
        announcement: &Announcement,
        challenge: &Challenge,
        response: &Response,
    ) -> bool {
        let commitment = match (announcement, response) {
            (Announcement::Leaf(commitment), Response::Empty) if commitment.kind() == self.kind => {
                commitment
            }
            _ => {
                debug!("leaf statement received a message of the wrong shape");
                return false;
            }
        };
        let lhs = match self.responses(context).and_then(|s| self.combine(&s)) {
            Ok(lhs) => lhs,
            Err(error) => {
                debug!(%error, "could not evaluate leaf statement");
                return false;
            }
        };
        let rhs = commitment.add(&self.image.scale(&challenge.to_scalar()));
        if rhs.as_ref() != Ok(&lhs) {
            debug!(kind = %self.kind, "leaf statement does not verify");
            return false;
        }
        true
    }

    fn recreate_announcement(&self, reader: &mut &[u8]) -> Result<Announcement, Error> {
        Ok(Announcement::Leaf(Element::read(self.kind, reader)?))
    }

    fn recreate_response(
        &self,
        announcement: &Announcement,
        _reader: &mut &[u8],
    ) -> Result<Response, Error> {
        match announcement {
            Announcement::Leaf(_) => Ok(Response::Empty),
            _ => Err(Error::ShapeMismatch),
        }
    }

    fn consume_statement(&self, scope: &[Variable], builder: &mut ChallengeBuilder) {
        builder.consume(&self.kind);
        builder.consume(&(self.terms.len() as u64));
        for (variable, base) in &self.terms {
            consume_position(scope, variable, builder);
            builder.consume(base);
        }
        builder.consume(&self.image);
    }
}
