//! The composition engine.
//!
//! A [`Delegate`] is an inner node of a proof tree. It optionally sends a first message, then
//! describes, from public data and that first message alone, a [`SubprotocolSpec`]: the internal
//! variables it declares and the named subprotocols that prove its statement. Every type
//! implementing [`Delegate`] is a [`Fragment`]; the engine below drives the three moves:
//!
//! - *Announce*: send the first message, build the subprotocol spec, collect witnesses for the declared
//!   variables, sample their announcement randomness, and recurse into the subprotocols.
//! - *Respond*: one response per declared variable, then recurse.
//! - *Verify*: run the additional check on the first message, rebuild the subprotocol spec from it, bring the
//!   declared variables' responses into scope, and require every subprotocol to accept.
//! - *Simulate*: simulate the first message, pick responses for the declared variables, and let
//!   every subprotocol derive its announcement.
//!
//! Because prover and verifier build the subprotocol spec from the same public data, they agree on its shape
//! without ever exchanging it. [`Conjunction`] is the simplest delegate: it sends nothing and
//! proves a fixed list of fragments over variables declared by the caller.

use crate::{
    common::*,
    expression::{Variable, Witness},
    fragment::{
        Announcement, AnnouncementSecret, Fragment, ProverContext, Response, ResponseContext,
        SendFirstValue,
    },
    proofs::{Challenge, ChallengeBuilder},
    Error,
};
use std::{fmt, sync::Arc};
use tracing::{debug, trace};

/// An inner node of a proof tree, possibly sending a first message before delegating to
/// subprotocols.
pub trait Delegate: fmt::Debug + Send + Sync {
    /// Prover state produced with the first message and used to derive the internal witnesses.
    type Secret: Default;

    /// Produce the first message. Nodes that send nothing keep the default.
    fn send_first_value(
        &self,
        _witness: &Witness,
        _rng: &mut dyn Rng,
    ) -> Result<(Self::Secret, SendFirstValue), Error> {
        Ok((Self::Secret::default(), SendFirstValue::Empty))
    }

    /// Produce a first message with the same distribution as [`Delegate::send_first_value`],
    /// without a witness.
    fn simulate_send_first_value(&self, _rng: &mut dyn Rng) -> Result<SendFirstValue, Error> {
        Ok(SendFirstValue::Empty)
    }

    /// Decode the first message from the front of `reader`.
    fn recreate_send_first_value(&self, _reader: &mut &[u8]) -> Result<SendFirstValue, Error> {
        Ok(SendFirstValue::Empty)
    }

    /// A validity check on the first message beyond the algebraic checks of the subprotocols.
    ///
    /// It runs before anything that depends on the first message. By default only an empty first
    /// message is accepted.
    fn additional_check(&self, first_value: &SendFirstValue) -> bool {
        first_value.is_empty()
    }

    /// Describe the subprotocols proving this node's statement, from public data and the first
    /// message only.
    fn provide_subprotocol_spec(
        &self,
        first_value: &SendFirstValue,
        builder: SubprotocolSpecBuilder,
    ) -> Result<SubprotocolSpec, Error>;

    /// Assign a value to every variable the subprotocol spec declares.
    ///
    /// By default the values are taken from the witness the node was given.
    fn provide_additional_witnesses(
        &self,
        _secret: Self::Secret,
        witness: &Witness,
        spec: &SubprotocolSpec,
    ) -> Result<Witness, Error> {
        spec.variables()
            .iter()
            .map(|variable| {
                witness
                    .get(variable)
                    .map(|value| (variable.clone(), value))
                    .ok_or_else(|| Error::UnassignedVariable(variable.clone()))
            })
            .collect()
    }

    /// Incorporate the public data of this node into a challenge. `scope` is as in
    /// [`Fragment::consume_statement`].
    fn consume_public(&self, _scope: &[Variable], _builder: &mut ChallengeBuilder) {}
}

impl<D: Delegate> Fragment for D {
    fn announce(
        &self,
        context: &ProverContext,
        rng: &mut dyn Rng,
    ) -> Result<(AnnouncementSecret, Announcement), Error> {
        let (secret, first_value) = self.send_first_value(context.witness(), rng)?;
        let spec = self.provide_subprotocol_spec(&first_value, SubprotocolSpecBuilder::new())?;
        let additional = self.provide_additional_witnesses(secret, context.witness(), &spec)?;

        if let Some(extra) = additional.variables().find(|v| !spec.declares(v)) {
            return Err(Error::UndeclaredVariable(extra.clone()));
        }
        let witnesses = spec
            .variables()
            .iter()
            .map(|v| {
                additional
                    .get(v)
                    .ok_or_else(|| Error::UnassignedVariable(v.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let randomness: Vec<Scalar> = spec
            .variables()
            .iter()
            .map(|_| Scalar::rand(&mut *rng))
            .collect();

        let inner = context.declare(
            spec.variables()
                .iter()
                .cloned()
                .zip(witnesses.iter().copied())
                .zip(randomness.iter().copied())
                .map(|((v, w), r)| (v, w, r)),
        )?;

        let mut child_secrets = Vec::with_capacity(spec.fragments().len());
        let mut child_announcements = Vec::with_capacity(spec.fragments().len());
        for (_, fragment) in spec.fragments() {
            let (secret, announcement) = fragment.announce(&inner, rng)?;
            child_secrets.push(secret);
            child_announcements.push(announcement);
        }

        Ok((
            AnnouncementSecret::Node {
                witnesses,
                randomness,
                children: child_secrets,
            },
            Announcement::Node {
                first_value,
                children: child_announcements,
            },
        ))
    }

    fn simulate(
        &self,
        context: &ResponseContext,
        challenge: &Challenge,
        rng: &mut dyn Rng,
    ) -> Result<(Announcement, Response), Error> {
        let first_value = self.simulate_send_first_value(rng)?;
        let spec = self.provide_subprotocol_spec(&first_value, SubprotocolSpecBuilder::new())?;
        let scalars: Vec<Scalar> = spec
            .variables()
            .iter()
            .map(|_| Scalar::rand(&mut *rng))
            .collect();
        let inner = context.declare(
            spec.variables()
                .iter()
                .cloned()
                .zip(scalars.iter().copied()),
        )?;

        let mut announcements = Vec::with_capacity(spec.fragments().len());
        let mut responses = Vec::with_capacity(spec.fragments().len());
        for (_, fragment) in spec.fragments() {
            let (announcement, response) = fragment.simulate(&inner, challenge, rng)?;
            announcements.push(announcement);
            responses.push(response);
        }

        Ok((
            Announcement::Node {
                first_value,
                children: announcements,
            },
            Response::Node {
                scalars,
                children: responses,
            },
        ))
    }

    fn verify(
        &self,
        context: &ResponseContext,
        announcement: &Announcement,
        challenge: &Challenge,
        response: &Response,
    ) -> bool {
        let (first_value, announcements, scalars, responses) = match (announcement, response) {
            (
                Announcement::Node {
                    first_value,
                    children: announcements,
                },
                Response::Node {
                    scalars,
                    children: responses,
                },
            ) => (first_value, announcements, scalars, responses),
            _ => {
                debug!(node = ?self, "message does not have the shape of a node");
                return false;
            }
        };

        // Nothing built from the first message is trusted before it passes this check.
        if !self.additional_check(first_value) {
            debug!(node = ?self, "first message fails the additional check");
            return false;
        }

        let spec = match self.provide_subprotocol_spec(first_value, SubprotocolSpecBuilder::new())
        {
            Ok(spec) => spec,
            Err(error) => {
                debug!(%error, "could not rebuild subprotocols from the first message");
                return false;
            }
        };
        if scalars.len() != spec.variables().len()
            || announcements.len() != spec.fragments().len()
            || responses.len() != spec.fragments().len()
        {
            debug!(node = ?self, "message does not match the subprotocol spec");
            return false;
        }

        let inner = match context.declare(
            spec.variables()
                .iter()
                .cloned()
                .zip(scalars.iter().copied()),
        ) {
            Ok(inner) => inner,
            Err(error) => {
                debug!(%error, "subprotocol spec shadows a variable in scope");
                return false;
            }
        };

        spec.fragments()
            .iter()
            .zip(announcements.iter().zip(responses.iter()))
            .all(|((name, fragment), (announcement, response))| {
                let accepted = fragment.verify(&inner, announcement, challenge, response);
                if !accepted {
                    debug!(subprotocol = %name, "subprotocol rejected");
                }
                accepted
            })
    }

    fn recreate_announcement(&self, reader: &mut &[u8]) -> Result<Announcement, Error> {
        let first_value = self.recreate_send_first_value(reader)?;
        let spec = self.provide_subprotocol_spec(&first_value, SubprotocolSpecBuilder::new())?;
        let children = spec
            .fragments()
            .iter()
            .map(|(_, fragment)| fragment.recreate_announcement(reader))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Announcement::Node {
            first_value,
            children,
        })
    }

    fn recreate_response(
        &self,
        announcement: &Announcement,
        reader: &mut &[u8],
    ) -> Result<Response, Error> {
        let (first_value, announcements) = match announcement {
            Announcement::Node {
                first_value,
                children,
            } => (first_value, children),
            Announcement::Leaf(_) => return Err(Error::ShapeMismatch),
        };
        let spec = self.provide_subprotocol_spec(first_value, SubprotocolSpecBuilder::new())?;
        if announcements.len() != spec.fragments().len() {
            return Err(Error::ShapeMismatch);
        }
        let scalars = Response::read_scalars(spec.variables().len(), reader)?;
        let children = spec
            .fragments()
            .iter()
            .zip(announcements)
            .map(|((_, fragment), announcement)| fragment.recreate_response(announcement, reader))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Response::Node { scalars, children })
    }

    fn consume_statement(&self, scope: &[Variable], builder: &mut ChallengeBuilder) {
        self.consume_public(scope, builder);
    }
}

/// Accumulates the internal variables and named subprotocols of a [`SubprotocolSpec`].
///
/// The builder is handed to [`Delegate::provide_subprotocol_spec`] by value and consumed by
/// [`SubprotocolSpecBuilder::build`].
#[derive(Debug, Default)]
pub struct SubprotocolSpecBuilder {
    variables: Vec<Variable>,
    fragments: Vec<(String, Arc<dyn Fragment>)>,
}

impl SubprotocolSpecBuilder {
    /// Start an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a fresh internal variable.
    pub fn new_variable(&mut self, name: impl AsRef<str>) -> Variable {
        let variable = Variable::new(name);
        self.variables.push(variable.clone());
        variable
    }

    /// Declare an existing variable, which must not already be declared by this spec.
    pub fn declare(&mut self, variable: Variable) -> Result<(), Error> {
        if self.variables.contains(&variable) {
            return Err(Error::RedeclaredVariable(variable));
        }
        self.variables.push(variable);
        Ok(())
    }

    /// Add a named subprotocol.
    pub fn add_subprotocol(
        &mut self,
        name: impl Into<String>,
        fragment: impl Fragment + 'static,
    ) -> Result<(), Error> {
        self.add_shared_subprotocol(name, Arc::new(fragment))
    }

    /// Add a named subprotocol that may also be used elsewhere.
    pub fn add_shared_subprotocol(
        &mut self,
        name: impl Into<String>,
        fragment: Arc<dyn Fragment>,
    ) -> Result<(), Error> {
        let name = name.into();
        if self.fragments.iter().any(|(existing, _)| *existing == name) {
            return Err(Error::DuplicateSubprotocol(name));
        }
        trace!(subprotocol = %name, "adding subprotocol");
        self.fragments.push((name, fragment));
        Ok(())
    }

    /// Finish the subprotocol spec.
    pub fn build(self) -> SubprotocolSpec {
        SubprotocolSpec {
            variables: self.variables,
            fragments: self.fragments,
        }
    }
}

/// The internal variables a node declares and the named subprotocols proving its statement.
#[derive(Debug, Clone)]
pub struct SubprotocolSpec {
    variables: Vec<Variable>,
    fragments: Vec<(String, Arc<dyn Fragment>)>,
}

impl SubprotocolSpec {
    /// The declared variables, in declaration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Whether the subprotocol spec declares a variable.
    pub fn declares(&self, variable: &Variable) -> bool {
        self.variables.contains(variable)
    }

    /// The declared variable with the given name, if there is exactly one.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        let mut matching = self.variables.iter().filter(|v| v.name() == name);
        match (matching.next(), matching.next()) {
            (Some(variable), None) => Some(variable),
            _ => None,
        }
    }

    /// The subprotocols with their names, in order.
    pub fn fragments(&self) -> &[(String, Arc<dyn Fragment>)] {
        &self.fragments
    }

    /// The subprotocol with the given name.
    pub fn fragment(&self, name: &str) -> Option<&Arc<dyn Fragment>> {
        self.fragments
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, fragment)| fragment)
    }
}

/// The conjunction of several fragments over variables declared by the caller.
///
/// The witness of every declared variable is taken from the witness given to the protocol.
/// Fragments sharing a variable are proven to use the same value for it.
#[derive(Debug, Clone, Default)]
pub struct Conjunction {
    variables: Vec<Variable>,
    fragments: Vec<(String, Arc<dyn Fragment>)>,
}

impl Conjunction {
    /// An empty conjunction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable shared by the conjuncts.
    pub fn declare(mut self, variable: &Variable) -> Result<Self, Error> {
        if self.variables.contains(variable) {
            return Err(Error::RedeclaredVariable(variable.clone()));
        }
        self.variables.push(variable.clone());
        Ok(self)
    }

    /// Add a named conjunct.
    pub fn with(
        mut self,
        name: impl Into<String>,
        fragment: impl Fragment + 'static,
    ) -> Result<Self, Error> {
        let name = name.into();
        if self.fragments.iter().any(|(existing, _)| *existing == name) {
            return Err(Error::DuplicateSubprotocol(name));
        }
        self.fragments.push((name, Arc::new(fragment)));
        Ok(self)
    }
}

impl Delegate for Conjunction {
    type Secret = ();

    fn provide_subprotocol_spec(
        &self,
        _first_value: &SendFirstValue,
        mut builder: SubprotocolSpecBuilder,
    ) -> Result<SubprotocolSpec, Error> {
        for variable in &self.variables {
            builder.declare(variable.clone())?;
        }
        for (name, fragment) in &self.fragments {
            builder.add_shared_subprotocol(name.clone(), Arc::clone(fragment))?;
        }
        Ok(builder.build())
    }

    fn consume_public(&self, scope: &[Variable], builder: &mut ChallengeBuilder) {
        builder.consume(&(self.variables.len() as u64));
        let inner: Vec<Variable> = scope.iter().chain(&self.variables).cloned().collect();
        for (name, fragment) in &self.fragments {
            builder.consume_bytes(name.as_bytes());
            fragment.consume_statement(&inner, builder);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        expression::{Equation, GroupExpr},
        proofs::LinearStatement,
    };

    /// Proves knowledge of `x` with `g * x = y` and `h * x = z`, as two conjuncts.
    fn dleq(rng: &mut impl Rng) -> (Conjunction, Witness) {
        let x = Variable::new("x");
        let secret = Scalar::rand(&mut *rng);
        let g: G1Projective = random_non_identity(&mut *rng);
        let h: G1Projective = random_non_identity(&mut *rng);
        let conjunction = Conjunction::new()
            .declare(&x)
            .unwrap()
            .with(
                "g",
                LinearStatement::new(&Equation::new(GroupExpr::from(g) * &x, g * secret))
                    .unwrap(),
            )
            .unwrap()
            .with(
                "h",
                LinearStatement::new(&Equation::new(GroupExpr::from(h) * &x, h * secret))
                    .unwrap(),
            )
            .unwrap();
        (conjunction, Witness::new().with(&x, secret))
    }

    fn run(fragment: &dyn Fragment, witness: Witness, rng: &mut impl Rng) -> bool {
        let (secret, announcement) = fragment
            .announce(&ProverContext::new(witness), &mut *rng)
            .unwrap();
        let challenge = Challenge::random(&mut *rng);
        let response = fragment.respond(secret, &challenge);
        fragment.verify(&ResponseContext::new(), &announcement, &challenge, &response)
    }

    #[test]
    fn conjunction_is_complete() {
        let mut rng = crate::test::rng();
        let (conjunction, witness) = dleq(&mut rng);
        assert!(run(&conjunction, witness, &mut rng));
    }

    #[test]
    fn conjunction_requires_every_conjunct() {
        let mut rng = crate::test::rng();
        let x = Variable::new("x");
        let g: G1Projective = random_non_identity(&mut rng);
        let conjunction = Conjunction::new()
            .declare(&x)
            .unwrap()
            .with(
                "true",
                LinearStatement::new(&Equation::new(GroupExpr::from(g) * &x, g)).unwrap(),
            )
            .unwrap()
            .with(
                "false",
                LinearStatement::new(&Equation::new(GroupExpr::from(g) * &x, g + g)).unwrap(),
            )
            .unwrap();
        assert!(!run(&conjunction, Witness::new().with(&x, 1u64), &mut rng));
    }

    #[test]
    fn missing_witness_is_an_error() {
        let mut rng = crate::test::rng();
        let (conjunction, _) = dleq(&mut rng);
        assert!(matches!(
            conjunction.announce(&ProverContext::new(Witness::new()), &mut rng),
            Err(Error::UnassignedVariable(_))
        ));
    }

    #[test]
    fn names_and_variables_are_unique() {
        let x = Variable::new("x");
        let statement = LinearStatement::new(&Equation::new(
            GroupExpr::from(G1Projective::generator()) * &x,
            G1Projective::generator(),
        ))
        .unwrap();
        assert_eq!(
            Conjunction::new()
                .with("a", statement.clone())
                .unwrap()
                .with("a", statement)
                .unwrap_err(),
            Error::DuplicateSubprotocol("a".to_string())
        );
        assert_eq!(
            Conjunction::new()
                .declare(&x)
                .unwrap()
                .declare(&x)
                .unwrap_err(),
            Error::RedeclaredVariable(x)
        );

        let mut builder = SubprotocolSpecBuilder::new();
        let first = builder.new_variable("digit");
        let second = builder.new_variable("digit");
        assert_ne!(first, second);
        let spec = builder.build();
        assert_eq!(spec.variables(), &[first, second]);
        assert!(spec.variable("digit").is_none());
    }

    #[test]
    fn nested_redeclaration_is_rejected() {
        let mut rng = crate::test::rng();
        let (inner, witness) = dleq(&mut rng);
        let shared = inner.variables[0].clone();
        let outer = Conjunction::new()
            .declare(&shared)
            .unwrap()
            .with("inner", inner)
            .unwrap();
        assert_eq!(
            outer
                .announce(&ProverContext::new(witness), &mut rng)
                .unwrap_err(),
            Error::RedeclaredVariable(shared)
        );
    }

    #[test]
    fn simulation_verifies() {
        let mut rng = crate::test::rng();
        let (conjunction, _) = dleq(&mut rng);
        for _ in 0..20 {
            let challenge = Challenge::random(&mut rng);
            let (announcement, response) = conjunction
                .simulate(&ResponseContext::new(), &challenge, &mut rng)
                .unwrap();
            assert!(conjunction.verify(
                &ResponseContext::new(),
                &announcement,
                &challenge,
                &response
            ));
        }
    }

    #[test]
    fn messages_survive_the_wire() {
        let mut rng = crate::test::rng();
        let (conjunction, witness) = dleq(&mut rng);
        let (secret, announcement) = conjunction
            .announce(&ProverContext::new(witness), &mut rng)
            .unwrap();
        let response = conjunction.respond(secret, &Challenge::random(&mut rng));

        let announcement_bytes = announcement.to_bytes();
        let mut reader = announcement_bytes.as_slice();
        let recreated = conjunction.recreate_announcement(&mut reader).unwrap();
        assert!(reader.is_empty());
        assert_eq!(recreated, announcement);

        let response_bytes = response.to_bytes();
        let mut reader = response_bytes.as_slice();
        assert_eq!(
            conjunction
                .recreate_response(&recreated, &mut reader)
                .unwrap(),
            response
        );
        assert!(reader.is_empty());
    }

    #[test]
    fn malformed_shapes_are_rejected() {
        let mut rng = crate::test::rng();
        let (conjunction, witness) = dleq(&mut rng);
        let (secret, announcement) = conjunction
            .announce(&ProverContext::new(witness), &mut rng)
            .unwrap();
        let challenge = Challenge::random(&mut rng);
        let response = conjunction.respond(secret, &challenge);

        let truncated = match &response {
            Response::Node { scalars, children } => Response::Node {
                scalars: scalars.clone(),
                children: children[..1].to_vec(),
            },
            Response::Empty => unreachable!("conjunctions respond with a node"),
        };
        let context = ResponseContext::new();
        assert!(!conjunction.verify(&context, &announcement, &challenge, &truncated));
        assert!(!conjunction.verify(&context, &announcement, &challenge, &Response::Empty));

        let with_first_value = match &announcement {
            Announcement::Node { children, .. } => Announcement::Node {
                first_value: SendFirstValue::Elements(vec![]),
                children: children.clone(),
            },
            Announcement::Leaf(_) => unreachable!("conjunctions announce a node"),
        };
        assert!(!conjunction.verify(&context, &with_first_value, &challenge, &response));
    }
}
