//! The contract every composable piece of a Sigma-protocol implements, and the messages that flow
//! between prover and verifier.
//!
//! A proof is a tree of [`Fragment`]s. Leaves are
//! [`LinearStatement`](crate::proofs::LinearStatement)s; every inner node is a
//! [`Delegate`](crate::proofs::Delegate), which may send a first message of its own and then
//! hands the work to named subprotocols. Messages mirror the shape of the tree:
//!
//! - An [`Announcement`] holds one group element per leaf, and each node's first message.
//! - A single [`Challenge`] is shared by every fragment of the tree.
//! - A [`Response`] holds, for each node, one scalar per variable the node declares.
//!
//! Each variable is declared by exactly one node. The declaring node samples the announcement
//! randomness for it and produces its response; every fragment below that node reads both from
//! its context.

use crate::{
    algebra::{read_scalar, write_scalar, Element},
    common::*,
    expression::{Variable, Witness},
    proofs::{Challenge, ChallengeBuilder},
    Error,
};
use std::{collections::HashMap, fmt};

/// A composable unit of a Sigma-protocol.
///
/// Fragments are built once from public data and can be used for any number of protocol runs.
/// All per-run state is carried by the [`AnnouncementSecret`], [`Announcement`] and [`Response`]
/// values.
pub trait Fragment: fmt::Debug + Send + Sync {
    /// Produce the prover's announcement, along with the secret needed to respond to a challenge.
    ///
    /// The context must hold a witness value for every variable the fragment declares, and
    /// announcement randomness for every variable declared above it that it uses.
    fn announce(
        &self,
        context: &ProverContext,
        rng: &mut dyn Rng,
    ) -> Result<(AnnouncementSecret, Announcement), Error>;

    /// Answer a challenge. The secret is consumed, so announcement randomness is never reused.
    fn respond(&self, secret: AnnouncementSecret, challenge: &Challenge) -> Response {
        secret.respond(challenge)
    }

    /// Produce an accepting announcement and response for a fixed challenge without a witness.
    ///
    /// The context holds the (simulated) responses of every variable declared above this fragment.
    fn simulate(
        &self,
        context: &ResponseContext,
        challenge: &Challenge,
        rng: &mut dyn Rng,
    ) -> Result<(Announcement, Response), Error>;

    /// Check a transcript. Malformed messages are rejected, never reported as errors.
    fn verify(
        &self,
        context: &ResponseContext,
        announcement: &Announcement,
        challenge: &Challenge,
        response: &Response,
    ) -> bool;

    /// Decode an announcement for this fragment from the front of `reader`.
    fn recreate_announcement(&self, reader: &mut &[u8]) -> Result<Announcement, Error>;

    /// Decode a response to the given announcement from the front of `reader`.
    fn recreate_response(
        &self,
        announcement: &Announcement,
        reader: &mut &[u8],
    ) -> Result<Response, Error>;

    /// Incorporate the public statement proven by this fragment into a challenge.
    ///
    /// `scope` lists the variables declared by the enclosing nodes, outermost first. A variable
    /// the fragment uses is identified by its position in `scope`, so the digest reflects which
    /// shared variable each term is wired to.
    fn consume_statement(&self, scope: &[Variable], builder: &mut ChallengeBuilder);
}

/// A message a node sends before delegating to its subprotocols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendFirstValue {
    /// Nothing is sent.
    Empty,
    /// A list of group elements.
    Elements(Vec<Element>),
}

impl SendFirstValue {
    /// Whether nothing is sent.
    pub fn is_empty(&self) -> bool {
        matches!(self, SendFirstValue::Empty)
    }

    /// The elements sent, if any.
    pub fn elements(&self) -> &[Element] {
        match self {
            SendFirstValue::Empty => &[],
            SendFirstValue::Elements(elements) => elements,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        for element in self.elements() {
            element.write(out);
        }
    }
}

/// The prover's first message, shaped like the fragment tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// The announcement of a leaf statement.
    Leaf(Element),
    /// The announcement of an inner node.
    Node {
        /// The message the node sends before delegating.
        first_value: SendFirstValue,
        /// The announcements of the node's subprotocols, in order.
        children: Vec<Announcement>,
    },
}

impl Announcement {
    /// Append the wire encoding of the announcement to `out`.
    ///
    /// Decoding requires the fragment tree, see [`Fragment::recreate_announcement`].
    pub fn write(&self, out: &mut Vec<u8>) {
        match self {
            Announcement::Leaf(element) => element.write(out),
            Announcement::Node {
                first_value,
                children,
            } => {
                first_value.write(out);
                for child in children {
                    child.write(out);
                }
            }
        }
    }

    /// The wire encoding of the announcement.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.write(&mut bytes);
        bytes
    }
}

/// The prover's final message, shaped like the fragment tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A leaf declares no variables, so it has nothing to respond.
    Empty,
    /// The response of an inner node.
    Node {
        /// One response scalar per declared variable, in declaration order.
        scalars: Vec<Scalar>,
        /// The responses of the node's subprotocols, in order.
        children: Vec<Response>,
    },
}

impl Response {
    /// Append the wire encoding of the response to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        if let Response::Node { scalars, children } = self {
            for scalar in scalars {
                write_scalar(scalar, out);
            }
            for child in children {
                child.write(out);
            }
        }
    }

    /// The wire encoding of the response.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.write(&mut bytes);
        bytes
    }

    pub(crate) fn read_scalars(count: usize, reader: &mut &[u8]) -> Result<Vec<Scalar>, Error> {
        (0..count).map(|_| read_scalar(reader)).collect()
    }
}

/// The prover's private state between announcement and response.
pub enum AnnouncementSecret {
    /// A leaf keeps no state.
    Leaf,
    /// The state of an inner node.
    Node {
        /// Witness values of the declared variables, in declaration order.
        witnesses: Vec<Scalar>,
        /// Announcement randomness of the declared variables, in declaration order.
        randomness: Vec<Scalar>,
        /// The secrets of the node's subprotocols, in order.
        children: Vec<AnnouncementSecret>,
    },
}

impl fmt::Debug for AnnouncementSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnouncementSecret::Leaf => f.write_str("Leaf"),
            AnnouncementSecret::Node { children, .. } => f
                .debug_struct("Node")
                .field("children", children)
                .finish_non_exhaustive(),
        }
    }
}

impl AnnouncementSecret {
    /// Compute `s = r + c * w` for every declared variable in the tree.
    pub fn respond(self, challenge: &Challenge) -> Response {
        match self {
            AnnouncementSecret::Leaf => Response::Empty,
            AnnouncementSecret::Node {
                witnesses,
                randomness,
                children,
            } => {
                let c = challenge.to_scalar();
                Response::Node {
                    scalars: witnesses
                        .iter()
                        .zip(randomness.iter())
                        .map(|(w, r)| *r + c * w)
                        .collect(),
                    children: children
                        .into_iter()
                        .map(|child| child.respond(challenge))
                        .collect(),
                }
            }
        }
    }
}

/// Everything a fragment may use while producing an announcement: the witness, and the
/// announcement randomness of every variable in scope.
#[derive(Clone, Default)]
pub struct ProverContext {
    witness: Witness,
    randomness: HashMap<Variable, Scalar>,
}

impl fmt::Debug for ProverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProverContext")
            .field("witness", &self.witness)
            .field("in_scope", &self.randomness.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProverContext {
    /// A context with no variable in scope.
    pub fn new(witness: Witness) -> Self {
        Self {
            witness,
            randomness: HashMap::new(),
        }
    }

    /// The witness values known to the prover.
    pub fn witness(&self) -> &Witness {
        &self.witness
    }

    /// The announcement randomness of a variable in scope.
    pub fn randomness(&self, variable: &Variable) -> Option<Scalar> {
        self.randomness.get(variable).copied()
    }

    /// Bring newly declared variables into scope, with their witness values and randomness.
    pub fn declare(
        &self,
        declared: impl IntoIterator<Item = (Variable, Scalar, Scalar)>,
    ) -> Result<Self, Error> {
        let mut inner = self.clone();
        for (variable, witness, randomness) in declared {
            if inner.randomness.contains_key(&variable) {
                return Err(Error::RedeclaredVariable(variable));
            }
            inner.witness.assign(&variable, witness);
            let _ = inner.randomness.insert(variable, randomness);
        }
        Ok(inner)
    }
}

/// The response scalar of every variable in scope, on the verifier's (or simulator's) side.
#[derive(Debug, Clone, Default)]
pub struct ResponseContext(HashMap<Variable, Scalar>);

impl ResponseContext {
    /// A context with no variable in scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// The response of a variable in scope.
    pub fn response(&self, variable: &Variable) -> Option<Scalar> {
        self.0.get(variable).copied()
    }

    /// Bring newly declared variables into scope with their responses.
    pub fn declare(
        &self,
        declared: impl IntoIterator<Item = (Variable, Scalar)>,
    ) -> Result<Self, Error> {
        let mut inner = self.clone();
        for (variable, response) in declared {
            if inner.0.contains_key(&variable) {
                return Err(Error::RedeclaredVariable(variable));
            }
            let _ = inner.0.insert(variable, response);
        }
        Ok(inner)
    }
}

/// Incorporate the position of `variable` in `scope` into a challenge.
pub(crate) fn consume_position(
    scope: &[Variable],
    variable: &Variable,
    builder: &mut ChallengeBuilder,
) {
    let position = scope.iter().position(|v| v == variable);
    builder.consume(&(position.map_or(u64::MAX, |p| p as u64)));
}

/// Fail if a decoder left bytes behind.
pub(crate) fn ensure_consumed(reader: &[u8]) -> Result<(), Error> {
    if reader.is_empty() {
        Ok(())
    } else {
        Err(Error::TrailingBytes(reader.len()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn responses_combine_randomness_and_witness() {
        let secret = AnnouncementSecret::Node {
            witnesses: vec![Scalar::from(3u64)],
            randomness: vec![Scalar::from(5u64)],
            children: vec![AnnouncementSecret::Leaf],
        };
        let response = secret.respond(&Challenge::from(Scalar::from(7u64)));
        assert_eq!(
            response,
            Response::Node {
                scalars: vec![Scalar::from(26u64)],
                children: vec![Response::Empty],
            }
        );
    }

    #[test]
    fn variables_cannot_be_declared_twice_on_one_path() {
        let x = Variable::new("x");
        let context = ProverContext::new(Witness::new())
            .declare(vec![(x.clone(), Scalar::one(), Scalar::one())])
            .unwrap();
        assert_eq!(context.randomness(&x), Some(Scalar::one()));
        assert_eq!(
            context
                .declare(vec![(x.clone(), Scalar::one(), Scalar::one())])
                .unwrap_err(),
            Error::RedeclaredVariable(x.clone())
        );

        let responses = ResponseContext::new()
            .declare(vec![(x.clone(), Scalar::one())])
            .unwrap();
        assert!(responses.declare(vec![(x, Scalar::one())]).is_err());
    }

    #[test]
    fn secrets_do_not_print_values() {
        let secret = AnnouncementSecret::Node {
            witnesses: vec![Scalar::from(123_456_789u64)],
            randomness: vec![Scalar::from(987_654_321u64)],
            children: vec![],
        };
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("123456789"));
        assert!(!printed.contains("987654321"));
    }
}
