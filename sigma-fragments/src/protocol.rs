//! Drivers that run a whole fragment tree through the three moves of a Sigma-protocol.
//!
//! A [`SigmaProtocol`] pairs a root [`Fragment`] with an optional witness. The prover calls
//! [`SigmaProtocol::announce`] and [`SigmaProtocol::respond`]; the verifier decodes messages with
//! the `recreate_*` methods and checks them with [`SigmaProtocol::verify`]. Instances without a
//! witness can still verify and simulate.
//!
//! [`run_interactive`] plays both sides of an interactive run, passing every message through its
//! wire encoding. See [`fiat_shamir`](crate::fiat_shamir) for non-interactive proofs.

use crate::{
    common::*,
    expression::Witness,
    fragment::{
        ensure_consumed, Announcement, AnnouncementSecret, Fragment, ProverContext, Response,
        ResponseContext,
    },
    proofs::Challenge,
    Error,
};
use std::sync::Arc;
use tracing::debug;

/// A statement, given by its root fragment, with an optional witness.
pub trait SigmaProtocol {
    /// The root of the fragment tree.
    fn fragment(&self) -> &dyn Fragment;

    /// The witness, if this instance can act as a prover.
    fn witness(&self) -> Option<&Witness>;

    /// Produce the prover's announcement.
    fn announce(&self, rng: &mut impl Rng) -> Result<(AnnouncementSecret, Announcement), Error> {
        let witness = self.witness().ok_or(Error::MissingWitness)?;
        self.fragment()
            .announce(&ProverContext::new(witness.clone()), rng)
    }

    /// Answer a challenge.
    fn respond(&self, secret: AnnouncementSecret, challenge: &Challenge) -> Response {
        self.fragment().respond(secret, challenge)
    }

    /// Check a transcript.
    fn verify(
        &self,
        announcement: &Announcement,
        challenge: &Challenge,
        response: &Response,
    ) -> bool {
        self.fragment()
            .verify(&ResponseContext::new(), announcement, challenge, response)
    }

    /// Produce an accepting transcript for a fixed challenge without a witness.
    fn simulate(
        &self,
        challenge: &Challenge,
        rng: &mut impl Rng,
    ) -> Result<(Announcement, Response), Error> {
        self.fragment()
            .simulate(&ResponseContext::new(), challenge, rng)
    }

    /// Decode an announcement, rejecting trailing bytes.
    fn recreate_announcement(&self, bytes: &[u8]) -> Result<Announcement, Error> {
        let mut reader = bytes;
        let announcement = self.fragment().recreate_announcement(&mut reader)?;
        ensure_consumed(reader)?;
        Ok(announcement)
    }

    /// Decode a response to an announcement, rejecting trailing bytes.
    fn recreate_response(
        &self,
        announcement: &Announcement,
        bytes: &[u8],
    ) -> Result<Response, Error> {
        let mut reader = bytes;
        let response = self
            .fragment()
            .recreate_response(announcement, &mut reader)?;
        ensure_consumed(reader)?;
        Ok(response)
    }

    /// Decode a challenge.
    fn recreate_challenge(&self, bytes: &[u8]) -> Result<Challenge, Error> {
        Challenge::from_bytes(bytes)
    }
}

/// A protocol over any fragment tree.
#[derive(Debug, Clone)]
pub struct ComposedProtocol {
    root: Arc<dyn Fragment>,
    witness: Option<Witness>,
}

impl ComposedProtocol {
    /// A prover instance.
    pub fn prover(root: impl Fragment + 'static, witness: Witness) -> Self {
        Self {
            root: Arc::new(root),
            witness: Some(witness),
        }
    }

    /// A verifier instance.
    pub fn verifier(root: impl Fragment + 'static) -> Self {
        Self {
            root: Arc::new(root),
            witness: None,
        }
    }

    /// A verifier instance for the same statement as this instance.
    pub fn to_verifier(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
            witness: None,
        }
    }
}

impl SigmaProtocol for ComposedProtocol {
    fn fragment(&self) -> &dyn Fragment {
        self.root.as_ref()
    }

    fn witness(&self) -> Option<&Witness> {
        self.witness.as_ref()
    }
}

/// Run the prover against the verifier with a challenge sampled by the verifier, passing every
/// message through its wire encoding. Returns the verifier's decision.
pub fn run_interactive(
    prover: &impl SigmaProtocol,
    verifier: &impl SigmaProtocol,
    rng: &mut impl Rng,
) -> Result<bool, Error> {
    let (secret, announcement) = prover.announce(&mut *rng)?;
    let received = verifier.recreate_announcement(&announcement.to_bytes())?;

    let challenge = Challenge::random(&mut *rng);
    let challenge = prover.recreate_challenge(&challenge.to_bytes())?;

    let response = prover.respond(secret, &challenge);
    let response = verifier.recreate_response(&received, &response.to_bytes())?;

    let accepted = verifier.verify(&received, &challenge, &response);
    if !accepted {
        debug!("interactive run rejected");
    }
    Ok(accepted)
}
