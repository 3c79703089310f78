//! Fragments for building zero-knowledge proofs: leaf statements, the composition engine, and the
//! set membership, range and generalized Schnorr proofs built on top of it.

mod challenge;
mod delegate;
mod digits;
mod schnorr;
mod set_membership;
mod statement;

pub use self::{
    challenge::*, delegate::*, digits::*, schnorr::*, set_membership::*, statement::*,
};
