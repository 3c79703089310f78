//! Schnorr-style proofs that a value lies within the range `[0, base^power)`.
//!
//! These are Camenisch, Chaabouni, and shelat-style range proofs built from set membership.
//!
//! ## Intuition
//! The prover writes the value in `base`-ary. That is, a value `B` is written `B_0 .. B_{k-1}`,
//! least significant digit first, where each `B_i` is in the range `[0, base)`. These have the
//! property that `B = sum( base^i * B_i )`.
//!
//! The prover shows each digit is a member of the set `{0, ..., base - 1}` with a
//! [`SetMembershipFragment`], and shows the digits are a correct `base`-ary representation of the
//! value with a linear statement in Zp. Both are subprotocols of a [`DigitDecompositionFragment`],
//! which declares one internal variable per digit and sends no first message of its own.
//!
//! The value is given as an [`Exponent`] over variables declared by an enclosing node, so the range
//! proof is meaningful only in conjunction with another statement about those variables, such as
//! the opening of a commitment.
//!
//! The default parameters, `base = 128` and `power = 9`, cover the range `[0, 2^63)`.

use crate::{
    common::*,
    expression::{Equation, Exponent, Variable, Witness},
    fragment::{consume_position, SendFirstValue},
    proofs::{
        ChallengeBuilder, Delegate, LinearStatement, SetMembershipFragment,
        SetMembershipPublicParameters, SubprotocolSpec, SubprotocolSpecBuilder,
    },
    Error,
};
use std::sync::Arc;
use tracing::trace;

/// The arity of digits used by default.
pub const DEFAULT_BASE: u64 = 128;

/// Number of digits used by default.
pub const DEFAULT_POWER: u32 = 9;

/// Write a value in `base`-ary with exactly `power` digits, least significant digit first.
///
/// Fails with [`Error::OutsideRange`] if the value is not below `base^power`.
pub fn decompose(value: &Scalar, base: u64, power: u32) -> Result<Vec<u64>, Error> {
    let bound = range_bound(base, power)?;
    let mut remaining = match scalar_to_u64(value) {
        Some(v) if v < bound => v,
        _ => {
            return Err(Error::OutsideRange {
                value: value.to_string(),
                bound,
            })
        }
    };

    let mut digits = Vec::with_capacity(power as usize);
    for _ in 0..power {
        digits.push(remaining % base);
        remaining /= base;
    }
    Ok(digits)
}

fn range_bound(base: u64, power: u32) -> Result<u64, Error> {
    if base < 2 {
        return Err(Error::InvalidDecomposition(format!(
            "base must be at least 2 (got {})",
            base
        )));
    }
    if power == 0 {
        return Err(Error::InvalidDecomposition(
            "power must be at least 1".to_string(),
        ));
    }
    base.checked_pow(power).ok_or_else(|| {
        Error::InvalidDecomposition(format!("{}^{} does not fit in 64 bits", base, power))
    })
}

/// Proves that the value of an exponent lies in `[0, base^power)`.
#[derive(Debug, Clone)]
pub struct DigitDecompositionFragment {
    member: Exponent,
    base: u64,
    power: u32,
    parameters: Arc<SetMembershipPublicParameters>,
}

impl DigitDecompositionFragment {
    /// Prove that `member` lies in `[0, base^power)`.
    ///
    /// The parameters must have been generated for exactly the set `{0, ..., base - 1}`.
    pub fn new(
        member: impl Into<Exponent>,
        base: u64,
        power: u32,
        parameters: Arc<SetMembershipPublicParameters>,
    ) -> Result<Self, Error> {
        let _ = range_bound(base, power)?;
        if !parameters.is_range(base) {
            return Err(Error::ParameterSetMismatch(format!(
                "digits in base {} need parameters for the set [0, {})",
                base, base
            )));
        }
        Ok(Self {
            member: member.into(),
            base,
            power,
            parameters,
        })
    }

    /// Prove that `member` lies in `[0, 2^63)`, using [`DEFAULT_BASE`] and [`DEFAULT_POWER`].
    pub fn with_default_range(
        member: impl Into<Exponent>,
        parameters: Arc<SetMembershipPublicParameters>,
    ) -> Result<Self, Error> {
        Self::new(member, DEFAULT_BASE, DEFAULT_POWER, parameters)
    }

    /// The arity of the digits.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// The number of digits.
    pub fn power(&self) -> u32 {
        self.power
    }

    /// The exclusive upper bound of the range.
    pub fn bound(&self) -> u64 {
        // Checked on construction.
        self.base.pow(self.power)
    }
}

impl Delegate for DigitDecompositionFragment {
    type Secret = ();

    fn provide_subprotocol_spec(
        &self,
        _first_value: &SendFirstValue,
        mut builder: SubprotocolSpecBuilder,
    ) -> Result<SubprotocolSpec, Error> {
        let digits: Vec<_> = (0..self.power)
            .map(|i| builder.new_variable(format!("digit_{}", i)))
            .collect();

        // sum( base^i * digit_i ) = member
        let mut weight = Scalar::one();
        let mut sum = Exponent::default();
        for digit in &digits {
            sum = sum + Exponent::from(digit) * weight;
            weight *= Scalar::from(self.base);
        }
        builder.add_subprotocol(
            "sum",
            LinearStatement::new(&Equation::new(sum, self.member.clone()))?,
        )?;

        for (i, digit) in digits.iter().enumerate() {
            builder.add_subprotocol(
                format!("digit_{}", i),
                SetMembershipFragment::new(digit, Arc::clone(&self.parameters)),
            )?;
        }
        trace!(base = self.base, power = self.power, "built digit decomposition");
        Ok(builder.build())
    }

    fn provide_additional_witnesses(
        &self,
        _secret: (),
        witness: &Witness,
        spec: &SubprotocolSpec,
    ) -> Result<Witness, Error> {
        let value = self.member.evaluate(witness)?;
        let digits = decompose(&value, self.base, self.power)?;
        Ok(spec
            .variables()
            .iter()
            .cloned()
            .zip(digits.into_iter().map(Scalar::from))
            .collect())
    }

    fn consume_public(&self, scope: &[Variable], builder: &mut ChallengeBuilder) {
        builder.consume(&self.base);
        builder.consume(&(self.power as u64));
        builder.consume(self.parameters.public_key());
        for (variable, coefficient) in self.member.terms() {
            consume_position(scope, variable, builder);
            builder.consume(coefficient);
        }
        builder.consume(&self.member.constant_term());
    }
}
