//! Symbolic expressions over secret scalars and public group elements.
//!
//! Statements are written as [`Equation`]s between two [`GroupExpr`]s. A [`GroupExpr`] combines
//! public [`Element`]s with secret [`Variable`]s through addition, scaling by an [`Exponent`], and
//! the pairing. Before a statement can be proven it is brought into [`LinearForm`], a sum of
//! public bases each scaled by one variable, plus a public constant. Expressions that multiply two
//! secrets together have no linear form and are rejected.
//!
//! Variables have nominal identity: two variables are the same only if one is a clone of the
//! other. Creating two variables with the same name gives two unrelated variables.
//!
//! ```
//! # use sigma_fragments::{Scalar, expression::*};
//! # use ark_bls12_381::G1Projective;
//! # use ark_ec::Group;
//! let x = Variable::new("x");
//! let g = G1Projective::generator();
//! let h = g * Scalar::from(5u64);
//! let equation = Equation::new(GroupExpr::from(g) * &x, h);
//! let witness = Witness::new().with(&x, 5u64);
//! assert!(equation.is_satisfied_by(&witness).unwrap());
//! ```

use crate::{
    algebra::{Element, GroupKind},
    common::*,
    Error,
};
use ark_bls12_381::{g1, g2};
use ark_ec::short_weierstrass::Projective;
use std::{
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    iter::FromIterator,
    ops::{Add, Mul, Neg, Sub},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// Source of variable handles. Handles are never reused within a process.
static NEXT_VARIABLE_HANDLE: AtomicUsize = AtomicUsize::new(0);

/// A secret scalar placeholder.
///
/// Equality, ordering and hashing use the variable's handle only; the name is a label for
/// debugging output.
#[derive(Clone)]
pub struct Variable {
    handle: usize,
    name: Arc<str>,
}

impl Variable {
    /// Create a fresh variable, distinct from every other variable.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            handle: NEXT_VARIABLE_HANDLE.fetch_add(1, Ordering::Relaxed),
            name: Arc::from(name.as_ref()),
        }
    }

    /// The debugging label of this variable.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unique handle of this variable.
    pub fn handle(&self) -> usize {
        self.handle
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state)
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.handle.cmp(&other.handle)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.handle)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An assignment of secret values to variables. Known only to the prover.
#[derive(Clone, Default, PartialEq)]
pub struct Witness(HashMap<Variable, Scalar>);

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

impl Witness {
    /// An empty witness.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a value to a variable, replacing any previous assignment.
    pub fn assign(&mut self, variable: &Variable, value: impl Into<Scalar>) {
        let _ = self.0.insert(variable.clone(), value.into());
    }

    /// A conveniently chainable variant of [`Witness::assign`].
    pub fn with(mut self, variable: &Variable, value: impl Into<Scalar>) -> Self {
        self.assign(variable, value);
        self
    }

    /// The value assigned to a variable, if any.
    pub fn get(&self, variable: &Variable) -> Option<Scalar> {
        self.0.get(variable).copied()
    }

    /// Whether a value is assigned to the variable.
    pub fn contains(&self, variable: &Variable) -> bool {
        self.0.contains_key(variable)
    }

    /// The assigned variables, in no particular order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.0.keys()
    }

    /// Number of assigned variables.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no variable is assigned.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn extend(&mut self, other: Witness) {
        self.0.extend(other.0)
    }
}

impl FromIterator<(Variable, Scalar)> for Witness {
    fn from_iter<T: IntoIterator<Item = (Variable, Scalar)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A scalar expression that is linear in its variables: `sum( c_i * x_i ) + c`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exponent {
    terms: Vec<(Variable, Scalar)>,
    constant: Scalar,
}

impl Exponent {
    /// A public constant.
    pub fn constant(value: impl Into<Scalar>) -> Self {
        Self {
            terms: Vec::new(),
            constant: value.into(),
        }
    }

    /// The variable terms with their coefficients, in order of first appearance.
    pub fn terms(&self) -> &[(Variable, Scalar)] {
        &self.terms
    }

    /// The public constant term.
    pub fn constant_term(&self) -> Scalar {
        self.constant
    }

    /// Whether the exponent depends on no variable.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// The variables this exponent depends on.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.terms.iter().map(|(variable, _)| variable)
    }

    /// Compute the value of the exponent under a witness.
    pub fn evaluate(&self, witness: &Witness) -> Result<Scalar, Error> {
        self.terms
            .iter()
            .try_fold(self.constant, |acc, (variable, coefficient)| {
                let value = witness
                    .get(variable)
                    .ok_or_else(|| Error::UnassignedVariable(variable.clone()))?;
                Ok(acc + *coefficient * value)
            })
    }

    /// Replace a variable by a public value.
    pub fn substitute(&self, variable: &Variable, value: Scalar) -> Exponent {
        let mut result = Exponent::constant(self.constant);
        for (v, coefficient) in &self.terms {
            if v == variable {
                result.constant += *coefficient * value;
            } else {
                result.add_term(v.clone(), *coefficient);
            }
        }
        result
    }

    fn add_term(&mut self, variable: Variable, coefficient: Scalar) {
        match self.terms.iter().position(|(v, _)| *v == variable) {
            Some(index) => {
                self.terms[index].1 += coefficient;
                if self.terms[index].1.is_zero() {
                    let _ = self.terms.remove(index);
                }
            }
            None if !coefficient.is_zero() => self.terms.push((variable, coefficient)),
            None => {}
        }
    }
}

impl From<Variable> for Exponent {
    fn from(variable: Variable) -> Self {
        Self {
            terms: vec![(variable, Scalar::one())],
            constant: Scalar::zero(),
        }
    }
}

impl From<&Variable> for Exponent {
    fn from(variable: &Variable) -> Self {
        variable.clone().into()
    }
}

impl From<Scalar> for Exponent {
    fn from(value: Scalar) -> Self {
        Exponent::constant(value)
    }
}

impl From<u64> for Exponent {
    fn from(value: u64) -> Self {
        Exponent::constant(value)
    }
}

impl<T: Into<Exponent>> Add<T> for Exponent {
    type Output = Exponent;

    fn add(mut self, other: T) -> Exponent {
        let other = other.into();
        self.constant += other.constant;
        for (variable, coefficient) in other.terms {
            self.add_term(variable, coefficient);
        }
        self
    }
}

impl Neg for Exponent {
    type Output = Exponent;

    fn neg(self) -> Exponent {
        self * -Scalar::one()
    }
}

impl<T: Into<Exponent>> Sub<T> for Exponent {
    type Output = Exponent;

    fn sub(self, other: T) -> Exponent {
        let other: Exponent = other.into();
        self + -other
    }
}

impl Mul<Scalar> for Exponent {
    type Output = Exponent;

    fn mul(self, factor: Scalar) -> Exponent {
        if factor.is_zero() {
            return Exponent::default();
        }
        Exponent {
            terms: self
                .terms
                .into_iter()
                .map(|(variable, coefficient)| (variable, coefficient * factor))
                .collect(),
            constant: self.constant * factor,
        }
    }
}

/// An expression whose value is an element of one of the groups.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupExpr {
    /// A public element.
    Element(Element),
    /// A scalar expression, as an element of Zp.
    Exponent(Exponent),
    /// The sum of two expressions in the same group.
    Sum(Box<GroupExpr>, Box<GroupExpr>),
    /// The inverse of an expression.
    Neg(Box<GroupExpr>),
    /// An expression multiplied by a scalar expression.
    Scaled(Box<GroupExpr>, Exponent),
    /// The pairing of a G1 expression with a G2 expression.
    Pairing(Box<GroupExpr>, Box<GroupExpr>),
}

impl GroupExpr {
    /// The pairing of two expressions.
    pub fn pairing(left: impl Into<GroupExpr>, right: impl Into<GroupExpr>) -> Self {
        GroupExpr::Pairing(Box::new(left.into()), Box::new(right.into()))
    }

    /// Bring the expression into linear form.
    ///
    /// Pairings are expanded by bilinearity, so a pairing is linear as long as at most one of its
    /// sides depends on a variable.
    pub fn linearize(&self) -> Result<LinearForm, Error> {
        match self {
            GroupExpr::Element(element) => Ok(LinearForm::constant(*element)),
            GroupExpr::Exponent(exponent) => Ok(LinearForm {
                kind: GroupKind::Scalar,
                terms: exponent
                    .terms
                    .iter()
                    .map(|(variable, c)| (variable.clone(), Element::Scalar(*c)))
                    .collect(),
                constant: Element::Scalar(exponent.constant),
            }),
            GroupExpr::Sum(left, right) => left.linearize()?.add(right.linearize()?),
            GroupExpr::Neg(inner) => Ok(inner.linearize()?.neg()),
            GroupExpr::Scaled(base, exponent) => {
                let base = base.linearize()?;
                if exponent.is_constant() {
                    return Ok(base.scale(&exponent.constant));
                }
                if !base.is_constant() {
                    return Err(non_linear(base.variables().chain(exponent.variables())));
                }
                let mut form = LinearForm::constant(base.constant.scale(&exponent.constant));
                for (variable, coefficient) in &exponent.terms {
                    form.add_term(variable.clone(), base.constant.scale(coefficient))?;
                }
                Ok(form)
            }
            GroupExpr::Pairing(left, right) => {
                let left = left.linearize()?;
                let right = right.linearize()?;
                let mut form = LinearForm::constant(left.constant.pair(&right.constant)?);
                match (left.is_constant(), right.is_constant()) {
                    (true, _) => {
                        for (variable, base) in &right.terms {
                            form.add_term(variable.clone(), left.constant.pair(base)?)?;
                        }
                    }
                    (false, true) => {
                        for (variable, base) in &left.terms {
                            form.add_term(variable.clone(), base.pair(&right.constant)?)?;
                        }
                    }
                    (false, false) => {
                        return Err(non_linear(left.variables().chain(right.variables())))
                    }
                }
                Ok(form)
            }
        }
    }

    /// Compute the value of the expression under a witness.
    pub fn evaluate(&self, witness: &Witness) -> Result<Element, Error> {
        self.linearize()?.evaluate(witness)
    }

    /// Replace a variable by a public value everywhere in the expression.
    pub fn substitute(&self, variable: &Variable, value: Scalar) -> GroupExpr {
        let boxed = |expr: &GroupExpr| Box::new(expr.substitute(variable, value));
        match self {
            GroupExpr::Element(element) => GroupExpr::Element(*element),
            GroupExpr::Exponent(exponent) => {
                GroupExpr::Exponent(exponent.substitute(variable, value))
            }
            GroupExpr::Sum(left, right) => GroupExpr::Sum(boxed(left), boxed(right)),
            GroupExpr::Neg(inner) => GroupExpr::Neg(boxed(inner)),
            GroupExpr::Scaled(base, exponent) => {
                GroupExpr::Scaled(boxed(base), exponent.substitute(variable, value))
            }
            GroupExpr::Pairing(left, right) => GroupExpr::Pairing(boxed(left), boxed(right)),
        }
    }
}

fn non_linear<'a>(variables: impl Iterator<Item = &'a Variable>) -> Error {
    let names: Vec<String> = variables.map(ToString::to_string).collect();
    Error::NonLinearExpression(format!("product of terms in {}", names.join(", ")))
}

impl From<Element> for GroupExpr {
    fn from(element: Element) -> Self {
        GroupExpr::Element(element)
    }
}

impl From<Projective<g1::Config>> for GroupExpr {
    fn from(g1: Projective<g1::Config>) -> Self {
        GroupExpr::Element(g1.into())
    }
}

impl From<Projective<g2::Config>> for GroupExpr {
    fn from(g2: Projective<g2::Config>) -> Self {
        GroupExpr::Element(g2.into())
    }
}

impl From<Gt> for GroupExpr {
    fn from(gt: Gt) -> Self {
        GroupExpr::Element(gt.into())
    }
}

impl From<Scalar> for GroupExpr {
    fn from(scalar: Scalar) -> Self {
        GroupExpr::Exponent(scalar.into())
    }
}

impl From<Exponent> for GroupExpr {
    fn from(exponent: Exponent) -> Self {
        GroupExpr::Exponent(exponent)
    }
}

impl From<Variable> for GroupExpr {
    fn from(variable: Variable) -> Self {
        GroupExpr::Exponent(variable.into())
    }
}

impl From<&Variable> for GroupExpr {
    fn from(variable: &Variable) -> Self {
        GroupExpr::Exponent(variable.into())
    }
}

impl<T: Into<GroupExpr>> Add<T> for GroupExpr {
    type Output = GroupExpr;

    fn add(self, other: T) -> GroupExpr {
        GroupExpr::Sum(Box::new(self), Box::new(other.into()))
    }
}

impl Neg for GroupExpr {
    type Output = GroupExpr;

    fn neg(self) -> GroupExpr {
        GroupExpr::Neg(Box::new(self))
    }
}

impl<T: Into<GroupExpr>> Sub<T> for GroupExpr {
    type Output = GroupExpr;

    fn sub(self, other: T) -> GroupExpr {
        let other: GroupExpr = other.into();
        self + -other
    }
}

impl<T: Into<Exponent>> Mul<T> for GroupExpr {
    type Output = GroupExpr;

    fn mul(self, exponent: T) -> GroupExpr {
        GroupExpr::Scaled(Box::new(self), exponent.into())
    }
}

/// An expression in linear form: `sum( B_i * x_i ) + C` for public bases `B_i`, variables `x_i`
/// and a public constant `C`, all in one group.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearForm {
    kind: GroupKind,
    terms: Vec<(Variable, Element)>,
    constant: Element,
}

impl LinearForm {
    fn constant(constant: Element) -> Self {
        Self {
            kind: constant.kind(),
            terms: Vec::new(),
            constant,
        }
    }

    /// The group the expression lives in.
    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// The variable terms with their bases, in order of first appearance.
    pub fn terms(&self) -> &[(Variable, Element)] {
        &self.terms
    }

    /// The public constant.
    pub fn constant_term(&self) -> &Element {
        &self.constant
    }

    /// Whether the expression depends on no variable.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// The variables this expression depends on.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.terms.iter().map(|(variable, _)| variable)
    }

    /// Compute the value of the expression under a witness.
    pub fn evaluate(&self, witness: &Witness) -> Result<Element, Error> {
        self.terms
            .iter()
            .try_fold(self.constant, |acc, (variable, base)| {
                let value = witness
                    .get(variable)
                    .ok_or_else(|| Error::UnassignedVariable(variable.clone()))?;
                acc.add(&base.scale(&value))
            })
    }

    fn add_term(&mut self, variable: Variable, base: Element) -> Result<(), Error> {
        if base.kind() != self.kind {
            return Err(Error::GroupMismatch {
                expected: self.kind,
                found: base.kind(),
            });
        }
        match self.terms.iter().position(|(v, _)| *v == variable) {
            Some(index) => self.terms[index].1 = self.terms[index].1.add(&base)?,
            None => self.terms.push((variable, base)),
        }
        Ok(())
    }

    fn add(mut self, other: LinearForm) -> Result<Self, Error> {
        self.constant = self.constant.add(&other.constant)?;
        for (variable, base) in other.terms {
            self.add_term(variable, base)?;
        }
        Ok(self)
    }

    fn neg(self) -> Self {
        Self {
            kind: self.kind,
            terms: self
                .terms
                .into_iter()
                .map(|(variable, base)| (variable, base.neg()))
                .collect(),
            constant: self.constant.neg(),
        }
    }

    fn scale(self, factor: &Scalar) -> Self {
        Self {
            kind: self.kind,
            terms: self
                .terms
                .into_iter()
                .map(|(variable, base)| (variable, base.scale(factor)))
                .collect(),
            constant: self.constant.scale(factor),
        }
    }
}

/// An assertion that two expressions are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    /// Left-hand side.
    pub lhs: GroupExpr,
    /// Right-hand side.
    pub rhs: GroupExpr,
}

impl Equation {
    /// Assert that `lhs` equals `rhs`.
    pub fn new(lhs: impl Into<GroupExpr>, rhs: impl Into<GroupExpr>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    /// The linear form of `lhs - rhs`; the equation holds when it evaluates to the identity.
    pub fn linearize(&self) -> Result<LinearForm, Error> {
        self.lhs.linearize()?.add(self.rhs.linearize()?.neg())
    }

    /// Whether the witness satisfies the equation.
    pub fn is_satisfied_by(&self, witness: &Witness) -> Result<bool, Error> {
        Ok(self.linearize()?.evaluate(witness)?.is_identity())
    }
}
