//! Classification and validation of operator products.
//!
//! A product of up to three [`Op`]s is reduced to at most two local factors
//! on distinct subsystems before any index is computed. Only the following
//! shapes are accepted:
//! - two basis operators of one subsystem, forming `|k⟩⟨l|`;
//! - two ladder/number operators, on any subsystems (a same-subsystem product
//!   is folded into a single band);
//! - a basis pair of one subsystem next to a ladder/number operator on another
//!   subsystem, on either side.

use crate::{
    error::{ Error, Result },
    kron::local::LocalOp,
    operator::{ Op, Transition },
};

/// A local matrix placed at a subsystem stride.
#[derive(Clone, Debug, PartialEq)]
pub struct Factor {
    pub local: LocalOp,
    pub n_before: usize,
}

impl Factor {
    fn from_op(op: &Op) -> Self {
        Self { local: LocalOp::from_op(op), n_before: op.n_before() }
    }

    fn from_transition(t: &Transition) -> Self {
        Self { local: LocalOp::from_transition(t), n_before: t.n_before() }
    }

    /// Return the number of levels of the subsystem.
    pub fn levels(&self) -> usize { self.local.levels() }

    /// Return the transposed factor.
    pub fn transpose(&self) -> Self {
        Self { local: self.local.transpose(), n_before: self.n_before }
    }
}

/// A validated product, reduced to one factor or two factors on distinct
/// subsystems ordered by stride.
#[derive(Clone, Debug, PartialEq)]
pub enum Product {
    Single(Factor),
    Pair(Factor, Factor),
}

impl Product {
    /// A lone operator.
    pub fn from_op(op: &Op) -> Self { Self::Single(Factor::from_op(op)) }

    /// A basis transition `|k⟩⟨l|`.
    pub fn from_transition(t: &Transition) -> Self {
        Self::Single(Factor::from_transition(t))
    }

    // operators on different subsystems commute, so the factors can always be
    // put in stride order
    fn ordered(a: Factor, b: Factor) -> Self {
        if a.n_before < b.n_before { Self::Pair(a, b) } else { Self::Pair(b, a) }
    }

    /// Classify the product `op1 · op2`.
    ///
    /// Fails with [`Error::InvalidOperatorCombination`] if exactly one operand
    /// is a basis operator and with [`Error::CrossSubspaceMismatch`] if two
    /// basis operators belong to different subsystems.
    pub fn pair(op1: &Op, op2: &Op) -> Result<Self> {
        match (LocalOp::from_op(op1), LocalOp::from_op(op2)) {
            (LocalOp::Element { .. }, LocalOp::Element { .. }) => {
                Transition::new(*op1, *op2).map(|t| Self::from_transition(&t))
            },
            (LocalOp::Band(b1), LocalOp::Band(b2)) if op1.same_subsystem(op2) => {
                Ok(Self::Single(Factor {
                    local: LocalOp::Band(b1.compose(&b2)),
                    n_before: op1.n_before(),
                }))
            },
            (l1 @ LocalOp::Band(_), l2 @ LocalOp::Band(_)) => {
                Ok(Self::ordered(
                    Factor { local: l1, n_before: op1.n_before() },
                    Factor { local: l2, n_before: op2.n_before() },
                ))
            },
            _ => Err(Error::invalid_combination(format!(
                "cannot multiply basis and non-basis operators ({} · {})",
                op1, op2,
            ))),
        }
    }

    /// Classify the product `op1 · op2 · op3`.
    ///
    /// The only supported shape is an adjacent pair of basis operators from
    /// one subsystem together with a ladder or number operator on another;
    /// everything else fails with [`Error::UnsupportedCombination`], except
    /// for a basis pair spanning two subsystems, which fails with
    /// [`Error::CrossSubspaceMismatch`].
    pub fn triple(op1: &Op, op2: &Op, op3: &Op) -> Result<Self> {
        let shape = [op1.is_basis(), op2.is_basis(), op3.is_basis()];
        let (transition, other)
            = match shape {
                [true, true, false] => (Transition::new(*op1, *op2)?, op3),
                [false, true, true] => (Transition::new(*op2, *op3)?, op1),
                [false, false, false] => {
                    return Err(Error::unsupported(
                        "products of three non-basis operators"
                    ));
                },
                [true, true, true] => {
                    return Err(Error::unsupported(
                        "products of three basis operators"
                    ));
                },
                _ => {
                    return Err(Error::unsupported(format!(
                        "basis operators must form an adjacent pair ({} · {} · {})",
                        op1, op2, op3,
                    )));
                },
            };
        if other.n_before() == transition.n_before() {
            return Err(Error::unsupported(format!(
                "{} acts on the same subsystem as its basis pair",
                other,
            )));
        }
        Ok(Self::ordered(
            Factor::from_transition(&transition),
            Factor::from_op(other),
        ))
    }

    /// Return the transpose of the product.
    pub fn transpose(&self) -> Self {
        match self {
            Self::Single(f) => Self::Single(f.transpose()),
            Self::Pair(f1, f2) => Self::Pair(f1.transpose(), f2.transpose()),
        }
    }

    /// Return `true` if every factor is a single element.
    pub fn is_element(&self) -> bool {
        let elem = |f: &Factor| matches!(f.local, LocalOp::Element { .. });
        match self {
            Self::Single(f) => elem(f),
            Self::Pair(f1, f2) => elem(f1) && elem(f2),
        }
    }
}
