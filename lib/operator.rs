//! Value-like descriptors for operators acting on a single subsystem of the
//! composite space.
//!
//! An [`Op`] carries no reference back to the registry that created it: the
//! stride (`n_before`) and level count of its subsystem are copied in at
//! creation time, which is all the Kronecker indexer needs to place it in the
//! composite space.

use std::fmt;
use crate::error::{ Error, Result };

/// The kind of a single-subsystem operator.
///
/// The ladder operators and the number operator are the usual truncated
/// oscillator matrices, each with exactly one nonzero diagonal. `Basis(k)`
/// stands for the basis state `|k⟩` of a discrete-basis subsystem; alone it
/// acts as the projector `|k⟩⟨k|`, and two of them from the same subsystem
/// form the outer product `|k⟩⟨l|` (see [`Transition`]).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Annihilation operator `a`, nonzero on the first super-diagonal.
    Lower,
    /// Creation operator `a†`, nonzero on the first sub-diagonal.
    Raise,
    /// Number operator `a†a`, nonzero on the main diagonal.
    Number,
    /// Basis state of a discrete-basis subsystem.
    Basis(usize),
}

impl OpKind {
    /// Return the kind of the Hermitian conjugate.
    pub fn dagger(self) -> Self {
        match self {
            Self::Lower => Self::Raise,
            Self::Raise => Self::Lower,
            Self::Number => Self::Number,
            Self::Basis(k) => Self::Basis(k),
        }
    }

    /// Return `true` for [`Self::Basis`].
    pub fn is_basis(self) -> bool { matches!(self, Self::Basis(_)) }
}

/// An operator acting on one subsystem, with the identity everywhere else.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Op {
    kind: OpKind,
    levels: usize,
    n_before: usize,
}

impl Op {
    pub(crate) fn new(kind: OpKind, levels: usize, n_before: usize) -> Self {
        Self { kind, levels, n_before }
    }

    /// Return the operator kind.
    pub fn kind(&self) -> OpKind { self.kind }

    /// Return the number of levels of the owning subsystem.
    pub fn levels(&self) -> usize { self.levels }

    /// Return the product of the level counts of all subsystems created before
    /// the owning subsystem.
    pub fn n_before(&self) -> usize { self.n_before }

    /// Return the size of the identity block following the owning subsystem in
    /// a composite space of dimension `total_levels`.
    pub fn n_after(&self, total_levels: usize) -> usize {
        total_levels / (self.n_before * self.levels)
    }

    /// Return the basis index addressed by a basis operator.
    pub fn position(&self) -> Option<usize> {
        match self.kind {
            OpKind::Basis(k) => Some(k),
            _ => None,
        }
    }

    /// Return `true` if `self` is a basis operator.
    pub fn is_basis(&self) -> bool { self.kind.is_basis() }

    /// Return `true` if `self` and `other` act on the same subsystem.
    pub fn same_subsystem(&self, other: &Self) -> bool {
        self.n_before == other.n_before && self.levels == other.levels
    }

    /// Return the Hermitian conjugate.
    ///
    /// All operators here have real matrix elements, so this is also the
    /// transpose.
    pub fn dagger(self) -> Self { Self { kind: self.kind.dagger(), ..self } }

    /// Return the number operator of the owning subsystem, if `self` is a
    /// ladder or number operator.
    pub fn number(self) -> Option<Self> {
        (!self.is_basis()).then_some(Self { kind: OpKind::Number, ..self })
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OpKind::Lower => write!(f, "a")?,
            OpKind::Raise => write!(f, "a†")?,
            OpKind::Number => write!(f, "n")?,
            OpKind::Basis(k) => write!(f, "|{}⟩", k)?,
        }
        write!(f, "[{}@{}]", self.levels, self.n_before)
    }
}

/// An outer product `|to⟩⟨from|` of two basis states of the same subsystem.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Transition {
    to: usize,
    from: usize,
    levels: usize,
    n_before: usize,
}

impl Transition {
    /// Form `|ket⟩⟨bra|` from two basis operators.
    ///
    /// Fails with [`Error::InvalidOperatorCombination`] if either operator is
    /// not a basis operator, and with [`Error::CrossSubspaceMismatch`] if they
    /// belong to different subsystems.
    pub fn new(ket: Op, bra: Op) -> Result<Self> {
        let (Some(to), Some(from)) = (ket.position(), bra.position()) else {
            return Err(Error::invalid_combination(
                format!("{} and {} are not both basis operators", ket, bra)
            ));
        };
        if !ket.same_subsystem(&bra) {
            return Err(Error::CrossSubspaceMismatch {
                n_before_a: ket.n_before,
                n_before_b: bra.n_before,
            });
        }
        Ok(Self { to, from, levels: ket.levels, n_before: ket.n_before })
    }

    /// Return the row (ket) index.
    pub fn to(&self) -> usize { self.to }

    /// Return the column (bra) index.
    pub fn from(&self) -> usize { self.from }

    /// Return the number of levels of the owning subsystem.
    pub fn levels(&self) -> usize { self.levels }

    /// Return the stride of the owning subsystem.
    pub fn n_before(&self) -> usize { self.n_before }

    /// Return `|from⟩⟨to|`.
    pub fn dagger(self) -> Self {
        Self { to: self.from, from: self.to, ..self }
    }

    /// Return `(|to⟩⟨from|)† |to⟩⟨from| = |from⟩⟨from|`.
    pub fn dagger_self(self) -> Self { Self { to: self.from, ..self } }
}
