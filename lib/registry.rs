//! Bookkeeping for the subsystems making up the composite space.
//!
//! Subsystems are ordered by creation: the first one created is the leftmost
//! (most significant) factor of the Kronecker product, so a subsystem's stride
//! `n_before` is the product of the level counts of everything created before
//! it.

use tracing::debug;
use crate::{
    error::{ Error, Result },
    operator::{ Op, OpKind },
};

/// Lifecycle of a [`Registry`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Nothing has been created yet.
    Uninitialized,
    /// Subsystems may be added.
    Open,
    /// The composite dimension is frozen.
    Finalized,
}

/// A single factor of the composite space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subsystem {
    index: usize,
    levels: usize,
    n_before: usize,
}

impl Subsystem {
    /// Return the position of `self` in creation order.
    pub fn index(&self) -> usize { self.index }

    /// Return the number of levels.
    pub fn levels(&self) -> usize { self.levels }

    /// Return the product of the level counts of all earlier subsystems.
    pub fn n_before(&self) -> usize { self.n_before }

    /// Return the annihilation operator.
    pub fn lower(&self) -> Op { Op::new(OpKind::Lower, self.levels, self.n_before) }

    /// Return the creation operator.
    pub fn raise(&self) -> Op { Op::new(OpKind::Raise, self.levels, self.n_before) }

    /// Return the number operator.
    pub fn number(&self) -> Op { Op::new(OpKind::Number, self.levels, self.n_before) }

    /// Return the basis operator for state `k`, if `k` is in range.
    pub fn basis(&self, k: usize) -> Option<Op> {
        (k < self.levels)
            .then(|| Op::new(OpKind::Basis(k), self.levels, self.n_before))
    }
}

/// Owns the subsystem table and the Open → Finalized lifecycle.
#[derive(Clone, Debug)]
pub struct Registry {
    subsystems: Vec<Subsystem>,
    total_levels: usize,
    state: Lifecycle,
    max_subsystems: usize,
}

impl Registry {
    /// Create a new, uninitialized registry holding at most `max_subsystems`
    /// subsystems.
    pub fn new(max_subsystems: usize) -> Self {
        Self {
            subsystems: Vec::new(),
            total_levels: 0,
            state: Lifecycle::Uninitialized,
            max_subsystems,
        }
    }

    /// Return the current lifecycle state.
    pub fn state(&self) -> Lifecycle { self.state }

    /// Return `true` once the composite dimension is frozen.
    pub fn is_finalized(&self) -> bool { self.state == Lifecycle::Finalized }

    /// Return the dimension of the composite space (`0` before anything has
    /// been created).
    pub fn total_levels(&self) -> usize { self.total_levels }

    /// Return the number of subsystems created so far.
    pub fn num_subsystems(&self) -> usize { self.subsystems.len() }

    /// Return all subsystems in creation order.
    pub fn subsystems(&self) -> &[Subsystem] { &self.subsystems }

    /// Return `true` if this registry created a subsystem with `levels`
    /// levels at stride `n_before`.
    pub fn has_subsystem(&self, n_before: usize, levels: usize) -> bool {
        self.subsystems.iter()
            .any(|s| s.n_before == n_before && s.levels == levels)
    }

    /// Add a ladder-type subsystem with `levels` levels.
    ///
    /// The returned [`Subsystem`] gives access to its lowering, raising, and
    /// number operators.
    pub fn create_subsystem(&mut self, levels: usize) -> Result<Subsystem> {
        let sub = self.push(levels)?;
        debug!(index = sub.index, levels, n_before = sub.n_before, "created subsystem");
        Ok(sub)
    }

    /// Add a two-level subsystem.
    pub fn create_qubit(&mut self) -> Result<Subsystem> {
        self.create_subsystem(2)
    }

    /// Add a discrete-basis subsystem with `levels` levels and return one basis
    /// operator per level, in order.
    pub fn create_basis_set(&mut self, levels: usize) -> Result<Vec<Op>> {
        let sub = self.push(levels)?;
        debug!(
            index = sub.index, levels, n_before = sub.n_before,
            "created basis set",
        );
        Ok(
            (0..levels)
            .map(|k| Op::new(OpKind::Basis(k), levels, sub.n_before))
            .collect()
        )
    }

    fn push(&mut self, levels: usize) -> Result<Subsystem> {
        if self.state == Lifecycle::Finalized {
            return Err(Error::FinalizedState);
        }
        if self.subsystems.len() + 1 > self.max_subsystems {
            return Err(Error::CapacityExceeded { max: self.max_subsystems });
        }
        if levels < 2 {
            return Err(Error::InvalidLevels(levels));
        }
        let n_before
            = if self.state == Lifecycle::Uninitialized {
                1
            } else {
                self.total_levels
            };
        let total = n_before.checked_mul(levels)
            .ok_or(Error::DimensionOverflow { total: n_before, levels })?;
        let sub = Subsystem { index: self.subsystems.len(), levels, n_before };
        self.subsystems.push(sub);
        self.total_levels = total;
        self.state = Lifecycle::Open;
        Ok(sub)
    }

    /// Freeze the composite dimension, returning it.
    ///
    /// Fails with [`Error::UninitializedRuntime`] if no subsystem exists.
    /// Finalizing an already-finalized registry is a no-op.
    pub fn finalize(&mut self) -> Result<usize> {
        match self.state {
            Lifecycle::Uninitialized => Err(Error::UninitializedRuntime),
            Lifecycle::Open => {
                self.state = Lifecycle::Finalized;
                Ok(self.total_levels)
            },
            Lifecycle::Finalized => Ok(self.total_levels),
        }
    }
}

impl Default for Registry {
    fn default() -> Self { Self::new(100) }
}
