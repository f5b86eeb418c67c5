//! Commutator terms `-i[H, ρ]`.

use num_complex::Complex64 as C64;
use tracing::debug;
use crate::{
    backend::SparseBackend,
    error::Result,
    kron::{ Embedding, Product },
    operator::Op,
};
use super::Liouvillian;

impl<B> Liouvillian<B>
where B: SparseBackend
{
    /// Add `a · op` to the Hamiltonian.
    ///
    /// A lone basis operator `|k⟩` contributes the projector `|k⟩⟨k|`.
    /// Finalizes the registry on first use.
    pub fn add_term(&mut self, a: f64, op: &Op) -> Result<()> {
        debug!(a, op = %op, "hamiltonian term");
        self.add_hamiltonian(a, Product::from_op(op))
    }

    /// Add `a · op1 · op2` to the Hamiltonian.
    ///
    /// Either both operators are basis operators of the same subsystem,
    /// giving `a |op1⟩⟨op2|`, or neither is. The operators are not
    /// symmetrized: a Hermitian Hamiltonian needs the conjugate term added as
    /// well.
    pub fn add_term2(&mut self, a: f64, op1: &Op, op2: &Op) -> Result<()> {
        let product = Product::pair(op1, op2)?;
        debug!(a, op1 = %op1, op2 = %op2, "hamiltonian term");
        self.add_hamiltonian(a, product)
    }

    /// Add `a · op1 · op2 · op3` to the Hamiltonian.
    ///
    /// Exactly two adjacent operators must be basis operators of one
    /// subsystem; the remaining one must be a ladder or number operator on a
    /// different subsystem.
    pub fn add_term3(&mut self, a: f64, op1: &Op, op2: &Op, op3: &Op)
        -> Result<()>
    {
        let product = Product::triple(op1, op2, op3)?;
        debug!(a, op1 = %op1, op2 = %op2, op3 = %op3, "hamiltonian term");
        self.add_hamiltonian(a, product)
    }

    fn add_hamiltonian(&mut self, a: f64, product: Product) -> Result<()> {
        self.check_factors(&product)?;
        let kron = self.ensure_finalized()?;
        let n = kron.total_levels();
        // I ⊗ H
        self.emit(&product, Embedding::left_identity(n), -C64::i() * a)?;
        // Hᵀ ⊗ I
        self.emit(&product.transpose(), Embedding::right_identity(n), C64::i() * a)?;
        self.emit_dense(&product, a);
        Ok(())
    }
}
