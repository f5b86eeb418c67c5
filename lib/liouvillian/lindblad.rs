//! Dissipator terms `D[C] ρ = a (C ρ C† - ½ {C†C, ρ})`.

use num_complex::Complex64 as C64;
use tracing::debug;
use crate::{
    backend::SparseBackend,
    error::{ Error, Result },
    kron::{ Embedding, Factor, LocalOp, Product },
    operator::{ Op, Transition },
};
use super::Liouvillian;

impl<B> Liouvillian<B>
where B: SparseBackend
{
    /// Add a dissipator with rate `a` and jump operator `op`.
    ///
    /// A lone basis operator `|k⟩` is treated as the projector jump `|k⟩⟨k|`
    /// (see [`Self::add_dissipator_basis`]).
    pub fn add_dissipator(&mut self, a: f64, op: &Op) -> Result<()> {
        if op.is_basis() {
            return self.add_dissipator_basis(a, op, op);
        }
        debug!(a, op = %op, "dissipator");
        self.add_jump(a, LocalOp::from_op(op), op.n_before())
    }

    /// Add a dissipator with rate `a` and jump operator `|op1⟩⟨op2|`.
    ///
    /// Both operators must be basis operators of the same subsystem.
    pub fn add_dissipator_basis(&mut self, a: f64, op1: &Op, op2: &Op)
        -> Result<()>
    {
        if !op1.is_basis() && !op2.is_basis() {
            return Err(Error::invalid_combination(
                "Lindblad of two non-basis operators not supported"
            ));
        }
        let transition = Transition::new(*op1, *op2)?;
        debug!(a, op1 = %op1, op2 = %op2, "dissipator");
        self.add_jump(
            a,
            LocalOp::from_transition(&transition),
            transition.n_before(),
        )
    }

    fn add_jump(&mut self, a: f64, jump: LocalOp, n_before: usize) -> Result<()> {
        let cdc = Product::Single(Factor { local: jump.dagger_self(), n_before });
        self.check_factors(&cdc)?;
        let kron = self.ensure_finalized()?;
        let n = kron.total_levels();
        let half = C64::from(-0.5 * a);
        // I ⊗ C†C
        self.emit(&cdc, Embedding::left_identity(n), half)?;
        // C†C ⊗ I
        self.emit(&cdc, Embedding::right_identity(n), half)?;
        // C ⊗ C
        self.emit_doubled(&jump, n_before, C64::from(a))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use super::*;

    #[test]
    fn qubit_decay_entries() {
        let mut liou = Liouvillian::local();
        let q = liou.create_qubit().unwrap();
        liou.add_dissipator(1.0, &q.lower()).unwrap();
        let m = liou.assemble().unwrap();
        // ρ_11 → ρ_00 population transfer, vec index 3 → 0
        assert_eq!(m.get(0, 3), C64::from(1.0));
        assert_eq!(m.get(3, 3), C64::from(-1.0));
        // coherences decay at half the rate
        assert_eq!(m.get(1, 1), C64::from(-0.5));
        assert_eq!(m.get(2, 2), C64::from(-0.5));
        assert_eq!(m.nnz(), 4);
    }

    #[test]
    fn basis_jump_entries() {
        let mut liou = Liouvillian::local();
        let v = liou.create_basis_set(3).unwrap();
        // jump |0⟩⟨2|
        liou.add_dissipator_basis(2.0, &v[0], &v[2]).unwrap();
        let m = liou.assemble().unwrap();
        // vec index of ρ[i, j] is 3 j + i
        assert_eq!(m.get(0, 8), C64::from(2.0));
        assert_eq!(m.get(8, 8), C64::from(-2.0));
        assert_eq!(m.get(2, 2), C64::from(-1.0));
        assert_eq!(m.get(6, 6), C64::from(-1.0));
        assert_eq!(m.nnz(), 6);
    }

    #[test]
    fn basis_decay_chain() {
        let mut liou = Liouvillian::local();
        let v = liou.create_basis_set(3).unwrap();
        // |2⟩ → |1⟩ → |0⟩
        liou.add_dissipator_basis(1.0, &v[0], &v[1]).unwrap();
        liou.add_dissipator_basis(1.0, &v[1], &v[2]).unwrap();
        let m = liou.assemble().unwrap();
        assert_eq!(m.get(0, 4), C64::from(1.0));
        assert_eq!(m.get(4, 8), C64::from(1.0));
        assert_eq!(m.get(4, 4), C64::from(-1.0));
        assert_eq!(m.get(8, 8), C64::from(-1.0));
        assert_eq!(m.get(7, 7), C64::from(-1.0));
        assert_eq!(m.get(0, 0), C64::from(0.0));
        // populations are conserved
        for col in [0, 4, 8] {
            let total: C64 = [0, 4, 8].iter().map(|&row| m.get(row, col)).sum();
            assert_eq!(total, C64::from(0.0));
        }
    }

    #[test]
    fn projector_jump() {
        let mut liou = Liouvillian::local();
        let v = liou.create_basis_set(2).unwrap();
        liou.add_dissipator(1.0, &v[1]).unwrap();
        let m = liou.assemble().unwrap();
        // populations are untouched, coherences dephase
        assert_eq!(m.get(0, 0), C64::from(0.0));
        assert_eq!(m.get(3, 3), C64::from(0.0));
        assert_eq!(m.get(1, 1), C64::from(-0.5));
        assert_eq!(m.get(2, 2), C64::from(-0.5));
        assert_eq!(m.nnz(), 2);
    }

    #[test]
    fn rejections() {
        let mut liou = Liouvillian::local();
        let q = liou.create_qubit().unwrap();
        let v = liou.create_basis_set(2).unwrap();
        let w = liou.create_basis_set(2).unwrap();
        assert!(matches!(
            liou.add_dissipator_basis(1.0, &q.lower(), &q.raise()),
            Err(Error::InvalidOperatorCombination(_))
        ));
        assert!(matches!(
            liou.add_dissipator_basis(1.0, &v[0], &q.raise()),
            Err(Error::InvalidOperatorCombination(_))
        ));
        assert!(matches!(
            liou.add_dissipator_basis(1.0, &v[0], &w[1]),
            Err(Error::CrossSubspaceMismatch { .. })
        ));
        let mut other = Liouvillian::local();
        let t = other.create_subsystem(3).unwrap();
        let u = other.create_basis_set(3).unwrap();
        assert!(matches!(
            liou.add_dissipator(1.0, &t.lower()),
            Err(Error::InvalidOperatorCombination(_))
        ));
        assert!(matches!(
            liou.add_dissipator_basis(1.0, &u[0], &u[2]),
            Err(Error::InvalidOperatorCombination(_))
        ));
        assert!(!liou.is_finalized());
    }
}
