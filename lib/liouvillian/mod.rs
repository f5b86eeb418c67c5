//! Assembly of the Liouville superoperator for a Lindblad master equation.
//!
//! A [`Liouvillian`] owns a subsystem [`Registry`] and a [`SparseBackend`].
//! Subsystems are created first; the first Hamiltonian or Lindblad term then
//! freezes the composite dimension `N` and allocates the `N² × N²`
//! superoperator. Each term is expanded by the Kronecker indexer directly into
//! `(row, col, value)` triples that are handed to the backend.
//!
//! The density matrix is vectorized by stacking columns (see
//! [`vectorize`][crate::vectorize::vectorize]), so that `vec(AρB) = (Bᵀ ⊗ A)
//! vec(ρ)`. With this convention
//! ```text
//! -i[H, ρ]  ↦  -i (I ⊗ H) + i (Hᵀ ⊗ I)
//! D[C] ρ    ↦  a (C̄ ⊗ C) - a/2 (I ⊗ C†C) - a/2 ((C†C)ᵀ ⊗ I)
//! ```
//! and since every operator here has real matrix elements, `C̄ = C`, `(C†C)ᵀ =
//! C†C`, and `Hᵀ` of a single term is its dagger.

use std::{
    convert::Infallible,
    fs::File,
    io::{ BufWriter, Write },
    path::Path,
};
use itertools::Itertools;
use ndarray as nd;
use num_complex::Complex64 as C64;
use tracing::{ debug, info, warn };
use crate::{
    backend::{ BackendError, LocalBackend, SparseBackend },
    config::Config,
    error::{ Error, Result },
    kron::{ Embedding, Kron, LocalOp, Product },
    operator::Op,
    registry::{ Lifecycle, Registry, Subsystem },
};

pub mod hamiltonian;
pub mod lindblad;

/* Context ********************************************************************/

#[derive(Debug)]
struct Assembly<M> {
    kron: Kron,
    matrix: M,
    dense: Option<nd::Array2<f64>>,
    assembled: bool,
}

/// Builder for the sparse superoperator of a composite open system.
pub struct Liouvillian<B>
where B: SparseBackend
{
    config: Config,
    registry: Registry,
    backend: B,
    assembly: Option<Assembly<B::Matrix>>,
}

impl<B> Liouvillian<B>
where B: SparseBackend
{
    /// Create a new builder.
    ///
    /// Fails with [`Error::Config`] if `config` does not validate.
    pub fn new(config: Config, backend: B) -> Result<Self> {
        config.validate()?;
        let registry = Registry::new(config.max_subsystems);
        Ok(Self { config, registry, backend, assembly: None })
    }

    /// Create a new builder with the default configuration.
    pub fn with_backend(backend: B) -> Self {
        let config = Config::default();
        let registry = Registry::new(config.max_subsystems);
        Self { config, registry, backend, assembly: None }
    }

    /// Return the active configuration.
    pub fn config(&self) -> &Config { &self.config }

    /// Return the subsystem registry.
    pub fn registry(&self) -> &Registry { &self.registry }

    /// Return the backend.
    pub fn backend(&self) -> &B { &self.backend }

    /// Return the composite dimension `N`.
    pub fn total_levels(&self) -> usize { self.registry.total_levels() }

    /// Return `true` once the first term has been added.
    pub fn is_finalized(&self) -> bool { self.registry.is_finalized() }

    /// Add a ladder-type subsystem. See [`Registry::create_subsystem`].
    pub fn create_subsystem(&mut self, levels: usize) -> Result<Subsystem> {
        self.registry.create_subsystem(levels)
    }

    /// Add a two-level subsystem.
    pub fn create_qubit(&mut self) -> Result<Subsystem> {
        self.registry.create_qubit()
    }

    /// Add a discrete-basis subsystem. See [`Registry::create_basis_set`].
    pub fn create_basis_set(&mut self, levels: usize) -> Result<Vec<Op>> {
        self.registry.create_basis_set(levels)
    }

    // freeze the registry and allocate the superoperator on first use
    fn ensure_finalized(&mut self) -> Result<Kron> {
        if let Some(asm) = self.assembly.as_ref() {
            return Ok(asm.kron);
        }
        if self.registry.state() == Lifecycle::Uninitialized {
            return Err(Error::UninitializedRuntime);
        }
        let n = self.registry.total_levels();
        let dim = n.checked_mul(n)
            .ok_or_else(|| overflow(format!("superoperator dimension {}²", n)))?;
        let nnz_per_row = self.config.nnz_per_row_factor.checked_mul(n)
            .ok_or_else(|| overflow(format!(
                "{} nonzeros per row for dimension {}",
                self.config.nnz_per_row_factor, n,
            )))?;
        let rank = self.backend.current_rank();
        let diag = &self.config.diagnostics;
        let keep_dense = diag.dense_hamiltonian && rank == diag.designated_rank;
        let dense_bytes = dim.checked_mul(std::mem::size_of::<f64>())
            .filter(|&bytes| bytes <= isize::MAX as usize);
        if keep_dense && dense_bytes.is_none() {
            return Err(overflow(format!("dense {}×{} Hamiltonian", n, n)));
        }
        let matrix = self.backend.allocate_matrix(dim, dim, nnz_per_row)?;
        self.registry.finalize()?;
        let dense = keep_dense.then(|| nd::Array2::zeros((n, n)));
        info!(
            total_levels = n,
            superoperator_dim = dim,
            nnz_per_row,
            rank,
            dense = dense.is_some(),
            "finalized composite space",
        );
        self.assembly = Some(Assembly {
            kron: Kron::new(n),
            matrix,
            dense,
            assembled: false,
        });
        Ok(Kron::new(n))
    }

    // reject operators that were not created by this builder's registry
    fn check_factors(&self, product: &Product) -> Result<()> {
        if self.registry.state() == Lifecycle::Uninitialized {
            return Err(Error::UninitializedRuntime);
        }
        let factors
            = match product {
                Product::Single(f) => vec![f],
                Product::Pair(f1, f2) => vec![f1, f2],
            };
        match factors.into_iter()
            .find(|f| !self.registry.has_subsystem(f.n_before, f.levels()))
        {
            Some(f) => Err(Error::invalid_combination(format!(
                "no {}-level subsystem at stride {} in this composite space",
                f.levels(), f.n_before,
            ))),
            None => Ok(()),
        }
    }

    fn assembly(&self) -> Result<&Assembly<B::Matrix>> {
        self.assembly.as_ref().ok_or(Error::UninitializedRuntime)
    }

    // send coeff * product, embedded, to the backend
    fn emit(&mut self, product: &Product, embedding: Embedding, coeff: C64)
        -> Result<()>
    {
        let Self { backend, assembly, .. } = self;
        let asm = assembly.as_mut().ok_or(Error::UninitializedRuntime)?;
        let matrix = &mut asm.matrix;
        asm.kron.emit(product, embedding, coeff, |r, c, v| {
            backend.insert(matrix, r, c, v)
        })?;
        Ok(())
    }

    // send coeff * (C ⊗ C) to the backend
    fn emit_doubled(&mut self, local: &LocalOp, n_before: usize, coeff: C64)
        -> Result<()>
    {
        let Self { backend, assembly, .. } = self;
        let asm = assembly.as_mut().ok_or(Error::UninitializedRuntime)?;
        let matrix = &mut asm.matrix;
        asm.kron.emit_doubled(local, n_before, coeff, |r, c, v| {
            backend.insert(matrix, r, c, v)
        })?;
        Ok(())
    }

    // accumulate coeff * product into the dense operator-space Hamiltonian, if
    // it is being kept
    fn emit_dense(&mut self, product: &Product, coeff: f64) {
        let Some(asm) = self.assembly.as_mut() else { return; };
        let kron = asm.kron;
        let Some(dense) = asm.dense.as_mut() else { return; };
        kron.emit(product, Embedding::operator_space(), C64::from(coeff), |r, c, v| {
            dense[[r, c]] += v.re;
            Ok::<(), Infallible>(())
        })
        .unwrap_or_else(|never| match never { });
    }

    /// Complete assembly of the superoperator and return it.
    ///
    /// Finalizes the registry if no term has been added yet, so a builder
    /// with subsystems but no terms yields an all-zero matrix. Calling this
    /// more than once is a no-op; adding terms afterward fails with the
    /// backend's error.
    pub fn assemble(&mut self) -> Result<&B::Matrix> {
        self.ensure_finalized()?;
        let Self { backend, assembly, .. } = self;
        let asm = assembly.as_mut().ok_or(Error::UninitializedRuntime)?;
        if !asm.assembled {
            backend.finalize_assembly(&mut asm.matrix)?;
            asm.assembled = true;
            debug!("assembled superoperator");
        }
        Ok(&asm.matrix)
    }

    /// Return the superoperator, if it has been allocated.
    pub fn matrix(&self) -> Option<&B::Matrix> {
        self.assembly.as_ref().map(|asm| &asm.matrix)
    }

    /// Return the dense operator-space Hamiltonian, if it is kept on this
    /// rank and at least one term has been added.
    pub fn dense_hamiltonian(&self) -> Option<&nd::Array2<f64>> {
        self.assembly.as_ref().and_then(|asm| asm.dense.as_ref())
    }

    // None on ranks that do not write diagnostics
    fn dense_for_output(&self) -> Result<Option<&nd::Array2<f64>>> {
        let diag = &self.config.diagnostics;
        let rank = self.backend.current_rank();
        if rank != diag.designated_rank {
            return Ok(None);
        }
        if !diag.dense_hamiltonian {
            warn!("dense Hamiltonian output requested but disabled by configuration");
            return Ok(None);
        }
        Ok(self.assembly()?.dense.as_ref())
    }

    /// Write the dense operator-space Hamiltonian as text to `path`, one
    /// whitespace-separated row per line.
    ///
    /// Only the designated rank writes anything; on every other rank, and
    /// when the dense Hamiltonian is disabled, this is a no-op. Fails with
    /// [`Error::UninitializedRuntime`] if no term has been added.
    pub fn write_hamiltonian<P>(&self, path: P) -> Result<()>
    where P: AsRef<Path>
    {
        let Some(dense) = self.dense_for_output()? else { return Ok(()); };
        let mut out = BufWriter::new(File::create(path.as_ref())?);
        for row in dense.rows() {
            writeln!(out, "{}", row.iter().map(|x| fmt_sci(*x)).join(" "))?;
        }
        out.flush()?;
        debug!(path = %path.as_ref().display(), "wrote dense Hamiltonian");
        Ok(())
    }

    /// Write the dense Hamiltonian to the configured output path.
    pub fn print_hamiltonian(&self) -> Result<()> {
        self.write_hamiltonian(&self.config.diagnostics.output)
    }

    /// Write the dense operator-space Hamiltonian to `path` in `.npy` format.
    ///
    /// Follows the same rank rules as [`Self::write_hamiltonian`].
    pub fn write_hamiltonian_npy<P>(&self, path: P) -> Result<()>
    where P: AsRef<Path>
    {
        let Some(dense) = self.dense_for_output()? else { return Ok(()); };
        ndarray_npy::write_npy(path, dense)?;
        Ok(())
    }
}

impl<B> Default for Liouvillian<B>
where B: SparseBackend + Default
{
    fn default() -> Self { Self::with_backend(B::default()) }
}

impl Liouvillian<LocalBackend> {
    /// Create a new single-process builder with the default configuration.
    pub fn local() -> Self { Self::default() }
}

fn overflow(what: String) -> Error {
    BackendError::Allocation(format!("{} overflows usize", what)).into()
}

// C-style `%e` formatting: six fractional digits and a signed, two-digit
// exponent
fn fmt_sci(x: f64) -> String {
    let s = format!("{:.6e}", x);
    match s.split_once('e') {
        Some((mant, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mant, sign, exp.abs())
        },
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sci_format() {
        assert_eq!(fmt_sci(1.0), "1.000000e+00");
        assert_eq!(fmt_sci(0.0), "0.000000e+00");
        assert_eq!(fmt_sci(-2.5e-7), "-2.500000e-07");
        assert_eq!(fmt_sci(1.0e123), "1.000000e+123");
    }

    #[test]
    fn allocation_on_first_term() {
        let mut liou = Liouvillian::local();
        let q = liou.create_qubit().unwrap();
        liou.create_subsystem(3).unwrap();
        assert!(liou.matrix().is_none());
        liou.add_term(1.0, &q.number()).unwrap();
        assert!(liou.is_finalized());
        assert_eq!(liou.matrix().unwrap().shape(), (36, 36));
        assert!(matches!(liou.create_qubit(), Err(Error::FinalizedState)));
    }

    #[test]
    fn assemble_without_terms() {
        let mut liou = Liouvillian::local();
        assert!(matches!(liou.assemble(), Err(Error::UninitializedRuntime)));
        liou.create_qubit().unwrap();
        let m = liou.assemble().unwrap();
        assert_eq!(m.nnz(), 0);
        assert!(m.is_assembled());
    }

    #[test]
    fn terms_after_assembly_fail() {
        let mut liou = Liouvillian::local();
        let q = liou.create_qubit().unwrap();
        liou.add_term(1.0, &q.number()).unwrap();
        liou.assemble().unwrap();
        liou.assemble().unwrap();
        assert!(matches!(
            liou.add_term(1.0, &q.number()),
            Err(Error::Backend(BackendError::AlreadyAssembled))
        ));
    }

    #[test]
    fn dense_only_on_designated_rank() {
        let mut liou = Liouvillian::with_backend(LocalBackend::with_rank(1, 2));
        let q = liou.create_qubit().unwrap();
        liou.add_term(1.0, &q.number()).unwrap();
        assert!(liou.dense_hamiltonian().is_none());

        let config = Config::default().with_dense_hamiltonian(false);
        let mut liou = Liouvillian::new(config, LocalBackend::new()).unwrap();
        let q = liou.create_qubit().unwrap();
        liou.add_term(1.0, &q.number()).unwrap();
        assert!(liou.dense_hamiltonian().is_none());
    }

    #[test]
    fn oversized_space_is_an_error() {
        let mut liou = Liouvillian::local();
        let qubits: Vec<Subsystem>
            = (0..usize::BITS / 2 + 1)
            .map(|_| liou.create_qubit().unwrap())
            .collect();
        assert!(matches!(
            liou.add_term(1.0, &qubits[0].number()),
            Err(Error::Backend(BackendError::Allocation(_)))
        ));
        assert!(!liou.is_finalized());
        assert!(liou.matrix().is_none());

        let mut config = Config::default();
        config.nnz_per_row_factor = usize::MAX;
        let mut liou = Liouvillian::new(config, LocalBackend::new()).unwrap();
        let q = liou.create_qubit().unwrap();
        assert!(matches!(
            liou.add_dissipator(1.0, &q.lower()),
            Err(Error::Backend(BackendError::Allocation(_)))
        ));
        assert!(!liou.is_finalized());
    }

    #[test]
    fn invalid_config() {
        let config = Config::default().with_max_subsystems(0);
        assert!(matches!(
            Liouvillian::new(config, LocalBackend::new()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn text_dump() {
        let mut liou = Liouvillian::local();
        let q = liou.create_qubit().unwrap();
        liou.add_term(2.0, &q.number()).unwrap();
        let path = std::env::temp_dir()
            .join(format!("lindblad-kron-dump-{}.txt", std::process::id()));
        liou.write_hamiltonian(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(
            text,
            "0.000000e+00 0.000000e+00\n0.000000e+00 2.000000e+00\n",
        );
    }
}
