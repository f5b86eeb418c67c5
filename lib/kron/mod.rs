//! Direct enumeration of the nonzero elements of Kronecker-embedded operators.
//!
//! An operator `M` acting on one subsystem of a composite space is the
//! Kronecker product `I_before ⊗ M ⊗ I_after`, where `before` is the product of
//! the level counts of all subsystems to its left and `after` the product of
//! those to its right. Every factor here has at most one nonzero per row, so
//! the nonzeros of the full product are listed in closed form without ever
//! forming the product:
//! ```text
//! row = (i_before · d + i) · after + i_after
//! col = (i_before · d + j) · after + i_after
//! ```
//! for each local nonzero `M[i, j]`. Two factors on different subsystems
//! generalize this with an identity block `I_between` between them:
//! ```text
//! row = (((i_before · d1 + i1) · between + i_between) · d2 + i2) · after + i_after
//! ```
//!
//! An [`Embedding`] adds further identity blocks outside the whole composite
//! space; this is how operators are placed into the doubled (Liouville) space,
//! where `extra_before = N` gives `I_N ⊗ M` and `extra_after = N` gives
//! `M ⊗ I_N`. Folding the extra blocks into `before` and `after` leaves the
//! index formula unchanged.

use num_complex::Complex64 as C64;

pub mod local;
pub use local::{ Band, LocalOp };

pub mod product;
pub use product::{ Factor, Product };

/// Sizes of the identity blocks placed outside the composite space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Embedding {
    pub extra_before: usize,
    pub extra_after: usize,
}

impl Embedding {
    /// The plain operator space, with no extra identity blocks.
    pub fn operator_space() -> Self { Self { extra_before: 1, extra_after: 1 } }

    /// `I_N ⊗ M` in the doubled space, for composite dimension `N`.
    pub fn left_identity(total_levels: usize) -> Self {
        Self { extra_before: total_levels, extra_after: 1 }
    }

    /// `M ⊗ I_N` in the doubled space, for composite dimension `N`.
    pub fn right_identity(total_levels: usize) -> Self {
        Self { extra_before: 1, extra_after: total_levels }
    }
}

/// Index generator for a composite space of fixed dimension.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Kron {
    total_levels: usize,
}

impl Kron {
    /// Create a new index generator for composite dimension `total_levels`.
    pub fn new(total_levels: usize) -> Self { Self { total_levels } }

    /// Return the composite dimension.
    pub fn total_levels(&self) -> usize { self.total_levels }

    /// Return the dimension of the space described by an embedding.
    pub fn dim(&self, embedding: Embedding) -> usize {
        embedding.extra_before * self.total_levels * embedding.extra_after
    }

    fn n_after(&self, factor: &Factor) -> usize {
        self.total_levels / (factor.n_before * factor.levels())
    }

    /// Pass every nonzero `(row, col, value)` of `coeff · product`, embedded
    /// according to `embedding`, to `sink`.
    ///
    /// Stops at the first error returned by `sink`.
    pub fn emit<F, E>(
        &self,
        product: &Product,
        embedding: Embedding,
        coeff: C64,
        mut sink: F,
    ) -> Result<(), E>
    where F: FnMut(usize, usize, C64) -> Result<(), E>
    {
        match product {
            Product::Single(f) => {
                let before = embedding.extra_before * f.n_before;
                let after = self.n_after(f) * embedding.extra_after;
                embed_one(&f.local, before, after, coeff, &mut sink)
            },
            Product::Pair(f1, f2) => {
                let before = embedding.extra_before * f1.n_before;
                let between = f2.n_before / (f1.n_before * f1.levels());
                let after = self.n_after(f2) * embedding.extra_after;
                embed_two(
                    &f1.local, &f2.local, before, between, after, coeff, &mut sink)
            },
        }
    }

    /// Pass every nonzero of `coeff · (C ⊗ C)` to `sink`, where `C = I_before ⊗
    /// local ⊗ I_after` is a full-space operator with stride `n_before`.
    ///
    /// Both copies of `C` live in the doubled space, separated by an identity
    /// block of size `after · before`.
    pub fn emit_doubled<F, E>(
        &self,
        local: &LocalOp,
        n_before: usize,
        coeff: C64,
        mut sink: F,
    ) -> Result<(), E>
    where F: FnMut(usize, usize, C64) -> Result<(), E>
    {
        let n_after = self.total_levels / (n_before * local.levels());
        embed_two(
            local, local, n_before, n_after * n_before, n_after, coeff, &mut sink)
    }
}

/// Nonzeros of `coeff · (I_before ⊗ local ⊗ I_after)`.
pub fn embed_one<F, E>(
    local: &LocalOp,
    before: usize,
    after: usize,
    coeff: C64,
    sink: &mut F,
) -> Result<(), E>
where F: FnMut(usize, usize, C64) -> Result<(), E>
{
    let d = local.levels();
    match local {
        LocalOp::Element { row, col, .. } => {
            embed_element(d, (*row, *col), before, after, coeff, sink)
        },
        LocalOp::Band(band) => {
            let entries = band.entries();
            for ib in 0..before {
                for &(i, j, v) in entries.iter() {
                    let r0 = (ib * d + i) * after;
                    let c0 = (ib * d + j) * after;
                    let val = coeff * v;
                    for ia in 0..after {
                        sink(r0 + ia, c0 + ia, val)?;
                    }
                }
            }
            Ok(())
        },
    }
}

/// Nonzeros of `coeff · (I_before ⊗ |row⟩⟨col| ⊗ I_after)` for a
/// `levels`-dimensional local space.
///
/// The local matrix has a single nonzero, so only the identity blocks are
/// looped over.
pub fn embed_element<F, E>(
    levels: usize,
    (row, col): (usize, usize),
    before: usize,
    after: usize,
    coeff: C64,
    sink: &mut F,
) -> Result<(), E>
where F: FnMut(usize, usize, C64) -> Result<(), E>
{
    for ib in 0..before {
        let r0 = (ib * levels + row) * after;
        let c0 = (ib * levels + col) * after;
        for ia in 0..after {
            sink(r0 + ia, c0 + ia, coeff)?;
        }
    }
    Ok(())
}

/// Nonzeros of `coeff · (I_before ⊗ local1 ⊗ I_between ⊗ local2 ⊗ I_after)`.
pub fn embed_two<F, E>(
    local1: &LocalOp,
    local2: &LocalOp,
    before: usize,
    between: usize,
    after: usize,
    coeff: C64,
    sink: &mut F,
) -> Result<(), E>
where F: FnMut(usize, usize, C64) -> Result<(), E>
{
    if let (
        LocalOp::Element { levels: d1, row: r1, col: c1 },
        LocalOp::Element { levels: d2, row: r2, col: c2 },
    ) = (local1, local2) {
        return embed_element_pair(
            (*d1, *r1, *c1), (*d2, *r2, *c2), before, between, after, coeff, sink);
    }
    let d1 = local1.levels();
    let d2 = local2.levels();
    let entries1 = local1.entries();
    let entries2 = local2.entries();
    for ib in 0..before {
        for &(i1, j1, v1) in entries1.iter() {
            let r1 = (ib * d1 + i1) * between;
            let c1 = (ib * d1 + j1) * between;
            for ibt in 0..between {
                for &(i2, j2, v2) in entries2.iter() {
                    let r0 = ((r1 + ibt) * d2 + i2) * after;
                    let c0 = ((c1 + ibt) * d2 + j2) * after;
                    let val = coeff * (v1 * v2);
                    for ia in 0..after {
                        sink(r0 + ia, c0 + ia, val)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Nonzeros of `coeff · (I_before ⊗ |r1⟩⟨c1| ⊗ I_between ⊗ |r2⟩⟨c2| ⊗
/// I_after)`, with each local element given as `(levels, row, col)`.
pub fn embed_element_pair<F, E>(
    (d1, r1, c1): (usize, usize, usize),
    (d2, r2, c2): (usize, usize, usize),
    before: usize,
    between: usize,
    after: usize,
    coeff: C64,
    sink: &mut F,
) -> Result<(), E>
where F: FnMut(usize, usize, C64) -> Result<(), E>
{
    for ib in 0..before {
        let rb = (ib * d1 + r1) * between;
        let cb = (ib * d1 + c1) * between;
        for ibt in 0..between {
            let r0 = ((rb + ibt) * d2 + r2) * after;
            let c0 = ((cb + ibt) * d2 + c2) * after;
            for ia in 0..after {
                sink(r0 + ia, c0 + ia, coeff)?;
            }
        }
    }
    Ok(())
}
