//! The sparse-matrix collaborator that receives assembled entries.
//!
//! Assembly code never stores matrix elements itself; it hands each
//! `(row, col, value)` triple to a [`SparseBackend`], which owns storage,
//! accumulation, and any routing of entries between processes. Every process
//! runs the same assembly and emits the same triples, so a distributed backend
//! only needs to keep the rows it owns.
//!
//! [`LocalBackend`] is the in-process implementation, storing its rows in a
//! [`CooMatrix`].

use std::ops::Range;
use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use rustc_hash::FxHashMap as HashMap;
use thiserror::Error;

/// Errors raised by a [`SparseBackend`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// An entry fell outside the matrix.
    #[error("entry ({row}, {col}) out of bounds for a {rows}×{cols} matrix")]
    OutOfBounds { row: usize, col: usize, rows: usize, cols: usize },

    /// An entry was inserted after assembly was finalized.
    #[error("matrix has already been assembled")]
    AlreadyAssembled,

    /// The backend could not allocate the requested matrix.
    #[error("allocation failed: {0}")]
    Allocation(String),
}

/// Storage and communication substrate for the assembled superoperator.
pub trait SparseBackend {
    /// Handle to an allocated matrix.
    type Matrix;

    /// Allocate a `rows × cols` matrix, reserving roughly `nnz_per_row`
    /// nonzeros in each row.
    fn allocate_matrix(&mut self, rows: usize, cols: usize, nnz_per_row: usize)
        -> Result<Self::Matrix, BackendError>;

    /// Add `value` to the element at `(row, col)`.
    fn insert(&mut self, matrix: &mut Self::Matrix, row: usize, col: usize, value: C64)
        -> Result<(), BackendError>;

    /// Complete assembly; no insertions are allowed afterward.
    fn finalize_assembly(&mut self, matrix: &mut Self::Matrix)
        -> Result<(), BackendError>;

    /// Rank of the calling process.
    fn current_rank(&self) -> usize;
}

/// Largest number of entries reserved when a matrix is allocated.
pub const MAX_RESERVED: usize = 1 << 16;

/// Coordinate-format sparse matrix holding a contiguous block of rows.
#[derive(Clone, Debug)]
pub struct CooMatrix {
    rows: usize,
    cols: usize,
    owned: Range<usize>,
    data: HashMap<(usize, usize), C64>,
    assembled: bool,
}

impl CooMatrix {
    /// Create a new, empty matrix that stores only the rows in `owned`.
    pub fn new(rows: usize, cols: usize, owned: Range<usize>) -> Self {
        Self {
            rows,
            cols,
            owned,
            data: HashMap::default(),
            assembled: false,
        }
    }

    // `cap` is only a hint; at most `MAX_RESERVED` entries are reserved up
    // front and the map grows as needed past that
    fn with_capacity(rows: usize, cols: usize, owned: Range<usize>, cap: usize)
        -> Result<Self, BackendError>
    {
        let mut new = Self::new(rows, cols, owned);
        new.data.try_reserve(cap.min(MAX_RESERVED))
            .map_err(|err| BackendError::Allocation(err.to_string()))?;
        Ok(new)
    }

    /// Return `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) { (self.rows, self.cols) }

    /// Return the range of rows stored locally.
    pub fn owned_rows(&self) -> Range<usize> { self.owned.clone() }

    /// Return `true` once assembly has been finalized.
    pub fn is_assembled(&self) -> bool { self.assembled }

    /// Return the number of stored elements.
    pub fn nnz(&self) -> usize { self.data.len() }

    /// Return the element at `(row, col)`, or zero if it is not stored.
    pub fn get(&self, row: usize, col: usize) -> C64 {
        self.data.get(&(row, col)).copied().unwrap_or_else(C64::zero)
    }

    /// Return all stored elements as `(row, col, value)`, sorted by position.
    pub fn triplets(&self) -> Vec<(usize, usize, C64)> {
        let mut trips: Vec<(usize, usize, C64)>
            = self.data.iter()
            .map(|(&(r, c), &v)| (r, c, v))
            .collect();
        trips.sort_by_key(|(r, c, _)| (*r, *c));
        trips
    }

    /// Return a dense copy of the matrix; rows not stored locally are zero.
    pub fn to_dense(&self) -> nd::Array2<C64> {
        let mut dense: nd::Array2<C64> = nd::Array2::zeros((self.rows, self.cols));
        self.data.iter()
            .for_each(|(&(r, c), &v)| { dense[[r, c]] += v; });
        dense
    }

    /// Compute the matrix-vector product with the locally stored rows.
    ///
    /// *Panics* if `x` does not have length equal to the number of columns.
    pub fn matvec(&self, x: &nd::Array1<C64>) -> nd::Array1<C64> {
        assert_eq!(x.len(), self.cols, "CooMatrix::matvec: dimension mismatch");
        let mut y: nd::Array1<C64> = nd::Array1::zeros(self.rows);
        self.data.iter()
            .for_each(|(&(r, c), &v)| { y[r] += v * x[c]; });
        y
    }

    fn add(&mut self, row: usize, col: usize, value: C64)
        -> Result<(), BackendError>
    {
        if self.assembled { return Err(BackendError::AlreadyAssembled); }
        if row >= self.rows || col >= self.cols {
            return Err(BackendError::OutOfBounds {
                row, col, rows: self.rows, cols: self.cols,
            });
        }
        if self.owned.contains(&row) {
            *self.data.entry((row, col)).or_insert_with(C64::zero) += value;
        }
        Ok(())
    }
}

/// In-process [`SparseBackend`].
///
/// With `num_ranks > 1` this stands in for one process of a distributed run:
/// rows are split into contiguous blocks, one per rank, and entries belonging
/// to other ranks' rows are dropped, since those ranks generate them
/// independently.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LocalBackend {
    rank: usize,
    num_ranks: usize,
}

impl Default for LocalBackend {
    fn default() -> Self { Self { rank: 0, num_ranks: 1 } }
}

impl LocalBackend {
    /// A single process owning every row.
    pub fn new() -> Self { Self::default() }

    /// Process `rank` of `num_ranks`.
    ///
    /// *Panics* if `rank >= num_ranks`.
    pub fn with_rank(rank: usize, num_ranks: usize) -> Self {
        assert!(rank < num_ranks, "LocalBackend::with_rank: rank out of range");
        Self { rank, num_ranks }
    }

    /// Return the total number of ranks.
    pub fn num_ranks(&self) -> usize { self.num_ranks }

    /// Return the rows owned by `rank` out of `rows`.
    ///
    /// The first `rows % num_ranks` ranks get one extra row.
    pub fn row_block(&self, rows: usize, rank: usize) -> Range<usize> {
        let base = rows / self.num_ranks;
        let extra = rows % self.num_ranks;
        let start = rank * base + rank.min(extra);
        let len = base + usize::from(rank < extra);
        start..start + len
    }
}

impl SparseBackend for LocalBackend {
    type Matrix = CooMatrix;

    fn allocate_matrix(&mut self, rows: usize, cols: usize, nnz_per_row: usize)
        -> Result<Self::Matrix, BackendError>
    {
        let owned = self.row_block(rows, self.rank);
        let cap = owned.len().checked_mul(nnz_per_row.min(cols))
            .ok_or_else(|| {
                BackendError::Allocation(
                    format!("capacity overflow for {} rows", owned.len())
                )
            })?;
        CooMatrix::with_capacity(rows, cols, owned, cap)
    }

    fn insert(&mut self, matrix: &mut Self::Matrix, row: usize, col: usize, value: C64)
        -> Result<(), BackendError>
    {
        matrix.add(row, col, value)
    }

    fn finalize_assembly(&mut self, matrix: &mut Self::Matrix)
        -> Result<(), BackendError>
    {
        // explicit zeros from cancelling contributions are not kept
        matrix.data.retain(|_, v| !v.is_zero());
        matrix.assembled = true;
        Ok(())
    }

    fn current_rank(&self) -> usize { self.rank }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates() {
        let mut backend = LocalBackend::new();
        let mut m = backend.allocate_matrix(3, 3, 2).unwrap();
        backend.insert(&mut m, 0, 1, C64::new(1.0, 0.0)).unwrap();
        backend.insert(&mut m, 0, 1, C64::new(0.5, 2.0)).unwrap();
        backend.insert(&mut m, 2, 2, C64::new(-1.0, 0.0)).unwrap();
        assert_eq!(m.get(0, 1), C64::new(1.5, 2.0));
        assert_eq!(m.nnz(), 2);
        assert_eq!(
            m.triplets(),
            vec![(0, 1, C64::new(1.5, 2.0)), (2, 2, C64::new(-1.0, 0.0))],
        );
    }

    #[test]
    fn bounds_and_assembly() {
        let mut backend = LocalBackend::new();
        let mut m = backend.allocate_matrix(2, 2, 1).unwrap();
        assert_eq!(
            backend.insert(&mut m, 2, 0, C64::zero()),
            Err(BackendError::OutOfBounds { row: 2, col: 0, rows: 2, cols: 2 }),
        );
        backend.insert(&mut m, 0, 0, C64::new(1.0, 0.0)).unwrap();
        backend.insert(&mut m, 0, 0, C64::new(-1.0, 0.0)).unwrap();
        backend.insert(&mut m, 1, 0, C64::new(3.0, 0.0)).unwrap();
        backend.finalize_assembly(&mut m).unwrap();
        assert!(m.is_assembled());
        assert_eq!(m.nnz(), 1);
        assert_eq!(
            backend.insert(&mut m, 1, 1, C64::zero()),
            Err(BackendError::AlreadyAssembled),
        );
    }

    #[test]
    fn capacity_hint_is_bounded() {
        let mut backend = LocalBackend::new();
        let n: usize = 1 << 12;
        let mut m = backend.allocate_matrix(n, n, 5 * n).unwrap();
        assert!(m.data.capacity() >= MAX_RESERVED);
        assert!(m.data.capacity() <= 2 * MAX_RESERVED);
        backend.insert(&mut m, n - 1, 0, C64::new(1.0, 0.0)).unwrap();
        assert_eq!(m.nnz(), 1);

        assert!(matches!(
            backend.allocate_matrix(usize::MAX, usize::MAX, usize::MAX),
            Err(BackendError::Allocation(_))
        ));
    }

    #[test]
    fn row_blocks_partition() {
        let backend = LocalBackend::with_rank(0, 3);
        let blocks: Vec<Range<usize>>
            = (0..3).map(|r| backend.row_block(10, r)).collect();
        assert_eq!(blocks, vec![0..4, 4..7, 7..10]);
    }

    #[test]
    fn foreign_rows_are_dropped() {
        let mut backend = LocalBackend::with_rank(1, 2);
        let mut m = backend.allocate_matrix(4, 4, 1).unwrap();
        assert_eq!(m.owned_rows(), 2..4);
        backend.insert(&mut m, 0, 0, C64::new(1.0, 0.0)).unwrap();
        backend.insert(&mut m, 3, 0, C64::new(1.0, 0.0)).unwrap();
        assert_eq!(m.nnz(), 1);
        assert_eq!(m.get(0, 0), C64::zero());
        assert_eq!(backend.current_rank(), 1);
    }

    #[test]
    fn matvec() {
        let mut backend = LocalBackend::new();
        let mut m = backend.allocate_matrix(2, 2, 2).unwrap();
        backend.insert(&mut m, 0, 1, C64::new(2.0, 0.0)).unwrap();
        backend.insert(&mut m, 1, 0, C64::i()).unwrap();
        let x = nd::array![C64::new(1.0, 0.0), C64::new(3.0, 0.0)];
        let y = m.matvec(&x);
        assert_eq!(y, nd::array![C64::new(6.0, 0.0), C64::new(0.0, 1.0)]);
    }
}
