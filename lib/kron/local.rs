//! Local (single-subsystem) matrices.
//!
//! Every operator handled here is either a *band*, with all nonzeros on one
//! diagonal at a fixed offset, or a single *element* `|r⟩⟨c|`. Both have at
//! most one nonzero per row, which is what lets the indexer enumerate the
//! nonzeros of a Kronecker product directly.

use crate::operator::{ Op, OpKind, Transition };

/// A `levels × levels` matrix whose only nonzeros sit at `(i, i + offset)`.
///
/// Positive offsets are above the main diagonal, negative offsets below.
#[derive(Clone, Debug, PartialEq)]
pub struct Band {
    levels: usize,
    offset: isize,
    // values[i] is the element in row i; rows whose column would fall outside
    // the matrix hold zero
    values: Vec<f64>,
}

impl Band {
    fn from_fn<F>(levels: usize, offset: isize, f: F) -> Self
    where F: Fn(usize) -> f64
    {
        let values: Vec<f64>
            = (0..levels)
            .map(|i| {
                if Self::col_in(levels, offset, i).is_some() { f(i) } else { 0.0 }
            })
            .collect();
        Self { levels, offset, values }
    }

    fn col_in(levels: usize, offset: isize, i: usize) -> Option<usize> {
        let j = i as isize + offset;
        (0..levels as isize).contains(&j).then_some(j as usize)
    }

    /// Truncated annihilation operator: `a[i, i + 1] = sqrt(i + 1)`.
    pub fn lower(levels: usize) -> Self {
        Self::from_fn(levels, 1, |i| ((i + 1) as f64).sqrt())
    }

    /// Truncated creation operator: `a†[i, i - 1] = sqrt(i)`.
    pub fn raise(levels: usize) -> Self {
        Self::from_fn(levels, -1, |i| (i as f64).sqrt())
    }

    /// Number operator: `n[i, i] = i`.
    pub fn number(levels: usize) -> Self {
        Self::from_fn(levels, 0, |i| i as f64)
    }

    /// Return the matrix dimension.
    pub fn levels(&self) -> usize { self.levels }

    /// Return the diagonal offset.
    pub fn offset(&self) -> isize { self.offset }

    /// Return the element in row `i`, i.e. at `(i, i + offset)`.
    pub fn value(&self, i: usize) -> f64 {
        self.values.get(i).copied().unwrap_or(0.0)
    }

    /// Return the column paired with row `i`, if it lies inside the matrix.
    pub fn col(&self, i: usize) -> Option<usize> {
        Self::col_in(self.levels, self.offset, i)
    }

    /// Return all nonzero elements as `(row, col, value)`.
    pub fn entries(&self) -> Vec<(usize, usize, f64)> {
        self.values.iter().enumerate()
            .filter(|(_, v)| **v != 0.0)
            .filter_map(|(i, v)| self.col(i).map(|j| (i, j, *v)))
            .collect()
    }

    /// Return the transpose.
    pub fn transpose(&self) -> Self {
        let offset = -self.offset;
        let values: Vec<f64>
            = (0..self.levels)
            .map(|i| {
                Self::col_in(self.levels, offset, i)
                    .map(|j| self.values[j])
                    .unwrap_or(0.0)
            })
            .collect();
        Self { levels: self.levels, offset, values }
    }

    /// Return the matrix product `self · rhs`.
    ///
    /// *Panics* if the two bands have different dimensions.
    pub fn compose(&self, rhs: &Self) -> Self {
        assert_eq!(self.levels, rhs.levels, "Band::compose: dimension mismatch");
        let offset = self.offset + rhs.offset;
        let values: Vec<f64>
            = (0..self.levels)
            .map(|i| {
                self.col(i)
                    .and_then(|j| rhs.col(j).map(|_| self.values[i] * rhs.values[j]))
                    .unwrap_or(0.0)
            })
            .collect();
        Self { levels: self.levels, offset, values }
    }
}

/// Local matrix of a single factor in a Kronecker product.
#[derive(Clone, Debug, PartialEq)]
pub enum LocalOp {
    /// A single nonzero diagonal.
    Band(Band),
    /// A single unit element `|row⟩⟨col|`.
    Element { levels: usize, row: usize, col: usize },
}

impl LocalOp {
    /// Return the local matrix of an operator. A lone basis operator `|k⟩` is
    /// the projector `|k⟩⟨k|`.
    pub fn from_op(op: &Op) -> Self {
        let levels = op.levels();
        match op.kind() {
            OpKind::Lower => Self::Band(Band::lower(levels)),
            OpKind::Raise => Self::Band(Band::raise(levels)),
            OpKind::Number => Self::Band(Band::number(levels)),
            OpKind::Basis(k) => Self::Element { levels, row: k, col: k },
        }
    }

    /// Return the local matrix of a basis transition.
    pub fn from_transition(t: &Transition) -> Self {
        Self::Element { levels: t.levels(), row: t.to(), col: t.from() }
    }

    /// Return the matrix dimension.
    pub fn levels(&self) -> usize {
        match self {
            Self::Band(band) => band.levels(),
            Self::Element { levels, .. } => *levels,
        }
    }

    /// Return all nonzero elements as `(row, col, value)`.
    pub fn entries(&self) -> Vec<(usize, usize, f64)> {
        match self {
            Self::Band(band) => band.entries(),
            Self::Element { row, col, .. } => vec![(*row, *col, 1.0)],
        }
    }

    /// Return the transpose.
    pub fn transpose(&self) -> Self {
        match self {
            Self::Band(band) => Self::Band(band.transpose()),
            Self::Element { levels, row, col } => {
                Self::Element { levels: *levels, row: *col, col: *row }
            },
        }
    }

    /// Return `M† M` for a real local matrix `M`.
    pub fn dagger_self(&self) -> Self {
        match self {
            Self::Band(band) => Self::Band(band.transpose().compose(band)),
            Self::Element { levels, col, .. } => {
                Self::Element { levels: *levels, row: *col, col: *col }
            },
        }
    }

    /// Return a dense representation, for tests and diagnostics.
    pub fn to_dense(&self) -> ndarray::Array2<f64> {
        let n = self.levels();
        let mut m: ndarray::Array2<f64> = ndarray::Array2::zeros((n, n));
        self.entries().into_iter()
            .for_each(|(i, j, v)| { m[[i, j]] += v; });
        m
    }
}
