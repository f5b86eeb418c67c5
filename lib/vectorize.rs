//! Column-stacking vectorization of density matrices.
//!
//! `vec(ρ)[j·N + i] = ρ[i, j]`, matching the index layout of the assembled
//! superoperator: the left Kronecker factor acts on the column index of `ρ`
//! and the right factor on the row index.

use ndarray as nd;
use num_complex::Complex64 as C64;

/// Stack the columns of `rho` into a single vector.
pub fn vectorize<S>(rho: &nd::ArrayBase<S, nd::Ix2>) -> nd::Array1<C64>
where S: nd::Data<Elem = C64>
{
    rho.t().iter().copied().collect()
}

/// Reshape a column-stacked vector back into an `n × n` matrix.
///
/// *Panics* if `v.len() != n * n`.
pub fn unvectorize<S>(v: &nd::ArrayBase<S, nd::Ix1>, n: usize) -> nd::Array2<C64>
where S: nd::Data<Elem = C64>
{
    assert_eq!(v.len(), n * n, "unvectorize: length is not n²");
    let mut rho: nd::Array2<C64> = nd::Array2::zeros((n, n));
    rho.view_mut().reversed_axes().iter_mut()
        .zip(v.iter())
        .for_each(|(r, x)| { *r = *x; });
    rho
}

/// Trace of the `n × n` matrix whose column-stacked form is `v`.
pub fn vectorized_trace<S>(v: &nd::ArrayBase<S, nd::Ix1>, n: usize) -> C64
where S: nd::Data<Elem = C64>
{
    (0..n).map(|k| v[k * n + k]).sum()
}
