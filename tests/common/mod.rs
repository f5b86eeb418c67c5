#![allow(dead_code)]

//! Dense reference matrices for checking assembled superoperators.

use ndarray::{ self as nd, linalg::kron };
use num_complex::Complex64 as C64;
use rand::Rng;

pub fn c(re: f64) -> C64 { C64::new(re, 0.0) }

pub fn eye(n: usize) -> nd::Array2<C64> { nd::Array2::eye(n) }

/// Truncated annihilation operator.
pub fn lower(d: usize) -> nd::Array2<C64> {
    let mut a: nd::Array2<C64> = nd::Array2::zeros((d, d));
    (0..d - 1).for_each(|i| { a[[i, i + 1]] = c(((i + 1) as f64).sqrt()); });
    a
}

/// Truncated creation operator.
pub fn raise(d: usize) -> nd::Array2<C64> { lower(d).t().to_owned() }

/// Number operator.
pub fn number(d: usize) -> nd::Array2<C64> {
    nd::Array2::from_diag(&(0..d).map(|i| c(i as f64)).collect::<nd::Array1<C64>>())
}

/// `|row⟩⟨col|` in `d` dimensions.
pub fn element(d: usize, row: usize, col: usize) -> nd::Array2<C64> {
    let mut m: nd::Array2<C64> = nd::Array2::zeros((d, d));
    m[[row, col]] = c(1.0);
    m
}

/// Place `local` on subsystem `k` of a composite space with the given level
/// counts, first subsystem leftmost.
pub fn embed(levels: &[usize], k: usize, local: &nd::Array2<C64>) -> nd::Array2<C64> {
    let before: usize = levels[..k].iter().product();
    let after: usize = levels[k + 1..].iter().product();
    kron(&kron(&eye(before), local), &eye(after))
}

pub fn dagger(m: &nd::Array2<C64>) -> nd::Array2<C64> {
    m.t().mapv(|x| x.conj())
}

/// `-i[H, ρ]`.
pub fn commutator(h: &nd::Array2<C64>, rho: &nd::Array2<C64>) -> nd::Array2<C64> {
    (h.dot(rho) - rho.dot(h)).mapv(|x| -C64::i() * x)
}

/// `a (C ρ C† - ½ {C†C, ρ})`.
pub fn dissipator(a: f64, jump: &nd::Array2<C64>, rho: &nd::Array2<C64>)
    -> nd::Array2<C64>
{
    let jd = dagger(jump);
    let jdj = jd.dot(jump);
    let sandwich = jump.dot(rho).dot(&jd);
    let anti = jdj.dot(rho) + rho.dot(&jdj);
    (sandwich - anti.mapv(|x| 0.5 * x)).mapv(|x| a * x)
}

/// Random density matrix `A A† / tr(A A†)`.
pub fn random_density<R>(rng: &mut R, n: usize) -> nd::Array2<C64>
where R: Rng
{
    let a: nd::Array2<C64>
        = nd::Array2::from_shape_fn((n, n), |_| {
            C64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
        });
    let rho = a.dot(&dagger(&a));
    let tr: C64 = rho.diag().iter().sum();
    rho.mapv(|x| x / tr)
}

pub fn assert_close(lhs: &nd::Array1<C64>, rhs: &nd::Array1<C64>, eps: f64) {
    assert_eq!(lhs.len(), rhs.len());
    for (k, (l, r)) in lhs.iter().zip(rhs).enumerate() {
        assert!(
            (l - r).norm() <= eps,
            "mismatch at {}: {} vs {}", k, l, r,
        );
    }
}
