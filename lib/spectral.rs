//! Deterministically ordered eigendecomposition of small dense matrices.
//!
//! [`decompose`] classifies its input on every call: Hermitian matrices go
//! through LAPACK's Hermitian solver (`zheevd`), which returns real eigenvalues
//! in ascending order with an orthonormal set of eigenvectors. Everything else
//! goes through the general complex solver (`zgeev`), after which eigenvalues,
//! right eigenvectors, and left eigenvectors are reordered together by a single
//! stable sort over an [`OrderBy`] key.
//!
//! Eigenvectors are always stored as the *columns* of a 2D array, so that the
//! `i`-th column corresponds to the `i`-th eigenvalue.

use itertools::Itertools;
use ndarray::{ self as nd, ShapeBuilder };
use ndarray_linalg::{ self as la, Eig, EighInto, Inverse, Scalar, UPLO };
use num_complex::Complex64 as C64;
use crate::error::{ NumericCause, SpectralError, SpectralResult };

/// Relative tolerance for the Hermiticity test.
pub const HERM_RTOL: f64 = 1e-5;

/// Absolute tolerance for the Hermiticity test.
pub const HERM_ATOL: f64 = 1e-8;

/// Sort key applied to the eigenvalues of a non-Hermitian matrix.
///
/// All orderings are ascending. The Hermitian path ignores this and always
/// gives ascending real eigenvalues.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum OrderBy {
    /// Sort by real part.
    #[default]
    Real,
    /// Sort by imaginary part.
    Imag,
    /// Sort by modulus.
    Abs,
}

impl OrderBy {
    /// Compute the sort key for a single eigenvalue.
    pub fn key(self, z: &C64) -> f64 {
        match self {
            Self::Real => z.re,
            Self::Imag => z.im,
            Self::Abs => z.norm(),
        }
    }
}

impl std::str::FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "real" => Ok(Self::Real),
            "imag" => Ok(Self::Imag),
            "abs" => Ok(Self::Abs),
            _ => Err(format!("unknown ordering '{}'", s)),
        }
    }
}

/// Output of [`decompose`].
///
/// Every column of `vectors`, `right`, and `left` is aligned with the element
/// of `values` at the same index.
#[derive(Clone, Debug, PartialEq)]
pub enum EigenResult {
    /// Produced for Hermitian input: real, ascending eigenvalues and an
    /// orthonormal eigenbasis.
    Hermitian {
        values: nd::Array1<f64>,
        vectors: nd::Array2<C64>,
    },
    /// Produced for any other input.
    ///
    /// Left eigenvectors satisfy `u_i^† M = λ_i u_i^†` and are normalized to
    /// unit length.
    General {
        values: nd::Array1<C64>,
        right: nd::Array2<C64>,
        left: nd::Array2<C64>,
    },
}

impl EigenResult {
    /// Return the number of eigenvalues.
    pub fn len(&self) -> usize {
        match self {
            Self::Hermitian { values, .. } => values.len(),
            Self::General { values, .. } => values.len(),
        }
    }

    /// Return `true` if there are no eigenvalues.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Return `true` if `self` came from the Hermitian solver.
    pub fn is_hermitian(&self) -> bool { matches!(self, Self::Hermitian { .. }) }

    /// Return the eigenvalues as complex numbers, regardless of which solver
    /// was used.
    pub fn values(&self) -> nd::Array1<C64> {
        match self {
            Self::Hermitian { values, .. } => values.mapv(C64::from),
            Self::General { values, .. } => values.clone(),
        }
    }

    /// Return the real eigenvalues if the Hermitian solver was used.
    pub fn real_values(&self) -> Option<&nd::Array1<f64>> {
        match self {
            Self::Hermitian { values, .. } => Some(values),
            Self::General { .. } => None,
        }
    }

    /// Return the (right) eigenvectors as columns.
    pub fn right(&self) -> &nd::Array2<C64> {
        match self {
            Self::Hermitian { vectors, .. } => vectors,
            Self::General { right, .. } => right,
        }
    }

    /// Return the left eigenvectors as columns, if they're distinct from the
    /// right eigenvectors.
    pub fn left(&self) -> Option<&nd::Array2<C64>> {
        match self {
            Self::Hermitian { .. } => None,
            Self::General { left, .. } => Some(left),
        }
    }

    /// Return a view of the `i`-th (right) eigenvector.
    ///
    /// *Panics* if `i` is out of bounds.
    pub fn vector(&self, i: usize) -> nd::ArrayView1<'_, C64> {
        self.right().column(i)
    }

    /// Decompose `self` into eigenvalues, right eigenvectors, and left
    /// eigenvectors (if any).
    pub fn into_parts(self)
        -> (nd::Array1<C64>, nd::Array2<C64>, Option<nd::Array2<C64>>)
    {
        match self {
            Self::Hermitian { values, vectors }
                => (values.mapv(C64::from), vectors, None),
            Self::General { values, right, left }
                => (values, right, Some(left)),
        }
    }
}

/// Return `true` if `M` is square and elementwise close to its conjugate
/// transpose.
///
/// Closeness is `|M_ij - M_ji^*| <= HERM_ATOL + HERM_RTOL * |M_ji|`. Any NaN
/// element makes this `false`.
pub fn is_hermitian<S>(M: &nd::ArrayBase<S, nd::Ix2>) -> bool
where S: nd::Data<Elem = C64>
{
    M.is_square()
        && M.indexed_iter()
        .all(|((i, j), a)| {
            let b = M[[j, i]].conj();
            (a - b).norm() <= HERM_ATOL + HERM_RTOL * b.norm()
        })
}

/// Compute the stable permutation that sorts `values` in ascending order of
/// `order`'s key.
///
/// Ties keep their original relative order; `-0.0` and `+0.0` keys tie.
pub fn sort_permutation<S>(values: &nd::ArrayBase<S, nd::Ix1>, order: OrderBy)
    -> Vec<usize>
where S: nd::Data<Elem = C64>
{
    let keys: Vec<f64>
        = values.iter()
        .map(|z| order.key(z))
        .map(|k| if k == 0.0 { 0.0 } else { k })
        .collect();
    (0..keys.len())
        .sorted_by(|&a, &b| keys[a].total_cmp(&keys[b]))
        .collect()
}

/// Diagonalize `M` with the default [`OrderBy::Real`] ordering.
///
/// See [`decompose_by`].
pub fn decompose<A, S>(M: &nd::ArrayBase<S, nd::Ix2>)
    -> SpectralResult<EigenResult>
where
    A: Scalar<Complex = C64>,
    S: nd::Data<Elem = A>,
{
    decompose_by(M, OrderBy::default())
}

/// Diagonalize `M`, choosing the Hermitian or general solver based on
/// [`is_hermitian`].
///
/// `order` is only applied to non-Hermitian input. Fails if `M` is empty or
/// non-square, contains non-finite elements, or if LAPACK fails.
pub fn decompose_by<A, S>(M: &nd::ArrayBase<S, nd::Ix2>, order: OrderBy)
    -> SpectralResult<EigenResult>
where
    A: Scalar<Complex = C64>,
    S: nd::Data<Elem = A>,
{
    let (rows, cols) = M.dim();
    if rows == 0 || rows != cols {
        return Err(SpectralError::Shape { rows, cols });
    }
    let H: nd::Array2<C64> = M.mapv(|a| a.as_c());
    if !H.iter().all(|h| h.is_finite()) {
        return Err(
            SpectralError::Numeric { n: rows, cause: NumericCause::NonFinite });
    }
    if is_hermitian(&H) {
        decompose_hermitian(H)
    } else {
        decompose_general(H, order)
    }
}

fn decompose_hermitian(H: nd::Array2<C64>) -> SpectralResult<EigenResult> {
    let n = H.nrows();
    let (values, vectors) = H.eigh_into(UPLO::Lower)
        .map_err(|err| {
            SpectralError::Numeric { n, cause: NumericCause::NoConvergence(err) }
        })?;
    Ok(EigenResult::Hermitian { values, vectors })
}

fn decompose_general(H: nd::Array2<C64>, order: OrderBy)
    -> SpectralResult<EigenResult>
{
    let n = H.nrows();
    let mut Hf: nd::Array2<C64> = nd::Array2::zeros((n, n).f());
    Hf.assign(&H);
    let (values, right) = Hf.eig()
        .map_err(|err| {
            SpectralError::Numeric { n, cause: NumericCause::NoConvergence(err) }
        })?;
    let left = left_vectors(&right)
        .map_err(|err| {
            SpectralError::Numeric { n, cause: NumericCause::Defective(err) }
        })?;
    let perm = sort_permutation(&values, order);
    Ok(EigenResult::General {
        values: values.select(nd::Axis(0), &perm),
        right: right.select(nd::Axis(1), &perm),
        left: left.select(nd::Axis(1), &perm),
    })
}

// rows of V^-1 are the conjugate-transposed left eigenvectors, in the same
// order as the columns of V
fn left_vectors(V: &nd::Array2<C64>) -> la::error::Result<nd::Array2<C64>> {
    let mut U: nd::Array2<C64> = V.inv()?.t().mapv(|w| w.conj());
    for mut u in U.axis_iter_mut(nd::Axis(1)) {
        let norm: f64 = u.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt();
        u.mapv_inplace(|x| x / norm);
    }
    Ok(U)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{ prelude as rnd, Rng, SeedableRng };

    const TOL: f64 = 1e-10;

    fn close(a: C64, b: C64) -> bool { (a - b).norm() < TOL }

    fn all_close(A: &nd::Array2<C64>, B: &nd::Array2<C64>) -> bool {
        A.shape() == B.shape()
            && A.iter().zip(B).all(|(a, b)| close(*a, *b))
    }

    fn random_hermitian(n: usize, seed: u64) -> nd::Array2<C64> {
        let mut rng = rnd::StdRng::seed_from_u64(seed);
        let A: nd::Array2<C64>
            = nd::Array2::from_shape_simple_fn((n, n), || {
                C64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
            });
        (&A + &A.t().mapv(|a| a.conj())) / C64::from(2.0)
    }

    // P diag(λ) P^-1 for a fixed non-unitary P
    fn with_spectrum(lambda: &[C64]) -> nd::Array2<C64> {
        let i = C64::i();
        let one = C64::from(1.0);
        let P: nd::Array2<C64> = nd::array![
            [one,       0.5 * one, 0.0 * one, 0.2 * i  ],
            [0.0 * one, one,       0.3 * one, 0.0 * one],
            [0.1 * one, 0.0 * one, one,       0.4 * one],
            [0.0 * one, 0.2 * i,   0.0 * one, one      ],
        ];
        let D = nd::Array2::from_diag(&nd::Array1::from(lambda.to_vec()));
        P.dot(&D).dot(&P.inv().unwrap())
    }

    #[test]
    fn hermitian_random() {
        for (n, seed) in [(1, 0), (2, 1), (5, 2), (8, 3)] {
            let M = random_hermitian(n, seed);
            assert!(is_hermitian(&M));
            let res = decompose(&M).unwrap();
            assert!(res.is_hermitian());
            assert!(res.left().is_none());
            assert_eq!(res.len(), n);

            let E = res.real_values().unwrap();
            assert!(E.iter().tuple_windows().all(|(a, b)| a <= b));

            let V = res.right();
            let L = nd::Array2::from_diag(&E.mapv(C64::from));
            let M_rec = V.dot(&L).dot(&V.inv().unwrap());
            assert!(all_close(&M_rec, &M));

            let eye: nd::Array2<C64> = nd::Array2::eye(n);
            let VhV = V.t().mapv(|v| v.conj()).dot(V);
            assert!(all_close(&VhV, &eye));
        }
    }

    #[test]
    fn real_symmetric_input() {
        let M: nd::Array2<f64> = nd::array![[2.0, 1.0], [1.0, 2.0]];
        let res = decompose(&M).unwrap();
        let E = res.real_values().unwrap();
        assert!((E[0] - 1.0).abs() < TOL);
        assert!((E[1] - 3.0).abs() < TOL);
    }

    #[test]
    fn nearly_hermitian_uses_hermitian_path() {
        let mut M = random_hermitian(3, 7);
        M[[0, 1]] += C64::new(1e-12, 0.0);
        assert!(decompose(&M.view()).unwrap().is_hermitian());
        M[[0, 1]] += C64::new(1e-3, 0.0);
        assert!(!decompose(&M.view()).unwrap().is_hermitian());
    }

    #[test]
    fn general_sorted_and_aligned() {
        let i = C64::i();
        let lambda = [
            2.0 + 1.0 * i,
            -1.0 + 3.0 * i,
            0.5 - 2.0 * i,
            -3.0 - 0.5 * i,
        ];
        let M = with_spectrum(&lambda);
        assert!(!is_hermitian(&M));

        let expected = [
            (OrderBy::Real, [lambda[3], lambda[1], lambda[2], lambda[0]]),
            (OrderBy::Imag, [lambda[2], lambda[3], lambda[0], lambda[1]]),
            (OrderBy::Abs,  [lambda[2], lambda[0], lambda[3], lambda[1]]),
        ];
        for (order, sorted) in expected {
            let res = decompose_by(&M, order).unwrap();
            assert!(!res.is_hermitian());
            let E = res.values();
            assert!(E.iter().zip(&sorted).all(|(e, s)| close(*e, *s)));

            let V = res.right();
            let U = res.left().unwrap();
            for (k, &e) in E.iter().enumerate() {
                let v = V.column(k);
                assert!(
                    M.dot(&v).iter().zip(v.iter())
                        .all(|(mv, vi)| close(*mv, e * vi))
                );
                let uh = U.column(k).mapv(|u| u.conj());
                assert!(
                    uh.dot(&M).iter().zip(uh.iter())
                        .all(|(um, ui)| close(*um, e * ui))
                );
                let unorm: f64 = uh.iter().map(|u| u.norm_sqr()).sum();
                assert!((unorm - 1.0).abs() < TOL);
            }
        }
    }

    #[test]
    fn upper_triangular() {
        let M: nd::Array2<f64> = nd::array![[2.0, 1.0], [0.0, 1.0]];
        let res = decompose(&M).unwrap();
        assert!(!res.is_hermitian());
        let E = res.values();
        assert!(close(E[0], 1.0.into()));
        assert!(close(E[1], 2.0.into()));
    }

    #[test]
    fn stable_permutation() {
        let values: nd::Array1<C64> = nd::array![
            C64::new(1.0, 0.0),
            C64::new(1.0, -2.0),
            C64::new(-0.0, -0.0),
            C64::new(-1.0, 0.0),
            C64::new(1.0, 2.0),
        ];
        assert_eq!(sort_permutation(&values, OrderBy::Real), vec![3, 2, 0, 1, 4]);
        assert_eq!(sort_permutation(&values, OrderBy::Imag), vec![1, 0, 2, 3, 4]);
        assert_eq!(sort_permutation(&values, OrderBy::Abs), vec![2, 0, 3, 1, 4]);
    }

    #[test]
    fn shape_errors() {
        let M: nd::Array2<f64> = nd::Array2::zeros((2, 3));
        assert!(matches!(
            decompose(&M),
            Err(SpectralError::Shape { rows: 2, cols: 3 })
        ));
        let M: nd::Array2<C64> = nd::Array2::zeros((0, 0));
        assert!(matches!(
            decompose(&M),
            Err(SpectralError::Shape { rows: 0, cols: 0 })
        ));
    }

    #[test]
    fn non_finite_is_numeric_error() {
        let mut M = random_hermitian(3, 11);
        M[[2, 0]] = C64::new(f64::NAN, 0.0);
        assert!(matches!(
            decompose(&M),
            Err(SpectralError::Numeric { n: 3, cause: NumericCause::NonFinite })
        ));
    }

    #[test]
    fn order_by_from_str() {
        assert_eq!("real".parse::<OrderBy>(), Ok(OrderBy::Real));
        assert_eq!("imag".parse::<OrderBy>(), Ok(OrderBy::Imag));
        assert_eq!("abs".parse::<OrderBy>(), Ok(OrderBy::Abs));
        assert!("magnitude".parse::<OrderBy>().is_err());
    }
}
